//! # Web Library
//!
//! HTTP boundary of the chat backend: router, middleware, extractors and handlers.

pub mod doc;
pub mod handlers;
pub mod middleware;
pub mod server;

#[cfg(test)]
pub(crate) mod test_utils;

pub use server::{create_router, init_tracing, start_server, AppState};
