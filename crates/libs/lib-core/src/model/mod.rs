//! # Model Layer
//!
//! Persistence for users, conversations and messages.

pub mod store;
