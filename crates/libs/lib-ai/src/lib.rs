//! # Upstream AI Client
//!
//! Client for the external chat completion endpoint (`POST <base>/chat`), in one-shot
//! and streaming modes, plus the incremental decoder for its `data:` line protocol.

pub mod client;
pub mod error;
pub mod sse;
pub mod types;

pub use client::{FragmentStream, UpstreamClient};
pub use error::{Result, UpstreamError};
pub use sse::{Frame, FrameDecoder};
pub use types::{ChatMessage, Role};
