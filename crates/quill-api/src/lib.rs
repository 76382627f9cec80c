//! quill-api: wire contract for the proposal-drafting backend
//!
//! This crate defines the request and reply shapes exchanged with the backend
//! agent, the opaque continuation state it hands out, the classification of
//! replies into a closed set of outcomes, and an HTTP client.

pub mod client;
pub mod error;
pub mod reply;
pub mod state;
pub mod types;

pub use client::BackendClient;
pub use error::{Error, Result};
pub use reply::Reply;
pub use state::ConversationState;
pub use types::*;
