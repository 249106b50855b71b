//! The agent loop: model invocation, tool dispatch and conversation state.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod error;
mod model_client;
pub mod tool;

pub use agent::{Agent, AgentBuilder, DEFAULT_MAX_TURNS};
pub use conversation::{Conversation, TranscriptSource};
pub use error::Error;
