//! A real-estate assistant: a chat model that can search property listings
//! and work out the cash-on-cash return of a rental.
//!
//! The crate includes a CLI for using in the terminal and a small debug
//! binary that dumps raw search results. As a library it exposes the
//! [`Configuration`], the tools and a [`Session`] wrapping the agent.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
mod session;
pub mod tools;

pub use config::{
    ConfigError, Configuration, ConfigurationBuilder, DEFAULT_MODEL,
    DEFAULT_SYSTEM_PROMPT,
};
pub use session::{Session, SessionBuilder};

/// Re-exports of [`realzen_agent_core`] crate.
pub mod core {
    pub use realzen_agent_core::*;
}
