//! The protocol between the agent loop and language model providers.
//!
//! Types in this crate carry no behavior of their own. They describe what a
//! provider receives (a [`ModelRequest`]) and what it hands back (a stream of
//! [`ModelResponseEvent`]s), so the agent can run against any provider that
//! implements [`ModelProvider`], including scripted ones in tests.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
