//! ocean-reply: Reply provider abstraction layer
//!
//! This crate provides a common interface for producing assistant replies,
//! either from a local simulated responder or from a remote chat endpoint.

pub mod error;
pub mod providers;

pub use error::{Error, Result};
pub use providers::{ReplyMode, ReplyProvider, provider_for};
