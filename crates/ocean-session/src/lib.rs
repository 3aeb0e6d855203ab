//! ocean-session: Session controller for a single chat conversation
//!
//! This crate owns the conversation history, the typing/error state and the
//! one in-flight reply request, and persists the history through a [`Store`].

pub mod controller;
pub mod error;
pub mod events;
pub mod message;
pub mod store;

pub use controller::{SessionConfig, SessionController, SessionView, TurnOutcome};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use message::{Message, Role, Status};
pub use store::{FileStore, MemoryStore, Store, open_default_store};
