//! Common types shared by the session and its collaborators.
//!
//! This module provides:
//! 1. **Requests:** The [`Request`] carried from the driver through the frontend into the
//!    timing engine, and its [`RequestKind`].
//! 2. **Errors:** Construction and configuration errors surfaced by the session.

/// Error types for configuration loading and session construction.
pub mod error;
/// Memory request representation and completion callbacks.
pub mod request;

pub use error::{BridgeError, ConfigError};
pub use request::{Callback, Request, RequestKind};
