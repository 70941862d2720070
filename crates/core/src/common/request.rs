//! Memory request representation.
//!
//! A [`Request`] is created by the session at submit time, handed to the frontend, forwarded
//! to the timing engine, and finally completed by the engine from inside its own `tick`.
//! Completion runs the request's deferred [`Callback`], which reaches session state only
//! through the [`CompletionContext`] the session lends to the engine for that tick.

use std::fmt;

use super::error::BridgeError;
use crate::completion::CompletionContext;

/// Direction of a memory request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Load; produces a completion carrying the functional value.
    Read,
    /// Store; updates the functional store at accept time and never produces a completion.
    Write,
}

impl RequestKind {
    /// Returns the wire code used by drivers (`0` = read, `1` = write).
    pub const fn code(self) -> i32 {
        match self {
            Self::Read => 0,
            Self::Write => 1,
        }
    }
}

impl TryFrom<i32> for RequestKind {
    type Error = BridgeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Read),
            1 => Ok(Self::Write),
            other => Err(BridgeError::InvalidRequestKind(other)),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Deferred completion action registered at submit time.
///
/// Invoked at most once, by the timing engine, from within a later `tick`.
pub type Callback = Box<dyn FnOnce(&Request, &mut CompletionContext<'_>) + Send>;

/// A memory request in flight between the driver and the timing engine.
pub struct Request {
    /// Byte address of the access.
    pub addr: u64,
    /// Read or write.
    pub kind: RequestKind,
    /// Identifier of the issuing agent (core, port, or testbench lane).
    pub source_id: i32,
    callback: Option<Callback>,
}

impl Request {
    /// Creates a request with no completion callback.
    pub fn new(addr: u64, kind: RequestKind, source_id: i32) -> Self {
        Self {
            addr,
            kind,
            source_id,
            callback: None,
        }
    }

    /// Attaches the callback the timing engine runs when this request completes.
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Self, &mut CompletionContext<'_>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Returns `true` if a completion callback is attached.
    pub const fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Completes the request, running its callback (if any) against `ctx`.
    ///
    /// Consumes the request, so a callback can never fire twice.
    pub fn complete(mut self, ctx: &mut CompletionContext<'_>) {
        if let Some(callback) = self.callback.take() {
            callback(&self, ctx);
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("kind", &self.kind)
            .field("source_id", &self.source_id)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
