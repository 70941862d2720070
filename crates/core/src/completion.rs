//! Completion delivery.
//!
//! Timing-engine callbacks push [`Completion`]s into the [`CompletionQueue`] through a
//! [`CompletionContext`]; the driver pops them with `Session::drain` in the order the
//! callbacks fired.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::RequestKind;
use crate::functional::FunctionalStore;
use crate::ledger::{RequestLedger, RequestRecord};

/// A completed read and the functional value it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Address of the completed read.
    pub addr: u64,
    /// Value resolved from the functional store when the read completed.
    pub value: u64,
}

/// FIFO of completions awaiting drain.
#[derive(Debug, Default)]
pub struct CompletionQueue {
    entries: VecDeque<Completion>,
}

impl CompletionQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a completion.
    pub fn push(&mut self, completion: Completion) {
        self.entries.push_back(completion);
    }

    /// Removes and returns the oldest completion.
    pub fn pop(&mut self) -> Option<Completion> {
        self.entries.pop_front()
    }

    /// Returns the oldest completion without removing it.
    pub fn peek(&self) -> Option<&Completion> {
        self.entries.front()
    }

    /// Number of completions waiting.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Session state lent to the timing engine for the duration of one `tick`.
///
/// Completion callbacks see the session only through this context, so no callback can
/// outlive the borrow or run outside a call the session makes into the engine.
#[derive(Debug)]
pub struct CompletionContext<'a> {
    store: &'a FunctionalStore,
    queue: &'a mut CompletionQueue,
    ledger: &'a mut RequestLedger,
    cycle: u64,
}

impl<'a> CompletionContext<'a> {
    /// Borrows the session state needed by completion callbacks at bridge cycle `cycle`.
    pub const fn new(
        store: &'a FunctionalStore,
        queue: &'a mut CompletionQueue,
        ledger: &'a mut RequestLedger,
        cycle: u64,
    ) -> Self {
        Self {
            store,
            queue,
            ledger,
            cycle,
        }
    }

    /// Bridge cycle during which the callbacks are running.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Resolves the functional value for `addr`.
    pub fn resolve(&self, addr: u64) -> u64 {
        self.store.read(addr)
    }

    /// Queues a completion for the driver.
    pub fn push(&mut self, completion: Completion) {
        trace!(
            cycle = self.cycle,
            "completion queued for {:#x}",
            completion.addr
        );
        self.queue.push(completion);
    }

    /// Retires the oldest ledger record of `kind` at `addr`.
    pub fn retire(&mut self, addr: u64, kind: RequestKind) -> Option<RequestRecord> {
        self.ledger.take(addr, kind)
    }
}
