//! Functional data model.
//!
//! Holds the value each address would contain if memory were untimed. Writes land here the
//! moment they are accepted; read completions resolve their value here when the timing engine
//! fires them. The timing engine never stores data.

use std::collections::HashMap;

/// Map from address to last written 64-bit value.
///
/// Unbounded: sized only by the distinct addresses written during a session.
#[derive(Debug, Default, Clone)]
pub struct FunctionalStore {
    values: HashMap<u64, u64>,
}

impl FunctionalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` at `addr`, replacing any earlier value.
    pub fn write(&mut self, addr: u64, value: u64) {
        let _ = self.values.insert(addr, value);
    }

    /// Returns the last value written to `addr`.
    ///
    /// An address that was never written reads back as the address itself, so a test can
    /// tell "never written" apart from "written zero".
    pub fn read(&self, addr: u64) -> u64 {
        self.values.get(&addr).copied().unwrap_or(addr)
    }

    /// Returns `true` if `addr` has been written.
    pub fn contains(&self, addr: u64) -> bool {
        self.values.contains_key(&addr)
    }

    /// Number of distinct addresses written.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
