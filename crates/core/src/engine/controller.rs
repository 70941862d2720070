//! Memory controller latency models.
//!
//! This module provides:
//! 1. **SimpleController:** Fixed latency per access (no row-buffer modeling).
//! 2. **DramController:** Row-buffer-aware latency (CAS, RAS, precharge) for DRAM-style timing.
//!
//! Controllers only decide how long an access takes. Data values never pass through them.

/// Outcome of a row-buffer lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// The addressed row was already open.
    Hit,
    /// No row was open.
    Miss,
    /// A different row was open and had to be closed first.
    Conflict,
}

/// Trait for memory controller implementations that report access latency in cycles.
pub trait MemoryController: Send {
    /// Returns the number of engine cycles required for an access to `addr`.
    fn access_latency(&mut self, addr: u64) -> u64;

    /// Row-buffer outcome of the most recent access, for controllers that model one.
    fn last_outcome(&self) -> Option<RowOutcome> {
        None
    }
}

/// Fixed-latency memory controller; every access takes the same number of cycles.
#[derive(Debug, Clone)]
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a simple controller with the given fixed latency in cycles.
    pub const fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}

/// DRAM-style controller with a single open-row buffer.
#[derive(Debug, Clone)]
pub struct DramController {
    open_row: Option<u64>,
    last: Option<RowOutcome>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
    row_mask: u64,
}

impl DramController {
    /// Row size used by [`DramController::new`]: 2 KiB.
    pub const DEFAULT_ROW_BITS: u32 = 11;

    /// Creates a DRAM controller with 2 KiB rows and the given timing (in cycles).
    ///
    /// # Arguments
    ///
    /// * `t_cas` - Column access strobe latency.
    /// * `t_ras` - Row access strobe latency.
    /// * `t_pre` - Precharge latency.
    pub const fn new(t_cas: u64, t_ras: u64, t_pre: u64) -> Self {
        Self::with_row_bits(t_cas, t_ras, t_pre, Self::DEFAULT_ROW_BITS)
    }

    /// Creates a DRAM controller whose rows span `1 << row_bits` bytes.
    ///
    /// `row_bits` of 64 or more places every address in one row.
    pub const fn with_row_bits(t_cas: u64, t_ras: u64, t_pre: u64, row_bits: u32) -> Self {
        let row_mask = if row_bits >= u64::BITS {
            0
        } else {
            !((1u64 << row_bits) - 1)
        };
        Self {
            open_row: None,
            last: None,
            t_cas,
            t_ras,
            t_pre,
            row_mask,
        }
    }

    /// Row currently held open, if any.
    pub const fn open_row(&self) -> Option<u64> {
        self.open_row
    }
}

impl MemoryController for DramController {
    fn access_latency(&mut self, addr: u64) -> u64 {
        let row = addr & self.row_mask;
        let (outcome, latency) = match self.open_row {
            Some(open) if open == row => (RowOutcome::Hit, self.t_cas),
            Some(_) => (
                RowOutcome::Conflict,
                self.t_pre.saturating_add(self.t_ras).saturating_add(self.t_cas),
            ),
            None => (RowOutcome::Miss, self.t_ras.saturating_add(self.t_cas)),
        };
        self.open_row = Some(row);
        self.last = Some(outcome);
        latency
    }

    fn last_outcome(&self) -> Option<RowOutcome> {
        self.last
    }
}
