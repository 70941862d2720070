//! In-flight request ledger.
//!
//! Records when each accepted request was issued so the session can correlate a completion
//! with its request and report issue-to-drain latency. Records are keyed by address; how a
//! second request to an address that is already in flight is handled depends on the
//! [`OverlapPolicy`].

use std::collections::{HashMap, VecDeque};

use crate::common::RequestKind;
use crate::config::OverlapPolicy;

/// Issue-time bookkeeping for one accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRecord {
    /// Bridge cycle at which the request was accepted.
    pub issue_cycle: u64,
    /// Read or write.
    pub kind: RequestKind,
}

/// Address-keyed ledger of in-flight requests.
#[derive(Debug, Default)]
pub struct RequestLedger {
    policy: OverlapPolicy,
    entries: HashMap<u64, VecDeque<RequestRecord>>,
}

impl RequestLedger {
    /// Creates an empty ledger with the given overlap policy.
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    /// Returns the overlap policy.
    pub const fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Returns `false` when a new request to `addr` must be refused.
    ///
    /// Only [`OverlapPolicy::Reject`] ever refuses, and only while a record for `addr` is live.
    pub fn admits(&self, addr: u64) -> bool {
        self.policy != OverlapPolicy::Reject || self.outstanding(addr) == 0
    }

    /// Records an accepted request issued at `cycle`.
    ///
    /// Under [`OverlapPolicy::Overwrite`] the new record replaces any live one for `addr`
    /// (last issued wins). The other policies keep records in issue order.
    pub fn record(&mut self, addr: u64, cycle: u64, kind: RequestKind) {
        let record = RequestRecord {
            issue_cycle: cycle,
            kind,
        };
        let slot = self.entries.entry(addr).or_default();
        if self.policy == OverlapPolicy::Overwrite {
            slot.clear();
        }
        slot.push_back(record);
    }

    /// Removes and returns the oldest record of `kind` at `addr`.
    ///
    /// `None` means the completion cannot be correlated; callers treat it as a diagnostic,
    /// not a failure.
    pub fn take(&mut self, addr: u64, kind: RequestKind) -> Option<RequestRecord> {
        let slot = self.entries.get_mut(&addr)?;
        let pos = slot.iter().position(|r| r.kind == kind)?;
        let record = slot.remove(pos);
        if slot.is_empty() {
            let _ = self.entries.remove(&addr);
        }
        record
    }

    /// Number of live records for `addr`.
    pub fn outstanding(&self, addr: u64) -> usize {
        self.entries.get(&addr).map_or(0, VecDeque::len)
    }

    /// Total number of live records.
    pub fn len(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }

    /// Returns `true` if no request is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
