//! Smoke run: a small self-checking driver for a bridge session.
//!
//! Requests are issued in groups of four at cache-line stride:
//! a write, a read of the address just written, and two reads of never-written addresses.
//! Every read completion is checked against a shadow copy of the accepted writes; a
//! never-written address must read back as itself.

use std::collections::HashMap;
use std::process::ExitCode;

use membridge_core::{Config, RequestKind, Session};
use tracing::{info, warn};

use crate::CliResult;

/// Run parameters.
#[derive(Debug, Clone)]
pub struct Plan {
    pub requests: usize,
    pub max_cycles: u64,
    pub max_inflight: usize,
    pub stride: u64,
    pub stall_limit: u64,
}

impl Plan {
    /// Address and kind of request `i`.
    fn request(&self, i: usize) -> (u64, RequestKind) {
        let line = i as u64;
        match i % 4 {
            0 => (line * self.stride, RequestKind::Write),
            1 => ((line - 1) * self.stride, RequestKind::Read),
            _ => (line * self.stride, RequestKind::Read),
        }
    }
}

/// Write data pattern: a deterministic function of the address.
const fn write_data(addr: u64) -> u64 {
    addr ^ 0xDEAD_BEEF_CAFE_BABE
}

#[derive(Debug, Default)]
struct Tally {
    accepted: u64,
    rejected: u64,
    reads_issued: u64,
    reads_completed: u64,
    functional_ok: u64,
    unmatched: u64,
}

/// Runs the smoke scenario against a session built from `config`.
pub fn run(config: &Config, plan: &Plan) -> CliResult {
    let mut session = Session::from_config(config)?;
    let (frontend_ratio, engine_ratio) = session.clock_ratios();
    info!(
        requests = plan.requests,
        frontend_ratio, engine_ratio, "starting smoke run"
    );

    let mut shadow: HashMap<u64, u64> = HashMap::new();
    let mut pending: HashMap<u64, u64> = HashMap::new();
    let mut tally = Tally::default();
    let mut next = 0;
    let mut stall = 0u64;
    let mut finished_at = None;

    for cycle in 0..plan.max_cycles {
        while let Some(done) = session.drain() {
            let Some(expected) = pending.remove(&done.addr) else {
                warn!("completion for {:#x} not matched to a pending read", done.addr);
                tally.unmatched += 1;
                continue;
            };
            tally.reads_completed += 1;
            if done.value == expected {
                tally.functional_ok += 1;
            } else {
                warn!(
                    "functional mismatch at {:#x}: got {:#018x}, expected {:#018x}",
                    done.addr, done.value, expected
                );
            }
        }

        if next < plan.requests && pending.len() < plan.max_inflight {
            let (addr, kind) = plan.request(next);
            let data = match kind {
                RequestKind::Write => write_data(addr),
                RequestKind::Read => 0,
            };
            if session.submit(addr, kind, 0, data) {
                match kind {
                    RequestKind::Write => {
                        let _ = shadow.insert(addr, data);
                    }
                    RequestKind::Read => {
                        let expected = shadow.get(&addr).copied().unwrap_or(addr);
                        let _ = pending.insert(addr, expected);
                        tally.reads_issued += 1;
                    }
                }
                next += 1;
                tally.accepted += 1;
                stall = 0;
            } else {
                tally.rejected += 1;
                stall += 1;
            }
        }

        session.advance();

        if next == plan.requests && pending.is_empty() {
            finished_at = Some(cycle + 1);
            break;
        }
        if stall > plan.stall_limit {
            warn!("stalled for {stall} cycles; possible deadlock");
            break;
        }
    }

    match finished_at {
        Some(cycle) => info!("all requests completed at cycle {cycle}"),
        None => warn!(
            "stopped with {} read(s) outstanding and {} request(s) unissued",
            pending.len(),
            plan.requests - next
        ),
    }

    println!("--- Results ---");
    println!("  Requests issued      : {} / {}", next, plan.requests);
    println!("  Reads completed      : {} / {}", tally.reads_completed, tally.reads_issued);
    println!("  Functional checks OK : {} / {}", tally.functional_ok, tally.reads_completed);
    println!("  Unmatched completions: {}", tally.unmatched);
    println!("  Submit accepted      : {}", tally.accepted);
    println!("  Submit rejected      : {}", tally.rejected);

    let report = session.finalize();
    report.print()?;

    if tally.accepted == 0 {
        eprintln!("FAIL: no requests were accepted");
        return Ok(ExitCode::FAILURE);
    }
    if tally.functional_ok != tally.reads_completed {
        eprintln!(
            "FAIL: {} of {} reads returned wrong data",
            tally.reads_completed - tally.functional_ok,
            tally.reads_completed
        );
        return Ok(ExitCode::FAILURE);
    }
    if tally.reads_completed == 0 {
        println!("WARN: no reads completed; functional model unverified");
    } else {
        println!("Smoke run PASSED");
    }
    Ok(ExitCode::SUCCESS)
}
