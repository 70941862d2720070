//! Bridge statistics collection and reporting.
//!
//! This module tracks counters for a session. It provides:
//! 1. **Bridge:** Cycles, per-domain ticks, admissions, completions, and read latency.
//! 2. **Frontend:** Accepted, rejected, and forwarded requests.
//! 3. **Timing engine:** Requests served and row-buffer outcomes.
//! 4. **Report:** [`FinalReport`], returned by `Session::finalize`, with sectioned printing.

use std::io::{self, Write};

/// Counters maintained by the session itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// External ticks elapsed.
    pub cycles: u64,
    /// Ticks on which the frontend was driven.
    pub frontend_ticks: u64,
    /// Ticks on which the timing engine was driven.
    pub engine_ticks: u64,
    /// Reads accepted by the frontend.
    pub reads_accepted: u64,
    /// Writes accepted by the frontend.
    pub writes_accepted: u64,
    /// Submits that returned `false`.
    pub rejections: u64,
    /// Completions handed to the driver.
    pub completions_drained: u64,
    /// Drained completions with no matching ledger record.
    pub unmatched_completions: u64,
    /// Sum of issue-to-drain latencies of correlated reads, in bridge cycles.
    pub latency_total: u64,
    /// Smallest correlated read latency observed.
    pub latency_min: Option<u64>,
    /// Largest correlated read latency observed.
    pub latency_max: u64,
}

impl BridgeStats {
    /// Folds one correlated read latency into the running figures.
    pub fn record_latency(&mut self, latency: u64) {
        self.latency_total += latency;
        self.latency_min = Some(self.latency_min.map_or(latency, |min| min.min(latency)));
        self.latency_max = self.latency_max.max(latency);
    }

    /// Number of correlated reads folded into the latency figures.
    pub const fn correlated_reads(&self) -> u64 {
        self.completions_drained - self.unmatched_completions
    }

    /// Mean issue-to-drain read latency, or 0.0 if nothing was correlated.
    pub fn mean_latency(&self) -> f64 {
        let n = self.correlated_reads();
        if n == 0 {
            0.0
        } else {
            self.latency_total as f64 / n as f64
        }
    }

    /// Total requests accepted.
    pub const fn accepted(&self) -> u64 {
        self.reads_accepted + self.writes_accepted
    }
}

/// Counters reported by a frontend at finalize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendStats {
    /// Frontend clock cycles executed.
    pub cycles: u64,
    /// Requests admitted into the pending queue.
    pub accepted: u64,
    /// Requests refused because the pending queue was full.
    pub rejected: u64,
    /// Requests handed on to the timing engine.
    pub forwarded: u64,
    /// Requests still pending when the frontend was finalized.
    pub abandoned: u64,
}

/// Counters reported by a timing engine at finalize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Timing-engine clock cycles executed.
    pub cycles: u64,
    /// Reads completed.
    pub reads_served: u64,
    /// Writes completed.
    pub writes_served: u64,
    /// Requests refused because the engine was full.
    pub refused: u64,
    /// Accesses that hit the open row.
    pub row_hits: u64,
    /// Accesses to an idle bank (no row open).
    pub row_misses: u64,
    /// Accesses that had to close a different open row first.
    pub row_conflicts: u64,
    /// Sum of modeled access latencies, in engine cycles.
    pub busy_cycles: u64,
    /// Requests still in flight when the engine was finalized.
    pub abandoned: u64,
}

impl EngineStats {
    /// Requests completed in total.
    pub const fn served(&self) -> u64 {
        self.reads_served + self.writes_served
    }
}

/// Section names for selective report output.
///
/// Pass an empty slice to [`FinalReport::print_sections`] to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "frontend", "memory", "latency"];

/// Everything a session reports at teardown.
#[derive(Debug, Clone, Default)]
pub struct FinalReport {
    /// Session counters.
    pub bridge: BridgeStats,
    /// Frontend counters.
    pub frontend: FrontendStats,
    /// Timing-engine counters.
    pub engine: EngineStats,
}

impl FinalReport {
    /// Writes the requested sections to `out`.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]; an empty slice
    /// writes everything.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by `out`.
    pub fn write_sections<W: Write>(&self, out: &mut W, sections: &[String]) -> io::Result<()> {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let b = &self.bridge;

        writeln!(out, "==========================================================")?;
        writeln!(out, "MEMORY BRIDGE STATISTICS")?;
        writeln!(out, "==========================================================")?;
        if want("summary") {
            writeln!(out, "sim_cycles               {}", b.cycles)?;
            writeln!(out, "frontend_ticks           {}", b.frontend_ticks)?;
            writeln!(out, "engine_ticks             {}", b.engine_ticks)?;
            writeln!(out, "reads_accepted           {}", b.reads_accepted)?;
            writeln!(out, "writes_accepted          {}", b.writes_accepted)?;
            writeln!(out, "rejections               {}", b.rejections)?;
            writeln!(out, "completions              {}", b.completions_drained)?;
            writeln!(out, "unmatched_completions    {}", b.unmatched_completions)?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("frontend") {
            let f = &self.frontend;
            writeln!(out, "FRONTEND")?;
            writeln!(out, "  cycles                 {}", f.cycles)?;
            writeln!(out, "  accepted               {}", f.accepted)?;
            writeln!(out, "  rejected               {}", f.rejected)?;
            writeln!(out, "  forwarded              {}", f.forwarded)?;
            writeln!(out, "  abandoned              {}", f.abandoned)?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("memory") {
            let e = &self.engine;
            let accesses = e.row_hits + e.row_misses + e.row_conflicts;
            let hit_rate = if accesses > 0 {
                (e.row_hits as f64 / accesses as f64) * 100.0
            } else {
                0.0
            };
            writeln!(out, "TIMING ENGINE")?;
            writeln!(out, "  cycles                 {}", e.cycles)?;
            writeln!(out, "  reads_served           {}", e.reads_served)?;
            writeln!(out, "  writes_served          {}", e.writes_served)?;
            writeln!(out, "  refused                {}", e.refused)?;
            writeln!(out, "  busy_cycles            {}", e.busy_cycles)?;
            writeln!(out, "  abandoned              {}", e.abandoned)?;
            writeln!(
                out,
                "  row_buffer  hits: {:<8} | misses: {:<8} | conflicts: {:<8} | hit_rate: {:.2}%",
                e.row_hits, e.row_misses, e.row_conflicts, hit_rate
            )?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("latency") {
            writeln!(out, "READ LATENCY (bridge cycles, issue to drain)")?;
            writeln!(out, "  correlated             {}", b.correlated_reads())?;
            writeln!(out, "  mean                   {:.2}", b.mean_latency())?;
            writeln!(out, "  min                    {}", b.latency_min.unwrap_or(0))?;
            writeln!(out, "  max                    {}", b.latency_max)?;
        }
        writeln!(out, "==========================================================")
    }

    /// Prints only the requested sections to stdout.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing to stdout.
    pub fn print_sections(&self, sections: &[String]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_sections(&mut out, sections)
    }

    /// Prints every section to stdout.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing to stdout.
    pub fn print(&self) -> io::Result<()> {
        self.print_sections(&[])
    }
}
