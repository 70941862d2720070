//! Session Tests.
//!
//! End-to-end request lifecycle through a session: construction, admission, clock
//! scheduling, completion delivery, ledger correlation, and teardown.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

use membridge_core::common::ConfigError;
use membridge_core::config::{BridgeConfig, Config, MemoryController, OverlapPolicy};
use membridge_core::engine::controller::RowOutcome;
use membridge_core::engine::frontend::ExternalFrontend;
use membridge_core::engine::memory::LatencyEngine;
use membridge_core::scheduler::ClockDomain;
use membridge_core::{BridgeError, Completion, RequestKind, Session};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::NamedTempFile;

use crate::common::harness::{TestContext, init_tracing, simple_config};
use crate::common::mocks::controller::MockController;
use crate::common::mocks::loader::MockLoader;
use crate::common::mocks::probes::{ProbeEngine, ProbeFrontend};

fn policy_context(policy: OverlapPolicy, latency: u64) -> TestContext {
    let mut config = simple_config(1, 1, latency);
    config.bridge.overlap_policy = policy;
    TestContext::new(&config)
}

// ══════════════════════════════════════════════════════════
// 1. Construction
// ══════════════════════════════════════════════════════════

#[test]
fn create_from_json_file() {
    init_tracing();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{ "frontend": {{ "clock_ratio": 2 }}, "memory": {{ "clock_ratio": 1, "latency": 4 }} }}"#
    )
    .unwrap();

    let session = Session::create(file.path()).unwrap();
    assert_eq!(session.clock_ratios(), (2, 1));
    assert_eq!(session.cycle(), 0);
    assert_eq!(session.in_flight(), 0);
}

#[test]
fn create_with_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = Session::create(dir.path().join("nope.json"));
    assert!(matches!(
        result,
        Err(BridgeError::Config(ConfigError::Io { .. }))
    ));
}

#[test]
fn create_with_loads_through_loader_once() {
    let mut loader = MockLoader::new();
    loader
        .expect_load()
        .withf(|path| path.ends_with("bridge.json"))
        .times(1)
        .returning(|_| Ok(simple_config(4, 2, 10)));

    let session = Session::create_with(&loader, Path::new("cfg/bridge.json")).unwrap();
    assert_eq!(session.clock_ratios(), (4, 2));
}

#[test]
fn loader_failure_surfaces_as_config_error() {
    let mut loader = MockLoader::new();
    loader.expect_load().times(1).returning(|path| {
        Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        })
    });

    let err = Session::create_with(&loader, Path::new("locked.json")).unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));
    assert!(err.to_string().contains("locked.json"));
}

#[test]
fn zero_frontend_ratio_is_rejected() {
    let config = simple_config(0, 1, 5);
    match Session::from_config(&config) {
        Err(BridgeError::InvalidClockRatio { domain, ratio }) => {
            assert_eq!(domain, ClockDomain::Frontend);
            assert_eq!(ratio, 0);
        }
        other => panic!("expected InvalidClockRatio, got {other:?}"),
    }
}

#[test]
fn zero_engine_ratio_from_collaborator_is_rejected() {
    let result = Session::with_engines(
        Box::new(ProbeFrontend::new(1)),
        Box::new(ProbeEngine::new(0, 1)),
        BridgeConfig::default(),
    );
    assert!(matches!(
        result,
        Err(BridgeError::InvalidClockRatio {
            domain: ClockDomain::Engine,
            ratio: 0,
        })
    ));
}

#[test]
fn zero_queue_depth_fails_engine_construction() {
    let mut config = simple_config(1, 1, 5);
    config.memory.queue_depth = 0;
    assert!(matches!(
        Session::from_config(&config),
        Err(BridgeError::EngineConstruction(_))
    ));
}

// ══════════════════════════════════════════════════════════
// 2. Clock scheduling
// ══════════════════════════════════════════════════════════

#[test]
fn each_domain_ticks_its_own_ratio_per_period() {
    let frontend = ProbeFrontend::new(3);
    let engine = ProbeEngine::new(2, 1);
    let (fp, ep) = (frontend.probe.clone(), engine.probe.clone());
    let mut session =
        Session::with_engines(Box::new(frontend), Box::new(engine), BridgeConfig::default())
            .unwrap();

    for _ in 0..6 {
        session.advance();
    }
    assert_eq!(fp.ticks(), 3);
    assert_eq!(ep.ticks(), 2);
    assert_eq!(session.stats().frontend_ticks, 3);
    assert_eq!(session.stats().engine_ticks, 2);
}

#[test]
fn advance_counts_every_external_cycle() {
    let mut ctx = TestContext::new(&Config::default());
    for _ in 0..1_000 {
        ctx.session.advance();
    }
    assert_eq!(ctx.session.cycle(), 1_000);
    assert_eq!(ctx.session.stats().cycles, 1_000);
}

// ══════════════════════════════════════════════════════════
// 3. Reads, writes, and the functional store
// ══════════════════════════════════════════════════════════

#[test]
fn read_after_write_returns_written_value() {
    let mut ctx = TestContext::simple(5);
    assert!(ctx.session.submit(0x40, RequestKind::Write, 0, 0xABCD));
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));

    let drained = ctx.run_until_idle(100);
    assert_eq!(
        drained,
        vec![Completion {
            addr: 0x40,
            value: 0xABCD,
        }]
    );
}

#[test]
fn read_of_unwritten_address_returns_address() {
    let mut ctx = TestContext::simple(5);
    assert!(ctx.session.submit(0x80, RequestKind::Read, 0, 0));
    assert_eq!(
        ctx.run_until_completion(100),
        Some(Completion {
            addr: 0x80,
            value: 0x80,
        })
    );
}

#[test]
fn writes_never_produce_completions() {
    let mut ctx = TestContext::simple(3);
    assert!(ctx.session.submit(0x40, RequestKind::Write, 0, 1));
    assert!(ctx.session.submit(0x80, RequestKind::Write, 0, 2));
    assert_eq!(ctx.session.in_flight(), 2);

    assert!(ctx.run_until_idle(100).is_empty());
    assert_eq!(ctx.session.in_flight(), 0);
    assert_eq!(ctx.session.stats().writes_accepted, 2);
    assert_eq!(ctx.session.functional().read(0x80), 2);
}

#[test]
fn empty_drain_has_no_side_effects() {
    let mut ctx = TestContext::simple(5);
    for _ in 0..3 {
        assert_eq!(ctx.session.drain(), None);
    }
    assert_eq!(ctx.session.cycle(), 0);
    assert_eq!(ctx.session.stats().completions_drained, 0);
    assert_eq!(ctx.session.stats().unmatched_completions, 0);
}

#[test]
fn rejected_submit_leaves_no_trace() {
    let mut session = Session::with_engines(
        Box::new(ProbeFrontend::rejecting(1)),
        Box::new(ProbeEngine::new(1, 1)),
        BridgeConfig::default(),
    )
    .unwrap();

    assert!(!session.submit(0x40, RequestKind::Write, 0, 7));
    assert!(!session.functional().contains(0x40));
    assert_eq!(session.in_flight(), 0);
    assert_eq!(session.pending_completions(), 0);
    assert_eq!(session.stats().rejections, 1);
    assert_eq!(session.stats().accepted(), 0);
}

#[test]
fn full_frontend_rejects_until_it_forwards() {
    let mut config = simple_config(1, 1, 5);
    config.frontend.queue_depth = 1;
    let mut ctx = TestContext::new(&config);

    assert!(ctx.session.submit(0x00, RequestKind::Read, 0, 0));
    assert!(!ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert_eq!(ctx.session.in_flight(), 1);

    ctx.session.advance();
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
}

#[test]
fn raw_submit_validates_kind_code() {
    let mut ctx = TestContext::simple(5);
    assert!(matches!(
        ctx.session.submit_raw(0x40, 2, 0, 9),
        Err(BridgeError::InvalidRequestKind(2))
    ));
    assert_eq!(ctx.session.stats().accepted(), 0);
    assert!(!ctx.session.functional().contains(0x40));

    assert!(ctx.session.submit_raw(0x40, 1, 0, 9).unwrap());
    assert_eq!(ctx.session.functional().read(0x40), 9);
}

// ══════════════════════════════════════════════════════════
// 4. Completion order and latency
// ══════════════════════════════════════════════════════════

#[test]
fn drain_order_follows_completion_order() {
    let mut ctrl = MockController::new();
    ctrl.expect_access_latency()
        .with(eq(0xA0_u64))
        .return_const(10u64);
    ctrl.expect_access_latency()
        .with(eq(0xB0_u64))
        .return_const(2u64);
    ctrl.expect_last_outcome().return_const(None::<RowOutcome>);

    let mut session = Session::with_engines(
        Box::new(ExternalFrontend::new(1, 4)),
        Box::new(LatencyEngine::new(1, 4, Box::new(ctrl))),
        BridgeConfig::default(),
    )
    .unwrap();
    assert!(session.submit(0xA0, RequestKind::Read, 0, 0));
    assert!(session.submit(0xB0, RequestKind::Read, 1, 0));

    let mut ctx = TestContext { session };
    let order: Vec<u64> = ctx.run_until_idle(100).iter().map(|c| c.addr).collect();
    assert_eq!(order, vec![0xB0, 0xA0]);
}

#[test]
fn latency_is_measured_issue_to_drain() {
    let mut ctx = TestContext::simple(5);
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert!(ctx.run_until_completion(100).is_some());

    let stats = ctx.session.stats();
    assert_eq!(stats.latency_min, Some(5));
    assert_eq!(stats.latency_max, 5);
    assert!((stats.mean_latency() - 5.0).abs() < f64::EPSILON);
    assert_eq!(stats.correlated_reads(), 1);
}

#[test]
fn slower_engine_clock_stretches_latency() {
    // Engine ticks once every two external cycles.
    let mut ctx = TestContext::new(&simple_config(2, 1, 5));
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert!(ctx.run_until_completion(100).is_some());
    assert!(ctx.session.stats().latency_max >= 10);
}

#[test]
fn submit_never_completes_inline() {
    let mut ctx = TestContext::simple(0);
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert_eq!(ctx.session.pending_completions(), 0);

    ctx.session.advance();
    assert_eq!(ctx.session.pending_completions(), 1);
}

#[test]
fn huge_latencies_do_not_overflow_the_engine() {
    let mut ctx = TestContext::new(&simple_config(1, 1, u64::MAX));
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    ctx.session.advance();
    assert!(ctx.session.submit(0x80, RequestKind::Read, 0, 0));
    ctx.session.advance();
    assert_eq!(ctx.session.pending_completions(), 0);

    let mut config = simple_config(1, 1, 0);
    config.memory.controller = MemoryController::Dram;
    let half = u64::MAX / 2;
    (config.memory.t_cas, config.memory.t_ras, config.memory.t_pre) = (half, half, half);
    let mut ctx = TestContext::new(&config);
    assert!(ctx.session.submit(0x0, RequestKind::Read, 0, 0));
    assert!(ctx.session.submit(0x10_0000, RequestKind::Read, 0, 0));
    ctx.session.advance();
    let report = ctx.session.finalize();
    assert_eq!(report.engine.row_conflicts, 1);
    assert_eq!(report.engine.busy_cycles, u64::MAX);
}

#[test]
fn undrained_completion_stays_queued() {
    let mut ctx = TestContext::simple(1);
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    for _ in 0..10 {
        ctx.session.advance();
    }
    assert_eq!(ctx.session.pending_completions(), 1);
    assert_eq!(ctx.session.in_flight(), 1);
}

// ══════════════════════════════════════════════════════════
// 5. Overlapping requests to one address
// ══════════════════════════════════════════════════════════

#[test]
fn overwrite_policy_reports_displaced_read_as_unmatched() {
    let mut ctx = policy_context(OverlapPolicy::Overwrite, 5);
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert!(ctx.session.submit(0x40, RequestKind::Write, 0, 0x55));

    let drained = ctx.run_until_idle(100);
    assert_eq!(
        drained,
        vec![Completion {
            addr: 0x40,
            value: 0x55,
        }]
    );
    assert_eq!(ctx.session.stats().unmatched_completions, 1);
    assert_eq!(ctx.session.in_flight(), 0);
}

#[test]
fn track_policy_correlates_every_request() {
    let mut ctx = policy_context(OverlapPolicy::Track, 5);
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert!(ctx.session.submit(0x40, RequestKind::Write, 0, 0x55));
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert_eq!(ctx.session.ledger().outstanding(0x40), 3);

    let drained = ctx.run_until_idle(100);
    assert_eq!(drained.len(), 2);
    assert_eq!(ctx.session.stats().unmatched_completions, 0);
    assert_eq!(ctx.session.stats().correlated_reads(), 2);
    assert_eq!(ctx.session.in_flight(), 0);
}

#[test]
fn reject_policy_refuses_until_retired() {
    let mut ctx = policy_context(OverlapPolicy::Reject, 5);
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    assert!(!ctx.session.submit(0x40, RequestKind::Write, 0, 0x55));
    assert!(!ctx.session.functional().contains(0x40));
    assert!(ctx.session.submit(0x80, RequestKind::Read, 0, 0));

    assert_eq!(ctx.run_until_idle(100).len(), 2);
    assert!(ctx.session.submit(0x40, RequestKind::Write, 0, 0x55));
    assert_eq!(ctx.session.stats().rejections, 1);
}

// ══════════════════════════════════════════════════════════
// 6. Teardown
// ══════════════════════════════════════════════════════════

#[test]
fn finalize_flushes_both_collaborators() {
    let frontend = ProbeFrontend::new(1);
    let engine = ProbeEngine::new(1, u64::MAX);
    let (fp, ep) = (frontend.probe.clone(), engine.probe.clone());
    let mut session =
        Session::with_engines(Box::new(frontend), Box::new(engine), BridgeConfig::default())
            .unwrap();

    assert!(session.submit(0x40, RequestKind::Read, 0, 0));
    for _ in 0..4 {
        session.advance();
    }
    let report = session.finalize();

    assert!(fp.finalized());
    assert!(ep.finalized());
    assert_eq!(report.bridge.cycles, 4);
    assert_eq!(report.bridge.reads_accepted, 1);
    assert_eq!(report.engine.abandoned, 1);
}

#[test]
fn finalize_reports_reference_engine_counters() {
    let mut ctx = TestContext::simple(2);
    assert!(ctx.session.submit(0x40, RequestKind::Write, 0, 1));
    assert!(ctx.session.submit(0x40, RequestKind::Read, 0, 0));
    let _ = ctx.run_until_idle(100);

    let report = ctx.session.finalize();
    assert_eq!(report.frontend.forwarded, 2);
    assert_eq!(report.engine.reads_served, 1);
    assert_eq!(report.engine.writes_served, 1);
    assert_eq!(report.engine.abandoned, 0);
    assert_eq!(report.bridge.completions_drained, 1);
}

// ══════════════════════════════════════════════════════════
// 7. Properties
// ══════════════════════════════════════════════════════════

/// Submits, advancing the session until the frontend has room.
fn submit_blocking(ctx: &mut TestContext, addr: u64, kind: RequestKind, data: u64) {
    for _ in 0..1_000 {
        if ctx.session.submit(addr, kind, 0, data) {
            return;
        }
        ctx.session.advance();
    }
    panic!("{kind} {addr:#x} never accepted");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reads_observe_last_write(
        writes in prop::collection::vec((0u64..8, any::<u64>()), 1..40),
    ) {
        let mut ctx = TestContext::simple(2);
        let mut shadow = HashMap::new();
        for (slot, data) in writes {
            let addr = slot * 64;
            submit_blocking(&mut ctx, addr, RequestKind::Write, data);
            let _ = shadow.insert(addr, data);
        }
        for &addr in shadow.keys() {
            submit_blocking(&mut ctx, addr, RequestKind::Read, 0);
        }

        let drained = ctx.run_until_idle(10_000);
        prop_assert_eq!(drained.len(), shadow.len());
        for done in drained {
            prop_assert_eq!(Some(&done.value), shadow.get(&done.addr));
        }
    }
}
