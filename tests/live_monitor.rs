//! End-to-end poll loop behavior against scripted mock sources.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};

use ditop::collector::mock::{MockHandle, MockStep};
use ditop::collector::vendor::{gauge_keys, keys};
use ditop::collector::{Counters, Gauges, MockSource, Section, SourceError, Vendor, WaitTotal};
use ditop::config::MonitorConfig;
use ditop::provider::{LiveMonitor, LoopState};
use ditop::storage::model::{CollectorState, Provenance, SessionRow};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
}

/// Cumulative snapshot `n` of a steady workload: 150 executions, 2s of DB
/// time and 0.5s of CPU per second, plus one busy wait event.
fn steady(n: i64) -> MockStep {
    let counters: Counters = [
        (keys::EXECUTE_COUNT, 100 + 150 * n),
        (keys::LOGICAL_READS, 1_000 * n),
        (keys::PHYSICAL_READS, 100 * n),
        (keys::COMMITS, 10 * n),
        (keys::ROLLBACKS, n),
        (keys::DB_TIME_US, 2_000_000 * n),
        (keys::DB_CPU_US, 500_000 * n),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    MockStep {
        counters,
        gauges: None,
        waits: vec![
            WaitTotal::new("User I/O", "db file sequential read", 1_000 + 500_000 * n, 10 + 2 * n),
            WaitTotal::new("Commit", "log file sync", 100 * n, n),
        ],
        sessions: vec![SessionRow {
            sid: 1,
            status: "ACTIVE".into(),
            ..SessionRow::default()
        }],
        hotspots: Vec::new(),
    }
}

fn start(steps: Vec<MockStep>) -> (LiveMonitor, MockHandle) {
    let source = MockSource::new(Vendor::Oracle, steps);
    let handle = source.handle();
    let monitor = LiveMonitor::start(Box::new(source), MonitorConfig::default()).unwrap();
    (monitor, handle)
}

#[test]
fn bootstrap_cycle_is_zero_and_backed() {
    let (mut m, _) = start((0..3).map(steady).collect());
    let running = AtomicBool::new(true);
    let p = m.cycle_at(&running, Instant::now(), ts(0)).unwrap();

    assert_eq!(p.cycle, 1);
    assert_eq!(p.frame.collector_state, CollectorState::On);
    assert!(p.frame.data_sources.metrics.is_backed());
    assert!(p.frame.data_sources.wait_events.is_backed());
    assert!(p.frame.wait_events.is_empty());
    assert!(p.frame.metrics.iter().all(|(_, v)| v == 0.0));
    assert_eq!(p.frame.sessions.len(), 1);
    assert!(p.frame.last_error.is_none());
}

#[test]
fn second_cycle_yields_rates_and_ranked_waits() {
    let (mut m, _) = start((0..3).map(steady).collect());
    let running = AtomicBool::new(true);
    let t0 = Instant::now();
    m.cycle_at(&running, t0, ts(0));
    let p = m
        .cycle_at(&running, t0 + Duration::from_secs(1), ts(1))
        .unwrap();

    let metrics = &p.frame.metrics;
    assert!(approx(metrics.sql_exec_per_sec, 150.0));
    assert!(approx(metrics.active_sessions, 2.0));
    assert!(approx(metrics.db_time_per_sec, 200.0));
    assert!(approx(metrics.cpu_time_per_sec, 50.0));
    assert!(approx(metrics.wait_time_per_sec, 150.0));
    assert!(approx(metrics.tran_per_sec, 11.0));
    assert!(approx(metrics.buffer_cache_hit, 90.0));

    let waits = &p.frame.wait_events;
    assert_eq!(waits.len(), 2);
    assert_eq!(waits[0].event, "db file sequential read");
    assert!(approx(waits[0].wait_sec_per_sec, 0.5));
    assert!(approx(waits[0].avg_wait_ms, 250.0));

    let dashboard = m.dashboard();
    assert_eq!(dashboard.values("sql_exec_per_sec"), vec![0.0, 150.0]);
    assert_eq!(dashboard.sparkline("sql_exec_per_sec", 10).chars().count(), 10);
}

#[test]
fn native_gauges_override_synthetic_values() {
    let mut steps: Vec<MockStep> = (0..2).map(steady).collect();
    let gauges: Gauges = [
        (gauge_keys::ACTIVE_SESSIONS.to_string(), 7.5),
        (gauge_keys::HOST_CPU_UTIL.to_string(), 42.0),
    ]
    .into_iter()
    .collect();
    for s in &mut steps {
        s.gauges = Some(gauges.clone());
    }
    let (mut m, _) = start(steps);
    let running = AtomicBool::new(true);
    let t0 = Instant::now();
    m.cycle_at(&running, t0, ts(0));
    let p = m
        .cycle_at(&running, t0 + Duration::from_secs(1), ts(1))
        .unwrap();
    assert!(approx(p.frame.metrics.active_sessions, 7.5));
    assert!(approx(p.frame.metrics.host_cpu_util, 42.0));
    assert!(approx(p.frame.metrics.db_time_per_sec, 200.0));
}

#[test]
fn failed_section_is_degraded_and_others_survive() {
    let (mut m, handle) = start((0..3).map(steady).collect());
    handle.fail_section_at(
        1,
        Section::Waits,
        SourceError::Query("relation does not exist".into()),
    );
    let running = AtomicBool::new(true);
    let t0 = Instant::now();
    m.cycle_at(&running, t0, ts(0));
    let p = m
        .cycle_at(&running, t0 + Duration::from_secs(1), ts(1))
        .unwrap();

    assert_eq!(p.state, LoopState::Cycling);
    assert_eq!(p.frame.collector_state, CollectorState::On);
    assert_eq!(p.frame.data_sources.wait_events, Provenance::Synthetic);
    assert!(p.frame.wait_events.is_empty());
    assert_eq!(p.frame.data_sources.metrics, Provenance::Collector);
    assert_eq!(p.frame.data_sources.sessions, Provenance::Collector);
    assert!(approx(p.frame.metrics.sql_exec_per_sec, 150.0));
    assert!(p.frame.last_error.as_deref().unwrap().starts_with("waits:"));

    // Next clean cycle clears the error.
    let p = m
        .cycle_at(&running, t0 + Duration::from_secs(2), ts(2))
        .unwrap();
    assert!(p.last_error.is_none());
    assert!(p.frame.data_sources.wait_events.is_backed());
}

#[test]
fn failed_metrics_do_not_feed_sparklines() {
    let (mut m, handle) = start((0..3).map(steady).collect());
    handle.fail_section_at(1, Section::Gauges, SourceError::Query("timeout".into()));
    let running = AtomicBool::new(true);
    let t0 = Instant::now();
    m.cycle_at(&running, t0, ts(0));
    let p = m
        .cycle_at(&running, t0 + Duration::from_secs(1), ts(1))
        .unwrap();
    assert_eq!(p.frame.data_sources.metrics, Provenance::Synthetic);
    assert_eq!(m.dashboard().values("sql_exec_per_sec").len(), 1);
}

#[test]
fn connection_loss_reconnects_on_next_tick() {
    let (mut m, handle) = start((0..4).map(steady).collect());
    handle.fail_section_at(
        1,
        Section::Sessions,
        SourceError::Connection("server closed the connection".into()),
    );
    let running = AtomicBool::new(true);
    let t0 = Instant::now();
    m.cycle_at(&running, t0, ts(0));

    let lost = m
        .cycle_at(&running, t0 + Duration::from_secs(1), ts(1))
        .unwrap();
    assert_eq!(lost.state, LoopState::Error);
    assert_eq!(lost.frame.collector_state, CollectorState::Err);
    assert_eq!(lost.frame.data_sources.sessions, Provenance::Synthetic);
    // Fetched before the loss.
    assert_eq!(lost.frame.data_sources.metrics, Provenance::Collector);
    // Skipped after the loss.
    assert_eq!(lost.frame.data_sources.sql_hotspots, Provenance::Synthetic);
    assert_eq!(handle.connect_calls(), 1);

    let back = m
        .cycle_at(&running, t0 + Duration::from_secs(2), ts(2))
        .unwrap();
    assert_eq!(handle.close_calls(), 1);
    assert_eq!(handle.connect_calls(), 2);
    assert_eq!(back.state, LoopState::Cycling);
    assert_eq!(back.frame.collector_state, CollectorState::On);
    assert!(back.frame.data_sources.sessions.is_backed());
}

#[test]
fn failing_reconnect_stays_in_error_and_retries() {
    let (mut m, handle) = start((0..5).map(steady).collect());
    handle.fail_section_at(
        1,
        Section::Counters,
        SourceError::Connection("connection reset".into()),
    );
    let running = AtomicBool::new(true);
    let t0 = Instant::now();
    m.cycle_at(&running, t0, ts(0));
    let lost = m
        .cycle_at(&running, t0 + Duration::from_secs(1), ts(1))
        .unwrap();
    assert_eq!(lost.state, LoopState::Error);
    assert!(!lost.frame.data_sources.any_backed());

    handle.fail_next_connects(1);
    let failed = m
        .cycle_at(&running, t0 + Duration::from_secs(2), ts(2))
        .unwrap();
    assert_eq!(failed.state, LoopState::Error);
    assert_eq!(failed.frame.collector_state, CollectorState::Err);
    assert!(!failed.frame.data_sources.any_backed());
    assert!(
        failed
            .frame
            .last_error
            .as_deref()
            .unwrap()
            .starts_with("Reconnect failed:")
    );
    // Exactly one close and one connect attempt per tick.
    assert_eq!(handle.close_calls(), 1);
    assert_eq!(handle.connect_calls(), 2);

    let back = m
        .cycle_at(&running, t0 + Duration::from_secs(3), ts(3))
        .unwrap();
    assert_eq!(handle.close_calls(), 2);
    assert_eq!(handle.connect_calls(), 3);
    assert_eq!(back.frame.collector_state, CollectorState::On);
    assert_eq!(m.state(), LoopState::Cycling);
}
