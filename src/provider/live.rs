//! Live poll loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{Dashboard, LoopState, ProviderError, Published, Ticker};
use crate::collector::{Counters, Gauges, InstanceInfo, Section, SnapshotSource, SourceError, WaitTotal};
use crate::config::MonitorConfig;
use crate::rates::{SysRateState, WaitRateState, metrics_from_rates};
use crate::storage::model::{
    CollectorState, DataSources, Frame, HotspotRow, Metrics, Provenance, RecordType, SessionRow,
    WaitRow,
};
use crate::storage::FrameLog;

/// Sessions kept per frame.
pub const MAX_SESSIONS: usize = 30;

/// Top SQL rows kept per frame.
pub const MAX_HOTSPOTS: usize = 15;

/// Step used while sleeping between ticks so shutdown stays responsive.
const SLEEP_STEP: Duration = Duration::from_millis(100);

/// Raw results of one cycle's fetches. `None` means the fetch failed or was
/// skipped after the connection dropped.
#[derive(Default)]
struct Fetched {
    counters: Option<Counters>,
    gauges: Option<Option<Gauges>>,
    waits: Option<Vec<WaitTotal>>,
    sessions: Option<Vec<SessionRow>>,
    hotspots: Option<Vec<HotspotRow>>,
}

/// Drives a [`SnapshotSource`] through the connect / cycle / reconnect
/// state machine and publishes one frame per tick.
pub struct LiveMonitor {
    source: Box<dyn SnapshotSource>,
    config: MonitorConfig,
    state: LoopState,
    sys_rates: SysRateState,
    wait_rates: WaitRateState,
    dashboard: Dashboard,
    frame_log: Option<FrameLog>,
    instance: InstanceInfo,
    /// Most recent error; cleared by a cycle without errors.
    last_error: Option<String>,
    cycles: u64,
    frame_log_failures: u64,
}

impl LiveMonitor {
    /// Validates the configuration, opens the frame log and connects.
    ///
    /// A failed initial connection is fatal: there is nothing to show yet.
    pub fn start(
        mut source: Box<dyn SnapshotSource>,
        config: MonitorConfig,
    ) -> Result<Self, ProviderError> {
        config.validate()?;

        let frame_log = match &config.record {
            Some(path) => {
                let log = FrameLog::open(path).map_err(ProviderError::FrameLog)?;
                info!(path = %path.display(), "recording frames");
                Some(log)
            }
            None => None,
        };

        let vendor = source.vendor();
        debug!(vendor = %vendor, "connecting");
        source.connect().map_err(ProviderError::Connect)?;

        let mut monitor = Self {
            source,
            wait_rates: WaitRateState::new(config.top_waits),
            dashboard: Dashboard::new(config.history_capacity),
            config,
            state: LoopState::Connecting,
            sys_rates: SysRateState::new(),
            frame_log,
            instance: InstanceInfo::default(),
            last_error: None,
            cycles: 0,
            frame_log_failures: 0,
        };
        monitor.refresh_instance_info();
        monitor.state = LoopState::Cycling;
        info!(
            vendor = %vendor,
            instance = %monitor.instance.instance_name,
            version = %monitor.instance.version,
            "connected"
        );
        Ok(monitor)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Handle for renderers.
    pub fn dashboard(&self) -> Dashboard {
        self.dashboard.clone()
    }

    pub fn instance(&self) -> &InstanceInfo {
        &self.instance
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Completed cycles so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Frames that could not be appended to the frame log.
    pub fn frame_log_failures(&self) -> u64 {
        self.frame_log_failures
    }

    /// Runs one cycle now.
    pub fn cycle(&mut self, running: &AtomicBool) -> Option<Arc<Published>> {
        self.cycle_at(running, Instant::now(), Utc::now())
    }

    /// Runs one cycle with an explicit clock.
    ///
    /// Returns `None` when `running` is cleared before the cycle completes;
    /// in that case no rate state has been touched and nothing is published.
    pub fn cycle_at(
        &mut self,
        running: &AtomicBool,
        now: Instant,
        timestamp: DateTime<Utc>,
    ) -> Option<Arc<Published>> {
        if self.state == LoopState::Stopped || !running.load(Ordering::SeqCst) {
            return None;
        }
        let started = Instant::now();
        let mut cycle_errors: Vec<String> = Vec::new();

        if self.state == LoopState::Error {
            self.source.close();
            info!("reconnecting");
            match self.source.connect() {
                Ok(()) => {
                    self.state = LoopState::Cycling;
                    self.refresh_instance_info();
                    info!(instance = %self.instance.instance_name, "reconnected");
                }
                Err(e) => {
                    warn!(error = %e, "reconnect failed");
                    cycle_errors.push(format!("Reconnect failed: {}", e));
                    return Some(self.finish(
                        Fetched::default(),
                        now,
                        timestamp,
                        started,
                        cycle_errors,
                    ));
                }
            }
        }

        let mut fetched = Fetched::default();

        fetched.counters = self.fetch(Section::Counters, &mut cycle_errors, |s| s.fetch_counters());
        if !running.load(Ordering::SeqCst) {
            return None;
        }
        fetched.gauges = self.fetch(Section::Gauges, &mut cycle_errors, |s| s.fetch_gauges());
        if !running.load(Ordering::SeqCst) {
            return None;
        }
        fetched.waits = self.fetch(Section::Waits, &mut cycle_errors, |s| s.fetch_wait_totals());
        if !running.load(Ordering::SeqCst) {
            return None;
        }
        fetched.sessions = self.fetch(Section::Sessions, &mut cycle_errors, |s| s.fetch_sessions());
        if !running.load(Ordering::SeqCst) {
            return None;
        }
        fetched.hotspots = self.fetch(Section::Hotspots, &mut cycle_errors, |s| s.fetch_hotspots());
        if !running.load(Ordering::SeqCst) {
            return None;
        }

        Some(self.finish(fetched, now, timestamp, started, cycle_errors))
    }

    /// Runs cycles on a fixed cadence until `running` is cleared.
    ///
    /// `on_cycle` is called after every published cycle.
    pub fn run<F>(&mut self, running: &AtomicBool, mut on_cycle: F)
    where
        F: FnMut(&Published),
    {
        let mut ticker = Ticker::new(self.config.interval, Instant::now());
        while running.load(Ordering::SeqCst) {
            if ticker.due(Instant::now()) {
                if let Some(published) = self.cycle(running) {
                    on_cycle(&published);
                }
                ticker.advance(Instant::now());
            }
            let pause = ticker.time_until(Instant::now()).min(SLEEP_STEP);
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }
        self.stop();
    }

    /// Closes the source. Further cycles return `None`.
    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            self.source.close();
            self.state = LoopState::Stopped;
            let frames = self.frame_log.as_ref().map_or(0, FrameLog::frames_written);
            info!(cycles = self.cycles, frames_recorded = frames, "monitor stopped");
        }
    }

    /// Runs one guarded fetch. Skipped once the connection is lost.
    fn fetch<T, F>(&mut self, section: Section, errors: &mut Vec<String>, f: F) -> Option<T>
    where
        F: FnOnce(&mut dyn SnapshotSource) -> Result<T, SourceError>,
    {
        if self.state == LoopState::Error {
            return None;
        }
        match f(self.source.as_mut()) {
            Ok(v) => Some(v),
            Err(e) => {
                if e.is_connection_lost() {
                    warn!(section = section.as_str(), error = %e, "connection lost");
                    self.state = LoopState::Error;
                } else {
                    warn!(section = section.as_str(), error = %e, "fetch failed");
                }
                errors.push(format!("{}: {}", section.as_str(), e));
                None
            }
        }
    }

    /// Computes rates from the fetched snapshots, builds and records the
    /// frame, and publishes it.
    fn finish(
        &mut self,
        fetched: Fetched,
        now: Instant,
        timestamp: DateTime<Utc>,
        started: Instant,
        errors: Vec<String>,
    ) -> Arc<Published> {
        let gauges_ok = fetched.gauges.is_some();
        let metrics_ok = fetched.counters.is_some() && gauges_ok;

        let metrics = match &fetched.counters {
            Some(counters) => {
                let gauges = fetched.gauges.as_ref().and_then(|g| g.as_ref());
                metrics_from_rates(&self.sys_rates.compute_at(counters, gauges, now))
            }
            None => Metrics::default(),
        };

        let wait_events: Vec<WaitRow> = match &fetched.waits {
            Some(totals) => self.wait_rates.compute_at(totals, now),
            None => Vec::new(),
        };

        let data_sources = DataSources {
            metrics: Provenance::from_ok(metrics_ok),
            sessions: Provenance::from_ok(fetched.sessions.is_some()),
            wait_events: Provenance::from_ok(fetched.waits.is_some()),
            sql_hotspots: Provenance::from_ok(fetched.hotspots.is_some()),
        };

        let mut sessions = fetched.sessions.unwrap_or_default();
        sessions.truncate(MAX_SESSIONS);
        let mut sql_hotspots = fetched.hotspots.unwrap_or_default();
        sql_hotspots.truncate(MAX_HOTSPOTS);

        let collector_state = if self.state == LoopState::Error || !data_sources.any_backed() {
            CollectorState::Err
        } else {
            CollectorState::On
        };

        let cycle_error = errors.first().cloned();
        if cycle_error.is_some() {
            self.last_error = cycle_error.clone();
        } else {
            self.last_error = None;
        }

        let metrics_backed = data_sources.metrics.is_backed();

        let frame = Frame {
            record_type: RecordType::Frame,
            timestamp,
            db_type: self.source.vendor(),
            instance_name: self.instance_name(),
            collector_state,
            data_sources,
            metrics,
            sessions,
            wait_events,
            sql_hotspots,
            last_error: cycle_error,
        };

        if let Some(log) = &mut self.frame_log
            && let Err(e) = log.append(&frame)
        {
            self.frame_log_failures += 1;
            warn!(
                path = %log.path().display(),
                error = %e,
                failures = self.frame_log_failures,
                "frame log append failed"
            );
        }

        self.cycles += 1;
        let published = Arc::new(Published {
            frame,
            instance: self.instance.clone(),
            state: self.state,
            cycle: self.cycles,
            collect_ms: started.elapsed().as_millis() as u64,
            last_error: self.last_error.clone(),
        });
        // Only collector-backed metrics feed the sparklines.
        let backed = metrics_backed.then_some(&published.frame.metrics);
        self.dashboard.publish(Arc::clone(&published), backed);
        published
    }

    fn instance_name(&self) -> String {
        if let Some(name) = &self.config.instance_name {
            return name.clone();
        }
        if self.instance.instance_name.is_empty() {
            self.source.vendor().label().to_string()
        } else {
            self.instance.instance_name.clone()
        }
    }

    /// Best effort; failure keeps the vendor label as instance name.
    fn refresh_instance_info(&mut self) {
        match self.source.instance_info() {
            Ok(info) => self.instance = info,
            Err(e) => {
                debug!(error = %e, "instance info unavailable");
                self.instance = InstanceInfo {
                    instance_name: self.source.vendor().label().to_string(),
                    ..InstanceInfo::default()
                };
            }
        }
    }
}

impl Drop for LiveMonitor {
    fn drop(&mut self) {
        if self.state != LoopState::Stopped {
            self.source.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockStep;
    use crate::collector::vendor::keys;
    use crate::collector::{MockSource, Vendor};
    use chrono::TimeZone;

    fn step(exec: i64) -> MockStep {
        let mut counters = Counters::new();
        counters.insert(keys::EXECUTE_COUNT.to_string(), exec);
        MockStep {
            counters,
            waits: vec![WaitTotal::new("User I/O", "db file sequential read", exec * 1000, exec)],
            sessions: vec![SessionRow::default(); 40],
            hotspots: vec![HotspotRow::default(); 20],
            ..Default::default()
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn start_fails_without_connection() {
        let src = MockSource::new(Vendor::Oracle, vec![step(0)]);
        src.handle().fail_next_connects(1);
        let err = LiveMonitor::start(Box::new(src), MonitorConfig::default());
        assert!(matches!(err, Err(ProviderError::Connect(_))));
    }

    #[test]
    fn start_rejects_invalid_config() {
        let src = MockSource::new(Vendor::Oracle, vec![step(0)]);
        let config = MonitorConfig {
            top_waits: 0,
            ..MonitorConfig::default()
        };
        let err = LiveMonitor::start(Box::new(src), config);
        assert!(matches!(err, Err(ProviderError::Config(_))));
    }

    #[test]
    fn caps_sessions_and_hotspots() {
        let src = MockSource::new(Vendor::Oracle, vec![step(100), step(250)]);
        let mut m = LiveMonitor::start(Box::new(src), MonitorConfig::default()).unwrap();
        let running = AtomicBool::new(true);
        let t0 = Instant::now();
        let p = m.cycle_at(&running, t0, ts(0)).unwrap();
        assert_eq!(p.frame.sessions.len(), MAX_SESSIONS);
        assert_eq!(p.frame.sql_hotspots.len(), MAX_HOTSPOTS);
        assert_eq!(p.frame.collector_state, CollectorState::On);

        let p = m
            .cycle_at(&running, t0 + Duration::from_secs(1), ts(1))
            .unwrap();
        assert!((p.frame.metrics.sql_exec_per_sec - 150.0).abs() < 1e-9);
        assert_eq!(p.cycle, 2);
    }

    #[test]
    fn cancelled_cycle_publishes_nothing() {
        let src = MockSource::new(Vendor::Oracle, vec![step(1)]);
        let mut m = LiveMonitor::start(Box::new(src), MonitorConfig::default()).unwrap();
        let running = AtomicBool::new(false);
        assert!(m.cycle_at(&running, Instant::now(), ts(0)).is_none());
        assert!(m.dashboard().current().is_none());
        assert_eq!(m.cycles(), 0);
    }

    #[test]
    fn cancel_between_queries_leaves_rates_untouched() {
        let src = MockSource::new(Vendor::Oracle, vec![step(100), step(250)]);
        let handle = src.handle();
        let mut m = LiveMonitor::start(Box::new(src), MonitorConfig::default()).unwrap();
        let running = Arc::new(AtomicBool::new(true));
        handle.stop_after(Section::Counters, Arc::clone(&running));

        assert!(m.cycle_at(&running, Instant::now(), ts(0)).is_none());
        assert!(!running.load(Ordering::SeqCst));
        assert!(!m.sys_rates.has_baseline());
        assert!(m.dashboard().current().is_none());
        assert!(m.dashboard().values("sql_exec_per_sec").is_empty());
        assert_eq!(m.cycles(), 0);
    }

    #[test]
    fn stopped_monitor_does_not_cycle() {
        let src = MockSource::new(Vendor::Oracle, vec![step(1)]);
        let handle = src.handle();
        let mut m = LiveMonitor::start(Box::new(src), MonitorConfig::default()).unwrap();
        m.stop();
        assert_eq!(m.state(), LoopState::Stopped);
        assert!(!handle.is_connected());
        let running = AtomicBool::new(true);
        assert!(m.cycle_at(&running, Instant::now(), ts(0)).is_none());
    }

    #[test]
    fn instance_name_override() {
        let src = MockSource::new(Vendor::Tibero, vec![step(1)]).with_instance_name("tb1");
        let config = MonitorConfig::default().with_instance_name(Some("prod-tb".into()));
        let mut m = LiveMonitor::start(Box::new(src), config).unwrap();
        assert_eq!(m.instance().instance_name, "tb1");
        let running = AtomicBool::new(true);
        let p = m.cycle_at(&running, Instant::now(), ts(0)).unwrap();
        assert_eq!(p.frame.instance_name, "prod-tb");
        assert_eq!(p.frame.db_type, Vendor::Tibero);
    }
}
