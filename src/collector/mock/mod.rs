//! Scripted snapshot source for tests and demo mode.
//!
//! `MockSource` replays a list of [`MockStep`]s (or a generated workload),
//! one step per cycle. A [`MockHandle`] shares state with the source so
//! tests can inject faults after the source has been boxed and handed to the
//! poll loop.

mod scenarios;

pub use scenarios::Workload;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{InstanceInfo, Section, SnapshotSource, SourceError, WaitTotal};
use super::vendor::{Counters, Gauges, Vendor};
use crate::storage::model::{HotspotRow, SessionRow};

/// Everything a source returns for one cycle.
#[derive(Debug, Clone, Default)]
pub struct MockStep {
    pub counters: Counters,
    /// `None` means the vendor has no native gauge view.
    pub gauges: Option<Gauges>,
    pub waits: Vec<WaitTotal>,
    pub sessions: Vec<SessionRow>,
    pub hotspots: Vec<HotspotRow>,
}

#[derive(Debug, Clone)]
enum Steps {
    Scripted(Vec<MockStep>),
    Generated(Workload),
}

impl Steps {
    /// Step `n`; scripted lists repeat their last entry once exhausted.
    fn get(&self, n: usize) -> MockStep {
        match self {
            Steps::Scripted(steps) => steps
                .get(n)
                .or_else(|| steps.last())
                .cloned()
                .unwrap_or_default(),
            Steps::Generated(w) => w.step(n),
        }
    }
}

#[derive(Debug)]
struct MockState {
    vendor: Vendor,
    info: InstanceInfo,
    steps: Steps,
    connected: bool,
    /// Index of the cycle in progress; advanced by each counters fetch.
    cycle: Option<usize>,
    current: MockStep,
    failing_connects: u32,
    faults: HashMap<(usize, Section), SourceError>,
    /// Flag cleared once the given section has been fetched.
    stop_after: Option<(Section, Arc<AtomicBool>)>,
    connect_calls: u32,
    close_calls: u32,
}

impl MockState {
    fn fetch(&mut self, section: Section) -> Result<&MockStep, SourceError> {
        if !self.connected {
            return Err(SourceError::Connection("not connected".to_string()));
        }
        if section == Section::Counters {
            let next = self.cycle.map_or(0, |c| c + 1);
            self.cycle = Some(next);
            self.current = self.steps.get(next);
        }
        let cycle = self.cycle.unwrap_or(0);
        if let Some(err) = self.faults.remove(&(cycle, section)) {
            if err.is_connection_lost() {
                self.connected = false;
            }
            return Err(err);
        }
        if let Some((after, flag)) = &self.stop_after
            && *after == section
        {
            flag.store(false, Ordering::SeqCst);
        }
        Ok(&self.current)
    }
}

/// Scripted in-memory [`SnapshotSource`].
pub struct MockSource {
    state: Arc<Mutex<MockState>>,
}

/// Shared control handle for a [`MockSource`].
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Arc<Mutex<MockState>>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockSource {
    /// Creates a source replaying `steps`, one per cycle.
    pub fn new(vendor: Vendor, steps: Vec<MockStep>) -> Self {
        Self::with_steps(vendor, Steps::Scripted(steps))
    }

    /// Creates a source producing an endless synthetic workload.
    pub fn generated(vendor: Vendor, workload: Workload) -> Self {
        Self::with_steps(vendor, Steps::Generated(workload))
    }

    fn with_steps(vendor: Vendor, steps: Steps) -> Self {
        let info = InstanceInfo {
            instance_name: format!("mock-{}", vendor.label()),
            host_name: "localhost".to_string(),
            version: "mock".to_string(),
        };
        Self {
            state: Arc::new(Mutex::new(MockState {
                vendor,
                info,
                steps,
                connected: false,
                cycle: None,
                current: MockStep::default(),
                failing_connects: 0,
                faults: HashMap::new(),
                stop_after: None,
                connect_calls: 0,
                close_calls: 0,
            })),
        }
    }

    pub fn with_instance_name(self, name: &str) -> Self {
        lock(&self.state).info.instance_name = name.to_string();
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl MockHandle {
    /// Makes the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        lock(&self.state).failing_connects = n;
    }

    /// Fails `section` once during cycle `cycle` (zero-based).
    ///
    /// A [`SourceError::Connection`] also drops the mock connection.
    pub fn fail_section_at(&self, cycle: usize, section: Section, err: SourceError) {
        lock(&self.state).faults.insert((cycle, section), err);
    }

    /// Clears `running` right after `section` is fetched, the way a shutdown
    /// signal arriving mid-cycle would.
    pub fn stop_after(&self, section: Section, running: Arc<AtomicBool>) {
        lock(&self.state).stop_after = Some((section, running));
    }

    pub fn connect_calls(&self) -> u32 {
        lock(&self.state).connect_calls
    }

    pub fn close_calls(&self) -> u32 {
        lock(&self.state).close_calls
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}

impl SnapshotSource for MockSource {
    fn vendor(&self) -> Vendor {
        lock(&self.state).vendor
    }

    fn connect(&mut self) -> Result<(), SourceError> {
        let mut st = lock(&self.state);
        st.connect_calls += 1;
        if st.connected {
            return Ok(());
        }
        if st.failing_connects > 0 {
            st.failing_connects -= 1;
            return Err(SourceError::Connection("connection refused".to_string()));
        }
        st.connected = true;
        Ok(())
    }

    fn close(&mut self) {
        let mut st = lock(&self.state);
        st.close_calls += 1;
        st.connected = false;
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    fn instance_info(&mut self) -> Result<InstanceInfo, SourceError> {
        let st = lock(&self.state);
        if !st.connected {
            return Err(SourceError::Connection("not connected".to_string()));
        }
        Ok(st.info.clone())
    }

    fn fetch_counters(&mut self) -> Result<Counters, SourceError> {
        lock(&self.state)
            .fetch(Section::Counters)
            .map(|s| s.counters.clone())
    }

    fn fetch_gauges(&mut self) -> Result<Option<Gauges>, SourceError> {
        lock(&self.state)
            .fetch(Section::Gauges)
            .map(|s| s.gauges.clone())
    }

    fn fetch_wait_totals(&mut self) -> Result<Vec<WaitTotal>, SourceError> {
        lock(&self.state)
            .fetch(Section::Waits)
            .map(|s| s.waits.clone())
    }

    fn fetch_sessions(&mut self) -> Result<Vec<SessionRow>, SourceError> {
        lock(&self.state)
            .fetch(Section::Sessions)
            .map(|s| s.sessions.clone())
    }

    fn fetch_hotspots(&mut self) -> Result<Vec<HotspotRow>, SourceError> {
        lock(&self.state)
            .fetch(Section::Hotspots)
            .map(|s| s.hotspots.clone())
    }
}
