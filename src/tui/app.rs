//! Main TUI application.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, info};

use crate::provider::{LiveMonitor, Ticker};

use super::input::{KeyAction, handle_key};
use super::render::render;
use super::state::ViewState;

/// Upper bound on a single input poll so collection stays on schedule.
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Interactive dashboard driving a [`LiveMonitor`].
pub struct App {
    monitor: LiveMonitor,
    state: ViewState,
    running: Arc<AtomicBool>,
}

impl App {
    /// `running` is shared with the signal handler; clearing it stops the app.
    pub fn new(monitor: LiveMonitor, running: Arc<AtomicBool>) -> Self {
        Self {
            monitor,
            state: ViewState::new(),
            running,
        }
    }

    /// Runs the dashboard until the user quits or `running` is cleared.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        self.monitor.stop();
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        let dashboard = self.monitor.dashboard();
        let interval = self.monitor.config().interval;
        let interval_secs = interval.as_secs();
        let mut ticker = Ticker::new(interval, Instant::now());

        while self.running.load(Ordering::SeqCst) {
            if ticker.due(Instant::now()) {
                if let Some(p) = self.monitor.cycle(&self.running) {
                    debug!(cycle = p.cycle, collect_ms = p.collect_ms, "cycle published");
                }
                ticker.advance(Instant::now());
            }

            let published = dashboard.current();
            terminal.draw(|frame| {
                render(
                    frame,
                    &mut self.state,
                    published.as_deref(),
                    &dashboard,
                    interval_secs,
                )
            })?;

            let timeout = ticker.time_until(Instant::now()).min(INPUT_POLL);
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        let sql_rows = published
                            .as_ref()
                            .map_or(0, |p| p.frame.sql_hotspots.len());
                        if handle_key(&mut self.state, key, sql_rows) == KeyAction::Quit {
                            info!("quit requested");
                            self.running.store(false, Ordering::SeqCst);
                        }
                    }
                    // Redrawn on the next iteration.
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }
}
