//! Main rendering logic for TUI.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::provider::{Dashboard, Published};

use super::state::ViewState;
use super::widgets::{
    LOAD_PROFILE_HEIGHT, displayed_metrics, render_footer, render_header, render_load_profile,
    render_sessions, render_sql, render_waits,
};

/// Top SQL panel height including header and borders.
const SQL_PANEL_HEIGHT: u16 = 12;

/// Main render function.
pub fn render(
    frame: &mut Frame,
    state: &mut ViewState,
    published: Option<&Published>,
    dashboard: &Dashboard,
    interval_secs: u64,
) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1),                   // Title
        Constraint::Length(LOAD_PROFILE_HEIGHT), // Load Profile | Top Waits
        Constraint::Min(8),                      // Sessions
        Constraint::Length(SQL_PANEL_HEIGHT),    // Top SQL
        Constraint::Length(1),                   // Footer
    ])
    .split(area);

    render_header(frame, chunks[0], published);

    let top = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    match published {
        Some(p) => {
            let ds = &p.frame.data_sources;
            let (metrics, freshness) = displayed_metrics(p, dashboard);
            render_load_profile(frame, top[0], Some((&metrics, freshness)), dashboard);
            render_waits(frame, top[1], &p.frame.wait_events, ds.wait_events.is_backed());
            render_sessions(
                frame,
                chunks[2],
                &p.frame.sessions,
                ds.sessions.is_backed(),
                state,
            );
            state.resolve_sql_scroll(p.frame.sql_hotspots.len());
            render_sql(
                frame,
                chunks[3],
                &p.frame.sql_hotspots,
                ds.sql_hotspots.is_backed(),
                state.sql_scroll,
            );
            render_footer(
                frame,
                chunks[4],
                interval_secs,
                p.collect_ms,
                p.last_error.as_deref(),
            );
        }
        None => {
            render_load_profile(frame, top[0], None, dashboard);
            render_waits(frame, top[1], &[], true);
            render_sessions(frame, chunks[2], &[], true, state);
            render_sql(frame, chunks[3], &[], true, 0);
            render_footer(frame, chunks[4], interval_secs, 0, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use std::sync::atomic::AtomicBool;
    use std::time::{Duration, Instant};

    use chrono::Utc;

    use crate::collector::mock::Workload;
    use crate::collector::{MockSource, Vendor};
    use crate::config::MonitorConfig;
    use crate::provider::LiveMonitor;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn renders_placeholder_before_first_cycle() {
        let mut terminal = Terminal::new(TestBackend::new(160, 50)).unwrap();
        let dashboard = Dashboard::new(60);
        let mut state = ViewState::new();
        terminal
            .draw(|f| render(f, &mut state, None, &dashboard, 6))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Connecting..."));
        assert!(text.contains("Interval: 6s"));
    }

    #[test]
    fn renders_all_panels_from_live_cycles() {
        let source = MockSource::generated(Vendor::Oracle, Workload::new(Vendor::Oracle));
        let mut monitor = LiveMonitor::start(Box::new(source), MonitorConfig::default()).unwrap();
        let running = AtomicBool::new(true);
        let t0 = Instant::now();
        monitor.cycle_at(&running, t0, Utc::now());
        let published = monitor
            .cycle_at(&running, t0 + Duration::from_secs(6), Utc::now())
            .unwrap();
        let dashboard = monitor.dashboard();

        let mut terminal = Terminal::new(TestBackend::new(180, 60)).unwrap();
        let mut state = ViewState::new();
        terminal
            .draw(|f| render(f, &mut state, Some(&published), &dashboard, 6))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Load Profile"));
        assert!(text.contains("Top Waits (Real-time)"));
        assert!(text.contains("Sessions ("));
        assert!(text.contains("Top SQL"));
        assert!(text.contains("Active Sessions"));
        assert_eq!(state.sessions_table.selected(), Some(0));
    }

    #[test]
    fn outage_is_visible_and_keeps_last_values() {
        use crate::collector::{Section, SourceError};

        let source = MockSource::generated(Vendor::Oracle, Workload::new(Vendor::Oracle));
        let handle = source.handle();
        handle.fail_section_at(
            2,
            Section::Counters,
            SourceError::Connection("server closed the connection".into()),
        );
        let mut monitor = LiveMonitor::start(Box::new(source), MonitorConfig::default()).unwrap();
        let running = AtomicBool::new(true);
        let t0 = Instant::now();
        monitor.cycle_at(&running, t0, Utc::now());
        let healthy = monitor
            .cycle_at(&running, t0 + Duration::from_secs(6), Utc::now())
            .unwrap();
        let lost = monitor
            .cycle_at(&running, t0 + Duration::from_secs(12), Utc::now())
            .unwrap();
        let dashboard = monitor.dashboard();
        assert!(healthy.frame.metrics.sql_exec_per_sec > 0.0);
        assert_eq!(lost.frame.metrics.sql_exec_per_sec, 0.0);

        let mut terminal = Terminal::new(TestBackend::new(180, 60)).unwrap();
        let mut state = ViewState::new();
        terminal
            .draw(|f| render(f, &mut state, Some(&healthy), &dashboard, 6))
            .unwrap();
        let text = buffer_text(&terminal);
        let title = text.lines().next().unwrap().to_string();
        assert!(title.contains(" ON "));
        assert!(!title.contains("ERR"));

        terminal
            .draw(|f| render(f, &mut state, Some(&lost), &dashboard, 6))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.lines().next().unwrap().contains("ERR (ERROR)"));
        assert!(text.contains("Load Profile [stale]"));
        let exec = crate::fmt::format_grouped(healthy.frame.metrics.sql_exec_per_sec, 0);
        let exec_line = text.lines().find(|l| l.contains("SQL Exec/s")).unwrap();
        assert!(exec_line.contains(&exec));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        let dashboard = Dashboard::new(60);
        let mut state = ViewState::new();
        terminal
            .draw(|f| render(f, &mut state, None, &dashboard, 6))
            .unwrap();
    }
}
