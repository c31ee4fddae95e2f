//! Load Profile panel: one metric per row with a sparkline.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::fmt::{format_grouped, format_pct_of};
use crate::provider::{Dashboard, Published};
use crate::storage::model::Metrics;
use crate::tui::style::Styles;

const LABEL_WIDTH: usize = 18;
const VALUE_WIDTH: usize = 16;
const SPARK_WIDTH: usize = 40;

/// How a metric value is printed.
#[derive(Debug, Clone, Copy)]
enum Format {
    /// Grouped with the given fraction digits.
    Plain(usize),
    /// Grouped with two fraction digits plus share of DB time.
    PctOfDbTime,
}

const ROWS: &[(&str, &str, Format)] = &[
    ("Active Sessions", "active_sessions", Format::Plain(2)),
    ("DB Time/s", "db_time_per_sec", Format::Plain(2)),
    ("CPU Time/s", "cpu_time_per_sec", Format::PctOfDbTime),
    ("Wait Time/s", "wait_time_per_sec", Format::PctOfDbTime),
    ("Logical Reads/s", "logical_reads_per_sec", Format::Plain(0)),
    ("Tran/s", "tran_per_sec", Format::Plain(0)),
    ("SQL Exec/s", "sql_exec_per_sec", Format::Plain(0)),
    ("Parse Total/s", "parse_total_per_sec", Format::Plain(0)),
    ("Hard Parse/s", "hard_parses_per_sec", Format::Plain(0)),
    ("Phy Reads/s", "physical_reads_per_sec", Format::Plain(0)),
    ("Phy Read MB/s", "physical_read_mb_per_sec", Format::Plain(2)),
    ("Phy Write MB/s", "physical_write_mb_per_sec", Format::Plain(2)),
    ("Redo MB/s", "redo_mb_per_sec", Format::Plain(2)),
];

/// Panel height including borders.
pub const LOAD_PROFILE_HEIGHT: u16 = ROWS.len() as u16 + 2;

/// Formatted `(label, metric name, value)` rows in display order.
pub fn metric_rows(metrics: &Metrics) -> Vec<(&'static str, &'static str, String)> {
    let db_time = metrics.db_time_per_sec;
    ROWS.iter()
        .map(|&(label, name, format)| {
            let v = metrics.get(name).unwrap_or(0.0);
            let text = match format {
                Format::Plain(decimals) => format_grouped(v, decimals),
                Format::PctOfDbTime => {
                    format!("{} ({})", format_grouped(v, 2), format_pct_of(v, db_time))
                }
            };
            (label, name, text)
        })
        .collect()
}

/// Where the displayed metric values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Collected this cycle.
    Live,
    /// Carried over from the last cycle with collector-backed metrics.
    Stale,
    /// Nothing collected yet; values are zero.
    Degraded,
}

impl Freshness {
    fn title(self) -> &'static str {
        match self {
            Freshness::Live => " Load Profile ",
            Freshness::Stale => " Load Profile [stale] ",
            Freshness::Degraded => " Load Profile [degraded] ",
        }
    }
}

/// Metrics to show for a cycle. A cycle without collector-backed metrics
/// keeps showing the last known values instead of zeros.
pub fn displayed_metrics(published: &Published, dashboard: &Dashboard) -> (Metrics, Freshness) {
    if published.frame.data_sources.metrics.is_backed() {
        return (published.frame.metrics.clone(), Freshness::Live);
    }
    match dashboard.last_backed_metrics() {
        Some(m) => (m, Freshness::Stale),
        None => (published.frame.metrics.clone(), Freshness::Degraded),
    }
}

fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}

/// Renders the Load Profile panel.
pub fn render_load_profile(
    frame: &mut Frame,
    area: Rect,
    metrics: Option<(&Metrics, Freshness)>,
    dashboard: &Dashboard,
) {
    let freshness = metrics.map_or(Freshness::Live, |(_, f)| f);
    let block = Block::default()
        .title(freshness.title())
        .borders(Borders::ALL)
        .border_style(Styles::border());

    let Some((metrics, _)) = metrics else {
        frame.render_widget(Paragraph::new("Waiting for data...").block(block), area);
        return;
    };
    let value_style = match freshness {
        Freshness::Live => Styles::value(),
        Freshness::Stale | Freshness::Degraded => Styles::stale(),
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    let spark_width = SPARK_WIDTH.min(inner_width.saturating_sub(LABEL_WIDTH + VALUE_WIDTH + 1));

    let lines: Vec<Line> = metric_rows(metrics)
        .into_iter()
        .map(|(label, name, value)| {
            let mut spans = vec![
                Span::styled(format!(" {}", pad(label, LABEL_WIDTH)), Styles::label()),
                Span::styled(pad(&value, VALUE_WIDTH), value_style),
            ];
            if spark_width > 0 {
                spans.push(Span::styled(
                    dashboard.sparkline(name, spark_width),
                    Styles::sparkline(),
                ));
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_display_order() {
        let rows = metric_rows(&Metrics::default());
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0].0, "Active Sessions");
        assert_eq!(rows[12].1, "redo_mb_per_sec");
        assert!(rows.iter().all(|(_, name, _)| Metrics::NAMES.contains(name)));
    }

    #[test]
    fn cpu_and_wait_show_share_of_db_time() {
        let m = Metrics {
            db_time_per_sec: 200.0,
            cpu_time_per_sec: 50.0,
            wait_time_per_sec: 150.0,
            logical_reads_per_sec: 12345.6,
            ..Metrics::default()
        };
        let rows = metric_rows(&m);
        assert_eq!(rows[2].2, "50.00 (25%)");
        assert_eq!(rows[3].2, "150.00 (75%)");
        assert_eq!(rows[4].2, "12,346");
    }

    #[test]
    fn unbacked_cycle_shows_last_known_values() {
        use crate::collector::InstanceInfo;
        use crate::provider::LoopState;
        use crate::storage::model::{CollectorState, DataSources, Frame as DataFrame, RecordType};
        use std::sync::Arc;

        let published = |metrics: Metrics, data_sources: DataSources| {
            Arc::new(Published {
                frame: DataFrame {
                    record_type: RecordType::Frame,
                    timestamp: chrono::Utc::now(),
                    db_type: crate::collector::Vendor::Oracle,
                    instance_name: "ORCL".into(),
                    collector_state: CollectorState::Err,
                    data_sources,
                    metrics,
                    sessions: Vec::new(),
                    wait_events: Vec::new(),
                    sql_hotspots: Vec::new(),
                    last_error: None,
                },
                instance: InstanceInfo::default(),
                state: LoopState::Error,
                cycle: 1,
                collect_ms: 0,
                last_error: None,
            })
        };
        let live = Metrics {
            sql_exec_per_sec: 150.0,
            ..Metrics::default()
        };
        let dashboard = Dashboard::new(10);

        let outage = published(Metrics::default(), DataSources::degraded());
        let (m, f) = displayed_metrics(&outage, &dashboard);
        assert_eq!(f, Freshness::Degraded);
        assert_eq!(m.sql_exec_per_sec, 0.0);

        let mut backed = DataSources::degraded();
        backed.metrics = crate::storage::model::Provenance::Collector;
        let ok = published(live.clone(), backed);
        assert_eq!(displayed_metrics(&ok, &dashboard).1, Freshness::Live);
        dashboard.publish(Arc::clone(&ok), Some(&live));

        let (m, f) = displayed_metrics(&outage, &dashboard);
        assert_eq!(f, Freshness::Stale);
        assert!((m.sql_exec_per_sec - 150.0).abs() < 1e-9);
    }

    #[test]
    fn no_share_without_db_time() {
        let rows = metric_rows(&Metrics::default());
        assert_eq!(rows[2].2, "0.00 (-)");
    }
}
