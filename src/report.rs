//! Frame log summary.
//!
//! Streams a frame log line by line and tallies collector state and
//! per-section provenance. Blank lines are ignored; malformed lines, partial
//! trailing lines and records that are not frames are counted as skipped.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::storage::model::{CollectorState, DataSources, Provenance};

/// Error type for report generation. Only raised when the log itself
/// cannot be read.
#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "cannot read frame log: {}", e),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Io(e)
    }
}

/// Backed vs degraded count for one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounts {
    pub backed: u64,
    pub degraded: u64,
}

impl SectionCounts {
    fn add(&mut self, p: Provenance) {
        if p.is_backed() {
            self.backed += 1;
        } else {
            self.degraded += 1;
        }
    }
}

/// Aggregate counts over a frame log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub frames: u64,
    pub on: u64,
    pub err: u64,
    pub metrics: SectionCounts,
    pub sessions: SectionCounts,
    pub wait_events: SectionCounts,
    pub sql_hotspots: SectionCounts,
    /// Non-blank lines that were not valid frames.
    pub skipped_lines: u64,
}

impl ReportStats {
    fn record(&mut self, header: &FrameHeader) {
        self.frames += 1;
        match header.collector_state {
            CollectorState::On => self.on += 1,
            CollectorState::Err => self.err += 1,
        }
        let ds = &header.data_sources;
        self.metrics.add(ds.metrics);
        self.sessions.add(ds.sessions);
        self.wait_events.add(ds.wait_events);
        self.sql_hotspots.add(ds.sql_hotspots);
    }
}

/// The part of a frame line the summary needs; the payload is ignored.
#[derive(Deserialize)]
struct FrameHeader {
    #[serde(rename = "type")]
    record_type: String,
    collector_state: CollectorState,
    data_sources: DataSources,
}

/// Summarizes the frame log at `path`.
pub fn summarize(path: impl AsRef<Path>) -> Result<ReportStats, ReportError> {
    let file = File::open(path.as_ref())?;
    summarize_reader(BufReader::new(file))
}

/// Summarizes frame lines read from `reader`.
pub fn summarize_reader<R: BufRead>(mut reader: R) -> Result<ReportStats, ReportError> {
    let mut stats = ReportStats::default();
    let mut buf = Vec::new();
    let mut line_no: u64 = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<FrameHeader>(line) {
            Ok(header) if header.record_type == "frame" => stats.record(&header),
            Ok(header) => {
                debug!(line = line_no, record_type = %header.record_type, "skipping non-frame record");
                stats.skipped_lines += 1;
            }
            Err(e) => {
                debug!(line = line_no, error = %e, "skipping malformed line");
                stats.skipped_lines += 1;
            }
        }
    }

    Ok(stats)
}

fn pct(part: u64, total: u64) -> String {
    if total == 0 {
        "-".to_string()
    } else {
        format!("{:.1}%", part as f64 * 100.0 / total as f64)
    }
}

/// Renders the summary as Markdown.
pub fn render_markdown(source: &str, stats: &ReportStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Frame log report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Recording: `{}`", source);
    let _ = writeln!(out, "- Frames: {}", stats.frames);
    let _ = writeln!(
        out,
        "- Collector state: ON {} ({}), ERR {} ({})",
        stats.on,
        pct(stats.on, stats.frames),
        stats.err,
        pct(stats.err, stats.frames)
    );
    let _ = writeln!(out, "- Skipped lines: {}", stats.skipped_lines);
    let _ = writeln!(out);
    let _ = writeln!(out, "| Section | Collector | Degraded | Backed % |");
    let _ = writeln!(out, "|---|---:|---:|---:|");
    for (name, c) in [
        ("metrics", stats.metrics),
        ("sessions", stats.sessions),
        ("wait_events", stats.wait_events),
        ("sql_hotspots", stats.sql_hotspots),
    ] {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            name,
            c.backed,
            c.degraded,
            pct(c.backed, c.backed + c.degraded)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ON_FRAME: &str = r#"{"type":"frame","timestamp":"2026-03-01T10:00:00Z","db_type":"oracle","instance_name":"ORCL","collector_state":"ON","data_sources":{"metrics":"collector","sessions":"collector","wait_events":"synthetic","sql_hotspots":"collector"},"metrics":{},"sessions":[],"wait_events":[],"sql_hotspots":[]}"#;
    const ERR_FRAME: &str = r#"{"type":"frame","timestamp":"2026-03-01T10:00:06Z","db_type":"oracle","instance_name":"ORCL","collector_state":"ERR","data_sources":{"metrics":"synthetic","sessions":"synthetic","wait_events":"synthetic","sql_hotspots":"synthetic"},"metrics":{},"sessions":[],"wait_events":[],"sql_hotspots":[],"last_error":"Reconnect failed"}"#;

    #[test]
    fn tallies_state_and_provenance() {
        let input = format!("{}\n{}\n{}\n", ON_FRAME, ERR_FRAME, ON_FRAME);
        let stats = summarize_reader(Cursor::new(input)).unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.on, 2);
        assert_eq!(stats.err, 1);
        assert_eq!(stats.metrics, SectionCounts { backed: 2, degraded: 1 });
        assert_eq!(stats.wait_events, SectionCounts { backed: 0, degraded: 3 });
        assert_eq!(stats.skipped_lines, 0);
    }

    #[test]
    fn skips_malformed_and_non_frame_lines() {
        let partial = &ON_FRAME[..ON_FRAME.len() / 2];
        let input = format!(
            "{}\n\nnot json\n{{\"type\":\"marker\",\"collector_state\":\"ON\",\"data_sources\":{{\"metrics\":\"collector\",\"sessions\":\"collector\",\"wait_events\":\"collector\",\"sql_hotspots\":\"collector\"}}}}\n{}",
            ON_FRAME, partial
        );
        let stats = summarize_reader(Cursor::new(input)).unwrap();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.skipped_lines, 3);
    }

    #[test]
    fn invalid_utf8_is_skipped_not_fatal() {
        let mut input = ON_FRAME.as_bytes().to_vec();
        input.extend_from_slice(b"\n\xff\xfe{\n");
        let stats = summarize_reader(Cursor::new(input)).unwrap();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.skipped_lines, 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = summarize(dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }

    #[test]
    fn markdown_lists_counts() {
        let input = format!("{}\n{}\n", ON_FRAME, ERR_FRAME);
        let stats = summarize_reader(Cursor::new(input)).unwrap();
        let md = render_markdown("frames.jsonl", &stats);
        assert!(md.contains("- Frames: 2"));
        assert!(md.contains("ON 1 (50.0%), ERR 1 (50.0%)"));
        assert!(md.contains("| metrics | 1 | 1 | 50.0% |"));
    }

    #[test]
    fn empty_log_renders_dashes() {
        let stats = ReportStats::default();
        let md = render_markdown("empty.jsonl", &stats);
        assert!(md.contains("ON 0 (-), ERR 0 (-)"));
    }
}
