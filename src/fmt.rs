//! Shared formatting helpers for the dashboard and the report.
//!
//! All pure formatting functions (no ratatui styles, no layout) live here.

/// Maximum length of SQL text kept in session and hotspot rows.
pub const SQL_TEXT_MAX: usize = 120;

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Formats `v` with `decimals` fraction digits and `,` thousands separators.
///
/// `format_grouped(1234567.891, 2)` -> `"1,234,567.89"`
pub fn format_grouped(v: f64, decimals: usize) -> String {
    if !v.is_finite() {
        return "-".to_string();
    }
    let raw = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(raw.len() + int_part.len() / 3 + 1);
    let negative = v < 0.0 && raw.chars().any(|c| c != '0' && c != '.');
    if negative {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Share of `value` in `base` as `"NN%"`, or `"-"` when `base` is negligible.
pub fn format_pct_of(value: f64, base: f64) -> String {
    if base > 0.001 {
        format!("{:.0}%", value / base * 100.0)
    } else {
        "-".to_string()
    }
}

/// Average wait in milliseconds; one decimal with separators from 1s up.
pub fn format_avg_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format_grouped(ms, 1)
    } else {
        format!("{:.2}", ms)
    }
}

/// Format milliseconds as human-readable: `"850ms"`, `"1.5s"`, `"2.0m"`.
pub fn format_ms(ms: f64) -> String {
    if ms >= 60_000.0 {
        format!("{:.1}m", ms / 60_000.0)
    } else if ms >= 1_000.0 {
        format!("{:.1}s", ms / 1_000.0)
    } else {
        format!("{:.0}ms", ms)
    }
}

// ---------------------------------------------------------------------------
// Text normalization
// ---------------------------------------------------------------------------

/// Truncate string to at most `max_chars` characters with `…`.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Normalize text for single-line display.
///
/// Replaces newlines and tabs with spaces and collapses runs of whitespace.
pub fn normalize_for_display(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                result.push(' ');
            }
            prev_space = true;
        } else {
            result.push(ch);
            prev_space = false;
        }
    }
    result.trim().to_string()
}

/// Single-line SQL text capped at [`SQL_TEXT_MAX`] characters.
pub fn compact_sql(s: &str) -> String {
    let flat = normalize_for_display(s);
    if flat.chars().count() <= SQL_TEXT_MAX {
        flat
    } else {
        flat.chars().take(SQL_TEXT_MAX).collect()
    }
}
