//! Fixed-capacity per-metric history and sparkline rendering.

use std::collections::HashMap;

/// Default number of samples kept per metric.
pub const DEFAULT_CAPACITY: usize = 60;

/// Sparkline glyphs, level 0 (blank) through level 8 (full block).
pub const BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Ranges narrower than this are treated as a flat series.
const FLAT_EPSILON: f64 = 0.0001;

/// Circular array of samples for one metric.
#[derive(Debug, Clone)]
struct Ring {
    slots: Box<[f64]>,
    /// Next slot to write.
    cursor: usize,
    /// Number of valid samples, saturates at capacity.
    len: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0.0; capacity].into_boxed_slice(),
            cursor: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, value: f64) {
        let cap = self.capacity();
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % cap;
        if self.len < cap {
            self.len += 1;
        }
    }

    /// Samples oldest to newest.
    fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let cap = self.capacity();
        let start = (self.cursor + cap - self.len) % cap;
        (0..self.len).map(move |i| self.slots[(start + i) % cap])
    }
}

/// Per-metric ring buffers sharing one capacity.
///
/// Not synchronized: the poll loop wraps it in a mutex when a renderer reads
/// it from another thread.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    capacity: usize,
    series: HashMap<String, Ring>,
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SeriesBuffer {
    /// Creates an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a sample, overwriting the oldest one when full.
    pub fn push(&mut self, name: &str, value: f64) {
        let capacity = self.capacity;
        self.series
            .entry(name.to_string())
            .or_insert_with(|| Ring::new(capacity))
            .push(value);
    }

    /// Samples for `name`, oldest first. Unknown names yield an empty vector.
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.series
            .get(name)
            .map(|r| r.iter().collect())
            .unwrap_or_default()
    }

    /// Renders the most recent samples as exactly `width` glyphs.
    ///
    /// Missing history is left-padded with blanks.
    pub fn sparkline(&self, name: &str, width: usize) -> String {
        let values = self.values(name);
        render_sparkline(&values, width)
    }
}

/// Quantizes the last `width` values into block glyphs.
pub fn render_sparkline(values: &[f64], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let take = values.len().min(width);
    let window = &values[values.len() - take..];

    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat_n(BLOCKS[0], width - take));
    if window.is_empty() {
        return out;
    }

    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    for &v in window {
        out.push(BLOCKS[level(v, min, range, max)]);
    }
    out
}

fn level(v: f64, min: f64, range: f64, max: f64) -> usize {
    if range < FLAT_EPSILON {
        return if max > FLAT_EPSILON { 4 } else { 0 };
    }
    let scaled = ((v - min) / range * 8.0).floor();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 8.0) as usize
}
