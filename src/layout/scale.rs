use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maps a data domain onto a pixel range. The range may be reversed, which
/// is how the y axis puts higher scores nearer the top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return (r0 + r1) / 2.0;
        }
        let t = (value - d0) / span;
        (r0 as f64 + t * (r1 - r0) as f64) as f32
    }
}

/// Grow `(min, max)` by `fraction` of its span on both sides. A zero span
/// grows by `fraction` of the magnitude (or by one unit at zero).
pub fn pad_domain(min: f64, max: f64, fraction: f64) -> (f64, f64) {
    let span = max - min;
    let pad = if span > 0.0 {
        span * fraction
    } else if min != 0.0 {
        min.abs() * fraction
    } else {
        1.0
    };
    (min - pad, max + pad)
}

/// Round tick values covering `[min, max]` with roughly `count` steps of
/// 1, 2, or 5 times a power of ten.
pub fn nice_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() || max <= min || count == 0 {
        return Vec::new();
    }
    let raw = (max - min) / count as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// `count` evenly spaced timestamps across the domain, endpoints included.
pub fn time_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() || max <= min || count < 2 {
        return Vec::new();
    }
    let step = (max - min) / (count - 1) as f64;
    (0..count).map(|i| min + step * i as f64).collect()
}

/// `Mon YYYY` for a millisecond timestamp.
pub fn format_month(timestamp_ms: f64) -> String {
    if !timestamp_ms.is_finite() {
        return String::new();
    }
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64)
        .map(|dt| dt.format("%b %Y").to_string())
        .unwrap_or_default()
}
