//! Capture timestamp analysis.
//!
//! SER timestamps are 64-bit counts of 100 ns ticks since 0001-01-01. Writers
//! disagree on whether the trailer holds UTC or local time, and on whether it
//! is ordered at all, so the raw values are kept untouched and only derived
//! constants (frame rate, UTC correction) are computed here.

use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::consts::{FRAME_RATE_SCALE, TICKS_PER_SECOND, UNIX_EPOCH_TICKS};

/// Capture rate as a scaled integer: `rate / scale` frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FrameRate {
    pub rate: i32,
    pub scale: i32,
}

impl FrameRate {
    /// The file has no timestamps to derive a rate from.
    pub const NOT_RECORDED: Self = Self { rate: 0, scale: 1 };

    /// Timestamps exist but give no usable span (zero, negative or out of order).
    pub const UNAVAILABLE: Self = Self { rate: -1, scale: 1 };

    pub fn is_available(&self) -> bool {
        self.rate > 0
    }

    /// Frames per second, when a rate could be derived.
    pub fn fps(&self) -> Option<f64> {
        self.is_available()
            .then(|| f64::from(self.rate) / f64::from(self.scale))
    }

    /// Rate for `frame_count` frames captured between two ticks.
    pub fn from_span(first: u64, last: u64, frame_count: u32) -> Self {
        // 100 us units
        let diff = last.saturating_sub(first) / 1000;
        if diff == 0 {
            return Self::UNAVAILABLE;
        }
        let fps = (f64::from(frame_count.saturating_sub(1)) * 10_000.0) / diff as f64;
        let scaled = (fps * f64::from(FRAME_RATE_SCALE)).round();
        if scaled > f64::from(i32::MAX) {
            return Self::UNAVAILABLE;
        }
        Self {
            rate: scaled as i32,
            scale: FRAME_RATE_SCALE,
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::NOT_RECORDED
    }
}

impl std::fmt::Display for FrameRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fps() {
            Some(fps) => write!(f, "{fps:.3} fps"),
            None if *self == Self::NOT_RECORDED => write!(f, "not recorded"),
            None => write!(f, "unavailable"),
        }
    }
}

/// Constants derived from a timestamp trailer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampAnalysis {
    pub first: u64,
    /// Tick used as the end of the capture span. Equals `first` when the
    /// trailer is out of order.
    pub last: u64,
    pub min: u64,
    pub in_order: bool,
    /// `date_time_utc - date_time` from the header.
    pub utc_to_local_offset: i64,
    /// Offset to add to raw ticks to get UTC; zero if they already are.
    pub correction: i64,
    pub frame_rate: FrameRate,
}

impl TimestampAnalysis {
    /// Analyse a trailer against the header's start times.
    pub fn new(ticks: &[u64], date_time: u64, date_time_utc: u64) -> Self {
        let first = ticks.first().copied().unwrap_or(0);
        let mut last = ticks.last().copied().unwrap_or(0);
        let mut min = first;
        let mut in_order = true;

        let mut previous = 0u64;
        for &current in ticks {
            min = min.min(current);
            if current < previous {
                in_order = false;
            }
            previous = current;
        }
        if !in_order {
            last = first;
        }

        let utc_to_local_offset = signed_diff(date_time_utc, date_time);
        let utc_candidate = signed_diff(date_time_utc, min).unsigned_abs();
        let local_candidate = signed_diff(date_time, min).unsigned_abs();
        let correction = if utc_candidate <= local_candidate {
            0
        } else {
            utc_to_local_offset
        };

        let frame_count = u32::try_from(ticks.len()).unwrap_or(u32::MAX);
        Self {
            first,
            last,
            min,
            in_order,
            utc_to_local_offset,
            correction,
            frame_rate: FrameRate::from_span(first, last, frame_count),
        }
    }
}

/// The loaded trailer: one tick per frame, in frame order.
#[derive(Clone, Debug)]
pub struct Timestamps {
    ticks: Vec<u64>,
    analysis: TimestampAnalysis,
}

impl Timestamps {
    pub fn new(ticks: Vec<u64>, date_time: u64, date_time_utc: u64) -> Self {
        let analysis = TimestampAnalysis::new(&ticks, date_time, date_time_utc);
        Self { ticks, analysis }
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Raw tick for the 0-based frame index.
    pub fn get(&self, index: usize) -> Option<u64> {
        self.ticks.get(index).copied()
    }

    /// Tick for the 0-based frame index with the UTC correction applied.
    pub fn utc(&self, index: usize) -> Option<u64> {
        self.get(index)
            .map(|t| t.wrapping_add_signed(self.analysis.correction))
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.ticks
    }

    pub fn analysis(&self) -> &TimestampAnalysis {
        &self.analysis
    }
}

/// `a - b` as a signed tick difference.
fn signed_diff(a: u64, b: u64) -> i64 {
    (i128::from(a) - i128::from(b)).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Convert a tick count to wall-clock time. Ticks before 1970 yield `None`.
pub fn ticks_to_system_time(ticks: u64) -> Option<SystemTime> {
    let since_epoch = ticks.checked_sub(UNIX_EPOCH_TICKS)?;
    let secs = since_epoch / TICKS_PER_SECOND;
    let nanos = (since_epoch % TICKS_PER_SECOND) * 100;
    SystemTime::UNIX_EPOCH.checked_add(Duration::new(secs, nanos as u32))
}
