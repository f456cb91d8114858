//! Sliding two-window change-point detection.
//!
//! A point is flagged when the mean of the window after it departs from the
//! mean of the window before it by more than a threshold multiple of the
//! before-window's standard deviation.

use crate::utils::{mean, std_dev};
use chrono::{DateTime, Utc};

/// Default width of each comparison window, in observations.
pub const DEFAULT_WINDOW: usize = 7;
/// Shift threshold, in before-window standard deviations.
pub const SHIFT_THRESHOLD: f64 = 2.0;

/// Direction of a detected mean shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePointKind {
    Increase,
    Decrease,
}

/// A detected shift in the series' local mean.
#[derive(Debug, Clone)]
pub struct ChangePoint {
    /// Timestamp of the first observation after the shift.
    pub timestamp: DateTime<Utc>,
    /// Shift size in before-window standard deviations.
    pub magnitude: f64,
    pub kind: ChangePointKind,
}

/// Slide two adjacent fixed-width windows across the series and flag points
/// where `|mean(after) - mean(before)| / std(before)` exceeds the threshold.
///
/// Within one window length of a flagged point only the strongest shift is
/// reported, so a single level change yields a single change point. Series
/// shorter than two windows return no change points.
pub fn detect_change_points(
    timestamps: &[DateTime<Utc>],
    values: &[f64],
    window: usize,
) -> Vec<ChangePoint> {
    if window == 0 || values.len() < 2 * window || timestamps.len() != values.len() {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, f64)> = Vec::new();
    for split in window..=(values.len() - window) {
        let before = &values[split - window..split];
        let after = &values[split..split + window];

        let before_std = std_dev(before);
        // Degenerate flat windows: substitute a small floor so a genuine
        // level shift is still visible.
        let denom = if before_std.is_finite() && before_std > 1e-9 {
            before_std
        } else {
            mean(before).abs().max(1.0) * 1e-3
        };

        let shift = (mean(after) - mean(before)) / denom;
        if shift.abs() > SHIFT_THRESHOLD {
            candidates.push((split, shift));
        }
    }

    // Non-maximum suppression: keep the strongest shift within each run of
    // nearby candidates.
    let mut change_points = Vec::new();
    let mut i = 0;
    while i < candidates.len() {
        let mut best = candidates[i];
        let mut j = i + 1;
        while j < candidates.len() && candidates[j].0 - candidates[j - 1].0 <= window {
            if candidates[j].1.abs() > best.1.abs() {
                best = candidates[j];
            }
            j += 1;
        }
        let (split, shift) = best;
        change_points.push(ChangePoint {
            timestamp: timestamps[split],
            magnitude: shift.abs(),
            kind: if shift > 0.0 {
                ChangePointKind::Increase
            } else {
                ChangePointKind::Decrease
            },
        });
        i = j;
    }

    change_points
}
