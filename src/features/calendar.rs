//! Calendar and cyclical encodings.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

/// Business hours for transactional metrics, inclusive.
pub const BUSINESS_HOURS: (u32, u32) = (8, 20);

/// Encode a periodic quantity as a (sin, cos) pair so that adjacent phases
/// stay adjacent in feature space (23:00 is close to 00:00).
pub fn cyclical_pair(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * std::f64::consts::PI * value / period;
    (angle.sin(), angle.cos())
}

/// 1.0 during weekday business hours, 0.0 otherwise.
pub fn business_hours_indicator(timestamp: &DateTime<Utc>) -> f64 {
    let weekday = !matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun);
    let hour = timestamp.hour();
    if weekday && hour >= BUSINESS_HOURS.0 && hour <= BUSINESS_HOURS.1 {
        1.0
    } else {
        0.0
    }
}

/// Calendar feature block for a timestamp: cyclical hour-of-day,
/// day-of-week, day-of-month encodings plus the business-hours indicator.
///
/// Seven values, in a fixed order relied on by the models.
pub fn calendar_features(timestamp: &DateTime<Utc>) -> Vec<f64> {
    let (hour_sin, hour_cos) = cyclical_pair(timestamp.hour() as f64, 24.0);
    let (dow_sin, dow_cos) =
        cyclical_pair(timestamp.weekday().num_days_from_monday() as f64, 7.0);
    let (dom_sin, dom_cos) = cyclical_pair((timestamp.day() - 1) as f64, 31.0);
    vec![
        hour_sin,
        hour_cos,
        dow_sin,
        dow_cos,
        dom_sin,
        dom_cos,
        business_hours_indicator(timestamp),
    ]
}
