//! Trend, seasonality, and change-point analysis.

pub mod changepoint;
pub mod seasonality;
pub mod trend;

pub use changepoint::{detect_change_points, ChangePoint, ChangePointKind};
pub use seasonality::{detect_seasonality, SeasonalityInfo};
pub use trend::{fit_trend, TrendDirection, TrendFit};

use crate::core::SalesSeries;
use crate::error::{EngineError, Result};

/// Combined trend/seasonality/change-point report for a series.
#[derive(Debug, Clone)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// R² of the linear fit, in [0, 1].
    pub strength: f64,
    pub seasonality: SeasonalityInfo,
    pub change_points: Vec<ChangePoint>,
}

/// Analyze a series: OLS trend, autocorrelation seasonality scan, and
/// two-window change-point detection.
///
/// Series too short for a sub-analysis degrade to "not detected" for that
/// part rather than erroring; only an empty series is rejected.
pub fn analyze_trend(series: &SalesSeries) -> Result<TrendAnalysis> {
    if series.is_empty() {
        return Err(EngineError::InvalidInput("empty series".to_string()));
    }
    tracing::debug!(len = series.len(), "analyzing trend");

    let fit = fit_trend(series.values());
    let seasonality = detect_seasonality(series.values());
    let change_points =
        detect_change_points(series.timestamps(), series.values(), changepoint::DEFAULT_WINDOW);

    Ok(TrendAnalysis {
        direction: fit.direction(),
        strength: fit.r_squared.clamp(0.0, 1.0),
        seasonality,
        change_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> SalesSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        SalesSeries::new(timestamps, values).unwrap()
    }

    #[test]
    fn strictly_increasing_series_reports_increasing() {
        // Slope 50/day over 30 points
        let values: Vec<f64> = (0..30).map(|i| 1000.0 + 50.0 * i as f64).collect();
        let analysis = analyze_trend(&make_series(values)).unwrap();

        assert_eq!(analysis.direction, TrendDirection::Increasing);
        assert!(analysis.strength > 0.95);
    }

    #[test]
    fn flat_noisy_series_reports_stable() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 1.7).sin()).collect();
        let analysis = analyze_trend(&make_series(values)).unwrap();
        assert_eq!(analysis.direction, TrendDirection::Stable);
    }

    #[test]
    fn weekly_pattern_is_detected() {
        let values: Vec<f64> = (0..84)
            .map(|i| 500.0 + 80.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin())
            .collect();
        let analysis = analyze_trend(&make_series(values)).unwrap();

        assert!(analysis.seasonality.detected);
        assert_eq!(analysis.seasonality.period, Some(7));
    }

    #[test]
    fn level_shift_is_flagged() {
        let mut values: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.9).sin()).collect();
        for v in values.iter_mut().skip(15) {
            *v += 60.0;
        }
        let analysis = analyze_trend(&make_series(values)).unwrap();
        assert!(!analysis.change_points.is_empty());
        assert_eq!(analysis.change_points[0].kind, ChangePointKind::Increase);
    }

    #[test]
    fn single_point_series_degrades_to_not_detected() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = SalesSeries::new(vec![base], vec![1.0]).unwrap();
        let analysis = analyze_trend(&series).unwrap();
        assert_eq!(analysis.direction, TrendDirection::Stable);
        assert!(!analysis.seasonality.detected);
        assert!(analysis.change_points.is_empty());
    }
}
