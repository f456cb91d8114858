//! Property-based tests for the forecasting and analysis operations.
//!
//! These verify invariants that should hold for all valid inputs, using
//! randomly generated series data.

use chrono::{DateTime, Duration, TimeZone, Utc};
use promo_engine::prelude::*;
use proptest::prelude::*;

fn make_series(values: &[f64]) -> SalesSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<DateTime<Utc>> = (0..values.len())
        .map(|i| base + Duration::days(i as i64))
        .collect();
    SalesSeries::new(timestamps, values.to_vec()).unwrap()
}

/// Positive values with a little variation, avoiding constant series.
fn valid_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(1.0..1000.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

/// Series with an unambiguous upward trend.
fn trending_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (0.0..50.0_f64, 2.0..10.0_f64)
            .prop_map(move |(base, slope)| (0..len).map(|i| base + slope * i as f64).collect())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn forecast_length_matches_horizon(
        values in valid_values_strategy(20, 80),
        horizon in 1usize..10
    ) {
        let series = make_series(&values);
        let results = forecast(&series, horizon, &ForecastOptions::default()).unwrap();
        prop_assert_eq!(results.len(), horizon);
    }

    #[test]
    fn intervals_bracket_predictions(
        values in valid_values_strategy(20, 80),
        horizon in 1usize..10
    ) {
        let series = make_series(&values);
        let results = forecast(&series, horizon, &ForecastOptions::default()).unwrap();
        for result in &results {
            prop_assert!(result.interval.lower <= result.predicted);
            prop_assert!(result.predicted <= result.interval.upper);
            prop_assert!(result.predicted >= 0.0);
            prop_assert!((0.0..=1.0).contains(&result.accuracy));
        }
    }

    #[test]
    fn forecast_timestamps_extend_the_series(
        values in valid_values_strategy(20, 60),
        horizon in 1usize..8
    ) {
        let series = make_series(&values);
        let results = forecast(&series, horizon, &ForecastOptions::default()).unwrap();
        let mut last = series.last_timestamp().unwrap();
        for result in &results {
            prop_assert!(result.timestamp > last);
            last = result.timestamp;
        }
    }

    #[test]
    fn forecast_is_idempotent(
        values in valid_values_strategy(20, 60),
        horizon in 1usize..6
    ) {
        let series = make_series(&values);
        let a = forecast(&series, horizon, &ForecastOptions::default()).unwrap();
        let b = forecast(&series, horizon, &ForecastOptions::default()).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert_eq!(x.predicted, y.predicted);
            prop_assert_eq!(x.interval.lower, y.interval.lower);
            prop_assert_eq!(x.interval.upper, y.interval.upper);
        }
    }

    #[test]
    fn trending_series_never_reports_decreasing(
        values in trending_values_strategy(25, 60)
    ) {
        let series = make_series(&values);
        let analysis = analyze_trend(&series).unwrap();
        prop_assert_ne!(analysis.direction, TrendDirection::Decreasing);
        prop_assert!((0.0..=1.0).contains(&analysis.strength));
    }

    #[test]
    fn analyze_trend_is_idempotent(values in valid_values_strategy(20, 60)) {
        let series = make_series(&values);
        let a = analyze_trend(&series).unwrap();
        let b = analyze_trend(&series).unwrap();
        prop_assert_eq!(a.direction, b.direction);
        prop_assert_eq!(a.strength, b.strength);
        prop_assert_eq!(a.seasonality.period, b.seasonality.period);
        prop_assert_eq!(a.change_points.len(), b.change_points.len());
    }

    #[test]
    fn short_histories_degrade_not_error(
        values in valid_values_strategy(1, 10),
        horizon in 1usize..5
    ) {
        let series = make_series(&values);
        // Never an error: moving-average fallback, tagged in the result.
        let results = forecast(&series, horizon, &ForecastOptions::default()).unwrap();
        prop_assert!(results.iter().all(|r| r.model == ModelId::MovingAverage));
    }
}
