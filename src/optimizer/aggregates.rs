//! Segment-level historical aggregates.

use std::collections::HashMap;

/// One historical promotion, as read from the promotion-record store.
#[derive(Debug, Clone)]
pub struct PromotionRecord {
    pub category: String,
    pub store_type: String,
    pub discount_type: String,
    /// Discount depth in percent.
    pub discount_value: f64,
    pub duration_days: u32,
    /// Seasonal demand multiplier at the time of the promotion.
    pub seasonality_factor: f64,
    pub spend: f64,
    pub budget: f64,
    pub units: f64,
    pub revenue: f64,
    pub roi: f64,
}

/// Averages over a (category, store-type) segment's promotion history.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SegmentAggregates {
    pub avg_spend: f64,
    pub avg_units: f64,
    pub avg_revenue: f64,
    pub avg_roi: f64,
    /// ROI weighted by how much of the budget was actually deployed.
    pub efficiency: f64,
}

impl SegmentAggregates {
    /// Compute aggregates over a set of records.
    ///
    /// Returns `None` for an empty set; callers fall back to
    /// [`SegmentAggregates::default_global`].
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a PromotionRecord>,
    {
        let mut n = 0usize;
        let mut spend = 0.0;
        let mut units = 0.0;
        let mut revenue = 0.0;
        let mut roi = 0.0;
        let mut utilization = 0.0;

        for record in records {
            n += 1;
            spend += record.spend;
            units += record.units;
            revenue += record.revenue;
            roi += record.roi;
            utilization += if record.budget > 0.0 {
                (record.spend / record.budget).clamp(0.0, 1.0)
            } else {
                1.0
            };
        }

        if n == 0 {
            return None;
        }
        let n = n as f64;
        let avg_roi = roi / n;
        Some(Self {
            avg_spend: spend / n,
            avg_units: units / n,
            avg_revenue: revenue / n,
            avg_roi,
            efficiency: avg_roi * (utilization / n),
        })
    }

    /// Conservative global defaults used when a segment has no history.
    /// The optimizer never errors on empty history.
    pub fn default_global() -> Self {
        Self {
            avg_spend: 25_000.0,
            avg_units: 5_000.0,
            avg_revenue: 60_000.0,
            avg_roi: 1.5,
            efficiency: 1.2,
        }
    }
}

/// Normalized lookup key for a (category, store-type) segment.
pub fn segment_key(category: &str, store_type: &str) -> String {
    format!(
        "{}|{}",
        category.trim().to_ascii_lowercase(),
        store_type.trim().to_ascii_lowercase()
    )
}

/// Group records into per-segment aggregates.
pub fn aggregate_segments(records: &[PromotionRecord]) -> HashMap<String, SegmentAggregates> {
    let mut grouped: HashMap<String, Vec<&PromotionRecord>> = HashMap::new();
    for record in records {
        grouped
            .entry(segment_key(&record.category, &record.store_type))
            .or_default()
            .push(record);
    }

    grouped
        .into_iter()
        .filter_map(|(key, group)| {
            SegmentAggregates::from_records(group.into_iter()).map(|agg| (key, agg))
        })
        .collect()
}
