//! Batch screening of promotion records for anomalous spend/ROI patterns.

use crate::optimizer::PromotionRecord;
use crate::utils::{mean, std_dev};

/// Z-score beyond which a record's ROI or spend is an outlier.
pub const OUTLIER_Z_THRESHOLD: f64 = 3.0;
/// ROI below which a promotion counts as underperforming.
const LOW_ROI_THRESHOLD: f64 = 1.0;

/// A flagged promotion record.
#[derive(Debug, Clone)]
pub struct PromotionAnomaly {
    /// Index into the screened batch.
    pub index: usize,
    pub reason: String,
    /// Magnitude of the triggering deviation (z-score, or spend/ROI gap).
    pub score: f64,
}

/// Screen a batch of promotion records.
///
/// Flags ROI z-scores above 3, spend z-scores above 3, and the explicit
/// high-spend-with-low-ROI combination. Batches too small for meaningful
/// statistics return no flags.
pub fn screen_promotions(records: &[PromotionRecord]) -> Vec<PromotionAnomaly> {
    if records.len() < 3 {
        return Vec::new();
    }

    let rois: Vec<f64> = records.iter().map(|r| r.roi).collect();
    let spends: Vec<f64> = records.iter().map(|r| r.spend).collect();

    let roi_mean = mean(&rois);
    let roi_std = std_dev(&rois).max(1e-9);
    let spend_mean = mean(&spends);
    let spend_std = std_dev(&spends).max(1e-9);

    let mut anomalies = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let roi_z = (record.roi - roi_mean) / roi_std;
        if roi_z.abs() > OUTLIER_Z_THRESHOLD {
            anomalies.push(PromotionAnomaly {
                index,
                reason: format!(
                    "ROI {:.2} is {:.1} standard deviations from the batch mean",
                    record.roi,
                    roi_z.abs()
                ),
                score: roi_z.abs(),
            });
        }

        let spend_z = (record.spend - spend_mean) / spend_std;
        if spend_z.abs() > OUTLIER_Z_THRESHOLD {
            anomalies.push(PromotionAnomaly {
                index,
                reason: format!(
                    "spend {:.0} is {:.1} standard deviations from the batch mean",
                    record.spend,
                    spend_z.abs()
                ),
                score: spend_z.abs(),
            });
        }

        // Above-average spend that failed to return: flagged even when
        // neither z-score is extreme.
        if record.spend > spend_mean + spend_std && record.roi < LOW_ROI_THRESHOLD {
            anomalies.push(PromotionAnomaly {
                index,
                reason: format!(
                    "high spend {:.0} with low ROI {:.2}",
                    record.spend, record.roi
                ),
                score: spend_z.max(0.0) + (LOW_ROI_THRESHOLD - record.roi),
            });
        }
    }

    anomalies
}
