//! Per-category monthly sums.

use dashboard_core::models::{MonthlyBucket, NormalizedRecord};
use tracing::debug;

use crate::grouper::group_by;

/// Stateless helper that sums normalized records into `(month, category)`
/// buckets.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Group `records` by category, then sum each category's records per
    /// month.
    ///
    /// Output is the concatenation of the per-category bucket lists: categories
    /// in first-occurrence order, and months within a category in
    /// first-occurrence order. Buckets of different categories are never merged
    /// here.
    pub fn aggregate(records: &[NormalizedRecord]) -> Vec<MonthlyBucket> {
        let by_category = group_by(records, |r| r.category.clone());

        let buckets: Vec<MonthlyBucket> = by_category
            .into_iter()
            .flat_map(|(_, category_records)| Self::sum_by_month(category_records))
            .collect();

        debug!(
            "Aggregated {} records into {} monthly buckets",
            records.len(),
            buckets.len()
        );
        buckets
    }

    /// The first record of a month seeds the bucket; later ones add into it.
    fn sum_by_month(records: Vec<&NormalizedRecord>) -> Vec<MonthlyBucket> {
        group_by(records, |r| r.month_key.clone())
            .into_iter()
            .filter_map(|(_, month_records)| {
                let (first, rest) = month_records.split_first()?;
                Some(rest.iter().fold(MonthlyBucket::seed(first), |bucket, r| {
                    MonthlyBucket {
                        measures: bucket.measures + r.measures,
                        ..bucket
                    }
                }))
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
