//! Month-wide pivot across categories.

use std::collections::BTreeMap;

use dashboard_core::models::{Measures, MonthlyBucket, PivotedRow};
use dashboard_core::settings::MonthOrder;
use tracing::debug;

use crate::grouper::group_by;

/// Stateless helper that turns monthly buckets into one row per month.
pub struct Pivoter;

impl Pivoter {
    /// Build one [`PivotedRow`] per distinct month, in the order months are
    /// first seen in `buckets`.
    ///
    /// Every category present in a month gets its own entry; the total is the
    /// fold of all of them, however many there are.
    pub fn pivot(buckets: &[MonthlyBucket]) -> Vec<PivotedRow> {
        let rows: Vec<PivotedRow> = group_by(buckets, |b| b.month_key.clone())
            .into_iter()
            .map(|(month_key, month_buckets)| Self::pivot_month(month_key, &month_buckets))
            .collect();

        debug!("Pivoted {} buckets into {} months", buckets.len(), rows.len());
        rows
    }

    /// Reorder rows according to `order`. The sort is stable and keys are
    /// unique, so this is deterministic.
    pub fn order(mut rows: Vec<PivotedRow>, order: MonthOrder) -> Vec<PivotedRow> {
        if order == MonthOrder::Chronological {
            rows.sort_by(|a, b| a.month_key.cmp(&b.month_key));
        }
        rows
    }

    fn pivot_month(month_key: String, buckets: &[&MonthlyBucket]) -> PivotedRow {
        // Buckets are unique per (month, category) when they come from the
        // aggregator; summing duplicates keeps hand-built input consistent.
        let by_category: BTreeMap<String, Measures> =
            buckets.iter().fold(BTreeMap::new(), |mut acc, bucket| {
                acc.entry(bucket.category.clone())
                    .and_modify(|m: &mut Measures| *m = *m + bucket.measures)
                    .or_insert(bucket.measures);
                acc
            });

        let total: Measures = by_category.values().sum();

        PivotedRow {
            month_key,
            total,
            by_category,
            derived: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
