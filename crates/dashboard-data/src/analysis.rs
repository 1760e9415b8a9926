//! End-to-end pipeline: normalize → aggregate → pivot → derive.
//!
//! Returns an [`AnalysisResult`] ready for a chart or table layer.

use dashboard_core::models::{PivotedRow, RawRecord};
use dashboard_core::settings::PipelineConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::MonthlyAggregator;
use crate::metrics::MetricsDeriver;
use crate::normalizer::Normalizer;
use crate::pivot::Pivoter;
use crate::summary::Summary;

// ── Public types ──────────────────────────────────────────────────────────────

/// A raw record the normalizer could not place in a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Zero-based position in the input sequence.
    pub index: usize,
    pub reason: String,
}

/// Stage counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub records_received: usize,
    pub records_normalized: usize,
    pub records_rejected: usize,
    pub buckets_created: usize,
    pub months: usize,
}

/// The complete output of [`analyze_records`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// One row per month, with derived metrics, in the configured order.
    pub rows: Vec<PivotedRow>,
    pub summary: Summary,
    /// Records skipped because no month could be derived from them.
    pub rejected: Vec<RejectedRecord>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Rows flattened to `<metric>_<category>` JSON objects.
    pub fn flat_rows(&self, total_suffix: &str) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| row.to_flat_map(total_suffix))
            .collect()
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline over an in-memory batch.
///
/// 1. Normalize every record; records without a usable end date are skipped
///    and reported in [`AnalysisResult::rejected`]. The batch never aborts.
/// 2. Sum per `(category, month)`.
/// 3. Pivot into one row per month.
/// 4. Derive ratio metrics.
/// 5. Order months per [`PipelineConfig::month_order`] and summarize.
pub fn analyze_records(records: &[RawRecord], config: &PipelineConfig) -> AnalysisResult {
    // ── Step 1: Normalize ─────────────────────────────────────────────────────
    let normalizer = Normalizer::from_config(config);
    let mut normalized = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (index, raw) in records.iter().enumerate() {
        match normalizer.normalize(raw) {
            Ok(record) => normalized.push(record),
            Err(e) => {
                warn!("Skipping record {}: {}", index, e);
                rejected.push(RejectedRecord {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }
    debug!(
        "Normalized {} of {} records",
        normalized.len(),
        records.len()
    );

    // ── Step 2: Aggregate ─────────────────────────────────────────────────────
    let buckets = MonthlyAggregator::aggregate(&normalized);

    // ── Step 3: Pivot ─────────────────────────────────────────────────────────
    let pivoted = Pivoter::pivot(&buckets);

    // ── Step 4: Derive ────────────────────────────────────────────────────────
    let derived = MetricsDeriver::derive_all(&pivoted);

    // ── Step 5: Order + summarize ─────────────────────────────────────────────
    let rows = Pivoter::order(derived, config.month_order);
    let summary = Summary::from_rows(&rows);

    let metadata = AnalysisMetadata {
        records_received: records.len(),
        records_normalized: normalized.len(),
        records_rejected: rejected.len(),
        buckets_created: buckets.len(),
        months: rows.len(),
    };

    info!(
        "Analysis complete: {} months, {} categories, {} records skipped",
        metadata.months,
        summary.categories.len(),
        metadata.records_rejected
    );

    AnalysisResult {
        rows,
        summary,
        rejected,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
