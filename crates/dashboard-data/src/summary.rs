//! Year-to-date totals across a monthly series.

use dashboard_core::models::{DerivedMetric, Measures, PivotedRow};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::metrics::MetricsDeriver;

/// Totals over every month of a pivoted series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of months in the series.
    pub months: usize,
    /// Sum of each month's total measures.
    pub total: Measures,
    /// Sum of each month's rounded `cost_k`, matching the chart headline.
    pub cost_k: f64,
    /// Every category seen, in first-occurrence order across months.
    pub categories: IndexSet<String>,
}

impl Summary {
    /// Sum up `rows`. Rows without derived metrics contribute a `cost_k`
    /// computed on the fly.
    pub fn from_rows(rows: &[PivotedRow]) -> Self {
        let categories: IndexSet<String> = rows
            .iter()
            .flat_map(|row| row.categories().map(str::to_string))
            .collect();

        let cost_k: f64 = rows
            .iter()
            .map(|row| {
                row.derived_value(DerivedMetric::CostK, None)
                    .unwrap_or_else(|| MetricsDeriver::value_for(row, DerivedMetric::CostK, None))
            })
            .sum();

        Self {
            months: rows.len(),
            total: rows.iter().map(|r| &r.total).sum(),
            cost_k,
            categories,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
