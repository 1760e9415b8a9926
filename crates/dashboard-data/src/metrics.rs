//! Ratio metrics on pivoted months.
//!
//! Two guards apply, and they are not interchangeable:
//!
//! * ratios return `0` when the **denominator** is absent, zero, or not finite;
//! * scaled values (`cost_k`) return `0` when the **value itself** is absent
//!   or zero.
//!
//! Every result is rounded half-up to [`DECIMALS`] places and is never NaN or
//! infinite.

use std::collections::BTreeMap;

use dashboard_core::formatting::round_half_up;
use dashboard_core::models::{Derivation, DerivedMetric, DerivedMetrics, Measures, PivotedRow};

/// Decimal places kept on every derived value.
pub const DECIMALS: u32 = 2;

/// Stateless collection of derived-metric calculations.
pub struct MetricsDeriver;

impl MetricsDeriver {
    /// Return a copy of `row` with [`PivotedRow::derived`] filled in.
    ///
    /// Totals get every metric with a total variant; each category present in
    /// the row gets every metric.
    pub fn derive(row: &PivotedRow) -> PivotedRow {
        let total = DerivedMetric::ALL
            .iter()
            .filter(|m| m.has_total_variant())
            .map(|&m| (m, Self::compute(m, Some(&row.total))))
            .collect();

        let by_category = row
            .by_category
            .iter()
            .map(|(category, measures)| (category.clone(), Self::compute_all(Some(measures))))
            .collect();

        PivotedRow {
            derived: Some(DerivedMetrics { total, by_category }),
            ..row.clone()
        }
    }

    /// [`MetricsDeriver::derive`] over a whole series.
    pub fn derive_all(rows: &[PivotedRow]) -> Vec<PivotedRow> {
        rows.iter().map(Self::derive).collect()
    }

    /// Value of `metric` for `category` (or the total when `None`) computed
    /// straight from the row's measures. A category absent from the row has
    /// no denominator and therefore yields `0`.
    pub fn value_for(row: &PivotedRow, metric: DerivedMetric, category: Option<&str>) -> f64 {
        let measures = match category {
            None => Some(&row.total),
            Some(c) => row.by_category.get(c),
        };
        Self::compute(metric, measures)
    }

    /// Evaluate one metric on an optional set of measures.
    pub fn compute(metric: DerivedMetric, measures: Option<&Measures>) -> f64 {
        match metric.derivation() {
            Derivation::Ratio {
                numerator,
                denominator,
            } => Self::ratio(
                measures.map(|m| m.get(numerator)),
                measures.map(|m| m.get(denominator)),
            ),
            Derivation::Scaled { measure, divisor } => {
                Self::scaled(measures.map(|m| m.get(measure)), divisor)
            }
        }
    }

    /// `numerator / denominator` rounded, or `0` when the denominator is
    /// missing, zero, or not finite.
    pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
        let Some(denominator) = denominator.filter(|d| d.is_finite() && *d != 0.0) else {
            return 0.0;
        };
        let numerator = numerator.unwrap_or(0.0);
        round_half_up(numerator / denominator, DECIMALS)
    }

    /// `value / divisor` rounded, or `0` when the value is missing or zero.
    pub fn scaled(value: Option<f64>, divisor: u32) -> f64 {
        match value.filter(|v| *v != 0.0) {
            Some(v) if divisor != 0 => round_half_up(v / f64::from(divisor), DECIMALS),
            _ => 0.0,
        }
    }

    fn compute_all(measures: Option<&Measures>) -> BTreeMap<DerivedMetric, f64> {
        DerivedMetric::ALL
            .iter()
            .map(|&m| (m, Self::compute(m, measures)))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn measures(h: f64, c: f64, p: f64, s: f64) -> Measures {
        Measures {
            ms_hours_used: h,
            cost_per_run: c,
            ppis_identified: p,
            compounds_screened: s,
        }
    }

    fn row(categories: &[(&str, Measures)]) -> PivotedRow {
        let by_category: BTreeMap<String, Measures> = categories
            .iter()
            .map(|(c, m)| (c.to_string(), *m))
            .collect();
        PivotedRow {
            month_key: "2024-01".to_string(),
            total: by_category.values().sum(),
            by_category,
            derived: None,
        }
    }

    // ── ratio / scaled ────────────────────────────────────────────────────────

    #[test]
    fn test_ratio_rounds_to_two_decimals() {
        assert_eq!(MetricsDeriver::ratio(Some(5.0), Some(10.0)), 0.5);
        assert_eq!(MetricsDeriver::ratio(Some(100.0), Some(3.0)), 33.33);
        assert_eq!(MetricsDeriver::ratio(Some(200.0), Some(3.0)), 66.67);
    }

    #[test]
    fn test_ratio_zero_or_missing_denominator() {
        assert_eq!(MetricsDeriver::ratio(Some(5.0), Some(0.0)), 0.0);
        assert_eq!(MetricsDeriver::ratio(Some(5.0), None), 0.0);
        assert_eq!(MetricsDeriver::ratio(Some(5.0), Some(f64::NAN)), 0.0);
        assert_eq!(MetricsDeriver::ratio(Some(5.0), Some(f64::INFINITY)), 0.0);
    }

    #[test]
    fn test_ratio_missing_numerator_is_zero() {
        assert_eq!(MetricsDeriver::ratio(None, Some(4.0)), 0.0);
        assert_eq!(MetricsDeriver::ratio(Some(f64::NAN), Some(4.0)), 0.0);
    }

    #[test]
    fn test_scaled_guards_the_value_not_the_divisor() {
        assert_eq!(MetricsDeriver::scaled(Some(1250.0), 1000), 1.25);
        assert_eq!(MetricsDeriver::scaled(Some(1234.0), 1000), 1.23);
        assert_eq!(MetricsDeriver::scaled(Some(0.0), 1000), 0.0);
        assert_eq!(MetricsDeriver::scaled(None, 1000), 0.0);
        assert_eq!(MetricsDeriver::scaled(Some(5.0), 0), 0.0);
    }

    // ── derive ────────────────────────────────────────────────────────────────

    #[test]
    fn test_derive_worked_example() {
        let r = row(&[
            ("A", measures(10.0, 100.0, 5.0, 0.0)),
            ("B", measures(0.0, 50.0, 0.0, 20.0)),
        ]);
        let d = MetricsDeriver::derive(&r);

        assert_eq!(d.derived_value(DerivedMetric::PpiPerMsHour, None), Some(0.5));
        assert_eq!(d.derived_value(DerivedMetric::PpiPerMsHour, Some("A")), Some(0.5));
        assert_eq!(d.derived_value(DerivedMetric::PpiPerMsHour, Some("B")), Some(0.0));
        assert_eq!(d.derived_value(DerivedMetric::CostPerPpi, None), Some(30.0));
        assert_eq!(d.derived_value(DerivedMetric::CostPerPpi, Some("B")), Some(0.0));
        assert_eq!(d.derived_value(DerivedMetric::CostK, None), Some(0.15));
        assert_eq!(d.derived_value(DerivedMetric::CostK, Some("B")), Some(0.05));
        assert_eq!(d.derived_value(DerivedMetric::CostPerCompound, Some("B")), Some(2.5));
        assert_eq!(d.derived_value(DerivedMetric::CompoundsPerMsHour, Some("B")), Some(0.0));
    }

    #[test]
    fn test_compound_metrics_have_no_total_variant() {
        let d = MetricsDeriver::derive(&row(&[("A", measures(1.0, 1.0, 1.0, 1.0))]));
        assert_eq!(d.derived_value(DerivedMetric::CostPerCompound, None), None);
        assert_eq!(d.derived_value(DerivedMetric::CompoundsPerMsHour, None), None);
        assert_eq!(d.derived_value(DerivedMetric::CostPerCompound, Some("A")), Some(1.0));
    }

    #[test]
    fn test_derive_does_not_touch_measures() {
        let r = row(&[("A", measures(3.0, 7.0, 2.0, 0.0))]);
        let d = MetricsDeriver::derive(&r);
        assert!(r.derived.is_none());
        assert_eq!(d.total, r.total);
        assert_eq!(d.by_category, r.by_category);
    }

    #[test]
    fn test_value_for_absent_category_is_zero() {
        let r = row(&[("A", measures(3.0, 7.0, 2.0, 0.0))]);
        assert_eq!(MetricsDeriver::value_for(&r, DerivedMetric::CostPerPpi, Some("Z")), 0.0);
        assert_eq!(MetricsDeriver::value_for(&r, DerivedMetric::CostPerPpi, None), 3.5);
    }

    #[test]
    fn test_flat_output_names() {
        let d = MetricsDeriver::derive(&row(&[("XLMS Screening", measures(4.0, 800.0, 8.0, 40.0))]));
        let flat = d.to_flat_map("total");
        assert_eq!(flat["cost_per_ppi_total"], serde_json::json!(100.0));
        assert_eq!(flat["cost_per_ppi_XLMS Screening"], serde_json::json!(100.0));
        assert_eq!(flat["compounds_per_ms_hour_XLMS Screening"], serde_json::json!(10.0));
        assert_eq!(flat["cost_k_XLMS Screening"], serde_json::json!(0.8));
        assert!(!flat.contains_key("cost_per_compound_total"));

        let legacy = d.to_flat_map("");
        assert_eq!(legacy["cost_k"], serde_json::json!(0.8));
    }
}
