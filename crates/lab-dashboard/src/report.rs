//! Plain-text rendering of an analysis for the terminal.

use dashboard_core::formatting::{format_currency, format_number, format_thousands};
use dashboard_core::models::{DerivedMetric, Measure};
use dashboard_data::analysis::AnalysisResult;

/// Headline totals followed by one line per month.
pub fn render_summary(result: &AnalysisResult) -> String {
    let summary = &result.summary;
    let mut out = String::new();

    out.push_str(&format!(
        "Months: {}   Categories: {}\n",
        summary.months,
        if summary.categories.is_empty() {
            "-".to_string()
        } else {
            summary
                .categories
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    ));
    out.push_str(&format!(
        "Total run costs: {}   MS hours: {}   PPIs: {}   Compounds: {}\n",
        format_thousands(summary.cost_k),
        format_number(summary.total.ms_hours_used, 0),
        format_number(summary.total.ppis_identified, 0),
        format_number(summary.total.compounds_screened, 0),
    ));
    if !result.rejected.is_empty() {
        out.push_str(&format!("Skipped records: {}\n", result.rejected.len()));
    }

    out.push('\n');
    out.push_str(&format!(
        "{:<8} {:>10} {:>10} {:>8} {:>12} {:>10}\n",
        "Month", "Cost (k$)", "MS hours", "PPIs", "$ / PPI", "PPI / h"
    ));
    for row in &result.rows {
        let derived = |metric| row.derived_value(metric, None).unwrap_or(0.0);
        out.push_str(&format!(
            "{:<8} {:>10} {:>10} {:>8} {:>12} {:>10}\n",
            row.month_key,
            format_number(derived(DerivedMetric::CostK), 2),
            format_number(row.total_value(Measure::MsHoursUsed), 1),
            format_number(row.total_value(Measure::PpisIdentified), 0),
            format_currency(derived(DerivedMetric::CostPerPpi)),
            format_number(derived(DerivedMetric::PpiPerMsHour), 2),
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::RawRecord;
    use dashboard_core::settings::PipelineConfig;
    use dashboard_data::analysis::analyze_records;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_render_summary() {
        let records = vec![
            raw(json!({
                "End Date": "2024-01-15",
                "Experiment Type": "Deep Fractionation",
                "MS Hours Used": 10,
                "Cost per Run (USD)": 12000,
                "PPIs Identified": 40
            })),
            raw(json!({
                "End Date": "2024-02-03",
                "Experiment Type": "XLMS Screening",
                "MS Hours Used": 4,
                "Cost per Run (USD)": 3000,
                "PPIs Identified": 6,
                "Compounds Screened": 1500
            })),
            raw(json!({"End Date": "??"})),
        ];
        let result = analyze_records(&records, &PipelineConfig::default());
        let text = render_summary(&result);

        assert!(text.contains("Months: 2"));
        assert!(text.contains("Deep Fractionation, XLMS Screening"));
        assert!(text.contains("$ 15k"));
        assert!(text.contains("Compounds: 1,500"));
        assert!(text.contains("Skipped records: 1"));
        assert!(text.contains("2024-01"));
        assert!(text.contains("$300.00"));
        assert!(text.contains("$500.00"));
    }

    #[test]
    fn test_render_empty() {
        let result = analyze_records(&[], &PipelineConfig::default());
        let text = render_summary(&result);
        assert!(text.contains("Months: 0   Categories: -"));
        assert!(!text.contains("Skipped"));
    }
}
