use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::Add;

// ── RawRecord ─────────────────────────────────────────────────────────────────

/// One experiment row exactly as the upstream spreadsheet parser produced it.
///
/// Nothing about the contents is trusted: any field may be missing, hold a
/// string where a number is expected, or carry a spreadsheet serial date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful in tests and fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Return the value of the first candidate key that is present, not
    /// `null` and not a blank string, together with the key that matched.
    pub fn first_present<'a>(&'a self, keys: &'a [String]) -> Option<(&'a str, &'a Value)> {
        keys.iter().find_map(|k| match self.0.get(k) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some((k.as_str(), v)),
        })
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ── Measure ───────────────────────────────────────────────────────────────────

/// The four numeric measures carried by every experiment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Mass-spectrometer instrument hours.
    MsHoursUsed,
    /// Run cost in US dollars.
    CostPerRun,
    /// Count of identified protein-protein interactions.
    PpisIdentified,
    /// Count of screened compounds (screening experiments only).
    CompoundsScreened,
}

impl Measure {
    pub const ALL: [Measure; 4] = [
        Measure::MsHoursUsed,
        Measure::CostPerRun,
        Measure::PpisIdentified,
        Measure::CompoundsScreened,
    ];

    /// Field-name stem used in flattened output.
    pub fn field_name(self) -> &'static str {
        match self {
            Measure::MsHoursUsed => "ms_hours_used",
            Measure::CostPerRun => "cost_per_run",
            Measure::PpisIdentified => "ppis_identified",
            Measure::CompoundsScreened => "compounds_screened",
        }
    }
}

// ── Measures ──────────────────────────────────────────────────────────────────

/// Values of all four measures. Always finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measures {
    pub ms_hours_used: f64,
    pub cost_per_run: f64,
    pub ppis_identified: f64,
    pub compounds_screened: f64,
}

impl Measures {
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::MsHoursUsed => self.ms_hours_used,
            Measure::CostPerRun => self.cost_per_run,
            Measure::PpisIdentified => self.ppis_identified,
            Measure::CompoundsScreened => self.compounds_screened,
        }
    }

    /// Elementwise sum of `self` and `other`.
    pub fn combine(&self, other: &Measures) -> Measures {
        Measures {
            ms_hours_used: self.ms_hours_used + other.ms_hours_used,
            cost_per_run: self.cost_per_run + other.cost_per_run,
            ppis_identified: self.ppis_identified + other.ppis_identified,
            compounds_screened: self.compounds_screened + other.compounds_screened,
        }
    }
}

impl Add for Measures {
    type Output = Measures;

    fn add(self, rhs: Measures) -> Measures {
        self.combine(&rhs)
    }
}

impl<'a> Sum<&'a Measures> for Measures {
    fn sum<I: Iterator<Item = &'a Measures>>(iter: I) -> Measures {
        iter.fold(Measures::default(), |acc, m| acc.combine(m))
    }
}

impl Sum for Measures {
    fn sum<I: Iterator<Item = Measures>>(iter: I) -> Measures {
        iter.fold(Measures::default(), |acc, m| acc.combine(&m))
    }
}

// ── NormalizedRecord ──────────────────────────────────────────────────────────

/// A raw record after type coercion: month key, category and measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// `"YYYY-MM"` of the record's end-of-period date.
    pub month_key: String,
    /// Experiment type label, e.g. `"Deep Fractionation"`.
    pub category: String,
    #[serde(flatten)]
    pub measures: Measures,
}

// ── MonthlyBucket ─────────────────────────────────────────────────────────────

/// Sum of every record sharing one `(month_key, category)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month_key: String,
    pub category: String,
    #[serde(flatten)]
    pub measures: Measures,
}

impl MonthlyBucket {
    /// Start a bucket from the first record seen for its month and category.
    pub fn seed(record: &NormalizedRecord) -> Self {
        Self {
            month_key: record.month_key.clone(),
            category: record.category.clone(),
            measures: record.measures,
        }
    }
}

// ── DerivedMetric ─────────────────────────────────────────────────────────────

/// Ratio metrics computed on top of a pivoted month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMetric {
    /// Run cost per identified PPI.
    CostPerPpi,
    /// Identified PPIs per instrument hour.
    PpiPerMsHour,
    /// Screened compounds per instrument hour.
    CompoundsPerMsHour,
    /// Run cost per screened compound.
    CostPerCompound,
    /// Run cost in thousands of dollars.
    CostK,
}

/// How a derived metric is obtained from the underlying measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// `numerator / denominator`, zero when the denominator is missing or zero.
    Ratio { numerator: Measure, denominator: Measure },
    /// `measure / divisor`, zero when the measure itself is missing or zero.
    Scaled { measure: Measure, divisor: u32 },
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 5] = [
        DerivedMetric::CostPerPpi,
        DerivedMetric::PpiPerMsHour,
        DerivedMetric::CompoundsPerMsHour,
        DerivedMetric::CostPerCompound,
        DerivedMetric::CostK,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            DerivedMetric::CostPerPpi => "cost_per_ppi",
            DerivedMetric::PpiPerMsHour => "ppi_per_ms_hour",
            DerivedMetric::CompoundsPerMsHour => "compounds_per_ms_hour",
            DerivedMetric::CostPerCompound => "cost_per_compound",
            DerivedMetric::CostK => "cost_k",
        }
    }

    pub fn derivation(self) -> Derivation {
        use Measure::*;
        match self {
            DerivedMetric::CostPerPpi => Derivation::Ratio {
                numerator: CostPerRun,
                denominator: PpisIdentified,
            },
            DerivedMetric::PpiPerMsHour => Derivation::Ratio {
                numerator: PpisIdentified,
                denominator: MsHoursUsed,
            },
            DerivedMetric::CompoundsPerMsHour => Derivation::Ratio {
                numerator: CompoundsScreened,
                denominator: MsHoursUsed,
            },
            DerivedMetric::CostPerCompound => Derivation::Ratio {
                numerator: CostPerRun,
                denominator: CompoundsScreened,
            },
            DerivedMetric::CostK => Derivation::Scaled {
                measure: CostPerRun,
                divisor: 1000,
            },
        }
    }

    /// Whether the metric is also reported for the cross-category total.
    /// Compound metrics only make sense per category.
    pub fn has_total_variant(self) -> bool {
        !matches!(
            self,
            DerivedMetric::CompoundsPerMsHour | DerivedMetric::CostPerCompound
        )
    }
}

/// Derived values for one month: totals plus one map per present category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total: BTreeMap<DerivedMetric, f64>,
    pub by_category: BTreeMap<String, BTreeMap<DerivedMetric, f64>>,
}

// ── PivotedRow ────────────────────────────────────────────────────────────────

/// One calendar month with per-category and total measures.
///
/// A category with no experiments in the month is simply absent from
/// `by_category`; it is never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotedRow {
    pub month_key: String,
    /// Elementwise sum over every entry of `by_category`.
    pub total: Measures,
    pub by_category: BTreeMap<String, Measures>,
    /// Filled in by the metrics deriver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedMetrics>,
}

impl PivotedRow {
    /// Look up a per-category measure; `None` when the category is absent.
    pub fn category_value(&self, category: &str, measure: Measure) -> Option<f64> {
        self.by_category.get(category).map(|m| m.get(measure))
    }

    pub fn total_value(&self, measure: Measure) -> f64 {
        self.total.get(measure)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.by_category.keys().map(String::as_str)
    }

    /// Look up a derived value. `category = None` selects the total variant.
    pub fn derived_value(&self, metric: DerivedMetric, category: Option<&str>) -> Option<f64> {
        let derived = self.derived.as_ref()?;
        match category {
            None => derived.total.get(&metric).copied(),
            Some(c) => derived.by_category.get(c)?.get(&metric).copied(),
        }
    }

    /// Flatten into the `<metric>_<category>` naming used by chart layers.
    ///
    /// Totals are named `<metric>_<total_suffix>`, or bare `<metric>` when
    /// `total_suffix` is empty. Total fields always win: a category whose
    /// fields would overwrite a total (a category literally named like the
    /// suffix) or an earlier category is flattened under
    /// `<category>_category` instead, repeated until its names are free.
    pub fn to_flat_map(&self, total_suffix: &str) -> Map<String, Value> {
        let total_name = |stem: &str| {
            if total_suffix.is_empty() {
                stem.to_string()
            } else {
                format!("{}_{}", stem, total_suffix)
            }
        };

        let mut out = Map::new();
        out.insert("month_key".into(), Value::from(self.month_key.clone()));

        for measure in Measure::ALL {
            out.insert(
                total_name(measure.field_name()),
                Value::from(self.total.get(measure)),
            );
        }
        for metric in DerivedMetric::ALL {
            if let Some(value) = self.derived_value(metric, None) {
                out.insert(total_name(metric.field_name()), Value::from(value));
            }
        }

        for (category, measures) in &self.by_category {
            let label = free_category_label(&out, category);
            if label != *category {
                tracing::debug!(
                    "Category \"{}\" clashes with existing fields, flattened as \"{}\"",
                    category,
                    label
                );
            }
            for measure in Measure::ALL {
                out.insert(
                    format!("{}_{}", measure.field_name(), label),
                    Value::from(measures.get(measure)),
                );
            }
            for metric in DerivedMetric::ALL {
                if let Some(value) = self.derived_value(metric, Some(category.as_str())) {
                    out.insert(
                        format!("{}_{}", metric.field_name(), label),
                        Value::from(value),
                    );
                }
            }
        }

        out
    }
}

/// Smallest `<category>(_category)*` label none of whose flattened field
/// names are already taken in `out`.
fn free_category_label(out: &Map<String, Value>, category: &str) -> String {
    let stems = Measure::ALL
        .iter()
        .map(|m| m.field_name())
        .chain(DerivedMetric::ALL.iter().map(|m| m.field_name()));

    let mut label = category.to_string();
    while stems
        .clone()
        .any(|stem| out.contains_key(&format!("{}_{}", stem, label)))
    {
        label.push_str("_category");
    }
    label
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn measures(h: f64, c: f64, p: f64, s: f64) -> Measures {
        Measures {
            ms_hours_used: h,
            cost_per_run: c,
            ppis_identified: p,
            compounds_screened: s,
        }
    }

    #[test]
    fn test_raw_record_first_present_skips_null() {
        let raw = RawRecord::new()
            .with("End Date", Value::Null)
            .with("end_date", "2024-01-15");
        let keys = vec!["End Date".to_string(), "end_date".to_string()];
        let (key, value) = raw.first_present(&keys).unwrap();
        assert_eq!(key, "end_date");
        assert_eq!(value, &json!("2024-01-15"));
    }

    #[test]
    fn test_raw_record_deserializes_from_object() {
        let raw: RawRecord =
            serde_json::from_value(json!({"Experiment Type": "XLMS Screening"})).unwrap();
        assert_eq!(raw.get("Experiment Type"), Some(&json!("XLMS Screening")));
    }

    #[test]
    fn test_measures_combine_elementwise() {
        let a = measures(1.0, 2.0, 3.0, 4.0);
        let b = measures(10.0, 20.0, 30.0, 40.0);
        assert_eq!(a + b, measures(11.0, 22.0, 33.0, 44.0));
    }

    #[test]
    fn test_measures_sum_of_empty_is_zero() {
        let total: Measures = Vec::<Measures>::new().iter().sum();
        assert_eq!(total, Measures::default());
    }

    #[test]
    fn test_measure_get_matches_field() {
        let m = measures(1.0, 2.0, 3.0, 4.0);
        let values: Vec<f64> = Measure::ALL.iter().map(|&k| m.get(k)).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_normalized_record_serializes_flat() {
        let rec = NormalizedRecord {
            month_key: "2024-01".into(),
            category: "A".into(),
            measures: measures(10.0, 100.0, 5.0, 0.0),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["month_key"], json!("2024-01"));
        assert_eq!(v["ms_hours_used"], json!(10.0));
        assert_eq!(v["compounds_screened"], json!(0.0));
    }

    #[test]
    fn test_total_variants() {
        assert!(DerivedMetric::CostPerPpi.has_total_variant());
        assert!(DerivedMetric::CostK.has_total_variant());
        assert!(!DerivedMetric::CompoundsPerMsHour.has_total_variant());
        assert!(!DerivedMetric::CostPerCompound.has_total_variant());
    }

    #[test]
    fn test_flat_map_naming() {
        let mut by_category = BTreeMap::new();
        by_category.insert("A".to_string(), measures(10.0, 100.0, 5.0, 0.0));
        let row = PivotedRow {
            month_key: "2024-01".into(),
            total: measures(10.0, 100.0, 5.0, 0.0),
            by_category,
            derived: None,
        };

        let flat = row.to_flat_map("total");
        assert_eq!(flat["month_key"], json!("2024-01"));
        assert_eq!(flat["ms_hours_used_total"], json!(10.0));
        assert_eq!(flat["cost_per_run_A"], json!(100.0));
        assert!(!flat.contains_key("cost_per_run_B"));

        let legacy = row.to_flat_map("");
        assert_eq!(legacy["ms_hours_used"], json!(10.0));
        assert!(!legacy.contains_key("ms_hours_used_total"));
    }

    #[test]
    fn test_first_present_skips_blank_strings() {
        let raw = RawRecord::new()
            .with("End Date", "  ")
            .with("end_date", "2024-01-15");
        let keys = vec!["End Date".to_string(), "end_date".to_string()];
        assert_eq!(raw.first_present(&keys).unwrap().0, "end_date");

        let blank_only = RawRecord::new().with("End Date", "");
        assert!(blank_only.first_present(&keys).is_none());
    }

    fn two_category_row(first: &str, second: &str) -> PivotedRow {
        let mut by_category = BTreeMap::new();
        by_category.insert(first.to_string(), measures(1.0, 100.0, 2.0, 0.0));
        by_category.insert(second.to_string(), measures(3.0, 50.0, 4.0, 0.0));
        PivotedRow {
            month_key: "2024-01".into(),
            total: by_category.values().sum(),
            by_category,
            derived: None,
        }
    }

    #[test]
    fn test_flat_map_category_named_like_total_suffix() {
        let row = two_category_row("total", "B");
        let flat = row.to_flat_map("total");

        assert_eq!(flat["cost_per_run_total"], json!(150.0));
        assert_eq!(flat["ms_hours_used_total"], json!(4.0));
        assert_eq!(flat["cost_per_run_total_category"], json!(100.0));
        assert_eq!(flat["cost_per_run_B"], json!(50.0));
    }

    #[test]
    fn test_flat_map_custom_suffix_clash() {
        let flat = two_category_row("all", "B").to_flat_map("all");
        assert_eq!(flat["cost_per_run_all"], json!(150.0));
        assert_eq!(flat["cost_per_run_all_category"], json!(100.0));

        // With the default suffix, "all" is an ordinary category.
        let flat = two_category_row("all", "B").to_flat_map("total");
        assert_eq!(flat["cost_per_run_all"], json!(100.0));
    }

    #[test]
    fn test_flat_map_clash_with_renamed_category() {
        let flat = two_category_row("total", "total_category").to_flat_map("total");
        assert_eq!(flat["cost_per_run_total"], json!(150.0));
        assert_eq!(flat["cost_per_run_total_category"], json!(100.0));
        assert_eq!(flat["cost_per_run_total_category_category"], json!(50.0));
    }

    #[test]
    fn test_category_value_absent_is_none() {
        let row = PivotedRow {
            month_key: "2024-01".into(),
            total: Measures::default(),
            by_category: BTreeMap::new(),
            derived: None,
        };
        assert_eq!(row.category_value("B", Measure::MsHoursUsed), None);
        assert_eq!(row.derived_value(DerivedMetric::CostK, None), None);
    }
}
