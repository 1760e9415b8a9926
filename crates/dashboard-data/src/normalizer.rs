//! Raw spreadsheet record → [`NormalizedRecord`].

use dashboard_core::data_processors::{DateProcessor, ValueCoercion};
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{Measures, NormalizedRecord, RawRecord};
use dashboard_core::settings::{FieldMapping, PipelineConfig};
use serde_json::Value;

/// Converts raw records using a configured column mapping.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fields: FieldMapping,
    unknown_category: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Normalizer {
    pub fn new(fields: FieldMapping, unknown_category: impl Into<String>) -> Self {
        Self {
            fields,
            unknown_category: unknown_category.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.fields.clone(), config.unknown_category.clone())
    }

    /// Normalize one record.
    ///
    /// Only the end date can fail: a missing date is a
    /// [`DashboardError::Validation`], an unreadable one a
    /// [`DashboardError::DateParse`]. Every measure that is missing or not a
    /// number becomes `0`, and a missing category becomes the configured
    /// placeholder.
    pub fn normalize(&self, raw: &RawRecord) -> Result<NormalizedRecord> {
        let (date_key, date_value) = raw
            .first_present(&self.fields.end_date)
            .ok_or_else(|| {
                DashboardError::validation(self.fields.end_date.join("|"), "end date is missing")
            })?;

        let date = DateProcessor::parse(date_value).ok_or_else(|| {
            DashboardError::DateParse(format!("{} = {}", date_key, describe(date_value)))
        })?;

        let category = ValueCoercion::label(self.lookup(raw, &self.fields.category))
            .unwrap_or_else(|| self.unknown_category.clone());

        let measures = Measures {
            ms_hours_used: ValueCoercion::measure(self.lookup(raw, &self.fields.ms_hours_used)),
            cost_per_run: ValueCoercion::measure(self.lookup(raw, &self.fields.cost_per_run)),
            ppis_identified: ValueCoercion::measure(
                self.lookup(raw, &self.fields.ppis_identified),
            ),
            compounds_screened: ValueCoercion::measure(
                self.lookup(raw, &self.fields.compounds_screened),
            ),
        };

        Ok(NormalizedRecord {
            month_key: DateProcessor::month_key(date),
            category,
            measures,
        })
    }

    fn lookup<'a>(&self, raw: &'a RawRecord, keys: &'a [String]) -> Option<&'a Value> {
        raw.first_present(keys).map(|(_, v)| v)
    }
}

/// Short description of an offending value for error messages.
fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
