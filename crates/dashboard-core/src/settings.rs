use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};

// ── MonthOrder ─────────────────────────────────────────────────────────────────

/// Order in which monthly rows are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MonthOrder {
    /// Ascending by `"YYYY-MM"` key.
    #[default]
    Chronological,
    /// The order in which months were first encountered while grouping.
    FirstSeen,
}

// ── FieldMapping ───────────────────────────────────────────────────────────────

/// Candidate column names for each input field. The first key that is present
/// (and not `null`) in a record wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub end_date: Vec<String>,
    pub category: Vec<String>,
    pub ms_hours_used: Vec<String>,
    pub cost_per_run: Vec<String>,
    pub ppis_identified: Vec<String>,
    pub compounds_screened: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            end_date: names(&["End Date", "end_date"]),
            category: names(&["Experiment Type", "type"]),
            ms_hours_used: names(&["MS Hours Used", "ms_hours_used"]),
            cost_per_run: names(&["Cost per Run (USD)", "cost_per_run"]),
            ppis_identified: names(&["PPIs Identified", "ppis_identified"]),
            compounds_screened: names(&["Compounds Screened", "compounds_screened"]),
        }
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Persisted pipeline configuration, stored as JSON at
/// `~/.lab-dashboard/config.json`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fields: FieldMapping,
    /// Label given to records whose category cell is empty.
    pub unknown_category: String,
    pub month_order: MonthOrder,
    /// Suffix appended to total fields in flattened output; empty means none.
    pub total_suffix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fields: FieldMapping::default(),
            unknown_category: "unknown".to_string(),
            month_order: MonthOrder::default(),
            total_suffix: "total".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Return the default path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".lab-dashboard").join("config.json")
    }

    /// Load the config from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// an error so that a typo in a column name is not silently ignored.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Atomically write the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Reject mappings that could never match a column.
    pub fn validate(&self) -> Result<()> {
        let f = &self.fields;
        let lists = [
            ("end_date", &f.end_date),
            ("category", &f.category),
            ("ms_hours_used", &f.ms_hours_used),
            ("cost_per_run", &f.cost_per_run),
            ("ppis_identified", &f.ppis_identified),
            ("compounds_screened", &f.compounds_screened),
        ];
        for (name, keys) in lists {
            if keys.is_empty() {
                return Err(DashboardError::Config(format!(
                    "fields.{} must list at least one column name",
                    name
                )));
            }
        }
        if self.unknown_category.trim().is_empty() {
            return Err(DashboardError::Config(
                "unknown_category must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly experiment metrics for the lab dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lab-dashboard",
    about = "Monthly experiment metrics for the lab dashboard",
    version
)]
pub struct Settings {
    /// JSON array or JSONL file of raw experiment records
    #[arg(required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Pipeline config file (defaults to ~/.lab-dashboard/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Month ordering of the output rows
    #[arg(long, value_enum)]
    pub month_order: Option<MonthOrder>,

    /// Suffix for total fields ("" for bare metric names)
    #[arg(long)]
    pub total_suffix: Option<String>,

    /// Output format
    #[arg(long, default_value = "json", value_parser = ["json", "summary"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Write the default config file (if absent) and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list,
    /// enabling unit-testing without spawning subprocesses.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Self {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Path of the config file to read.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(PipelineConfig::config_path)
    }

    /// Load the config file and apply CLI overrides (CLI always wins).
    pub fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::load_from(&self.config_path())?;
        if let Some(order) = self.month_order {
            config.month_order = order;
        }
        if let Some(suffix) = &self.total_suffix {
            config.total_suffix = suffix.clone();
        }
        Ok(config)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
