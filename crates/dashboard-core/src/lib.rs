//! Shared types for the lab dashboard.
//!
//! Record and measure models, the error taxonomy, lenient value coercion for
//! spreadsheet cells, configuration, and number formatting.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{DashboardError, Result};
