//! Monthly experiment pipeline for the lab dashboard.
//!
//! Normalizes raw spreadsheet records, sums them per category and month,
//! pivots months across categories, and derives ratio metrics for charting.

pub mod aggregator;
pub mod analysis;
pub mod grouper;
pub mod metrics;
pub mod normalizer;
pub mod pivot;
pub mod reader;
pub mod summary;

pub use dashboard_core as core;
