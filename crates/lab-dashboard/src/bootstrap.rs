use std::path::Path;

use dashboard_core::settings::PipelineConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` value to a tracing filter directive.
fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr so that
/// stdout carries only the pipeline output.
///
/// `RUST_LOG`, when set, takes precedence over `log_level`.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

// ── Config bootstrap ───────────────────────────────────────────────────────────

/// Write the default pipeline config to `path` unless a file already exists.
///
/// Returns `true` when a file was written.
pub fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        tracing::info!("Config already present at {}", path.display());
        return Ok(false);
    }
    PipelineConfig::default().save_to(path)?;
    tracing::info!("Wrote default config to {}", path.display());
    Ok(true)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
