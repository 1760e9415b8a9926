mod bootstrap;
mod report;

use anyhow::{bail, Context, Result};
use dashboard_core::settings::Settings;
use dashboard_data::analysis::analyze_records;
use dashboard_data::reader::load_raw_records;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;
    tracing::info!("Lab Dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    if settings.init_config {
        bootstrap::write_default_config(&settings.config_path())?;
        return Ok(());
    }

    let config = settings
        .resolve_config()
        .with_context(|| format!("loading {}", settings.config_path().display()))?;
    tracing::debug!(
        "Month order: {:?}, total suffix: {:?}",
        config.month_order,
        config.total_suffix
    );

    let Some(input) = settings.input.as_ref() else {
        bail!("no input file given");
    };
    let records = load_raw_records(input)?;
    let result = analyze_records(&records, &config);

    match settings.format.as_str() {
        "summary" => print!("{}", report::render_summary(&result)),
        _ => {
            let rows = result.flat_rows(&config.total_suffix);
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
