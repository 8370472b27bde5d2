mod bootstrap;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use energy_core::settings::Settings;
use energy_runtime::session::DashboardSession;

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("Energy dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings
        .resolve_config()
        .context("failed to load configuration")?;
    tracing::info!(
        denylist = config.denylist.len(),
        baseline = config.baseline.enabled,
        "configuration resolved"
    );

    if settings.save_config {
        let path = settings.config_file();
        config
            .save_to(&path)
            .with_context(|| format!("failed to save configuration to {}", path.display()))?;
        tracing::info!(path = %path.display(), "configuration saved");
    }

    if settings.paths.is_empty() {
        if settings.save_config {
            return Ok(());
        }
        anyhow::bail!("no input files given; pass one or more CSV files or directories");
    }

    let mut session = DashboardSession::new(config);
    let loaded = session.load_paths(&settings.paths);
    tracing::info!(files = loaded, "input files read");
    session.set_selection(settings.selection());

    let view = session.render();

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", report::render(&view));
    }

    Ok(())
}
