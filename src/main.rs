use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use sealice_map::config::{Config, ConfigError};
use sealice_map::context::SeaLiceContext;
use sealice_map::grid::pyramid::build_tiers;
use sealice_map::pipeline::Dashboard;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sea-lice dispersion overlay renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the overlay for the session and viewport in a config file.
    Render {
        #[arg(long)]
        config: PathBuf,
    },
    /// Build the 50 to 800 m tiers from the finest density layers.
    BuildTiers {
        /// Directory with `current/` and `planned/` GeoTIFFs.
        #[arg(long)]
        source: PathBuf,
        /// Grid root the `map_<res>m` directories are written to.
        #[arg(long)]
        output: PathBuf,
    },
}

fn run_render(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(&config_path)?;
    let viewport = *config
        .viewport()
        .ok_or_else(|| ConfigError::Viewport("a viewport is required to render".to_string()))?;

    let context = Arc::new(SeaLiceContext::load(&config)?);
    let dashboard = Dashboard::new(context, config.params().clone());
    let response = dashboard.render(&viewport)?;

    let out_dir = config.output_directory();
    fs::create_dir_all(out_dir)?;
    if let Some(overlay) = &response.overlay {
        let png_path = out_dir.join("overlay.png");
        fs::write(&png_path, &overlay.png)?;
        info!(path = %png_path.display(), width = overlay.width, height = overlay.height, "overlay written");
    }
    for warning in &response.warnings {
        warn!(?warning, "render warning");
    }

    let json_path = out_dir.join("overlay.json");
    fs::write(&json_path, serde_json::to_string_pretty(&response)?)?;
    info!(
        path = %json_path.display(),
        total_biomass_kg = response.aggregates.total_biomass_kg(),
        total_lice_release = response.aggregates.total_lice_release,
        "summary written"
    );

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render { config } => run_render(config),
        Command::BuildTiers { source, output } => {
            let count = build_tiers(&source, &output)?;
            info!(layers = count, output = %output.display(), "tiers built");
            Ok(())
        }
    }
}
