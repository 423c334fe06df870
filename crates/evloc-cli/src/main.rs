mod locate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "evloc")]
#[command(about = "EV charging station finder")]
struct Cli {
    /// Station catalog CSV; overrides `EVLOC_CATALOG_PATH`.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Directory holding the rendered plot; overrides `EVLOC_ARTIFACT_DIR`.
    #[arg(long, global = true)]
    artifact_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find the station closest to a location and plot it.
    Nearest {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Find the most powerful station within `range` of a location.
    Best {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, allow_negative_numbers = true)]
        range: f64,
    },
    /// Write the last rendered plot as a PDF.
    Export {
        #[arg(long, default_value = "result.pdf")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = evloc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }
    if let Some(dir) = cli.artifact_dir {
        config.artifact_dir = dir;
    }

    match cli.command {
        Commands::Nearest { lat, lng } => locate::run_nearest(&config, lat, lng),
        Commands::Best { lat, lng, range } => locate::run_best(&config, lat, lng, range),
        Commands::Export { out } => locate::run_export(&config, &out),
    }
}

#[cfg(test)]
mod tests;
