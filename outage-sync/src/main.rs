use clap::Parser;
use outage_sync::config::{Config, FileConfig};
use std::error::Error;
use std::path::PathBuf;

/// Submits a site's outages since 2022, annotated with device names.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// API key sent with every request.
    #[arg(long, env = "KRAKENFLEX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Site to process. Defaults to norwich-pear-tree.
    #[arg(long, env = "SITE_ID")]
    site_id: Option<String>,

    /// Optional YAML file with api, logging and metrics settings.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let _guard = outage_sync::logging::init(&file_config.logging, file_config.metrics.as_ref())?;

    let config = Config::resolve(file_config, cli.api_key, cli.site_id)
        .inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;

    outage_sync::run(config)?;
    Ok(())
}
