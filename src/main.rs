//! Magic Registry CLI
//!
//! Entry point for the `magic-registry` command-line tool.

use clap::Parser;
use magic_registry::config::DEFAULT_CONFIG_FILE;
use magic_registry::{CatalogBuilder, RegistryConfig};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "magic-registry")]
#[command(about = "Merge .magic artifacts into the model registry", version)]
struct Cli {
    /// Path to config file (default: magic-registry.toml if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory scanned for artifacts (default: magic/upload)
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Registry file to update (default: magic/manifest.json)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Remove entries whose artifact is no longer in the upload directory
    #[arg(long)]
    prune: bool,

    /// Keep a copy of a corrupt registry file before overwriting it
    #[arg(long)]
    backup_corrupt: bool,

    /// Output the scan report in JSON format
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let report = match CatalogBuilder::new(config).run() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if cli.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", report.to_human());
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<RegistryConfig, magic_registry::ConfigError> {
    let default_file = PathBuf::from(DEFAULT_CONFIG_FILE);
    let config_path = match cli.config {
        Some(ref path) => Some(path.as_path()),
        None if default_file.exists() => Some(default_file.as_path()),
        None => None,
    };

    let mut config = RegistryConfig::load(config_path)?;

    let mut overridden = false;
    if let Some(ref dir) = cli.upload_dir {
        config.upload_dir = dir.clone();
        overridden = true;
    }
    if let Some(ref path) = cli.registry {
        config.registry_path = path.clone();
        overridden = true;
    }
    if cli.prune {
        config.prune = true;
        overridden = true;
    }
    if cli.backup_corrupt {
        config.backup_corrupt = true;
        overridden = true;
    }
    if overridden {
        config.mark_cli_override();
    }

    Ok(config)
}
