use clap::Parser;
use std::path::{Path, PathBuf};

mod cli;
mod commands;

use cli::{Args, Commands};
use stripemd::config::{get_config_path, load_config_from, validate_config, Config};
use stripemd::error::Result;

fn main() {
    match run() {
        Ok(code) => {
            std::process::exit(code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_selected_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config_from(path);
    }
    let config = Config::default();
    validate_config(&config)?;
    Ok(config)
}

fn run() -> Result<i32> {
    let args = Args::parse();

    let config_path: PathBuf = match &args.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let config = load_selected_config(&config_path);

    let filter = std::env::var("STRIPEMD_LOG").unwrap_or_else(|_| match &config {
        Ok(config) => config.logging.get_filter(),
        Err(_) => "info".to_string(),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Route {
            parent,
            name,
            stripes,
            hash_type,
            json,
        } => {
            commands::print_route(&config?, parent, &name, &stripes, hash_type, json)?;
            Ok(0)
        }
        Commands::Locate { fid, json } => {
            commands::print_location(&config?, fid, json)?;
            Ok(0)
        }
        Commands::Fh { action } => {
            commands::handle_fh_command(action)?;
            Ok(0)
        }
        Commands::Config { action } => {
            commands::handle_config_command(action, &config_path, &config?)?;
            Ok(0)
        }
        Commands::Doctor => {
            let healthy = commands::run_doctor(&config_path)?;
            Ok(if healthy { 0 } else { 1 })
        }
    }
}
