use clap::Parser;
use log::info;

use painter::cli::Args;
use painter::config::{self, PathConfig};
use painter::runner;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());

    // Ensure directories exist (the log file may live there)
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {:#}", e);
    }

    runner::init_logging(&args, &path_config)?;

    info!("Painter v{}", env!("CARGO_PKG_VERSION"));

    runner::run_app(args, path_config)?;
    Ok(())
}
