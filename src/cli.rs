use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "HTTP:   rouille (sync)\n",
    "Window: eframe/egui\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Toy painter: draws scripts submitted over HTTP
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Ingest server port (overrides settings)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Ingest server bind address (overrides settings)
    #[arg(long = "bind", value_name = "ADDR")]
    pub bind: Option<String>,

    /// Canvas width in pixels (overrides settings)
    #[arg(long = "width", value_name = "PX")]
    pub width: Option<u32>,

    /// Canvas height in pixels (overrides settings)
    #[arg(long = "height", value_name = "PX")]
    pub height: Option<u32>,

    /// Run without a window; scenes are only logged
    #[arg(long = "headless")]
    pub headless: bool,

    /// Enable logging to file (default: painter.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Level filter for the verbosity count
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
