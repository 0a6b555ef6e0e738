//! Application runner: logging, settings, and wiring of loop, server and window.

use anyhow::Context;
use crossbeam_channel::Receiver;
use log::{debug, info, warn};

use crate::cli::Args;
use crate::config::{self, PathConfig, Settings};
use crate::core::canvas::{Canvas, Scene};
use crate::core::op_loop::Loop;
use crate::server::{ApiServer, IngestLimits};
use crate::ui::{self, CanvasStyle, WindowConfig};

/// Initialize env_logger from CLI flags.
///
/// Console logging honours `RUST_LOG`; `--log` writes to a file instead.
pub fn init_logging(args: &Args, path_config: &PathConfig) -> anyhow::Result<()> {
    let log_level = args.log_level();

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level.as_str()))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// CLI flags take priority over the settings file.
pub fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(ref bind) = args.bind {
        settings.bind = bind.clone();
    }
    if let Some(width) = args.width {
        settings.canvas_width = width.max(1);
    }
    if let Some(height) = args.height {
        settings.canvas_height = height.max(1);
    }
}

/// Run painter until the window closes (or forever in headless mode).
pub fn run_app(args: Args, path_config: PathConfig) -> anyhow::Result<()> {
    info!("Painter starting...");
    debug!("Command-line args: {:?}", args);

    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    let mut settings = Settings::load(&settings_path);
    if !settings_path.exists() {
        // Leave an editable file behind on first run
        match settings.save(&settings_path) {
            Ok(()) => info!("Wrote default settings to {}", settings_path.display()),
            Err(e) => warn!("{:#}", e),
        }
    }
    apply_overrides(&mut settings, &args);
    debug!("Settings: {:?}", settings);

    let mut op_loop = Loop::new();
    let limits = IngestLimits {
        max_script_bytes: settings.max_script_bytes,
    };
    let server = ApiServer::start(&settings.listen_addr(), op_loop.poster(), limits)?;
    let (width, height) = (settings.canvas_width, settings.canvas_height);
    let canvas = Canvas::new(width, height);
    let scene_rx = canvas.scenes();

    let result = if args.headless {
        run_headless(&mut op_loop, canvas, &scene_rx)
    } else {
        let window = WindowConfig {
            title: settings.title.clone(),
            canvas_width: width,
            canvas_height: height,
            style: CanvasStyle {
                base_color: settings.base_color,
                border_color: settings.border_color,
                border_width: settings.border_width,
            },
            listen_addr: server.addr().to_string(),
        };
        let poster = op_loop.poster();

        ui::run(window, poster, scene_rx, |ctx| {
            info!("Screen ready, starting command loop");
            op_loop
                .start(canvas.with_context(ctx.clone()))
                .context("Failed to start command loop")
        })
    };

    server.stop();
    op_loop.stop_and_wait();
    info!("Painter stopped");
    result
}

/// Apply operations without a window, logging each published scene.
fn run_headless(op_loop: &mut Loop, canvas: Canvas, scenes: &Receiver<Scene>) -> anyhow::Result<()> {
    op_loop.start(canvas).context("Failed to start command loop")?;
    info!("Running headless, serving until terminated");

    // The canvas keeps its sender for the life of the loop, so this only
    // ends if the consumer thread goes away.
    for scene in scenes.iter() {
        debug!(
            "Frame {}: {} figures, background {:?}, position {:?}",
            scene.frame,
            scene.figures.len(),
            scene.background,
            scene.position
        );
    }
    Ok(())
}
