use lightwall::app::EditorApp;
use lightwall::cli::Args;
use lightwall::config::{self, PathConfig};
use lightwall::settings::{EditorSettings, SETTINGS_FILE};

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use log::{debug, info, warn};

fn init_logging(args: &Args, path_config: &PathConfig) -> anyhow::Result<()> {
    let log_level = args.log_level();

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| path_config.data_file(config::LOG_FILE));
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
        // Console logging; RUST_LOG wins over -v
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level.as_str()))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = path_config.ensure_dirs() {
        eprintln!("Warning: {:#}", e);
    }

    init_logging(&args, &path_config)?;

    info!("lightwall {} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    let settings_path = path_config.config_file(SETTINGS_FILE);
    info!("Settings: {}", settings_path.display());
    let settings = EditorSettings::load_or_init(&settings_path).unwrap_or_else(|e| {
        warn!("{:#}; using default settings", e);
        EditorSettings::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("lightwall v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1280.0, 800.0])
            .with_resizable(true)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "lightwall",
        native_options,
        Box::new(move |cc| {
            let mut app = EditorApp::new(settings)?;
            app.attach_context(&cc.egui_ctx);
            if args.has_scene_input() {
                info!("Preloading scene from command line");
                app.preload(&args);
            }
            Ok(Box::new(app))
        }),
    )?;

    info!("Application exiting");
    Ok(())
}
