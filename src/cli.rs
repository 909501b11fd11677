use clap::Parser;
use std::path::PathBuf;

/// Plan light projections on a building facade
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Wall photo to use as background (optional, can also be chosen from the toolbar)
    #[arg(value_name = "BACKGROUND")]
    pub background: Option<PathBuf>,

    /// Wall width in meters
    #[arg(long = "width", value_name = "M")]
    pub width_meters: Option<f32>,

    /// Wall height in meters
    #[arg(long = "height", value_name = "M")]
    pub height_meters: Option<f32>,

    /// Layer image to add (can be specified multiple times)
    #[arg(short = 'l', long = "layer", value_name = "FILE")]
    pub layers: Vec<PathBuf>,

    /// Side of one projector's square projection, in meters
    #[arg(long = "projector-size", value_name = "M")]
    pub projector_size_meters: Option<f32>,

    /// Enable logging to file (default: lightwall.log in the data directory)
    #[arg(long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn has_scene_input(&self) -> bool {
        self.background.is_some() || !self.layers.is_empty()
    }
}
