use clap::Parser;
use std::path::PathBuf;

use crate::core::LoopMode;
use crate::entities::{TimeStepInterval, Timestamp, parse_timestamp};

/// Time slider core driver: prints steps and tick layout, then plays
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Full extent start (RFC 3339, "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD")
    #[arg(long = "start", value_name = "TIME", value_parser = parse_timestamp)]
    pub start: Timestamp,

    /// Full extent end
    #[arg(long = "end", value_name = "TIME", value_parser = parse_timestamp)]
    pub end: Timestamp,

    /// Step interval, e.g. "1 day", "3 days", "15 min", "1 month"
    #[arg(short = 'i', long = "interval", value_name = "INTERVAL")]
    pub interval: Option<TimeStepInterval>,

    /// Initial current extent (defaults to the full extent)
    #[arg(long = "current", value_names = ["START", "END"], num_args = 2, value_parser = parse_timestamp)]
    pub current: Option<Vec<Timestamp>>,

    /// Pin the current extent start
    #[arg(long = "pin-start")]
    pub pin_start: bool,

    /// Pin the current extent end
    #[arg(long = "pin-end")]
    pub pin_end: bool,

    /// Loop mode at the end of the range: none, repeat, reverse
    #[arg(short = 'o', long = "loop", value_name = "MODE")]
    pub loop_mode: Option<LoopMode>,

    /// Play backward
    #[arg(short = 'b', long = "backward")]
    pub backward: bool,

    /// Time between playback steps in milliseconds
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Number of playback ticks to run (0: don't play)
    #[arg(short = 'n', long = "ticks", value_name = "N", default_value_t = 10)]
    pub ticks: usize,

    /// Track length used for positions and tick layout
    #[arg(short = 'w', long = "width", value_name = "UNITS")]
    pub width: Option<f64>,

    /// Save the effective settings to the config directory
    #[arg(long = "save-settings")]
    pub save_settings: bool,

    /// Enable logging to file (default: timeslider.log in the data directory)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}
