use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "upwatch")]
#[command(about = "Check the upload listings once and announce new files")]
pub struct Args {
    /// JSON config file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Manual verification run: replay cached pages and look back a week
    #[arg(long)]
    pub replay: bool,

    /// Detect and log, but send nothing (overrides `debug` in the config)
    #[arg(long)]
    pub dry_run: bool,

    /// Log at debug level
    #[arg(long, short)]
    pub verbose: bool,

    /// Also write the log to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
