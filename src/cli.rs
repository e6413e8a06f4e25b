//! Command-line interface for mobsim
//!
//! The binary runs headless behavior scenarios from JSON configs.

use clap::Parser;
use std::path::PathBuf;

/// Hostile actor behavior scenario runner
#[derive(Parser, Debug)]
#[command(name = "mobsim")]
#[command(about = "Hostile actor behavior scenario runner")]
#[command(version)]
pub struct Args {
    /// JSON scenario config file to run
    #[arg(long, value_name = "CONFIG_FILE")]
    pub scenario: PathBuf,

    /// Output path for the behavior log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum scenario duration in seconds (overrides the config value)
    #[arg(long)]
    pub max_duration: Option<f32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
