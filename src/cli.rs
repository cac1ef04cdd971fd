//! Command-line argument parsing for keytrace

use clap::Parser;
use std::path::PathBuf;

/// Replay a tick script through the input system and print the events it fires
#[derive(Parser, Debug)]
#[command(name = "keytrace", version, about = "Replay key snapshots and print edge events")]
pub struct CliArgs {
    /// Tick script: one line of held keys per tick, `-` for none, `~` for lost capture
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Print one JSON object per event
    #[arg(long)]
    pub json: bool,

    /// Also bind KEY directly and report how often it fired
    #[arg(long = "watch", value_name = "KEY")]
    pub watch: Vec<String>,

    /// Read settings from this file instead of the default config
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
