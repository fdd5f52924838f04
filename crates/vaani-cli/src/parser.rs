//! Root argument parser.
//!
//! Global flags live here; the subcommand tree is in [`crate::commands`].

use clap::Parser;

use crate::commands::Commands;

/// Top-level command line for the narration tool.
#[derive(Parser)]
#[command(name = "vaani")]
#[command(about = "Speak text through a remote service with on-device fallback")]
#[command(version)]
pub struct Cli {
    /// Verbose (debug-level) logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
