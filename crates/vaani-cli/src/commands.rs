//! Main commands enum and subcommands.
//!
//! This module defines the available commands for the CLI tool.

use std::path::PathBuf;

use clap::Subcommand;
use vaani::Language;

/// Available commands for the narration tool.
#[derive(Subcommand)]
pub enum Commands {
    /// Speak a piece of text aloud
    Say {
        /// Text to narrate
        text: String,

        /// Language of the text ("en" or "ta")
        #[arg(short, long, default_value = "en")]
        language: Language,

        /// Remote synthesis endpoint
        #[arg(long, env = "VAANI_TTS_ENDPOINT")]
        endpoint: Option<String>,

        /// Remote latency budget in milliseconds
        #[arg(long)]
        budget_ms: Option<u64>,

        /// Skip the on-disk clip cache
        #[arg(long)]
        no_cache: bool,

        /// Override the clip cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Override the voice model directory
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// List on-device voices that can load right now
    Voices {
        /// Override the voice model directory
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Manage on-device voice models
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },

    /// Manage the audio clip cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

/// Voice model management commands.
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download any missing voice models
    Ensure {
        /// Only the model for this language ("en" or "ta")
        #[arg(short, long)]
        language: Option<Language>,

        /// Override the voice model directory
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Show which voice models are installed
    Status {
        /// Override the voice model directory
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
}

/// Clip cache commands.
#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show cache location, clip count, and size
    Status {
        /// Override the clip cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Delete all cached clips
    Clear {
        /// Override the clip cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}
