//! Voices command handler.
//!
//! Lists the on-device voices that can actually load from disk right now,
//! which is also a quick health check for the fallback channel.

use std::path::PathBuf;

use anyhow::{Context, Result};
use vaani::{LocalConfig, LocalSynthesizer, SherpaSynthesizer, default_model_dir};

/// Execute the voices command.
pub fn execute(model_dir: Option<PathBuf>) -> Result<()> {
    let root = model_dir
        .or_else(default_model_dir)
        .context("no voice model directory available on this platform")?;

    match SherpaSynthesizer::load(&root, &LocalConfig::default()) {
        Ok(synth) => {
            println!("On-device voices in {}:", root.display());
            for voice in synth.voices() {
                println!(
                    "  {:<16} {:<28} {} ({})",
                    voice.id,
                    voice.name,
                    voice.language.display_name(),
                    voice.provider
                );
            }
        }
        Err(e) => {
            println!("No on-device voices available: {e}");
            println!("Run `vaani models ensure` to install them.");
        }
    }
    Ok(())
}
