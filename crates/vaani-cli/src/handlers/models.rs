//! Models subcommand handlers: voice model install and status.

use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use vaani::{Language, VoiceModelCatalog, default_model_dir, ensure_voice_model};

fn resolve_root(model_dir: Option<PathBuf>) -> Result<PathBuf> {
    model_dir
        .or_else(default_model_dir)
        .context("no voice model directory available on this platform")
}

/// Execute `models ensure`: download whatever is missing.
pub async fn ensure(language: Option<Language>, model_dir: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(model_dir)?;
    let targets: Vec<Language> = language.map_or_else(|| Language::ALL.to_vec(), |l| vec![l]);

    for lang in targets {
        let model = VoiceModelCatalog::for_language(lang)
            .with_context(|| format!("no catalog voice for {lang}"))?;

        if VoiceModelCatalog::is_downloaded(&root, &model) {
            println!("{} is already installed", model.name);
            continue;
        }

        println!("Downloading {} ({})...", model.name, model.size_display);
        let bar = ProgressBar::new(model.size_bytes);
        bar.set_style(download_style());
        let dir = ensure_voice_model(&root, lang, |downloaded, total| {
            if total > 0 {
                bar.set_length(total);
            }
            bar.set_position(downloaded);
        })
        .await
        .with_context(|| format!("failed to install {}", model.name))?;
        bar.finish_and_clear();
        println!("Installed {} at {}", model.name, dir.display());
    }
    Ok(())
}

/// Execute `models status`: show the catalog with install state.
pub fn status(model_dir: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(model_dir)?;
    println!("Voice model directory: {}", root.display());

    for model in VoiceModelCatalog::tts_models() {
        let mark = if VoiceModelCatalog::is_downloaded(&root, &model) {
            "installed"
        } else {
            "missing (run `vaani models ensure`)"
        };
        println!(
            "  {:<10} {:<28} {:>6}  {}",
            model.language.display_name(),
            model.name,
            model.size_display,
            mark
        );
    }
    Ok(())
}

fn download_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {bar:28.cyan/blue} {bytes:>9} / {total_bytes:>9} ({percent:>3}%) @ {bytes_per_sec}",
    )
    .unwrap()
}
