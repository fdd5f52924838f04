//! Cache subcommand handlers: clip cache inspection and cleanup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::HumanBytes;
use vaani::{AudioCache, default_cache_dir};

fn resolve_dir(cache_dir: Option<PathBuf>) -> Result<PathBuf> {
    cache_dir
        .or_else(default_cache_dir)
        .context("no cache directory available on this platform")
}

/// Execute `cache status`.
pub async fn status(cache_dir: Option<PathBuf>) -> Result<()> {
    let dir = resolve_dir(cache_dir)?;
    let stats = AudioCache::new(dir.clone()).stats().await?;

    println!("Clip cache: {}", dir.display());
    println!("  {} clips, {}", stats.clips, HumanBytes(stats.bytes));
    Ok(())
}

/// Execute `cache clear`.
pub async fn clear(cache_dir: Option<PathBuf>) -> Result<()> {
    let dir = resolve_dir(cache_dir)?;
    let cache = AudioCache::new(dir);
    let stats = cache.stats().await?;
    let removed = cache.clear().await?;

    println!("Removed {} cached clips ({})", removed, HumanBytes(stats.bytes));
    Ok(())
}
