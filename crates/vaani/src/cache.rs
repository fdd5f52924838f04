//! On-disk clip cache for the remote channel.
//!
//! The remote service synthesizes a given (text, language) pair to the
//! same clip every time, so clips are cached content-addressed: the key
//! is the SHA-256 of `"{text}-{lang}"` and the payload is the mp3 as
//! fetched. Repeated narrations of the same label then cost no network
//! round trip at all.

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::language::Language;

/// Content-addressed cache of remote clips.
#[derive(Debug, Clone)]
pub struct AudioCache {
    dir: PathBuf,
}

/// Clip count and total payload size, for CLI status output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub clips: usize,
    pub bytes: u64,
}

impl AudioCache {
    /// Cache rooted at `dir`. The directory is created lazily on first store.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory this cache stores clips under.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a (text, language) pair.
    #[must_use]
    pub fn clip_path(&self, text: &str, language: Language) -> PathBuf {
        let key = Sha256::digest(format!("{text}-{}", language.tag()));
        self.dir.join(format!("{key:x}.mp3"))
    }

    /// Fetch a cached clip, or `None` on miss.
    pub async fn load(&self, text: &str, language: Language) -> Option<Vec<u8>> {
        let path = self.clip_path(text, language);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "clip cache hit");
                Some(bytes)
            }
            Err(_) => None,
        }
    }

    /// Store a clip for a (text, language) pair.
    ///
    /// Failures are logged and swallowed; caching is an optimization and
    /// never a reason to fail the narration that produced the clip.
    pub async fn store(&self, text: &str, language: Language, bytes: &[u8]) {
        let path = self.clip_path(text, language);
        if let Err(e) = self.write_clip(&path, bytes).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to cache clip");
        }
    }

    async fn write_clip(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(path, bytes).await
    }

    /// Count cached clips and their total size.
    pub async fn stats(&self) -> io::Result<CacheStats> {
        let mut stats = CacheStats::default();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(stats),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "mp3") {
                stats.clips += 1;
                stats.bytes += entry.metadata().await?.len();
            }
        }
        Ok(stats)
    }

    /// Delete every cached clip, returning how many were removed.
    pub async fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "mp3") {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
