//! Content-addressed on-disk cache for synthesized audio.
//!
//! Every synthesis request maps to one file, `{root}/{key}.mp3`, where `key`
//! is the SHA-256 of the request fields. There is no index: existence, count
//! and size are always read back from the directory, so nothing has to be
//! reconciled after a crash.
//!
//! ## Cache Key Components
//!
//! The key is the lowercase hex SHA-256 of `text|voice|rate|pitch`. Fields
//! are hashed as given (no trimming or normalization) and the `|` separator
//! is not escaped, so `("a|b", "c")` and `("a", "b|c")` share a key. Keys
//! written by earlier releases stay valid because of this.
//!
//! ## Failure Policy
//!
//! The cache only ever accelerates synthesis:
//!
//! | Operation | On failure |
//! |-----------|------------|
//! | `lookup` | miss |
//! | `store` | [`StoreOutcome::Skipped`] + `warn!` |
//! | `stats` | zeroed stats + `warn!` |
//! | `clear` | best-effort count, undeletable entries are skipped |
//!
//! ## Examples
//!
//! ```ignore
//! use tts_lib::{AudioCache, SpeechRequest};
//!
//! let cache = AudioCache::new("/tmp/tts-cache");
//! let request = SpeechRequest::new("Hello world");
//!
//! if cache.lookup(&request).await.is_none() {
//!     let audio = synthesize(&request).await?;
//!     cache.store(&request, &audio).await;
//! }
//! ```

use std::ffi::OsStr;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::errors::CacheError;
use crate::types::{AUDIO_MPEG, SpeechRequest};

/// Suffix shared by every cache entry.
pub const ENTRY_SUFFIX: &str = ".mp3";

/// Directory name under `~/.cache`.
const CACHE_DIR_NAME: &str = "tts-cli";

/// Distinguishes temp files written by the same process in the same instant.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// Cache Key
// ============================================================================

/// A 64 character lowercase hex digest identifying one synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a `(text, voice, rate, pitch)` tuple.
    ///
    /// Pure and infallible; the empty string is a valid value for every field.
    pub fn derive(text: &str, voice: &str, rate: &str, pitch: &str) -> Self {
        let input = format!("{text}|{voice}|{rate}|{pitch}");
        Self(hex::encode(Sha256::digest(input.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Results
// ============================================================================

/// A cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAudio {
    /// The stored payload, byte for byte.
    pub bytes: Vec<u8>,
    /// Always `audio/mpeg`.
    pub content_type: &'static str,
}

impl CachedAudio {
    fn mpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: AUDIO_MPEG,
        }
    }
}

/// Aggregate size of the cache root.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Number of `.mp3` entries directly inside the root.
    pub file_count: usize,
    /// Sum of their sizes in bytes.
    pub total_bytes: u64,
    /// Directory that was inspected.
    pub cache_root: PathBuf,
}

impl CacheStats {
    fn empty(cache_root: PathBuf) -> Self {
        Self {
            file_count: 0,
            total_bytes: 0,
            cache_root,
        }
    }

    /// Total size in MiB, unrounded.
    pub fn total_size_mb(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// What happened to a [`AudioCache::store`] call.
///
/// A skipped store has already been logged; callers may ignore it.
#[derive(Debug)]
pub enum StoreOutcome {
    /// The entry was written to this path.
    Stored(PathBuf),
    /// Caching failed; the audio is still good to use.
    Skipped(CacheError),
}

impl StoreOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, StoreOutcome::Stored(_))
    }
}

// ============================================================================
// Audio Cache
// ============================================================================

/// Directory-backed audio store.
///
/// Holds only its root path. Cloning is cheap and clones share the same
/// directory, which is the only shared state.
#[derive(Debug, Clone)]
pub struct AudioCache {
    root: PathBuf,
}

impl AudioCache {
    /// Create a cache rooted at `root`. Nothing is touched on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a cache at [`AudioCache::default_root`].
    pub fn with_default_root() -> Self {
        Self::new(Self::default_root())
    }

    /// `~/.cache/tts-cli`, or `{temp}/tts-cli` when there is no home directory.
    pub fn default_root() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".cache").join(CACHE_DIR_NAME),
            None => std::env::temp_dir().join(CACHE_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for `key`. Does not check that it exists.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}{ENTRY_SUFFIX}"))
    }

    /// Create the root and any missing parents. Succeeds if it already exists.
    pub async fn ensure_ready(&self) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CacheError::CreateDir {
                path: self.root.clone(),
                source,
            })
    }

    /// Return the cached audio for `request`, or `None`.
    ///
    /// A missing root, a missing entry and an unreadable entry all count as
    /// a miss.
    pub async fn lookup(&self, request: &SpeechRequest) -> Option<CachedAudio> {
        let key = request.cache_key();
        let path = self.path_for(&key);

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(key = %key, bytes = bytes.len(), "audio cache hit");
                Some(CachedAudio::mpeg(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "audio cache miss");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cache entry, treating as miss");
                None
            }
        }
    }

    /// Save `audio` as the entry for `request`, replacing any previous one.
    ///
    /// Never fails: errors are logged and returned as
    /// [`StoreOutcome::Skipped`].
    pub async fn store(&self, request: &SpeechRequest, audio: &[u8]) -> StoreOutcome {
        match self.try_store(request, audio).await {
            Ok(path) => {
                debug!(path = %path.display(), bytes = audio.len(), "saved audio to cache");
                StoreOutcome::Stored(path)
            }
            Err(err) => {
                warn!(error = %err, "failed to save audio to cache");
                StoreOutcome::Skipped(err)
            }
        }
    }

    async fn try_store(&self, request: &SpeechRequest, audio: &[u8]) -> Result<PathBuf, CacheError> {
        self.ensure_ready().await?;
        let path = self.path_for(&request.cache_key());
        write_atomic(&path, audio).await?;
        Ok(path)
    }

    /// Count and size the entries in the cache root.
    ///
    /// Creates the root when missing. Any failure yields zeroed stats.
    pub async fn stats(&self) -> CacheStats {
        match self.try_stats().await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "failed to get cache stats");
                CacheStats::empty(self.root.clone())
            }
        }
    }

    async fn try_stats(&self) -> Result<CacheStats, CacheError> {
        self.ensure_ready().await?;

        let mut stats = CacheStats::empty(self.root.clone());
        for (_, len) in self.entries().await? {
            stats.file_count += 1;
            stats.total_bytes += len;
        }
        Ok(stats)
    }

    /// Delete every entry and return how many were removed.
    ///
    /// Entries that cannot be deleted are logged and skipped, so the count
    /// is best-effort. A missing root is an empty cache.
    pub async fn clear(&self) -> usize {
        let entries = match self.entries().await {
            Ok(entries) => entries,
            Err(CacheError::ReadDir { source, .. }) if source.kind() == ErrorKind::NotFound => {
                return 0;
            }
            Err(err) => {
                warn!(error = %err, "failed to clear cache");
                return 0;
            }
        };

        let mut removed = 0;
        for (path, _) in entries {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                // raced with another clear
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete cache entry");
                }
            }
        }

        debug!(removed, root = %self.root.display(), "cleared audio cache");
        removed
    }

    /// Regular `.mp3` files directly inside the root, with their sizes.
    async fn entries(&self) -> Result<Vec<(PathBuf, u64)>, CacheError> {
        let read_err = |source: std::io::Error| CacheError::ReadDir {
            path: self.root.clone(),
            source,
        };

        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(read_err)?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await.map_err(read_err)? {
            if !is_entry_name(&entry.file_name()) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(read_err(e)),
            };
            if metadata.is_file() {
                entries.push((entry.path(), metadata.len()));
            }
        }

        Ok(entries)
    }
}

fn is_entry_name(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.ends_with(ENTRY_SUFFIX))
}

// ============================================================================
// Atomic Write
// ============================================================================

/// Atomically write data to a file.
///
/// Writes a hidden `.tmp` sibling and renames it over `path`, so a reader
/// sees either the old content or the new content, never a partial file.
/// The temp name never ends in `.mp3` and is invisible to `stats`/`clear`.
///
/// ## Errors
///
/// Returns `CacheError::CreateDir` if the parent cannot be created and
/// `CacheError::Write` if the write or rename fails. The temp file is
/// removed on failure.
pub async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| CacheError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent.join(format!(
        ".{}.{}-{}-{}.tmp",
        file_name,
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = match write_synced(&temp_path, data).await {
        Ok(()) => tokio::fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };

    if let Err(source) = result {
        if let Err(e) = tokio::fs::remove_file(&temp_path).await
            && e.kind() != ErrorKind::NotFound
        {
            debug!(path = %temp_path.display(), error = %e, "failed to remove temp file");
        }
        return Err(CacheError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

// ============================================================================
// Tests
// ============================================================================
