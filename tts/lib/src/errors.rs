use std::path::PathBuf;

/// Failures of the on-disk audio cache.
///
/// None of these ever escape [`AudioCache::lookup`](crate::AudioCache::lookup)
/// or [`AudioCache::stats`](crate::AudioCache::stats); `store` reports them
/// as a skipped outcome and a `tracing` warning.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache root (or one of its parents) could not be created.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming an entry failed.
    #[error("failed to write cache entry {path}: {source}")]
    Write {
        /// Final entry path that was being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache root could not be enumerated.
    #[error("failed to read cache directory {path}: {source}")]
    ReadDir {
        /// The cache root.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during TTS operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// The WebSocket handshake with the speech service failed.
    #[error("Failed to connect to speech service: {source}")]
    Connection {
        #[source]
        source: Box<tungstenite::Error>,
    },

    /// The WebSocket session broke after it was established.
    #[error("Speech service connection dropped: {source}")]
    WebSocket {
        #[source]
        source: Box<tungstenite::Error>,
    },

    /// The speech service went quiet for longer than the configured timeout.
    #[error("Speech service timed out after {timeout:?} (check your network connection)")]
    Timeout {
        /// Connect or idle timeout that elapsed.
        timeout: std::time::Duration,
    },

    /// Fetching the voice list failed at the HTTP layer.
    #[error("Failed to fetch voice list: {0}")]
    VoiceList(#[from] reqwest::Error),

    /// The voice list response was not the expected JSON.
    #[error("Failed to parse voice list: {0}")]
    VoiceListParse(#[from] serde_json::Error),

    /// The service closed the turn without sending any audio.
    #[error("No audio received for voice '{voice}' (is the voice name valid?)")]
    NoAudioReceived {
        /// Voice that was requested.
        voice: String,
    },

    /// No audio player is installed.
    #[error("No audio player available")]
    NoAudioPlayer,

    /// A player process could not be started.
    #[error("Failed to spawn '{player}'")]
    ProcessSpawnFailed {
        /// Player binary.
        player: String,
        #[source]
        source: std::io::Error,
    },

    /// Every available player exited unsuccessfully.
    #[error("Playback failed with '{player}': {stderr}")]
    PlaybackFailed {
        /// Last player tried.
        player: String,
        /// Its captured stderr.
        stderr: String,
    },

    /// A blocking task was cancelled or panicked.
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TtsError {
    pub(crate) fn connection(err: tungstenite::Error) -> Self {
        TtsError::Connection {
            source: Box::new(err),
        }
    }

    pub(crate) fn websocket(err: tungstenite::Error) -> Self {
        TtsError::WebSocket {
            source: Box::new(err),
        }
    }
}
