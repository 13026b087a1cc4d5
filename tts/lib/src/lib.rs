//! TTS Lib
//!
//! Text-to-speech through Microsoft's Edge read-aloud service, fronted by a
//! content-addressed on-disk audio cache.
//!
//! ## Features
//!
//! - **Audio cache**: identical requests are served from disk, keyed by a
//!   SHA-256 digest of text, voice, rate and pitch
//! - **Atomic writes**: cache entries appear whole or not at all
//! - **Best-effort caching**: cache failures never block synthesis
//! - **Async-first**: built on tokio
//!
//! ## Quick Start
//!
//! ```ignore
//! use tts_lib::{AudioCache, EdgeTtsProvider, SpeechRequest, synthesize_with_cache};
//!
//! let cache = AudioCache::with_default_root();
//! let request = SpeechRequest::new("Hello, world!").with_voice("en-GB-SoniaNeural");
//! let result = synthesize_with_cache(&EdgeTtsProvider::new(), Some(&cache), &request).await?;
//! tts_lib::playback::play_audio_bytes(&result.audio).await?;
//! ```
//!
//! ## Module Structure
//!
//! - [`audio_cache`] - The on-disk cache and its key derivation
//! - [`providers`] - The Edge read-aloud client
//! - [`speak`] - Cache-aware synthesis
//! - [`playback`] - Playing MP3 through host players
//! - [`detection`] - The `--check` system report
//! - [`format`] - Text helpers for CLI output

pub mod audio_cache;
pub mod detection;
pub mod errors;
pub mod format;
pub mod playback;
pub mod providers;
pub mod speak;
pub mod traits;
pub mod types;

// Re-export main types at crate root for convenience
pub use audio_cache::{AudioCache, CacheKey, CacheStats, CachedAudio, StoreOutcome, write_atomic};
pub use detection::{CheckCategory, CheckStatus, SystemCheck, check_system};
pub use errors::{CacheError, TtsError};
pub use format::{format_kb, format_text, format_voices};
pub use providers::EdgeTtsProvider;
pub use speak::synthesize_with_cache;
pub use traits::{Synthesizer, VoiceInventory};
pub use types::{
    AUDIO_MPEG, DEFAULT_PITCH, DEFAULT_RATE, DEFAULT_VOICE, SpeakResult, SpeechRequest, Voice,
};
