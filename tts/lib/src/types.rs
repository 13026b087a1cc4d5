//! Core types shared by the cache, the synthesizer and the CLI.

use serde::{Deserialize, Serialize};

use crate::audio_cache::CacheKey;

/// Voice used when the caller does not pick one.
pub const DEFAULT_VOICE: &str = "en-US-AriaNeural";

/// Neutral speech rate.
pub const DEFAULT_RATE: &str = "+0%";

/// Neutral pitch offset.
pub const DEFAULT_PITCH: &str = "+0Hz";

/// Content type of every synthesized and cached payload.
pub const AUDIO_MPEG: &str = "audio/mpeg";

// ============================================================================
// Speech Request
// ============================================================================

/// A single synthesis request.
///
/// The four fields are exactly the inputs of the cache key, so two requests
/// that compare equal always share a cache entry.
///
/// ## Examples
///
/// ```
/// use tts_lib::SpeechRequest;
///
/// let request = SpeechRequest::new("Hello")
///     .with_voice("en-GB-SoniaNeural")
///     .with_rate("+20%");
/// assert_eq!(request.pitch, "+0Hz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    /// Text to speak, passed through untouched.
    pub text: String,
    /// Service voice short name (e.g. `en-US-AriaNeural`).
    pub voice: String,
    /// Relative rate such as `+20%` or `-10%`.
    pub rate: String,
    /// Relative pitch such as `+10Hz` or `-20Hz`.
    pub pitch: String,
}

impl SpeechRequest {
    /// Create a request with the default voice, rate and pitch.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: DEFAULT_VOICE.into(),
            rate: DEFAULT_RATE.into(),
            pitch: DEFAULT_PITCH.into(),
        }
    }

    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    #[must_use]
    pub fn with_rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = rate.into();
        self
    }

    #[must_use]
    pub fn with_pitch(mut self, pitch: impl Into<String>) -> Self {
        self.pitch = pitch.into();
        self
    }

    /// The content-addressed key for this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(&self.text, &self.voice, &self.rate, &self.pitch)
    }

    /// True when the rate differs from the neutral default.
    pub fn has_custom_rate(&self) -> bool {
        self.rate != DEFAULT_RATE
    }

    /// True when the pitch differs from the neutral default.
    pub fn has_custom_pitch(&self) -> bool {
        self.pitch != DEFAULT_PITCH
    }
}

// ============================================================================
// Voice
// ============================================================================

/// A voice offered by the speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    #[serde(rename = "ShortName")]
    pub short_name: String,
    #[serde(rename = "Gender", default)]
    pub gender: String,
    #[serde(rename = "Locale", default)]
    pub locale: String,
    #[serde(rename = "FriendlyName", default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

impl Voice {
    /// Language code taken from the locale prefix (`en` for `en-US`).
    ///
    /// Returns `"unknown"` when the locale is empty.
    pub fn language(&self) -> &str {
        match self.locale.split('-').next() {
            Some(lang) if !lang.is_empty() => lang,
            _ => "unknown",
        }
    }
}

// ============================================================================
// Speak Result
// ============================================================================

/// Audio produced for a request, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakResult {
    /// MP3 bytes.
    pub audio: Vec<u8>,
    /// True when served from the on-disk cache.
    pub from_cache: bool,
}
