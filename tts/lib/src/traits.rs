//! Traits at the seam between the cache and the speech service.
//!
//! The cache never talks to the network. Whoever orchestrates a request
//! holds a [`Synthesizer`] and calls it on a miss, which keeps the service
//! swappable (and mockable in tests).

use crate::errors::TtsError;
use crate::types::{SpeechRequest, Voice};

/// Turns a request into MP3 bytes.
///
/// ## Native Async Traits
///
/// This trait uses native Rust async functions in traits (AFIT), available
/// since Rust 1.75. No `async-trait` crate is needed.
///
/// ## Examples
///
/// ```ignore
/// use tts_lib::{SpeechRequest, Synthesizer, TtsError};
///
/// struct Silence;
///
/// impl Synthesizer for Silence {
///     async fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>, TtsError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait Synthesizer: Send + Sync {
    /// Synthesize `request` into a complete MP3 byte stream.
    ///
    /// ## Errors
    ///
    /// Returns `TtsError` if the service cannot be reached or sends no audio.
    fn synthesize(
        &self,
        request: &SpeechRequest,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, TtsError>> + Send;
}

/// Lists the voices a service offers.
pub trait VoiceInventory: Send + Sync {
    fn list_voices(&self) -> impl std::future::Future<Output = Result<Vec<Voice>, TtsError>> + Send;
}

// ============================================================================
// Tests
// ============================================================================
