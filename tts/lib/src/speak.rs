//! Cache-aware synthesis.
//!
//! The single place where the cache and a [`Synthesizer`] meet: look up,
//! synthesize on a miss, store the result. Cache problems never surface
//! here; synthesis errors do.

use tracing::debug;

use crate::audio_cache::AudioCache;
use crate::errors::TtsError;
use crate::traits::Synthesizer;
use crate::types::{SpeakResult, SpeechRequest};

/// Produce audio for `request`, going through `cache` when one is given.
///
/// Passing `None` bypasses the cache entirely (no lookup, no store), which is
/// what `--no-cache` does.
///
/// ## Errors
///
/// Only errors from `synth` are returned.
///
/// ## Examples
///
/// ```ignore
/// use tts_lib::{AudioCache, EdgeTtsProvider, SpeechRequest, synthesize_with_cache};
///
/// let cache = AudioCache::with_default_root();
/// let result = synthesize_with_cache(
///     &EdgeTtsProvider::new(),
///     Some(&cache),
///     &SpeechRequest::new("Hello"),
/// )
/// .await?;
/// println!("cached: {}", result.from_cache);
/// ```
pub async fn synthesize_with_cache<S: Synthesizer>(
    synth: &S,
    cache: Option<&AudioCache>,
    request: &SpeechRequest,
) -> Result<SpeakResult, TtsError> {
    if let Some(cache) = cache
        && let Some(hit) = cache.lookup(request).await
    {
        return Ok(SpeakResult {
            audio: hit.bytes,
            from_cache: true,
        });
    }

    let audio = synth.synthesize(request).await?;

    match cache {
        Some(cache) if !audio.is_empty() => {
            cache.store(request, &audio).await;
        }
        Some(_) => debug!("not caching empty audio"),
        None => {}
    }

    Ok(SpeakResult {
        audio,
        from_cache: false,
    })
}
