//! TTS provider implementations.
//!
//! Providers implement [`Synthesizer`](crate::Synthesizer) and
//! [`VoiceInventory`](crate::VoiceInventory). Only the Edge read-aloud
//! service is wired up.

mod edge;

pub use edge::{EdgeTtsProvider, SERVICE_HOST};
