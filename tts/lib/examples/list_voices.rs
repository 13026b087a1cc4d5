//! List Voices Example
//!
//! Fetches the Edge voice list and prints it grouped by language.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example list_voices
//! cargo run --example list_voices -- en   # only locales starting with "en"
//! ```

use tts_lib::{EdgeTtsProvider, Voice, VoiceInventory, format_voices};

#[tokio::main]
async fn main() {
    let prefix = std::env::args().nth(1);

    let voices = match EdgeTtsProvider::new().list_voices().await {
        Ok(voices) => voices,
        Err(e) => {
            eprintln!("Failed to fetch voices: {e}");
            std::process::exit(1);
        }
    };

    let voices: Vec<Voice> = match &prefix {
        Some(prefix) => voices
            .into_iter()
            .filter(|v| v.locale.starts_with(prefix.as_str()))
            .collect(),
        None => voices,
    };

    for line in format_voices(&voices) {
        println!("{line}");
    }
}
