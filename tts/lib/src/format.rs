//! Plain-text formatting used by the CLI output.

use crate::types::Voice;

/// Voices listed per language before the rest are summarized.
const VOICES_PER_LANGUAGE: usize = 5;

/// Shorten `text` to `max_len` characters, appending `...` if anything was cut.
///
/// ## Examples
///
/// ```
/// use tts_lib::format::format_text;
///
/// assert_eq!(format_text("Hello world", 5), "Hello...");
/// assert_eq!(format_text("Hi", 5), "Hi");
/// ```
pub fn format_text(text: &str, max_len: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_len).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Size in KiB with one decimal, e.g. `1.5` for 1536 bytes.
pub fn format_kb(bytes: usize) -> String {
    format!("{:.1}", bytes as f64 / 1024.0)
}

/// Group voices by language for display.
///
/// Languages appear in the order they are first seen. Each group shows its
/// first five voices and a summary line for the rest; a total closes the list.
pub fn format_voices(voices: &[Voice]) -> Vec<String> {
    let mut groups: Vec<(&str, Vec<&Voice>)> = Vec::new();
    for voice in voices {
        let lang = voice.language();
        match groups.iter_mut().find(|(name, _)| *name == lang) {
            Some((_, members)) => members.push(voice),
            None => groups.push((lang, vec![voice])),
        }
    }

    let mut output = Vec::new();
    for (lang, members) in &groups {
        output.push(format!("[{}] {} voices", lang.to_uppercase(), members.len()));
        for voice in members.iter().take(VOICES_PER_LANGUAGE) {
            output.push(format!("  {:<25} ({})", voice.short_name, voice.gender));
        }
        if members.len() > VOICES_PER_LANGUAGE {
            output.push(format!(
                "  ... and {} more",
                members.len() - VOICES_PER_LANGUAGE
            ));
        }
    }
    output.push(format!("Total: {} voices available", voices.len()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(short_name: &str, gender: &str, locale: &str) -> Voice {
        Voice {
            short_name: short_name.into(),
            gender: gender.into(),
            locale: locale.into(),
            friendly_name: None,
        }
    }

    #[test]
    fn test_format_text_short_is_unchanged() {
        assert_eq!(format_text("Hello", 50), "Hello");
        assert_eq!(format_text("", 50), "");
    }

    #[test]
    fn test_format_text_exact_length_has_no_ellipsis() {
        let text = "a".repeat(50);
        assert_eq!(format_text(&text, 50), text);
    }

    #[test]
    fn test_format_text_truncates() {
        let text = "a".repeat(60);
        let formatted = format_text(&text, 50);
        assert_eq!(formatted, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_format_text_counts_characters_not_bytes() {
        assert_eq!(format_text("héllo wörld", 5), "héllo...");
        assert_eq!(format_text("🚀🚀🚀", 2), "🚀🚀...");
    }

    #[test]
    fn test_format_kb() {
        assert_eq!(format_kb(0), "0.0");
        assert_eq!(format_kb(1536), "1.5");
        assert_eq!(format_kb(10 * 1024), "10.0");
    }

    #[test]
    fn test_format_voices_groups_by_language() {
        let voices = vec![
            voice("en-US-AriaNeural", "Female", "en-US"),
            voice("de-DE-KatjaNeural", "Female", "de-DE"),
            voice("en-GB-RyanNeural", "Male", "en-GB"),
        ];
        let lines = format_voices(&voices);

        assert_eq!(lines[0], "[EN] 2 voices");
        assert_eq!(lines[1], format!("  {:<25} (Female)", "en-US-AriaNeural"));
        assert_eq!(lines[2], format!("  {:<25} (Male)", "en-GB-RyanNeural"));
        assert_eq!(lines[3], "[DE] 1 voices");
        assert_eq!(lines.last().unwrap(), "Total: 3 voices available");
    }

    #[test]
    fn test_format_voices_summarizes_large_groups() {
        let voices: Vec<Voice> = (0..8)
            .map(|i| voice(&format!("fr-FR-Voice{i}"), "Male", "fr-FR"))
            .collect();
        let lines = format_voices(&voices);

        assert_eq!(lines[0], "[FR] 8 voices");
        assert_eq!(lines.iter().filter(|l| l.contains("fr-FR-Voice")).count(), 5);
        assert!(lines.contains(&"  ... and 3 more".to_string()));
        assert_eq!(lines.last().unwrap(), "Total: 8 voices available");
    }

    #[test]
    fn test_format_voices_unknown_locale() {
        let lines = format_voices(&[voice("mystery", "Neutral", "")]);
        assert_eq!(lines[0], "[UNKNOWN] 1 voices");
    }

    #[test]
    fn test_format_voices_empty() {
        assert_eq!(format_voices(&[]), vec!["Total: 0 voices available"]);
    }
}
