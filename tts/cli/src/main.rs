use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, ValueHint};
use color_eyre::eyre::WrapErr;
use owo_colors::{OwoColorize, Stream};
use tracing_subscriber::EnvFilter;

use tts_lib::detection::{CheckCategory, CheckStatus};
use tts_lib::{
    AudioCache, DEFAULT_PITCH, DEFAULT_RATE, DEFAULT_VOICE, EdgeTtsProvider, SpeechRequest,
    VoiceInventory, check_system, format_kb, format_text, format_voices, synthesize_with_cache,
};

/// Characters of the input echoed back before synthesis.
const PREVIEW_LEN: usize = 50;

/// Text-to-speech with Microsoft Edge voices
///
/// # Examples
///
/// ```no_run
/// // tts Hello world
/// // tts "Hello" --voice en-GB-SoniaNeural
/// // tts "Fast" --rate +30% --pitch -10Hz
/// // tts "Save me" --save output.mp3
/// ```
#[derive(Parser)]
#[command(name = "tts")]
#[command(about = "Convert text to speech using Microsoft Edge voices", long_about = None)]
#[command(version)]
struct Cli {
    /// Text to speak
    text: Vec<String>,

    /// Voice to use
    #[arg(long, value_name = "NAME", default_value = DEFAULT_VOICE)]
    voice: String,

    /// Speech rate (e.g. +20%, -10%)
    #[arg(long, value_name = "RATE", default_value = DEFAULT_RATE, allow_hyphen_values = true)]
    rate: String,

    /// Voice pitch (e.g. +10Hz, -20Hz)
    #[arg(long, value_name = "PITCH", default_value = DEFAULT_PITCH, allow_hyphen_values = true)]
    pitch: String,

    /// Save to file instead of playing
    #[arg(long, value_name = "FILE", visible_alias = "output", value_hint = ValueHint::FilePath)]
    save: Option<PathBuf>,

    /// Check system setup
    #[arg(long)]
    check: bool,

    /// List all available voices
    #[arg(long)]
    list_voices: bool,

    /// Always synthesize; neither read nor write the cache
    #[arg(long)]
    no_cache: bool,

    /// Delete every cached audio file
    #[arg(long)]
    clear_cache: bool,

    /// Show cache location, file count and size
    #[arg(long)]
    cache_stats: bool,

    /// Cache directory [default: ~/.cache/tts-cli]
    #[arg(long, value_name = "DIR", env = "TTS_CACHE_DIR", value_hint = ValueHint::DirPath)]
    cache_dir: Option<PathBuf>,

    /// Log cache and network activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn cache(&self) -> AudioCache {
        self.cache_dir
            .clone()
            .map_or_else(AudioCache::with_default_root, AudioCache::new)
    }

    fn request(&self, text: String) -> SpeechRequest {
        SpeechRequest::new(text)
            .with_voice(&self.voice)
            .with_rate(&self.rate)
            .with_pitch(&self.pitch)
    }
}

/// Joins multiple arguments into a single string with spaces
fn join_args(args: Vec<String>) -> String {
    args.join(" ")
}

/// The text to speak, or `None` when no text arguments were given.
fn spoken_text(args: &[String]) -> Option<String> {
    (!args.is_empty()).then(|| join_args(args.to_vec()))
}

/// `RUST_LOG` wins; otherwise warnings only, or our own debug events with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "tts=debug,tts_lib=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Suggestion printed after an error, keyed off the error message.
fn error_hint(message: &str) -> Option<&'static str> {
    let message = message.to_lowercase();
    if message.contains("voice") {
        Some("Try: tts --list-voices")
    } else if message.contains("network") || message.contains("connect") {
        Some("Check your internet connection")
    } else {
        None
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {message}");
    if let Some(hint) = error_hint(message) {
        eprintln!();
        eprintln!("{hint}");
    }
    std::process::exit(1);
}

fn status_marker(status: CheckStatus) -> String {
    match status {
        CheckStatus::Ok => "✓"
            .if_supports_color(Stream::Stdout, |s| s.green())
            .to_string(),
        CheckStatus::Missing => "✗"
            .if_supports_color(Stream::Stdout, |s| s.red())
            .to_string(),
        CheckStatus::Warning => "!"
            .if_supports_color(Stream::Stdout, |s| s.yellow())
            .to_string(),
    }
}

async fn run_check() {
    println!("Checking system setup...");

    let mut section: Option<CheckCategory> = None;
    for check in check_system().await {
        if section != Some(check.category) {
            println!();
            let title = check.category.title();
            println!("{}:", title.if_supports_color(Stream::Stdout, |s| s.bold()));
            section = Some(check.category);
        }
        println!("{} {}", status_marker(check.status), check.message);
    }

    println!();
    println!("System check complete!");
}

async fn run_list_voices() {
    println!("Fetching voices...");

    match EdgeTtsProvider::new().list_voices().await {
        Ok(voices) => {
            for line in format_voices(&voices) {
                if line.starts_with('[') || line.starts_with("Total:") {
                    println!();
                }
                println!("{line}");
            }
        }
        Err(e) => exit_with_error(&e.to_string()),
    }
}

async fn run_clear_cache(cache: &AudioCache) {
    let removed = cache.clear().await;
    println!(
        "Cleared {removed} cached file(s) from {}",
        cache.root().display()
    );
}

async fn run_cache_stats(cache: &AudioCache) {
    let stats = cache.stats().await;
    println!("Cache directory: {}", stats.cache_root.display());
    println!("Cached files:    {}", stats.file_count);
    println!("Total size:      {:.2} MB", stats.total_size_mb());
}

/// Synthesize `text` and either save or play the result.
async fn run_speak(cli: &Cli, text: String) -> color_eyre::Result<()> {
    println!("Converting: \"{}\"", format_text(&text, PREVIEW_LEN));
    println!("   Voice: {}", cli.voice);
    if cli.rate != DEFAULT_RATE {
        println!("   Rate: {}", cli.rate);
    }
    if cli.pitch != DEFAULT_PITCH {
        println!("   Pitch: {}", cli.pitch);
    }

    let request = cli.request(text);
    let cache = (!cli.no_cache).then(|| cli.cache());
    tracing::debug!(key = %request.cache_key(), no_cache = cli.no_cache, "synthesizing");

    let result = synthesize_with_cache(&EdgeTtsProvider::new(), cache.as_ref(), &request).await?;

    let suffix = if result.from_cache { " (cached)" } else { "" };
    println!("Generated {} KB{suffix}", format_kb(result.audio.len()));

    match &cli.save {
        Some(path) => save_audio(path, &result.audio).await,
        None => play_audio(&result.audio).await,
    }
}

async fn save_audio(path: &Path, audio: &[u8]) -> color_eyre::Result<()> {
    tokio::fs::write(path, audio)
        .await
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    println!("Saved to: {}", path.display());
    Ok(())
}

/// Play through a temp file; keep the file if nothing could play it.
async fn play_audio(audio: &[u8]) -> color_eyre::Result<()> {
    let temp = tempfile::Builder::new()
        .prefix("tts_")
        .suffix(".mp3")
        .tempfile()
        .wrap_err("Failed to create temp file")?;
    tokio::fs::write(temp.path(), audio)
        .await
        .wrap_err("Failed to write temp file")?;

    println!("Playing...");
    match tts_lib::playback::play_audio_file(temp.path()).await {
        Ok(()) => {
            println!("Done!");
        }
        Err(e) => {
            tracing::warn!(error = %e, "playback failed");
            let (_, kept) = temp.keep().wrap_err("Failed to keep temp file")?;
            println!("No audio player worked. File saved: {}", kept.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.check {
        run_check().await;
        return Ok(());
    }

    if cli.list_voices {
        run_list_voices().await;
        return Ok(());
    }

    if cli.clear_cache {
        run_clear_cache(&cli.cache()).await;
        return Ok(());
    }

    if cli.cache_stats {
        run_cache_stats(&cli.cache()).await;
        return Ok(());
    }

    let Some(text) = spoken_text(&cli.text) else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Err(e) = run_speak(&cli, text).await {
        exit_with_error(&e.to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_args_multi_word() {
        let args = vec!["Hello".to_string(), "world".to_string()];
        assert_eq!(join_args(args), "Hello world");
    }

    #[test]
    fn test_join_args_empty() {
        let args: Vec<String> = vec![];
        assert_eq!(join_args(args), "");
    }

    #[test]
    fn test_join_args_unicode() {
        let args = vec!["Hello".to_string(), "世界".to_string(), "🚀".to_string()];
        assert_eq!(join_args(args), "Hello 世界 🚀");
    }

    #[test]
    fn test_spoken_text_none_without_arguments() {
        assert_eq!(spoken_text(&[]), None);
    }

    #[test]
    fn test_spoken_text_keeps_whitespace_only_text() {
        assert_eq!(spoken_text(&["  ".to_string()]), Some("  ".to_string()));
        assert_eq!(
            spoken_text(&["Hello".to_string(), "world".to_string()]),
            Some("Hello world".to_string())
        );
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tts", "Hello"]).unwrap();
        assert_eq!(cli.voice, DEFAULT_VOICE);
        assert_eq!(cli.rate, DEFAULT_RATE);
        assert_eq!(cli.pitch, DEFAULT_PITCH);
        assert!(cli.save.is_none());
        assert!(!cli.no_cache);
    }

    #[test]
    fn test_negative_rate_and_pitch() {
        let cli =
            Cli::try_parse_from(["tts", "Slow", "--rate", "-10%", "--pitch", "-20Hz"]).unwrap();
        assert_eq!(cli.rate, "-10%");
        assert_eq!(cli.pitch, "-20Hz");
        assert_eq!(cli.text, vec!["Slow"]);
    }

    #[test]
    fn test_output_is_alias_for_save() {
        let cli = Cli::try_parse_from(["tts", "Hi", "--output", "out.mp3"]).unwrap();
        assert_eq!(cli.save, Some(PathBuf::from("out.mp3")));
    }

    #[test]
    fn test_cache_dir_flag() {
        let cli = Cli::try_parse_from(["tts", "--cache-stats", "--cache-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.cache().root(), Path::new("/tmp/x"));
    }

    #[test]
    fn test_request_carries_settings() {
        let cli = Cli::try_parse_from(["tts", "--voice", "en-GB-SoniaNeural", "--rate", "+20%"])
            .unwrap();
        let request = cli.request("Hello".into());
        assert_eq!(request.text, "Hello");
        assert_eq!(request.voice, "en-GB-SoniaNeural");
        assert_eq!(request.rate, "+20%");
        assert_eq!(request.pitch, DEFAULT_PITCH);
    }

    #[test]
    fn test_error_hint_voice() {
        assert_eq!(
            error_hint("No audio received for voice 'xx-XX-Nobody'"),
            Some("Try: tts --list-voices")
        );
    }

    #[test]
    fn test_error_hint_connection() {
        assert_eq!(
            error_hint("Failed to connect to speech service: timed out"),
            Some("Check your internet connection")
        );
        assert_eq!(
            error_hint("Network unreachable"),
            Some("Check your internet connection")
        );
    }

    #[test]
    fn test_error_hint_none() {
        assert_eq!(error_hint("Failed to write out.mp3"), None);
    }
}
