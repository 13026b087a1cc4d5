//! Audio playback through the host's command-line players.
//!
//! Synthesized audio is always MP3. The macOS and Linux lists only hold
//! players that decode MP3; Windows falls back to PowerShell's WAV-only
//! `Media.SoundPlayer`. Players are tried in order until one succeeds.

use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::TtsError;

// ============================================================================
// OS-Specific Audio Players
// ============================================================================

/// MP3-capable players in preference order.
#[cfg(target_os = "macos")]
pub const MP3_PLAYERS: &[&str] = &["afplay"];

/// MP3-capable players in preference order.
/// paplay and aplay are left out: they only decode WAV/PCM and turn MP3 into static.
#[cfg(target_os = "linux")]
pub const MP3_PLAYERS: &[&str] = &["ffplay", "mpg123", "mpv", "play"];

/// The Windows fallback player.
///
/// PowerShell drives `Media.SoundPlayer`, which only decodes WAV; MP3 input
/// fails to play and the caller keeps the file instead.
#[cfg(target_os = "windows")]
pub const MP3_PLAYERS: &[&str] = &["powershell"];

/// MP3-capable players in preference order.
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
pub const MP3_PLAYERS: &[&str] = &["ffplay", "mpg123", "mpv", "play"];

// ============================================================================
// Player Detection
// ============================================================================

/// Players from [`MP3_PLAYERS`] that are on `PATH`, in preference order.
///
/// ## Examples
///
/// ```
/// use tts_lib::playback::available_players;
///
/// for player in available_players() {
///     println!("can play with {player}");
/// }
/// ```
pub fn available_players() -> Vec<&'static str> {
    MP3_PLAYERS
        .iter()
        .copied()
        .filter(|player| is_installed(player))
        .collect()
}

/// Whether `program` resolves on `PATH`.
pub fn is_installed(program: &str) -> bool {
    which::which(program).is_ok()
}

// ============================================================================
// Playback Functions
// ============================================================================

/// Play MP3 bytes by writing them to a temporary file first.
///
/// The temporary file is removed when the function returns.
///
/// ## Errors
///
/// Same as [`play_audio_file`], plus `TtsError::Io` if the temp file
/// cannot be written.
pub async fn play_audio_bytes(data: &[u8]) -> Result<(), TtsError> {
    let temp_file = NamedTempFile::with_suffix(".mp3")?;
    tokio::fs::write(temp_file.path(), data).await?;

    play_audio_file(temp_file.path()).await
}

/// Play an MP3 file, falling through the available players.
///
/// ## Errors
///
/// - `TtsError::NoAudioPlayer` if no player is installed
/// - `TtsError::PlaybackFailed` with the last player's stderr if all fail
pub async fn play_audio_file(path: &Path) -> Result<(), TtsError> {
    let players = available_players();
    let mut last_error = TtsError::NoAudioPlayer;

    for player in players {
        match play_with(player, path).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!(player, error = %e, "player failed, trying next");
                last_error = e;
            }
        }
    }

    Err(last_error)
}

async fn play_with(player: &str, path: &Path) -> Result<(), TtsError> {
    let args = build_player_args(player, path);

    tracing::debug!(player, path = %path.display(), "Playing audio file");

    let output = tokio::process::Command::new(player)
        .args(&args)
        .output()
        .await
        .map_err(|e| TtsError::ProcessSpawnFailed {
            player: player.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(TtsError::PlaybackFailed {
            player: player.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// Build the command-line arguments for the audio player.
fn build_player_args(player: &str, path: &Path) -> Vec<String> {
    let path_str = path.to_string_lossy().to_string();

    match player {
        "powershell" => vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            format!(
                "(New-Object Media.SoundPlayer '{}').PlaySync()",
                path_str.replace('\'', "''")
            ),
        ],
        "ffplay" => vec![
            "-nodisp".to_string(),
            "-autoexit".to_string(),
            "-loglevel".to_string(),
            "quiet".to_string(),
            path_str,
        ],
        "mpg123" => vec!["-q".to_string(), path_str],
        "mpv" => vec![
            "--no-video".to_string(),
            "--really-quiet".to_string(),
            path_str,
        ],
        // afplay, play
        _ => vec![path_str],
    }
}

// ============================================================================
// Tests
// ============================================================================
