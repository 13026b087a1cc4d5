//! Host capability checks behind `tts --check`.
//!
//! Everything here probes the OS (players on `PATH`, `ping`, `df`) and only
//! reports; nothing fails hard.

use std::path::Path;
use std::process::Stdio;

use crate::playback::{MP3_PLAYERS, is_installed};
use crate::providers::SERVICE_HOST;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Missing,
    Warning,
}

/// Section a check belongs to, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCategory {
    Tool,
    AudioPlayers,
    Network,
    TempDirectory,
}

impl CheckCategory {
    pub fn title(&self) -> &'static str {
        match self {
            CheckCategory::Tool => "Tool",
            CheckCategory::AudioPlayers => "Audio players",
            CheckCategory::Network => "Internet connection",
            CheckCategory::TempDirectory => "Temp directory",
        }
    }
}

/// One line of the system report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCheck {
    pub category: CheckCategory,
    pub status: CheckStatus,
    pub message: String,
}

impl SystemCheck {
    fn new(category: CheckCategory, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            category,
            status,
            message: message.into(),
        }
    }
}

/// Run every check and return the report in display order.
pub async fn check_system() -> Vec<SystemCheck> {
    let mut results = vec![SystemCheck::new(
        CheckCategory::Tool,
        CheckStatus::Ok,
        format!("tts {}", env!("CARGO_PKG_VERSION")),
    )];

    results.extend(check_players());
    results.push(check_network().await);
    results.push(check_temp_dir(&std::env::temp_dir()).await);

    results
}

fn check_players() -> Vec<SystemCheck> {
    MP3_PLAYERS
        .iter()
        .map(|player| {
            if is_installed(player) {
                SystemCheck::new(CheckCategory::AudioPlayers, CheckStatus::Ok, *player)
            } else {
                SystemCheck::new(
                    CheckCategory::AudioPlayers,
                    CheckStatus::Missing,
                    format!("{player} not found"),
                )
            }
        })
        .collect()
}

async fn check_network() -> SystemCheck {
    let reachable = tokio::process::Command::new("ping")
        .args(ping_args(SERVICE_HOST))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok_and(|status| status.success());

    if reachable {
        SystemCheck::new(
            CheckCategory::Network,
            CheckStatus::Ok,
            "Can reach Microsoft TTS servers",
        )
    } else {
        SystemCheck::new(
            CheckCategory::Network,
            CheckStatus::Warning,
            "Cannot ping TTS servers (might still work)",
        )
    }
}

#[cfg(target_os = "windows")]
fn ping_args(host: &str) -> Vec<&str> {
    vec!["-n", "1", host]
}

#[cfg(not(target_os = "windows"))]
fn ping_args(host: &str) -> Vec<&str> {
    vec!["-c", "1", host]
}

async fn check_temp_dir(dir: &Path) -> SystemCheck {
    let available = match tokio::process::Command::new("df").arg("-h").arg(dir).output().await {
        Ok(output) if output.status.success() => {
            parse_df_available(&String::from_utf8_lossy(&output.stdout))
        }
        _ => None,
    };

    let message = match available {
        Some(space) => format!("{} - {} available", dir.display(), space),
        None => format!("{} exists", dir.display()),
    };
    SystemCheck::new(CheckCategory::TempDirectory, CheckStatus::Ok, message)
}

/// The "Avail" column (4th) of the first data row of `df -h`.
fn parse_df_available(output: &str) -> Option<String> {
    output
        .lines()
        .nth(1)?
        .split_whitespace()
        .nth(3)
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================
