use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const ENTRY_A: &str = "229ffe2acc5903733e75713512730d0e99635556eb9fe41dea27654802422436.mp3";
const ENTRY_B: &str = "be5be69f55e91af25e54ecc2154d4da359b67b3b27e25f5cc0b3ff54eb74dff3.mp3";

/// Text whose default-voice entry is `ENTRY_A`.
const CACHED_TEXT: &str = "Hello, test world!";
/// Entry for `CACHED_TEXT` with `--rate -10%`.
const ENTRY_SLOW: &str = "72097aa807e42e0633e3c594b098c4c0421d43b7e1e518d1b05fce8b1d7e4381.mp3";

/// Two cache entries plus an unrelated file the cache must ignore.
fn seed_cache(root: &Path) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join(ENTRY_A), vec![0u8; 1024]).unwrap();
    fs::write(root.join(ENTRY_B), vec![0u8; 2048]).unwrap();
    fs::write(root.join("notes.txt"), b"keep me").unwrap();
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    cargo_bin_cmd!("tts")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Convert text to speech"))
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--cache-dir"))
        .stdout(predicate::str::contains("--list-voices"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("tts")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tts"));
}

#[test]
fn test_no_text_prints_help() {
    cargo_bin_cmd!("tts")
        .env_remove("TTS_CACHE_DIR")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_unknown_flag_fails() {
    cargo_bin_cmd!("tts")
        .arg("--definitely-not-a-flag")
        .assert()
        .failure();
}

// ============================================================================
// Cache Stats Tests
// ============================================================================

#[test]
fn test_cache_stats_empty_creates_directory() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("cache");

    cargo_bin_cmd!("tts")
        .args(["--cache-stats", "--cache-dir"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains(root.display().to_string()))
        .stdout(predicate::str::contains("Cached files:    0"))
        .stdout(predicate::str::contains("0.00 MB"));

    assert!(root.is_dir());
}

#[test]
fn test_cache_stats_counts_only_mp3_entries() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());

    cargo_bin_cmd!("tts")
        .args(["--cache-stats", "--cache-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached files:    2"));
}

#[test]
fn test_cache_dir_from_env() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());

    cargo_bin_cmd!("tts")
        .arg("--cache-stats")
        .env("TTS_CACHE_DIR", temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(temp.path().display().to_string()))
        .stdout(predicate::str::contains("Cached files:    2"));
}

#[test]
fn test_cache_dir_flag_overrides_env() {
    let env_dir = tempfile::tempdir().unwrap();
    seed_cache(env_dir.path());
    let flag_dir = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("tts")
        .args(["--cache-stats", "--cache-dir"])
        .arg(flag_dir.path())
        .env("TTS_CACHE_DIR", env_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached files:    0"));
}

#[test]
fn test_cache_stats_ignores_text() {
    let temp = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("tts")
        .args(["Hello", "--cache-stats", "--cache-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached files:"))
        .stdout(predicate::str::contains("Converting").not());
}

// ============================================================================
// Clear Cache Tests
// ============================================================================

#[test]
fn test_clear_cache_removes_entries_only() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());

    cargo_bin_cmd!("tts")
        .args(["--clear-cache", "--cache-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 cached file(s) from"))
        .stdout(predicate::str::contains(temp.path().display().to_string()));

    assert!(!temp.path().join(ENTRY_A).exists());
    assert!(!temp.path().join(ENTRY_B).exists());
    assert!(temp.path().join("notes.txt").exists());
}

#[test]
fn test_clear_cache_missing_directory() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("never-created");

    cargo_bin_cmd!("tts")
        .args(["--clear-cache", "--cache-dir"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 0 cached file(s)"));
}

#[test]
fn test_clear_cache_takes_precedence_over_stats() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());

    cargo_bin_cmd!("tts")
        .args(["--cache-stats", "--clear-cache", "--cache-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 cached file(s)"))
        .stdout(predicate::str::contains("Cached files:").not());
}

#[test]
fn test_clear_then_stats_is_empty() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());

    cargo_bin_cmd!("tts")
        .args(["--clear-cache", "--cache-dir"])
        .arg(temp.path())
        .assert()
        .success();

    cargo_bin_cmd!("tts")
        .args(["--cache-stats", "--cache-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached files:    0"));
}

// ============================================================================
// Synthesis Tests (served from the cache, no network)
// ============================================================================

#[test]
fn test_cached_text_is_saved_without_synthesis() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("cache");
    seed_cache(&root);
    let out = temp.path().join("out.mp3");

    cargo_bin_cmd!("tts")
        .args([CACHED_TEXT, "--cache-dir"])
        .arg(&root)
        .arg("--save")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Converting: \"{CACHED_TEXT}\"")))
        .stdout(predicate::str::contains("Voice: en-US-AriaNeural"))
        .stdout(predicate::str::contains("Rate:").not())
        .stdout(predicate::str::contains("Pitch:").not())
        .stdout(predicate::str::contains("Generated 1.0 KB (cached)"))
        .stdout(predicate::str::contains(format!("Saved to: {}", out.display())));

    assert_eq!(fs::read(&out).unwrap(), vec![0u8; 1024]);
}

#[test]
fn test_output_alias_saves_cached_audio() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());
    let out = temp.path().join("alias.mp3");

    cargo_bin_cmd!("tts")
        .args([CACHED_TEXT, "--cache-dir"])
        .arg(temp.path())
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("(cached)"));

    assert_eq!(fs::read(&out).unwrap().len(), 1024);
}

#[test]
fn test_negative_rate_is_shown_and_keyed() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());
    fs::write(temp.path().join(ENTRY_SLOW), vec![1u8; 1536]).unwrap();
    let out = temp.path().join("slow.mp3");

    cargo_bin_cmd!("tts")
        .args([CACHED_TEXT, "--rate", "-10%", "--cache-dir"])
        .arg(temp.path())
        .arg("--save")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rate: -10%"))
        .stdout(predicate::str::contains("Generated 1.5 KB (cached)"));

    assert_eq!(fs::read(&out).unwrap(), vec![1u8; 1536]);
}

#[test]
fn test_long_text_is_truncated_in_preview() {
    let temp = tempfile::tempdir().unwrap();
    let text = "a".repeat(60);
    // entry for 60 'a's with the default voice, rate and pitch
    fs::write(
        temp.path().join("ce8f7a36039d007e6bd203723fd734b09aea2e76f4a4dc3af1d6197d504945dd.mp3"),
        vec![2u8; 512],
    )
    .unwrap();
    let out = temp.path().join("long.mp3");

    cargo_bin_cmd!("tts")
        .args([text.as_str(), "--cache-dir"])
        .arg(temp.path())
        .arg("--save")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Converting: \"{}...\"", "a".repeat(50))))
        .stdout(predicate::str::contains("Generated 0.5 KB (cached)"));
}

#[test]
fn test_no_cache_skips_cached_entry() {
    let temp = tempfile::tempdir().unwrap();
    seed_cache(temp.path());
    let out = temp.path().join("fresh.mp3");

    // succeeds with network access, fails with an error without; never a cache hit
    cargo_bin_cmd!("tts")
        .args([CACHED_TEXT, "--no-cache", "--cache-dir"])
        .arg(temp.path())
        .arg("--save")
        .arg(&out)
        .assert()
        .stdout(predicate::str::contains("Converting:"))
        .stdout(predicate::str::contains("(cached)").not());
}
