//! Locates the external programs whistle drives: ffmpeg for encoding and an
//! audio player for playback.
//!
//! Standard installation locations are checked before falling back to a PATH
//! search, so the tools are found even when launched with a minimal PATH.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// A command line able to play an audio file and exit when done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: PathBuf,
    /// Arguments placed before the file path.
    pub args: Vec<String>,
}

/// Players tried by "auto", in order, with the flags that make them headless.
const PLAYER_CANDIDATES: &[(&str, &[&str])] = &[
    ("afplay", &[]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "error"]),
    ("mpv", &["--no-video", "--really-quiet"]),
];

/// Locates the ffmpeg binary on the system.
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/opt/homebrew/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/snap/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"),
        ]
    } else {
        vec![]
    };

    if let Some(path) = candidates.into_iter().find(|path| path.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let ffmpeg_path = find_in_path("ffmpeg").ok_or_else(|| {
        anyhow!(
            "ffmpeg not found. Please install ffmpeg:\n\
             macOS: brew install ffmpeg\n\
             Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
             Windows: Download from https://ffmpeg.org/download.html"
        )
    })?;
    tracing::debug!("Found ffmpeg in PATH at: {}", ffmpeg_path.display());
    Ok(ffmpeg_path)
}

/// Resolves the configured player.
///
/// `"auto"` picks the first available of afplay, ffplay, and mpv. Anything
/// else is split on whitespace into a program and leading arguments.
pub fn find_player(player: &str) -> Result<PlayerCommand> {
    let player = player.trim();
    if player.is_empty() || player == "auto" {
        for (name, args) in PLAYER_CANDIDATES {
            if let Some(program) = find_in_path(name) {
                tracing::debug!("Using audio player: {}", program.display());
                return Ok(PlayerCommand {
                    program,
                    args: args.iter().map(|a| a.to_string()).collect(),
                });
            }
        }
        return Err(anyhow!(
            "No audio player found. Install ffmpeg (ffplay) or mpv, or set playback.player in the config"
        ));
    }

    parse_player(player)
}

/// Splits a configured player command line.
fn parse_player(command: &str) -> Result<PlayerCommand> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow!("Invalid player command: empty"))?;
    Ok(PlayerCommand {
        program: PathBuf::from(program),
        args: parts.map(str::to_string).collect(),
    })
}

/// Searches for a binary in the system PATH.
///
/// Uses `which` on Unix systems and `where` on Windows.
fn find_in_path(binary_name: &str) -> Option<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = std::process::Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let path_str = String::from_utf8_lossy(&output.stdout);
    let first = path_str.lines().next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(PathBuf::from(first))
    }
}
