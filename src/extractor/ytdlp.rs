//! yt-dlp wrapper used as the extraction backend
//!
//! Each attempt runs `yt-dlp --dump-json` once with the attempt's proxy,
//! user agent, spoofed client IP and cookie file on the command line.
//! Supports an explicitly configured binary or a system-installed yt-dlp.

use crate::extractor::models::RawBackendRecord;
use crate::extractor::traits::{AttemptConfig, BackendError, ExtractionBackend};
use crate::utils::error::VidcdnError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info, warn};

/// Browser-like headers sent with every attempt
const BASE_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", "en-US,en;q=0.9,ar;q=0.8"),
    ("Origin", "https://www.youtube.com"),
    ("Referer", "https://www.youtube.com/"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-site"),
    ("Sec-Fetch-Dest", "video"),
    ("DNT", "1"),
];

const EXTRACTOR_ARGS: &str = "youtube:skip=dash,hls;player_skip=js,configs,webpage";

/// Extraction backend running the yt-dlp executable
pub struct YtDlpBackend {
    ytdlp_path: PathBuf,
    attempt_timeout: Duration,
}

impl YtDlpBackend {
    /// Initialize backend and verify yt-dlp availability
    ///
    /// Search order:
    /// 1. Configured path
    /// 2. Next to the current executable
    /// 3. System PATH
    /// 4. Common installation paths (Homebrew, etc.)
    pub fn new(configured: Option<&Path>, attempt_timeout: Duration) -> Result<Self, VidcdnError> {
        let ytdlp_path = match configured {
            Some(path) if path.is_file() => {
                if !is_executable(path) {
                    return Err(VidcdnError::ConfigError(format!(
                        "yt-dlp at {} is not executable",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            Some(path) => {
                warn!("Configured yt-dlp {} does not exist, searching", path.display());
                find_ytdlp().ok_or(VidcdnError::YtDlpNotFound)?
            }
            None => find_ytdlp().ok_or(VidcdnError::YtDlpNotFound)?,
        };
        info!("Using yt-dlp at: {}", ytdlp_path.display());

        Ok(Self {
            ytdlp_path,
            attempt_timeout,
        })
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }
}

/// Command-line arguments for one attempt, URL last
pub fn build_args(url: &str, config: &AttemptConfig<'_>) -> Vec<String> {
    let mut args: Vec<String> = [
        "--dump-json",
        "--no-download",
        "--no-warnings",
        "--no-playlist",
        "--no-check-certificates",
        "--geo-bypass-country",
        "US",
        "--retries",
        "15",
        "--fragment-retries",
        "10",
        "--extractor-args",
        EXTRACTOR_ARGS,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push("--socket-timeout".to_string());
    args.push(config.socket_timeout.as_secs().to_string());

    args.push("-f".to_string());
    args.push(config.format_selector.to_string());

    args.push("--user-agent".to_string());
    args.push(config.identity.user_agent.clone());

    for (name, value) in BASE_HEADERS {
        args.push("--add-header".to_string());
        args.push(format!("{}:{}", name, value));
    }
    let ip = &config.identity.spoofed_client_ip;
    args.push("--add-header".to_string());
    args.push(format!("X-Forwarded-For:{}", ip));
    args.push("--add-header".to_string());
    args.push(format!("Client-IP:{}", ip));

    if let Some(proxy) = &config.identity.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    if let Some(cookie_file) = config.credentials.cookie_file() {
        args.push("--cookies".to_string());
        args.push(cookie_file.to_string_lossy().to_string());
    }

    args.push("--".to_string());
    args.push(url.to_string());
    args
}

/// Parse `--dump-json` output; playlists print one object per line
pub fn parse_dump(stdout: &str) -> Result<RawBackendRecord, BackendError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| BackendError::Reported("yt-dlp printed no metadata".to_string()))?;
    Ok(serde_json::from_str(line)?)
}

#[async_trait]
impl ExtractionBackend for YtDlpBackend {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    async fn resolve(
        &self,
        url: &str,
        config: &AttemptConfig<'_>,
    ) -> Result<RawBackendRecord, BackendError> {
        debug!("Extracting video info for URL: {}", url);

        let child = AsyncCommand::new(&self.ytdlp_path)
            .args(build_args(url, config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(self.attempt_timeout, child.wait_with_output()).await
        {
            Ok(output) => output?,
            Err(_) => return Err(BackendError::TimedOut(self.attempt_timeout)),
        };

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BackendError::Reported(error_msg));
        }

        parse_dump(&String::from_utf8_lossy(&output.stdout))
    }
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Next to the executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Some(adjacent) = find_adjacent_ytdlp() {
        info!("✓ Using bundled yt-dlp: {:?}", adjacent);
        return Some(adjacent);
    }

    if let Ok(path) = which::which("yt-dlp") {
        info!("✓ Using system yt-dlp: {:?}", path);
        return Some(path);
    }

    if let Some(common) = find_in_common_paths() {
        info!("✓ Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    warn!("✗ yt-dlp not found anywhere!");
    None
}

fn find_adjacent_ytdlp() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    find_in_dir(exe_path.parent()?)
}

/// An executable yt-dlp directly inside `dir`
fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    let name = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    };
    let candidate = dir.join(name);
    (candidate.is_file() && is_executable(&candidate)).then_some(candidate)
}

fn find_in_common_paths() -> Option<PathBuf> {
    let common_paths = [
        // macOS Homebrew (Apple Silicon)
        "/opt/homebrew/bin/yt-dlp",
        // macOS Homebrew (Intel) / manual installs
        "/usr/local/bin/yt-dlp",
        // System
        "/usr/bin/yt-dlp",
        // pip user install
        "~/.local/bin/yt-dlp",
    ];

    for path_str in common_paths {
        let expanded = match path_str.strip_prefix("~/") {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            },
            None => PathBuf::from(path_str),
        };

        if expanded.is_file() && is_executable(&expanded) {
            return Some(expanded);
        }
    }

    None
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        // On Windows, just check if file exists
        path.exists()
    }
}

// ============================================================
// Tests
// ============================================================
