//! Application configuration

use crate::credentials::Browser;
use crate::utils::platform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Format selectors tried in order, best-effort progressive MP4 first
pub const DEFAULT_FORMAT_SELECTORS: &[&str] = &[
    "bestvideo[ext=mp4][protocol!*=dash][protocol!*=m3u8]+bestaudio[ext=m4a]/best[ext=mp4][protocol!*=dash][protocol!*=m3u8]",
    "best[ext=mp4][protocol!*=dash][protocol!*=m3u8]",
    "best[protocol!*=dash][protocol!*=m3u8]",
];

pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2.1 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
];

pub const DEFAULT_PROXIES: &[&str] = &[
    "socks5://127.0.0.1:9050", // Tor
    "http://127.0.0.1:8080",
    "https://127.0.0.1:8080",
];

pub const DEFAULT_COOKIE_DOMAINS: &[&str] = &[".youtube.com", ".googlevideo.com", ".google.com"];

pub const DEFAULT_DIRECT_MEDIA_HOSTS: &[&str] = &["googlevideo.com"];

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub extractor: ExtractorSettings,
    pub server: ServerSettings,
}

/// Settings for the extraction search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Format selectors, outermost loop of the search
    pub format_selectors: Vec<String>,

    /// Proxy URIs; `None` means a direct connection and is always tried first
    pub proxies: Vec<Option<String>>,

    pub user_agents: Vec<String>,

    /// Number of spoofed client IPs generated per request
    pub spoofed_ip_count: usize,

    /// Seed for the spoofed IP generator (random per request when unset)
    pub ip_seed: Option<u64>,

    /// Socket timeout handed to yt-dlp (seconds)
    pub socket_timeout_secs: u64,

    /// Upper bound for one backend round-trip (seconds)
    pub attempt_timeout_secs: u64,

    /// Overall deadline for one extraction request (seconds)
    pub request_deadline_secs: Option<u64>,

    /// Attempts dispatched concurrently; 1 keeps the search strictly sequential
    pub max_parallel_attempts: usize,

    pub browsers: Vec<Browser>,

    pub cookie_domains: Vec<String>,

    /// Netscape cookie file used when nothing could be harvested
    pub static_cookie_file: PathBuf,

    /// Where harvested cookie files are written (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,

    /// Hosts whose URLs are already raw media and skip the backend
    pub direct_media_hosts: Vec<String>,

    /// Explicit yt-dlp binary, otherwise discovered on the system
    pub ytdlp_path: Option<PathBuf>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        let mut proxies = vec![None];
        proxies.extend(DEFAULT_PROXIES.iter().map(|p| Some(p.to_string())));

        Self {
            format_selectors: to_strings(DEFAULT_FORMAT_SELECTORS),
            proxies,
            user_agents: to_strings(DEFAULT_USER_AGENTS),
            spoofed_ip_count: 5,
            ip_seed: None,
            socket_timeout_secs: 30,
            attempt_timeout_secs: 90,
            request_deadline_secs: None,
            max_parallel_attempts: 1,
            browsers: vec![Browser::Chrome, Browser::Firefox, Browser::Edge],
            cookie_domains: to_strings(DEFAULT_COOKIE_DOMAINS),
            static_cookie_file: PathBuf::from("cookies.txt"),
            temp_dir: None,
            direct_media_hosts: to_strings(DEFAULT_DIRECT_MEDIA_HOSTS),
            ytdlp_path: None,
        }
    }
}

impl ExtractorSettings {
    /// Enforce sane minimums so a hand-edited file cannot disable the search
    pub fn validate(&mut self) {
        let defaults = ExtractorSettings::default();

        if self.format_selectors.is_empty() {
            warn!("No format selectors configured, using defaults");
            self.format_selectors = defaults.format_selectors;
        }
        if self.user_agents.is_empty() {
            warn!("No user agents configured, using defaults");
            self.user_agents = defaults.user_agents;
        }
        // Unproxied attempts always come first
        self.proxies.retain(|p| p.as_deref().map_or(false, |p| !p.trim().is_empty()));
        self.proxies.insert(0, None);

        if self.spoofed_ip_count == 0 {
            self.spoofed_ip_count = 1;
        }
        if self.max_parallel_attempts == 0 {
            self.max_parallel_attempts = 1;
        }
        if self.socket_timeout_secs == 0 {
            self.socket_timeout_secs = defaults.socket_timeout_secs;
        }
        if self.attempt_timeout_secs == 0 {
            self.attempt_timeout_secs = defaults.attempt_timeout_secs;
        }
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_secs.map(Duration::from_secs)
    }
}

/// HTTP front end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl AppSettings {
    /// Load settings from a JSON file.
    ///
    /// With no explicit path the platform config location is used, and a
    /// missing file there just yields defaults. `PORT` overrides the
    /// server port.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let default_path = platform::settings_path();
                if default_path.exists() {
                    Self::read_file(&default_path)?
                } else {
                    debug!("No settings file at {:?}, using defaults", default_path);
                    Self::default()
                }
            }
        };

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => settings.server.port = port,
                Err(e) => warn!("Ignoring invalid PORT value {:?}: {}", port, e),
            }
        }

        settings.extractor.validate();
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
