//! Platform-specific paths for vidcdn
//!
//! This module provides cross-platform abstractions for:
//! - The configuration directory and settings file
//! - Scratch space for generated cookie files
//! - Browser profile locations used for cookie harvesting

use crate::credentials::Browser;
use std::path::{Path, PathBuf};

/// Returns the configuration directory
/// - macOS: ~/Library/Application Support/vidcdn
/// - Windows: %APPDATA%\vidcdn
/// - Linux: ~/.config/vidcdn
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidcdn")
}

/// Default settings file location
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Directory for generated cookie files
pub fn scratch_dir(configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir)
}

/// Candidate cookie databases for a browser, most likely first.
///
/// Firefox keeps one database per profile, so every profile directory is
/// listed. Chromium browsers moved the database under `Network/` in newer
/// releases; both locations are returned and callers skip missing files.
pub fn browser_cookie_databases(browser: Browser) -> Vec<PathBuf> {
    match browser {
        Browser::Firefox => firefox_profile_roots()
            .into_iter()
            .flat_map(|root| list_subdirs(&root))
            .map(|profile| profile.join("cookies.sqlite"))
            .collect(),
        Browser::Chrome | Browser::Edge => chromium_user_data_dir(browser)
            .map(|root| {
                vec![
                    root.join("Default").join("Network").join("Cookies"),
                    root.join("Default").join("Cookies"),
                ]
            })
            .unwrap_or_default(),
    }
}

#[cfg(target_os = "macos")]
fn firefox_profile_roots() -> Vec<PathBuf> {
    dirs::data_dir()
        .map(|data| vec![data.join("Firefox").join("Profiles")])
        .unwrap_or_default()
}

#[cfg(target_os = "windows")]
fn firefox_profile_roots() -> Vec<PathBuf> {
    dirs::data_dir()
        .map(|data| vec![data.join("Mozilla").join("Firefox").join("Profiles")])
        .unwrap_or_default()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn firefox_profile_roots() -> Vec<PathBuf> {
    // Snap installs keep their own profile tree
    dirs::home_dir()
        .map(|home| {
            vec![
                home.join(".mozilla").join("firefox"),
                home.join("snap")
                    .join("firefox")
                    .join("common")
                    .join(".mozilla")
                    .join("firefox"),
            ]
        })
        .unwrap_or_default()
}

fn chromium_user_data_dir(browser: Browser) -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let data = dirs::data_dir()?;
        match browser {
            Browser::Chrome => Some(data.join("Google").join("Chrome")),
            Browser::Edge => Some(data.join("Microsoft Edge")),
            Browser::Firefox => None,
        }
    }

    #[cfg(target_os = "windows")]
    {
        let local = dirs::data_local_dir()?;
        match browser {
            Browser::Chrome => Some(local.join("Google").join("Chrome").join("User Data")),
            Browser::Edge => Some(local.join("Microsoft").join("Edge").join("User Data")),
            Browser::Firefox => None,
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let config = dirs::config_dir()?;
        match browser {
            Browser::Chrome => Some(config.join("google-chrome")),
            Browser::Edge => Some(config.join("microsoft-edge")),
            Browser::Firefox => None,
        }
    }
}

fn list_subdirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}
