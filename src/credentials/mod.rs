//! Credential contexts: cookie sets an attempt can present to the backend

pub mod harvest;
pub mod netscape;
pub mod supplier;

pub use harvest::{CookieHarvester, SqliteCookieHarvester};
pub use supplier::{CredentialLease, CredentialSupplier};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Browsers cookies can be harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Firefox,
    Edge,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Edge => "Edge",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cookie {
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub name: String,
    pub value: String,
}

/// Where a credential context came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialSource {
    None,
    BrowserHarvested,
    StaticFile,
}

/// Cookies presented by an attempt, plus the Netscape file the backend reads them from
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialContext {
    pub source: CredentialSource,
    pub cookies: Vec<Cookie>,
    pub cookie_file: Option<PathBuf>,
}

impl CredentialContext {
    /// Context with no cookies at all
    pub fn empty() -> Self {
        Self {
            source: CredentialSource::None,
            cookies: Vec::new(),
            cookie_file: None,
        }
    }

    pub fn from_file(source: CredentialSource, cookies: Vec<Cookie>, path: &Path) -> Self {
        Self {
            source,
            cookies,
            cookie_file: Some(path.to_path_buf()),
        }
    }

    pub fn cookie_file(&self) -> Option<&Path> {
        self.cookie_file.as_deref()
    }
}

/// Drop later duplicates of the same (domain, path, name), keeping first-seen order
pub fn dedup_cookies(cookies: Vec<Cookie>) -> Vec<Cookie> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::with_capacity(cookies.len());
    for cookie in cookies {
        let key = (cookie.domain.clone(), cookie.path.clone(), cookie.name.clone());
        if seen.insert(key) {
            unique.push(cookie);
        }
    }
    unique
}
