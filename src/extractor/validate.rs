//! Structural URL check performed before any network work

use url::Url;

/// True when the input parses to a non-empty scheme and network location
pub fn is_valid_url(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().map_or(false, |h| !h.is_empty()),
        Err(_) => false,
    }
}
