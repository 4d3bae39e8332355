//! Netscape cookie file format, as read by yt-dlp and curl

use crate::credentials::Cookie;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, warn};

const HEADER: &str = "# Netscape HTTP Cookie File\n\
# https://curl.haxx.se/rfc/cookie_spec.html\n\
# This is a generated file!  Do not edit.\n\n";

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Render cookies as a Netscape cookie file
pub fn render(cookies: &[Cookie]) -> String {
    let mut out = String::from(HEADER);
    for cookie in cookies {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            cookie.domain,
            flag(cookie.domain.starts_with('.')),
            cookie.path,
            flag(cookie.secure),
            cookie.expires_at.map(|t| t.timestamp()).unwrap_or(0),
            cookie.name,
            cookie.value,
        );
    }
    out
}

/// Parse a Netscape cookie file, skipping comments and malformed lines
pub fn parse(contents: &str) -> Vec<Cookie> {
    let mut cookies = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => rest,
            None if line.starts_with('#') || line.trim().is_empty() => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 {
            warn!("Skipping malformed cookie line {}", index + 1);
            continue;
        }

        let expires_at = match fields[4].trim().parse::<i64>() {
            Ok(0) => None,
            Ok(secs) => DateTime::<Utc>::from_timestamp(secs, 0),
            Err(_) => {
                warn!("Skipping cookie line {} with bad expiry", index + 1);
                continue;
            }
        };

        cookies.push(Cookie {
            domain: fields[0].to_string(),
            path: fields[2].to_string(),
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            expires_at,
            name: fields[5].to_string(),
            value: fields[6].to_string(),
        });
    }

    cookies
}

/// Write cookies to `path` in Netscape format
pub async fn write_file(path: &Path, cookies: &[Cookie]) -> std::io::Result<()> {
    tokio::fs::write(path, render(cookies)).await?;
    debug!("Wrote {} cookies to {}", cookies.len(), path.display());
    Ok(())
}

/// Read and parse a Netscape cookie file
pub async fn read_file(path: &Path) -> std::io::Result<Vec<Cookie>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse(&contents))
}

fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}
