//! Cookie harvesting from local browser profiles

use crate::credentials::{Browser, Cookie};
use crate::utils::platform;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Seconds between 1601-01-01 (Chromium epoch) and 1970-01-01
const CHROMIUM_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Source of browser cookies for a set of domains
#[async_trait]
pub trait CookieHarvester: Send + Sync {
    /// Cookies for hosts matching any of `domain_suffixes`.
    ///
    /// An error means this browser could not be read; callers move on to
    /// the next one.
    async fn harvest(&self, browser: Browser, domain_suffixes: &[String]) -> Result<Vec<Cookie>>;
}

/// Reads cookie databases of locally installed browsers
pub struct SqliteCookieHarvester {
    scratch_dir: PathBuf,
    overrides: HashMap<Browser, Vec<PathBuf>>,
}

impl SqliteCookieHarvester {
    pub fn new(scratch_dir: PathBuf) -> Self {
        Self {
            scratch_dir,
            overrides: HashMap::new(),
        }
    }

    /// Use explicit database files for a browser instead of its profile dirs
    pub fn with_databases(mut self, browser: Browser, databases: Vec<PathBuf>) -> Self {
        self.overrides.insert(browser, databases);
        self
    }

    fn databases(&self, browser: Browser) -> Vec<PathBuf> {
        match self.overrides.get(&browser) {
            Some(paths) => paths.clone(),
            None => platform::browser_cookie_databases(browser),
        }
    }

    /// Browsers keep their database locked, so read a private copy
    async fn read_copy(&self, browser: Browser, database: &Path) -> Result<Vec<Cookie>> {
        let copy = self.scratch_dir.join(format!(
            "vidcdn-{}-{}.sqlite",
            browser.as_str().to_lowercase(),
            Uuid::new_v4()
        ));
        tokio::fs::copy(database, &copy)
            .await
            .with_context(|| format!("Failed to copy {}", database.display()))?;

        let result = read_database(browser, &copy).await;

        if let Err(e) = tokio::fs::remove_file(&copy).await {
            warn!("Failed to remove cookie database copy {}: {}", copy.display(), e);
        }
        result
    }
}

#[async_trait]
impl CookieHarvester for SqliteCookieHarvester {
    async fn harvest(&self, browser: Browser, domain_suffixes: &[String]) -> Result<Vec<Cookie>> {
        let databases: Vec<PathBuf> = self
            .databases(browser)
            .into_iter()
            .filter(|path| path.is_file())
            .collect();

        if databases.is_empty() {
            anyhow::bail!("no {} cookie database found", browser);
        }

        let mut cookies = Vec::new();
        let mut last_error = None;
        let mut readable = 0usize;
        for database in &databases {
            debug!("Reading {} cookies from {}", browser, database.display());
            match self.read_copy(browser, database).await {
                Ok(found) => {
                    readable += 1;
                    cookies.extend(
                        found
                            .into_iter()
                            .filter(|c| matches_domain(&c.domain, domain_suffixes)),
                    );
                }
                Err(e) => {
                    warn!("Skipping {} profile {}: {:#}", browser, database.display(), e);
                    last_error = Some(e);
                }
            }
        }

        if readable == 0 {
            if let Some(e) = last_error {
                return Err(e.context(format!("no readable {} cookie database", browser)));
            }
        }

        info!("Found {} matching cookies in {}", cookies.len(), browser);
        Ok(cookies)
    }
}

async fn read_database(browser: Browser, path: &Path) -> Result<Vec<Cookie>> {
    let options = SqliteConnectOptions::new().filename(path);
    let mut conn = SqliteConnection::connect_with(&options).await?;

    let query = match browser {
        Browser::Firefox => "SELECT host, path, isSecure, expiry, name, value FROM moz_cookies",
        Browser::Chrome | Browser::Edge => {
            "SELECT host_key, path, is_secure, expires_utc, name, value FROM cookies"
        }
    };
    let rows = sqlx::query(query).fetch_all(&mut conn).await?;
    conn.close().await?;

    let mut cookies = Vec::with_capacity(rows.len());
    let mut encrypted = 0usize;
    for row in rows {
        let value: String = row.try_get(5)?;
        if value.is_empty() {
            // Chromium stores most values only in `encrypted_value`
            encrypted += 1;
            continue;
        }
        let raw_expiry: i64 = row.try_get(3)?;
        let expires_at = match browser {
            Browser::Firefox => firefox_expiry(raw_expiry),
            Browser::Chrome | Browser::Edge => chromium_expiry(raw_expiry),
        };
        let secure: i64 = row.try_get(2)?;

        cookies.push(Cookie {
            domain: row.try_get(0)?,
            path: row.try_get(1)?,
            secure: secure != 0,
            expires_at,
            name: row.try_get(4)?,
            value,
        });
    }

    if encrypted > 0 {
        debug!("Skipped {} encrypted {} cookies", encrypted, browser);
    }
    Ok(cookies)
}

/// True when `host` is one of the suffixes or lies under one
pub fn matches_domain(host: &str, domain_suffixes: &[String]) -> bool {
    let host = host.to_lowercase();
    let bare_host = host.trim_start_matches('.');
    domain_suffixes.iter().any(|suffix| {
        let suffix = suffix.to_lowercase();
        let bare_suffix = suffix.trim_start_matches('.');
        bare_host == bare_suffix || bare_host.ends_with(&format!(".{}", bare_suffix))
    })
}

fn firefox_expiry(raw: i64) -> Option<DateTime<Utc>> {
    match raw {
        0 => None,
        // Recent Firefox releases store milliseconds
        ms if ms > 100_000_000_000 => DateTime::<Utc>::from_timestamp(ms / 1000, 0),
        secs => DateTime::<Utc>::from_timestamp(secs, 0),
    }
}

fn chromium_expiry(raw: i64) -> Option<DateTime<Utc>> {
    if raw == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(raw / 1_000_000 - CHROMIUM_EPOCH_OFFSET_SECS, 0)
}
