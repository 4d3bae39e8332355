//! Assembles the credential contexts available to one extraction request

use crate::credentials::{
    dedup_cookies, netscape, Browser, CookieHarvester, CredentialContext, CredentialSource,
};
use crate::utils::config::ExtractorSettings;
use crate::utils::platform;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Builds credential contexts: harvested browser cookies first, then the
/// static fallback file, then no cookies at all
pub struct CredentialSupplier {
    harvester: Arc<dyn CookieHarvester>,
    browsers: Vec<Browser>,
    domain_suffixes: Vec<String>,
    static_cookie_file: PathBuf,
    scratch_dir: PathBuf,
}

impl CredentialSupplier {
    pub fn new(harvester: Arc<dyn CookieHarvester>, settings: &ExtractorSettings) -> Self {
        Self {
            harvester,
            browsers: settings.browsers.clone(),
            domain_suffixes: settings.cookie_domains.clone(),
            static_cookie_file: settings.static_cookie_file.clone(),
            scratch_dir: platform::scratch_dir(settings.temp_dir.as_deref()),
        }
    }

    /// Contexts for one request, in the order they should be tried.
    ///
    /// The returned lease owns any cookie file written here and deletes it
    /// when released or dropped.
    pub async fn supply(&self) -> CredentialLease {
        let mut harvested = Vec::new();
        for browser in &self.browsers {
            match self.harvester.harvest(*browser, &self.domain_suffixes).await {
                Ok(cookies) => {
                    for cookie in &cookies {
                        debug!("Cookie: {} from {}", cookie.name, cookie.domain);
                    }
                    harvested.extend(cookies);
                }
                Err(e) => warn!("Could not get cookies from {}: {:#}", browser, e),
            }
        }

        let harvested = dedup_cookies(harvested);
        if !harvested.is_empty() {
            let path = self
                .scratch_dir
                .join(format!("vidcdn-cookies-{}.txt", Uuid::new_v4()));
            match netscape::write_file(&path, &harvested).await {
                Ok(()) => {
                    info!("Saved {} browser cookies to {}", harvested.len(), path.display());
                    let context = CredentialContext::from_file(
                        CredentialSource::BrowserHarvested,
                        harvested,
                        &path,
                    );
                    return CredentialLease::owning(vec![context], path);
                }
                Err(e) => {
                    error!("Error saving cookies to {}: {}", path.display(), e);
                    // A partial file may exist
                    let _ = tokio::fs::remove_file(&path).await;
                }
            }
        } else {
            warn!("No browser cookies found");
        }

        CredentialLease::borrowed(vec![self.fallback_context().await])
    }

    async fn fallback_context(&self) -> CredentialContext {
        let path = &self.static_cookie_file;
        if !path.is_file() {
            debug!("No static cookie file at {}", path.display());
            return CredentialContext::empty();
        }

        match netscape::read_file(path).await {
            Ok(cookies) => {
                info!("Using {} cookies from {}", cookies.len(), path.display());
                CredentialContext::from_file(CredentialSource::StaticFile, cookies, path)
            }
            Err(e) => {
                warn!("Could not read static cookie file {}: {}", path.display(), e);
                CredentialContext::empty()
            }
        }
    }
}

/// Credential contexts for one request plus the temporary file backing them.
///
/// The temporary file is removed by `release`, or on drop if the request
/// ended early (deadline, panic, cancelled future). Static fallback files
/// are never owned by a lease.
#[derive(Debug)]
pub struct CredentialLease {
    contexts: Vec<CredentialContext>,
    temp_file: Option<PathBuf>,
}

impl CredentialLease {
    fn owning(contexts: Vec<CredentialContext>, temp_file: PathBuf) -> Self {
        Self {
            contexts,
            temp_file: Some(temp_file),
        }
    }

    fn borrowed(contexts: Vec<CredentialContext>) -> Self {
        Self {
            contexts,
            temp_file: None,
        }
    }

    pub fn contexts(&self) -> &[CredentialContext] {
        &self.contexts
    }

    pub fn temp_file(&self) -> Option<&Path> {
        self.temp_file.as_deref()
    }

    /// Delete the temporary cookie file, if any
    pub async fn release(mut self) {
        if let Some(path) = self.temp_file.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed temporary cookie file {}", path.display()),
                Err(e) => warn!("Failed to remove cookie file {}: {}", path.display(), e),
            }
        }
    }
}

impl Drop for CredentialLease {
    fn drop(&mut self) {
        if let Some(path) = self.temp_file.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove cookie file {}: {}", path.display(), e);
            } else {
                debug!("Removed temporary cookie file {} on drop", path.display());
            }
        }
    }
}
