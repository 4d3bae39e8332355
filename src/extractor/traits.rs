use crate::credentials::CredentialContext;
use crate::extractor::models::RawBackendRecord;
use crate::identity::Identity;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Everything one backend call needs, built fresh for every attempt
#[derive(Debug, Clone, Copy)]
pub struct AttemptConfig<'a> {
    pub identity: &'a Identity,
    pub credentials: &'a CredentialContext,
    pub format_selector: &'a str,
    pub socket_timeout: Duration,
}

/// Failure of one backend call
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend ran and reported a failure message
    #[error("{0}")]
    Reported(String),

    #[error("failed to run backend: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed backend output: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("backend call timed out after {0:?}")]
    TimedOut(Duration),
}

/// Core trait for metadata extraction backends
///
/// This trait isolates the search from the specific extraction method
/// (yt-dlp process, test double, etc.).
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Returns a unique identifier for this backend (e.g., "ytdlp")
    fn id(&self) -> &'static str;

    /// Resolve a page URL into its metadata record under one attempt configuration.
    ///
    /// The format selector is a hint; a backend may return more streams
    /// than it selects.
    async fn resolve(
        &self,
        url: &str,
        config: &AttemptConfig<'_>,
    ) -> Result<RawBackendRecord, BackendError>;
}
