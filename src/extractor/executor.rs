//! One extraction attempt under one identity and format selector

use crate::credentials::CredentialContext;
use crate::extractor::classify::{classify, Classification};
use crate::extractor::models::{ExtractionRequest, RawBackendRecord};
use crate::extractor::traits::{AttemptConfig, BackendError, ExtractionBackend};
use crate::identity::Identity;
use crate::utils::error::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What a single attempt tells the search loop
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// The backend returned a record with a non-empty stream list
    RawSuccess(RawBackendRecord),
    /// Worth retrying under the next identity
    SoftFail(String),
    /// Stop the search with this kind
    HardFail { kind: ErrorKind, detail: String },
}

impl AttemptOutcome {
    /// True for failures caused by the video itself, which no other
    /// identity can get past. An `Unknown` on the final attempt only ends
    /// the loop because nothing is left to try.
    pub fn aborts_search(&self) -> bool {
        matches!(self, AttemptOutcome::HardFail { kind, .. } if *kind != ErrorKind::Unknown)
    }
}

/// Runs attempts against a backend and classifies what comes back
pub struct AttemptExecutor {
    backend: Arc<dyn ExtractionBackend>,
    socket_timeout: Duration,
}

impl AttemptExecutor {
    pub fn new(backend: Arc<dyn ExtractionBackend>, socket_timeout: Duration) -> Self {
        Self {
            backend,
            socket_timeout,
        }
    }

    /// Try one (identity, credentials, selector) combination.
    ///
    /// `is_last` marks the final combination of the whole search space;
    /// an unrecognized failure there becomes `HardFail(Unknown)`.
    pub async fn attempt(
        &self,
        request: &ExtractionRequest,
        identity: &Identity,
        credentials: &CredentialContext,
        format_selector: &str,
        is_last: bool,
    ) -> AttemptOutcome {
        let config = AttemptConfig {
            identity,
            credentials,
            format_selector,
            socket_timeout: self.socket_timeout,
        };

        info!("Attempting to extract info for URL: {}", request.url());
        debug!("Using {} with format {}", identity, format_selector);

        match self.backend.resolve(request.url(), &config).await {
            Ok(record) => match record.formats.as_deref() {
                None => {
                    warn!("No formats found in extracted info");
                    AttemptOutcome::SoftFail("no formats in backend record".to_string())
                }
                Some([]) => {
                    warn!("Backend returned an empty format list");
                    AttemptOutcome::SoftFail("empty format list".to_string())
                }
                Some(_) => AttemptOutcome::RawSuccess(record),
            },
            Err(BackendError::Reported(message)) => classify_failure(&message, identity, is_last),
            Err(e) => {
                let message = e.to_string();
                error!("Error during info extraction: {}", message);
                unrecognized(message, is_last)
            }
        }
    }
}

fn classify_failure(message: &str, identity: &Identity, is_last: bool) -> AttemptOutcome {
    match classify(message) {
        Classification::IdentityDependent(reason) => {
            warn!("{} with User-Agent: {}", reason, identity.user_agent);
            AttemptOutcome::SoftFail(reason.to_string())
        }
        Classification::Permanent(kind) => {
            info!("Backend reported {} ({}), stopping search", kind, message);
            AttemptOutcome::HardFail {
                kind,
                detail: message.to_string(),
            }
        }
        Classification::Unrecognized => {
            error!("yt-dlp error: {}", message);
            unrecognized(message.to_string(), is_last)
        }
    }
}

fn unrecognized(message: String, is_last: bool) -> AttemptOutcome {
    if is_last {
        AttemptOutcome::HardFail {
            kind: ErrorKind::Unknown,
            detail: message,
        }
    } else {
        AttemptOutcome::SoftFail(message)
    }
}
