//! The extraction search
//!
//! One request walks format selectors (outermost), then credential
//! contexts, then identities until an attempt yields at least one directly
//! fetchable stream, a video-level failure ends the search, or the space
//! runs out. With `max_parallel_attempts > 1` several attempts run at
//! once, but results are still consumed in search order.

use crate::credentials::{CookieHarvester, CredentialContext, CredentialSupplier, SqliteCookieHarvester};
use crate::extractor::assemble::{assemble, ranked_candidates};
use crate::extractor::direct::{direct_result, is_direct_media_url};
use crate::extractor::executor::{AttemptExecutor, AttemptOutcome};
use crate::extractor::models::{ExtractionOutcome, ExtractionRequest};
use crate::extractor::traits::ExtractionBackend;
use crate::extractor::validate::is_valid_url;
use crate::extractor::ytdlp::YtDlpBackend;
use crate::identity::{Identity, IdentityRotation, IdentitySpace};
use crate::utils::config::ExtractorSettings;
use crate::utils::error::{ErrorKind, VidcdnError};
use crate::utils::platform;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One step of the search as seen by the consumer
enum Step {
    Finished(AttemptOutcome),
    /// Not run, or abandoned because another attempt ended the search
    Skipped,
}

/// Entry point for turning a page URL into ranked stream URLs
pub struct ExtractionOrchestrator {
    executor: AttemptExecutor,
    supplier: CredentialSupplier,
    rotation: IdentityRotation,
    format_selectors: Vec<String>,
    direct_media_hosts: Vec<String>,
    max_parallel_attempts: usize,
    request_deadline: Option<Duration>,
}

impl ExtractionOrchestrator {
    pub fn new(
        backend: Arc<dyn ExtractionBackend>,
        harvester: Arc<dyn CookieHarvester>,
        settings: &ExtractorSettings,
    ) -> Self {
        info!("Extraction backend: {}", backend.id());
        Self {
            executor: AttemptExecutor::new(backend, settings.socket_timeout()),
            supplier: CredentialSupplier::new(harvester, settings),
            rotation: IdentityRotation::from_settings(settings),
            format_selectors: settings.format_selectors.clone(),
            direct_media_hosts: settings.direct_media_hosts.clone(),
            max_parallel_attempts: settings.max_parallel_attempts.max(1),
            request_deadline: settings.request_deadline(),
        }
    }

    /// Orchestrator backed by yt-dlp and the local browsers' cookie stores
    pub fn from_settings(settings: &ExtractorSettings) -> Result<Self, VidcdnError> {
        let backend = YtDlpBackend::new(settings.ytdlp_path.as_deref(), settings.attempt_timeout())?;
        let harvester =
            SqliteCookieHarvester::new(platform::scratch_dir(settings.temp_dir.as_deref()));
        Ok(Self::new(Arc::new(backend), Arc::new(harvester), settings))
    }

    /// Extract metadata and ranked stream URLs for a page URL.
    ///
    /// Never fails outright: every problem ends up as
    /// `ExtractionOutcome::Failure` with a kind.
    pub async fn extract(&self, url: &str) -> ExtractionOutcome {
        let url = url.trim();
        if !is_valid_url(url) {
            warn!("Rejected invalid URL: {:?}", url);
            return ExtractionOutcome::failure(ErrorKind::InvalidUrl, url);
        }

        if is_direct_media_url(url, &self.direct_media_hosts) {
            info!("Direct media URL, skipping extraction: {}", url);
            return ExtractionOutcome::Success(Box::new(direct_result(url)));
        }

        let started = Instant::now();
        let request = ExtractionRequest::new(url, self.format_selectors.clone());

        // Dropping this future mid-way still removes the cookie file via the lease
        let work = async {
            let lease = self.supplier.supply().await;
            let space = self.rotation.generate();
            debug!(
                "Search space: {} selectors x {} credential contexts x {} identities",
                request.format_selectors().len(),
                lease.contexts().len(),
                space.len()
            );

            let outcome = self.search(&request, lease.contexts(), &space).await;
            lease.release().await;
            outcome
        };

        let outcome = match self.request_deadline {
            Some(deadline) => match tokio::time::timeout(deadline, work).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Extraction of {} hit the {:?} deadline", url, deadline);
                    ExtractionOutcome::failure(
                        ErrorKind::Timeout,
                        format!("deadline of {:?} exceeded", deadline),
                    )
                }
            },
            None => work.await,
        };

        match &outcome {
            ExtractionOutcome::Success(result) => info!(
                "Extracted {} formats for {} in {:?}",
                result.formats.len(),
                url,
                started.elapsed()
            ),
            ExtractionOutcome::Failure { kind, detail } => {
                warn!("Extraction of {} failed ({}): {}", url, kind, detail)
            }
        }
        outcome
    }

    async fn search(
        &self,
        request: &ExtractionRequest,
        contexts: &[CredentialContext],
        space: &IdentitySpace,
    ) -> ExtractionOutcome {
        let total = request.format_selectors().len() * contexts.len() * space.len();
        if total == 0 {
            return ExtractionOutcome::failure(ErrorKind::NoExtractableFormat, "empty search space");
        }

        let plan: Vec<(usize, String, CredentialContext, Identity)> = request
            .format_selectors()
            .iter()
            .flat_map(|selector| {
                contexts.iter().flat_map(move |context| {
                    space
                        .iter()
                        .map(move |identity| (selector.clone(), context.clone(), identity))
                })
            })
            .enumerate()
            .map(|(index, (selector, context, identity))| (index, selector, context, identity))
            .collect();

        let cancel = CancellationToken::new();
        let executor = &self.executor;
        let mut steps = stream::iter(plan)
            .map(|(index, selector, context, identity)| {
                let cancel = cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return Step::Skipped;
                    }
                    let is_last = index + 1 == total;
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Step::Skipped,
                        outcome = executor.attempt(request, &identity, &context, &selector, is_last) => {
                            if outcome.aborts_search() {
                                cancel.cancel();
                            }
                            Step::Finished(outcome)
                        }
                    }
                }
            })
            .buffered(self.max_parallel_attempts);

        let mut last_reason = String::from("no attempt produced a usable stream");
        while let Some(step) = steps.next().await {
            match step {
                Step::Skipped => continue,
                Step::Finished(AttemptOutcome::RawSuccess(record)) => {
                    let formats = ranked_candidates(record.formats.as_deref().unwrap_or_default());
                    match assemble(request.url(), &record, formats) {
                        Some(result) => {
                            cancel.cancel();
                            return ExtractionOutcome::Success(Box::new(result));
                        }
                        None => {
                            warn!("No suitable video formats found");
                            last_reason = "no directly fetchable video stream".to_string();
                        }
                    }
                }
                Step::Finished(AttemptOutcome::SoftFail(reason)) => {
                    debug!("Attempt failed, trying next: {}", reason);
                    last_reason = reason;
                }
                Step::Finished(AttemptOutcome::HardFail { kind, detail }) => {
                    cancel.cancel();
                    return ExtractionOutcome::failure(kind, detail);
                }
            }
        }

        ExtractionOutcome::failure(ErrorKind::NoExtractableFormat, last_reason)
    }
}
