//! HTTP front end

use crate::extractor::classify::kind_for_unexpected;
use crate::extractor::{ExtractionOrchestrator, ExtractionOutcome};
use crate::utils::config::ServerSettings;
use axum::extract::{Form, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

const BANNER: &str = "vidcdn: POST /extract with form field `url` to get direct stream URLs\n";

/// Form body of `POST /extract`
#[derive(Debug, Default, Deserialize)]
pub struct ExtractForm {
    pub url: Option<String>,
}

pub fn router(orchestrator: Arc<ExtractionOrchestrator>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/extract", post(extract))
        .with_state(orchestrator)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn serve(settings: &ServerSettings, orchestrator: Arc<ExtractionOrchestrator>) -> anyhow::Result<()> {
    let address = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);

    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

async fn index() -> &'static str {
    BANNER
}

pub async fn extract(
    State(orchestrator): State<Arc<ExtractionOrchestrator>>,
    Form(form): Form<ExtractForm>,
) -> Json<Value> {
    let url = match form.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return Json(json!({ "error": "No URL provided" })),
    };

    info!("Processing URL: {}", url);
    // A panic inside the search must still produce a JSON answer
    let outcome = match tokio::spawn(async move { orchestrator.extract(&url).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Extraction task failed: {}", e);
            let detail = e.to_string();
            ExtractionOutcome::failure(kind_for_unexpected(&detail), detail)
        }
    };
    Json(outcome.to_json())
}
