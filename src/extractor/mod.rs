//! Extraction pipeline: validation, the attempt search and result assembly

pub mod assemble;
pub mod classify;
pub mod direct;
pub mod executor;
pub mod models;
pub mod orchestrator;
pub mod rank;
pub mod sanitize;
pub mod traits;
pub mod validate;
pub mod ytdlp;

pub use executor::{AttemptExecutor, AttemptOutcome};
pub use models::{
    ExtractionOutcome, ExtractionRequest, FormatCandidate, RawBackendRecord, RawStreamDescriptor,
    VideoResult,
};
pub use orchestrator::ExtractionOrchestrator;
pub use traits::{AttemptConfig, BackendError, ExtractionBackend};
pub use ytdlp::YtDlpBackend;
