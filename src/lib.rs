//! vidcdn library

pub mod credentials;
pub mod extractor;
pub mod identity;
pub mod server;
pub mod utils;

// Re-export main types for easier use
pub use extractor::{ExtractionOrchestrator, ExtractionOutcome, VideoResult};
pub use identity::{Identity, IdentityRotation};
pub use utils::{AppSettings, ErrorKind, VidcdnError};
