//! Error handling for vidcdn

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for vidcdn
#[derive(Debug, Error)]
pub enum VidcdnError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Classified failure of one extraction request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidUrl,
    AgeRestricted,
    PrivateVideo,
    VideoUnavailable,
    IncompleteId,
    RateLimited,
    LiveNotStarted,
    MembersOnly,
    GeoBlocked,
    NoExtractableFormat,
    Timeout,
    Unknown,
}

impl ErrorKind {
    /// Message placed in the `error` field of a failure response
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "Invalid URL format",
            ErrorKind::AgeRestricted => "This video is age-restricted",
            ErrorKind::PrivateVideo => "This is a private video and cannot be accessed",
            ErrorKind::VideoUnavailable => {
                "This video is unavailable. It may have been removed or made private"
            }
            ErrorKind::IncompleteId => "The video link is incomplete or malformed",
            ErrorKind::RateLimited => "Too many requests. Please try again shortly",
            ErrorKind::LiveNotStarted => "This live event has not started yet",
            ErrorKind::MembersOnly => "This content is only available to channel members",
            ErrorKind::GeoBlocked => "This content is not available in your region",
            ErrorKind::NoExtractableFormat => {
                "Could not extract a downloadable format. The video may be private or restricted"
            }
            ErrorKind::Timeout => "Extraction timed out. Please try again later",
            ErrorKind::Unknown => "An unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::AgeRestricted => "age_restricted",
            ErrorKind::PrivateVideo => "private_video",
            ErrorKind::VideoUnavailable => "video_unavailable",
            ErrorKind::IncompleteId => "incomplete_id",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::LiveNotStarted => "live_not_started",
            ErrorKind::MembersOnly => "members_only",
            ErrorKind::GeoBlocked => "geo_blocked",
            ErrorKind::NoExtractableFormat => "no_extractable_format",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
