//! Classification of backend error text
//!
//! yt-dlp reports failures as free text. Conditions caused by the calling
//! identity (bot checks, 403s) are worth retrying under another identity;
//! conditions caused by the video itself are not. Both the attempt executor
//! and the top-level error path read from the tables below.

use crate::utils::error::ErrorKind;

/// Phrases that point at the identity that made the request
const IDENTITY_FAILURES: &[(&str, &str)] = &[
    ("Sign in to confirm you\u{2019}re not a bot", "bot detection"),
    ("Sign in to confirm you're not a bot", "bot detection"),
    ("HTTP Error 403", "access denied (403)"),
];

/// Phrases that point at the video itself. First match wins, so order matters.
const VIDEO_FAILURES: &[(&str, ErrorKind)] = &[
    ("Sign in to confirm your age", ErrorKind::AgeRestricted),
    ("Private video", ErrorKind::PrivateVideo),
    // Geo notices usually start with "Video unavailable."
    ("available in your country", ErrorKind::GeoBlocked),
    ("This video is unavailable", ErrorKind::VideoUnavailable),
    ("Video unavailable", ErrorKind::VideoUnavailable),
    ("This video has been removed", ErrorKind::VideoUnavailable),
    ("Incomplete YouTube ID", ErrorKind::IncompleteId),
    ("HTTP Error 429", ErrorKind::RateLimited),
    ("This live event will begin in", ErrorKind::LiveNotStarted),
    ("Premieres in", ErrorKind::LiveNotStarted),
    ("Join this channel to get access", ErrorKind::MembersOnly),
    ("members-only content", ErrorKind::MembersOnly),
    ("Content is not available", ErrorKind::GeoBlocked),
];

/// How one backend failure message should steer the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Caused by the identity; try the next one
    IdentityDependent(&'static str),
    /// Caused by the video; stop searching
    Permanent(ErrorKind),
    /// Not in either table
    Unrecognized,
}

/// Match a backend message against the identity table, then the video table
pub fn classify(message: &str) -> Classification {
    if let Some((_, reason)) = IDENTITY_FAILURES
        .iter()
        .find(|(phrase, _)| message.contains(phrase))
    {
        return Classification::IdentityDependent(reason);
    }

    match permanent_kind(message) {
        Some(kind) => Classification::Permanent(kind),
        None => Classification::Unrecognized,
    }
}

/// The video-state kind named by a message, if any
pub fn permanent_kind(message: &str) -> Option<ErrorKind> {
    VIDEO_FAILURES
        .iter()
        .find(|(phrase, _)| message.contains(phrase))
        .map(|(_, kind)| *kind)
}

/// Kind for an error that escaped the search loop
pub fn kind_for_unexpected(message: &str) -> ErrorKind {
    permanent_kind(message).unwrap_or(ErrorKind::Unknown)
}
