//! Builds the final result from a backend record and its ranked streams

use crate::extractor::models::{FormatCandidate, RawBackendRecord, RawStreamDescriptor, VideoResult};
use crate::extractor::rank::rank_descriptors;
use crate::extractor::sanitize::sanitize_stream_url;

/// Filter, rank and sanitize a stream list into output candidates
pub fn ranked_candidates(descriptors: &[RawStreamDescriptor]) -> Vec<FormatCandidate> {
    rank_descriptors(descriptors)
        .into_iter()
        .map(|d| {
            let url = sanitize_stream_url(d.url.as_deref().unwrap_or_default());
            FormatCandidate::from_descriptor(d, url)
        })
        .collect()
}

/// Assemble a result; `None` when no candidate survived.
///
/// `requested_url` stands in for the canonical URL when the backend did
/// not report one.
pub fn assemble(
    requested_url: &str,
    record: &RawBackendRecord,
    formats: Vec<FormatCandidate>,
) -> Option<VideoResult> {
    let default_format = formats.first()?.clone();

    Some(VideoResult {
        title: text_or(&record.title, "Unknown"),
        thumbnail_url: text_or(&record.thumbnail, ""),
        description: text_or(&record.description, ""),
        duration_seconds: record.duration.unwrap_or(0.0),
        view_count: record.view_count.unwrap_or(0),
        platform_name: text_or(&record.extractor, "Unknown"),
        canonical_url: text_or(&record.webpage_url, requested_url),
        uploader_name: text_or(&record.uploader, "Unknown"),
        upload_date: text_or(&record.upload_date, ""),
        like_count: record.like_count.unwrap_or(0),
        channel_url: text_or(&record.channel_url, ""),
        channel_follower_count: record.channel_follower_count.unwrap_or(0),
        formats,
        default_format,
    })
}

fn text_or(value: &Option<String>, default: &str) -> String {
    value.clone().unwrap_or_else(|| default.to_string())
}
