//! Filtering and quality ranking of backend stream descriptors

use crate::extractor::models::{FormatCandidate, RawStreamDescriptor};
use std::cmp::Ordering;

/// Segmented delivery protocols whose URL is a manifest, not a media file
const MANIFEST_PROTOCOLS: &[&str] = &[
    "m3u8",
    "m3u8_native",
    "dash",
    "dash_manifest",
    "http_dash_segments",
    "f4m",
    "ism",
];

/// `format_note` fragments marking streams with no usable video
const EXCLUDED_NOTES: &[&str] = &["audio only", "images", "thumbnail"];

/// True when the descriptor points at a directly fetchable video stream
pub fn is_direct_video(descriptor: &RawStreamDescriptor) -> bool {
    if descriptor.url.as_deref().map_or(true, str::is_empty) {
        return false;
    }

    if let Some(protocol) = descriptor.protocol.as_deref() {
        // Merged formats report e.g. "m3u8_native+https"
        let protocol = protocol.to_lowercase();
        if protocol
            .split('+')
            .any(|part| MANIFEST_PROTOCOLS.contains(&part.trim()))
        {
            return false;
        }
    }

    if let Some(note) = descriptor.format_note.as_deref() {
        let note = note.to_lowercase();
        if EXCLUDED_NOTES.iter().any(|excluded| note.contains(excluded)) {
            return false;
        }
    }

    true
}

/// Drop unusable descriptors and order the rest best-first.
///
/// The order is descending over (bitrate, height, width, fps, is mp4).
/// Exact ties keep the backend's order.
pub fn filter_and_rank(descriptors: &[RawStreamDescriptor]) -> Vec<FormatCandidate> {
    rank_descriptors(descriptors)
        .into_iter()
        .map(|d| FormatCandidate::from_descriptor(d, d.url.clone().unwrap_or_default()))
        .collect()
}

/// The surviving descriptors themselves, best-first
pub fn rank_descriptors(descriptors: &[RawStreamDescriptor]) -> Vec<&RawStreamDescriptor> {
    let mut survivors: Vec<&RawStreamDescriptor> =
        descriptors.iter().filter(|d| is_direct_video(d)).collect();

    // sort_by is stable
    survivors.sort_by(|a, b| compare_quality(b, a));
    survivors
}

/// Sort key tuple of one descriptor, missing values counting as zero
pub fn quality_key(descriptor: &RawStreamDescriptor) -> (f64, u32, u32, f64, bool) {
    (
        descriptor.tbr.unwrap_or(0.0),
        descriptor.height.unwrap_or(0),
        descriptor.width.unwrap_or(0),
        descriptor.fps.unwrap_or(0.0),
        descriptor.ext.as_deref() == Some("mp4"),
    )
}

/// Ascending comparison of two descriptors by the quality key
pub fn compare_quality(a: &RawStreamDescriptor, b: &RawStreamDescriptor) -> Ordering {
    let (a_tbr, a_h, a_w, a_fps, a_mp4) = quality_key(a);
    let (b_tbr, b_h, b_w, b_fps, b_mp4) = quality_key(b);

    a_tbr
        .total_cmp(&b_tbr)
        .then(a_h.cmp(&b_h))
        .then(a_w.cmp(&b_w))
        .then(a_fps.total_cmp(&b_fps))
        .then(a_mp4.cmp(&b_mp4))
}
