//! Raw CDN links that need no extraction

use crate::extractor::models::{FormatCandidate, Fps, VideoResult};
use url::Url;

/// True when the URL's host is one of `hosts` or a subdomain of one
pub fn is_direct_media_url(raw: &str, hosts: &[String]) -> bool {
    let Some(host) = Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
    else {
        return false;
    };

    hosts.iter().any(|known| {
        let known = known.trim_start_matches('.').to_lowercase();
        host == known || host.ends_with(&format!(".{}", known))
    })
}

/// Single-format result echoing the input URL
pub fn direct_result(raw: &str) -> VideoResult {
    let format = FormatCandidate {
        quality: "direct".to_string(),
        container_format: "mp4".to_string(),
        resolution: "original".to_string(),
        filesize_bytes: 0,
        url: raw.to_string(),
        vcodec: "unknown".to_string(),
        acodec: "unknown".to_string(),
        fps: Fps::unknown(),
        bitrate: 0.0,
    };

    VideoResult {
        title: "Direct Video".to_string(),
        thumbnail_url: String::new(),
        description: String::new(),
        duration_seconds: 0.0,
        view_count: 0,
        platform_name: "googlevideo".to_string(),
        canonical_url: raw.to_string(),
        uploader_name: "Unknown".to_string(),
        upload_date: String::new(),
        like_count: 0,
        channel_url: String::new(),
        channel_follower_count: 0,
        formats: vec![format.clone()],
        default_format: format,
    }
}
