//! Property checks for stream URL sanitizing and quality ranking.

use proptest::prelude::*;
use vidcdn::extractor::rank::{filter_and_rank, is_direct_video, quality_key, rank_descriptors};
use vidcdn::extractor::sanitize::sanitize_stream_url;
use vidcdn::extractor::RawStreamDescriptor;

fn param() -> impl Strategy<Value = String> {
    prop_oneof![
        ("[a-z]{1,8}", "[a-zA-Z0-9%._-]{0,12}").prop_map(|(k, v)| format!("{}={}", k, v)),
        prop_oneof![Just("range"), Just("rn"), Just("rbuf"), Just("mime"), Just("rangeX")]
            .prop_flat_map(|k| "[0-9a-z-]{0,8}".prop_map(move |v| format!("{}={}", k, v))),
    ]
}

fn stream_url() -> impl Strategy<Value = String> {
    (prop::collection::vec(param(), 0..8), prop::option::of("[a-z0-9?=&]{1,10}")).prop_map(
        |(params, fragment)| {
            let mut url = "https://rr2.googlevideo.com/videoplayback".to_string();
            if !params.is_empty() {
                url.push('?');
                url.push_str(&params.join("&"));
            }
            if let Some(fragment) = fragment {
                url.push('#');
                url.push_str(&fragment);
            }
            url
        },
    )
}

fn descriptor() -> impl Strategy<Value = RawStreamDescriptor> {
    (
        prop::option::of(prop_oneof![Just("https"), Just("m3u8_native"), Just("http_dash_segments"), Just("https+dash")]),
        prop::option::of(prop_oneof![Just("720p"), Just("audio only"), Just("storyboard images")]),
        prop::option::of(0u32..2200),
        prop::option::of(0.0f64..8000.0),
        prop::option::of(prop_oneof![Just("mp4"), Just("webm")]),
        prop::bool::ANY,
    )
        .prop_map(|(protocol, note, height, tbr, ext, has_url)| RawStreamDescriptor {
            url: has_url.then(|| "https://cdn.example.com/v?range=0-1&id=1".to_string()),
            protocol: protocol.map(str::to_string),
            format_note: note.map(str::to_string),
            height,
            width: height.map(|h| h * 16 / 9),
            tbr,
            ext: ext.map(str::to_string),
            ..Default::default()
        })
}

/// Query part of a URL, ignoring any fragment
fn query_of(url: &str) -> &str {
    let head = url.split_once('#').map_or(url, |(head, _)| head);
    head.split_once('?').map_or("", |(_, q)| q)
}

fn fragment_of(url: &str) -> Option<&str> {
    url.split_once('#').map(|(_, f)| f)
}

fn is_session_name(param: &str) -> bool {
    let name = param.split_once('=').map_or(param, |(k, _)| k);
    ["range", "rn", "rbuf", "mime"].iter().any(|s| name.starts_with(s))
}

proptest! {
    #[test]
    fn sanitize_is_idempotent(url in stream_url()) {
        let once = sanitize_stream_url(&url);
        prop_assert_eq!(sanitize_stream_url(&once), once);
    }

    #[test]
    fn sanitize_drops_only_session_params(url in stream_url()) {
        let clean = sanitize_stream_url(&url);
        prop_assert!(!query_of(&clean).split('&').any(is_session_name));
        prop_assert!(clean.starts_with("https://rr2.googlevideo.com/videoplayback"));

        let kept: Vec<&str> = query_of(&url)
            .split('&')
            .filter(|p| !p.is_empty() && !is_session_name(p))
            .collect();
        let clean_query: Vec<&str> = query_of(&clean).split('&').filter(|p| !p.is_empty()).collect();
        prop_assert_eq!(clean_query, kept);
    }

    #[test]
    fn sanitize_leaves_fragment_alone(url in stream_url()) {
        let clean = sanitize_stream_url(&url);
        prop_assert_eq!(fragment_of(&clean), fragment_of(&url));
        let has_query = url.split('#').next().map_or(false, |head| head.contains('?'));
        if !has_query {
            prop_assert_eq!(clean, url);
        }
    }

    #[test]
    fn ranking_keeps_only_direct_video(descriptors in prop::collection::vec(descriptor(), 0..20)) {
        let ranked = rank_descriptors(&descriptors);
        prop_assert_eq!(ranked.len(), descriptors.iter().filter(|d| is_direct_video(d)).count());
        for d in &ranked {
            prop_assert!(is_direct_video(d));
        }
        prop_assert_eq!(filter_and_rank(&descriptors).len(), ranked.len());
    }

    #[test]
    fn ranking_is_sorted_best_first(descriptors in prop::collection::vec(descriptor(), 0..20)) {
        let ranked = rank_descriptors(&descriptors);
        for pair in ranked.windows(2) {
            let (a, b) = (quality_key(pair[0]), quality_key(pair[1]));
            prop_assert!(a.partial_cmp(&b) != Some(std::cmp::Ordering::Less));
        }
    }

    #[test]
    fn ranking_ignores_input_order(descriptors in prop::collection::vec(descriptor(), 0..12)) {
        let mut reversed = descriptors.clone();
        reversed.reverse();

        let forward: Vec<_> = rank_descriptors(&descriptors).into_iter().map(quality_key).collect();
        let backward: Vec<_> = rank_descriptors(&reversed).into_iter().map(quality_key).collect();
        prop_assert_eq!(forward, backward);
    }
}
