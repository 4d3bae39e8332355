//! Stripping of session-bound query parameters from stream URLs

/// Parameter name prefixes that bind a link to one playback session
const SESSION_PARAM_PREFIXES: &[&str] = &["range", "rn", "rbuf", "mime"];

/// Remove session/range parameters so the same stream yields the same URL.
///
/// Only the query is touched: the remaining parameters keep their original
/// text and order, and the `?` is dropped when nothing is left.
pub fn sanitize_stream_url(stream_url: &str) -> String {
    // A '?' inside the fragment is not a query
    let (without_fragment, fragment) = match stream_url.split_once('#') {
        Some((head, f)) => (head, Some(f)),
        None => (stream_url, None),
    };

    let (base, query) = match without_fragment.split_once('?') {
        Some(parts) => parts,
        None => return stream_url.to_string(),
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|param| !is_session_param(param))
        .collect();

    let mut out = String::with_capacity(stream_url.len());
    out.push_str(base);
    // An empty query splits into one empty parameter and is kept as-is
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn is_session_param(param: &str) -> bool {
    let name = param.split_once('=').map_or(param, |(name, _)| name);
    SESSION_PARAM_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}
