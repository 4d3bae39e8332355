//! Data structures for extraction requests, backend records and results

use crate::utils::error::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One extraction call: the page URL and the format selectors to try, in order
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    url: String,
    format_selectors: Vec<String>,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>, format_selectors: Vec<String>) -> Self {
        Self {
            url: url.into(),
            format_selectors,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format_selectors(&self) -> &[String] {
        &self.format_selectors
    }
}

/// Top-level record printed by `yt-dlp --dump-json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBackendRecord {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub view_count: Option<u64>,
    pub extractor: Option<String>,
    pub webpage_url: Option<String>,
    pub uploader: Option<String>,
    pub upload_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub like_count: Option<u64>,
    pub channel_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub channel_follower_count: Option<u64>,
    /// Absent when the backend resolved the page but exposed no stream list
    pub formats: Option<Vec<RawStreamDescriptor>>,
}

/// One stream variant reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStreamDescriptor {
    pub format_id: Option<String>,
    pub url: Option<String>,
    pub protocol: Option<String>,
    pub format_note: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub fps: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub tbr: Option<f64>, // Total bitrate
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub filesize_approx: Option<u64>,
}

/// Numeric fields whose JSON type varies between extractors.
/// Anything that is not a usable number reads as `None`.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
            _ => None,
        })
    }

    pub fn unsigned<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        let value = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v.round() as u64)
            }),
            _ => None,
        };
        Ok(value.and_then(|v| T::try_from(v).ok()))
    }
}

/// Frame rate as reported, or `"unknown"` when the backend gave none
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fps {
    Known(f64),
    Unknown(UnknownMarker),
}

/// Serializes as the literal string `"unknown"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownMarker {
    Unknown,
}

impl Fps {
    pub fn unknown() -> Self {
        Fps::Unknown(UnknownMarker::Unknown)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Fps::Known(v) => Some(*v),
            Fps::Unknown(_) => None,
        }
    }
}

/// A directly fetchable stream that survived filtering, in output form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatCandidate {
    pub quality: String,
    pub container_format: String,
    pub resolution: String,
    pub filesize_bytes: u64,
    pub url: String,
    pub vcodec: String,
    pub acodec: String,
    pub fps: Fps,
    pub bitrate: f64,
}

impl FormatCandidate {
    /// Build the output form of a descriptor, applying the defaults table
    pub fn from_descriptor(descriptor: &RawStreamDescriptor, url: String) -> Self {
        let quality = match descriptor.height {
            Some(h) if h > 0 => format!("{}p", h),
            _ => "auto".to_string(),
        };
        let resolution = format!(
            "{}x{}",
            descriptor
                .width
                .map(|w| w.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            descriptor
                .height
                .map(|h| h.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        );

        Self {
            quality,
            container_format: descriptor.ext.clone().unwrap_or_else(|| "mp4".to_string()),
            resolution,
            filesize_bytes: descriptor
                .filesize
                .or(descriptor.filesize_approx)
                .unwrap_or(0),
            url,
            vcodec: descriptor.vcodec.clone().unwrap_or_else(|| "unknown".to_string()),
            acodec: descriptor.acodec.clone().unwrap_or_else(|| "unknown".to_string()),
            fps: descriptor.fps.map(Fps::Known).unwrap_or_else(Fps::unknown),
            bitrate: descriptor.tbr.unwrap_or(0.0),
        }
    }
}

/// Normalized result of a successful extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub title: String,
    pub thumbnail_url: String,
    pub description: String,
    pub duration_seconds: f64,
    pub view_count: u64,
    pub platform_name: String,
    pub canonical_url: String,
    pub uploader_name: String,
    pub upload_date: String,
    pub like_count: u64,
    pub channel_url: String,
    pub channel_follower_count: u64,
    /// Best first; never empty
    pub formats: Vec<FormatCandidate>,
    pub default_format: FormatCandidate,
}

impl VideoResult {
    /// JSON body for the front end, with the default format mirrored at the top level
    pub fn to_json(&self) -> Value {
        let mut body = serde_json::to_value(self).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut body {
            map.insert("quality".into(), json!(self.default_format.quality));
            map.insert("resolution".into(), json!(self.default_format.resolution));
            map.insert("format".into(), json!(self.default_format.container_format));
            map.insert("download_url".into(), json!(self.default_format.url));
        }
        body
    }
}

/// Final answer of one extraction call
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Success(Box<VideoResult>),
    Failure { kind: ErrorKind, detail: String },
}

impl ExtractionOutcome {
    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        ExtractionOutcome::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ExtractionOutcome::Success(_) => None,
            ExtractionOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Always a well-formed JSON object: the result, or `{"error": ...}`
    pub fn to_json(&self) -> Value {
        match self {
            ExtractionOutcome::Success(result) => result.to_json(),
            ExtractionOutcome::Failure { kind, .. } => json!({ "error": kind.user_message() }),
        }
    }
}
