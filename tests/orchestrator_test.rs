//! End-to-end tests of the extraction search against a scripted backend.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vidcdn::credentials::{Browser, Cookie, CookieHarvester};
use vidcdn::extractor::{
    AttemptConfig, BackendError, ExtractionBackend, ExtractionOrchestrator, ExtractionOutcome,
    RawBackendRecord,
};
use vidcdn::utils::{ErrorKind, ExtractorSettings};

type Reply = (Duration, Result<RawBackendRecord, BackendError>);
type Script = dyn Fn(usize, &AttemptConfig<'_>) -> Reply + Send + Sync;

struct ScriptedBackend {
    calls: Arc<AtomicUsize>,
    saw_cookie_file: Arc<AtomicBool>,
    script: Box<Script>,
}

#[async_trait]
impl ExtractionBackend for ScriptedBackend {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn resolve(
        &self,
        _url: &str,
        config: &AttemptConfig<'_>,
    ) -> Result<RawBackendRecord, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if config.credentials.cookie_file().map_or(false, Path::exists) {
            self.saw_cookie_file.store(true, Ordering::SeqCst);
        }
        let (delay, result) = (self.script)(call, config);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

struct Harness {
    orchestrator: ExtractionOrchestrator,
    calls: Arc<AtomicUsize>,
    saw_cookie_file: Arc<AtomicBool>,
}

impl Harness {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Returns one YouTube cookie from every browser
struct OneCookieHarvester;

#[async_trait]
impl CookieHarvester for OneCookieHarvester {
    async fn harvest(&self, _browser: Browser, _domains: &[String]) -> Result<Vec<Cookie>> {
        Ok(vec![Cookie {
            domain: ".youtube.com".to_string(),
            path: "/".to_string(),
            secure: true,
            expires_at: None,
            name: "SID".to_string(),
            value: "abc".to_string(),
        }])
    }
}

struct NoCookieHarvester;

#[async_trait]
impl CookieHarvester for NoCookieHarvester {
    async fn harvest(&self, browser: Browser, _domains: &[String]) -> Result<Vec<Cookie>> {
        anyhow::bail!("no {} profile", browser)
    }
}

fn settings(dir: &Path) -> ExtractorSettings {
    let mut settings = ExtractorSettings {
        temp_dir: Some(dir.to_path_buf()),
        static_cookie_file: dir.join("cookies.txt"),
        ip_seed: Some(7),
        ..Default::default()
    };
    settings.validate();
    settings
}

fn harness<F>(
    settings: &ExtractorSettings,
    harvester: Arc<dyn CookieHarvester>,
    script: F,
) -> Harness
where
    F: Fn(usize, &AttemptConfig<'_>) -> Reply + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let saw_cookie_file = Arc::new(AtomicBool::new(false));
    let backend = ScriptedBackend {
        calls: calls.clone(),
        saw_cookie_file: saw_cookie_file.clone(),
        script: Box::new(script),
    };
    Harness {
        orchestrator: ExtractionOrchestrator::new(Arc::new(backend), harvester, settings),
        calls,
        saw_cookie_file,
    }
}

fn reported(message: &str) -> Reply {
    (Duration::ZERO, Err(BackendError::Reported(message.to_string())))
}

fn record(heights: &[u32]) -> RawBackendRecord {
    let formats: Vec<_> = heights
        .iter()
        .map(|h| {
            json!({
                "format_id": h.to_string(),
                "url": format!("https://rr1.googlevideo.com/videoplayback?itag={}&range=0-1000&rn=2", h),
                "protocol": "https",
                "height": h,
                "width": h * 16 / 9,
                "tbr": f64::from(*h) * 2.0,
                "ext": "mp4",
            })
        })
        .collect();
    serde_json::from_value(json!({
        "title": "Test clip",
        "extractor": "youtube",
        "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "formats": formats,
    }))
    .expect("valid record")
}

fn success(heights: &[u32]) -> Reply {
    (Duration::ZERO, Ok(record(heights)))
}

fn leftover_cookie_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("vidcdn-cookies-"))
        .count()
}

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[tokio::test]
async fn invalid_url_never_reaches_backend() {
    let dir = tempfile::tempdir().expect("temp dir");
    let h = harness(&settings(dir.path()), Arc::new(NoCookieHarvester), |_, _| success(&[720]));

    for url in ["not a url", "", "www.youtube.com/watch?v=x"] {
        let outcome = h.orchestrator.extract(url).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidUrl));
    }
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn private_video_stops_after_one_attempt() {
    let dir = tempfile::tempdir().expect("temp dir");
    let h = harness(&settings(dir.path()), Arc::new(NoCookieHarvester), |_, _| {
        reported("ERROR: [youtube] dQw4w9WgXcQ: Private video. Sign in if you've been granted access")
    });

    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::PrivateVideo));
    assert_eq!(h.calls(), 1);
    assert_eq!(
        outcome.to_json(),
        json!({ "error": ErrorKind::PrivateVideo.user_message() })
    );
}

#[tokio::test]
async fn bot_checks_rotate_identity_until_success() {
    let dir = tempfile::tempdir().expect("temp dir");
    let h = harness(&settings(dir.path()), Arc::new(NoCookieHarvester), |call, _| {
        if call < 3 {
            reported("ERROR: unable to download video data: HTTP Error 403: Forbidden")
        } else {
            success(&[480, 720])
        }
    });

    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(h.calls(), 4);

    let ExtractionOutcome::Success(result) = outcome else {
        panic!("expected success, got {:?}", outcome);
    };
    assert_eq!(result.formats.len(), 2);
    assert_eq!(result.formats[0].quality, "720p");
    assert_eq!(result.formats[1].quality, "480p");
    assert_eq!(result.default_format, result.formats[0]);
    assert_eq!(
        result.formats[0].url,
        "https://rr1.googlevideo.com/videoplayback?itag=720"
    );
    assert_eq!(result.platform_name, "youtube");

    let body = result.to_json();
    assert_eq!(body["download_url"], json!(result.formats[0].url));
    assert_eq!(body["quality"], json!("720p"));
}

#[tokio::test]
async fn identities_change_between_attempts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = seen.clone();
    let h = harness(&settings(dir.path()), Arc::new(NoCookieHarvester), move |call, config| {
        log.lock().expect("lock").push(config.identity.clone());
        if call < 6 {
            reported("Sign in to confirm you're not a bot")
        } else {
            success(&[360])
        }
    });

    assert!(h.orchestrator.extract(VIDEO_URL).await.is_success());

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 7);
    // No proxy first; IPs vary fastest
    assert!(seen.iter().all(|identity| identity.proxy.is_none()));
    assert_ne!(seen[0].spoofed_client_ip, seen[1].spoofed_client_ip);
    assert_eq!(seen[0].user_agent, seen[4].user_agent);
    assert_ne!(seen[4].user_agent, seen[5].user_agent);
}

#[tokio::test]
async fn exhausted_search_cleans_up_cookie_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = settings(dir.path());
    let h = harness(&settings, Arc::new(OneCookieHarvester), |_, _| {
        (
            Duration::ZERO,
            Ok(serde_json::from_value(json!({"title": "x", "formats": []})).expect("record")),
        )
    });

    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::NoExtractableFormat));

    let space = settings.format_selectors.len()
        * settings.proxies.len()
        * settings.user_agents.len()
        * settings.spoofed_ip_count;
    assert_eq!(h.calls(), space);
    assert!(h.saw_cookie_file.load(Ordering::SeqCst));
    assert_eq!(leftover_cookie_files(dir.path()), 0);
}

#[tokio::test]
async fn manifest_only_streams_are_not_a_result() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut settings = settings(dir.path());
    settings.format_selectors = vec!["best".to_string()];
    settings.user_agents = vec!["ua".to_string()];
    settings.proxies = Vec::new();
    settings.spoofed_ip_count = 2;
    settings.validate();

    let h = harness(&settings, Arc::new(NoCookieHarvester), |_, _| {
        (
            Duration::ZERO,
            Ok(serde_json::from_value(json!({
                "formats": [
                    {"url": "https://cdn/master.m3u8", "protocol": "m3u8_native", "height": 1080},
                    {"url": "https://cdn/a.m4a", "protocol": "https", "format_note": "audio only"},
                ]
            }))
            .expect("record")),
        )
    });

    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::NoExtractableFormat));
    assert_eq!(h.calls(), 2);
}

#[tokio::test]
async fn unknown_error_on_last_identity_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut settings = settings(dir.path());
    settings.format_selectors = vec!["best".to_string()];
    settings.user_agents = vec!["ua".to_string()];
    settings.proxies = Vec::new();
    settings.spoofed_ip_count = 2;
    settings.validate();

    let h = harness(&settings, Arc::new(NoCookieHarvester), |_, _| {
        reported("ERROR: something nobody anticipated")
    });

    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Unknown));
    assert_eq!(h.calls(), 2);
}

#[tokio::test]
async fn direct_cdn_url_skips_backend() {
    let dir = tempfile::tempdir().expect("temp dir");
    let h = harness(&settings(dir.path()), Arc::new(OneCookieHarvester), |_, _| success(&[720]));
    let url = "https://rr3---sn-abc.googlevideo.com/videoplayback?expire=1&itag=18";

    let ExtractionOutcome::Success(result) = h.orchestrator.extract(url).await else {
        panic!("direct URL should succeed");
    };
    assert_eq!(h.calls(), 0);
    assert_eq!(result.formats.len(), 1);
    assert_eq!(result.formats[0].url, url);
    assert_eq!(result.formats[0].quality, "direct");
    assert_eq!(leftover_cookie_files(dir.path()), 0);
}

#[tokio::test]
async fn deadline_ends_search_and_removes_cookie_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut settings = settings(dir.path());
    settings.request_deadline_secs = Some(1);

    let h = harness(&settings, Arc::new(OneCookieHarvester), |_, _| {
        (Duration::from_secs(30), Ok(record(&[720])))
    });

    let started = Instant::now();
    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(leftover_cookie_files(dir.path()), 0);
}

fn four_agents(dir: &Path, parallel: usize) -> ExtractorSettings {
    let mut settings = settings(dir);
    settings.format_selectors = vec!["best".to_string()];
    settings.user_agents = (0..4).map(|i| format!("ua-{}", i)).collect();
    settings.proxies = Vec::new();
    settings.spoofed_ip_count = 1;
    settings.max_parallel_attempts = parallel;
    settings.validate();
    settings
}

#[tokio::test]
async fn parallel_search_keeps_search_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let h = harness(&four_agents(dir.path(), 4), Arc::new(NoCookieHarvester), |_, config| {
        match config.identity.user_agent.as_str() {
            "ua-0" | "ua-1" => reported("HTTP Error 403: Forbidden"),
            // Slower than ua-3 but earlier in the search order
            "ua-2" => (Duration::from_millis(200), Ok(record(&[480]))),
            _ => success(&[1080]),
        }
    });

    let ExtractionOutcome::Success(result) = h.orchestrator.extract(VIDEO_URL).await else {
        panic!("expected success");
    };
    assert_eq!(result.formats[0].quality, "480p");
}

#[tokio::test]
async fn parallel_hard_fail_cancels_slow_attempts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let h = harness(&four_agents(dir.path(), 3), Arc::new(NoCookieHarvester), |_, config| {
        match config.identity.user_agent.as_str() {
            "ua-1" => reported("ERROR: Video unavailable. This video has been removed by the uploader"),
            _ => (Duration::from_secs(30), Ok(record(&[720]))),
        }
    });

    let started = Instant::now();
    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::VideoUnavailable));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(h.calls() <= 3);
}

/// Takes longer than the request deadline for every browser
struct SlowHarvester;

#[async_trait]
impl CookieHarvester for SlowHarvester {
    async fn harvest(&self, browser: Browser, domains: &[String]) -> Result<Vec<Cookie>> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        OneCookieHarvester.harvest(browser, domains).await
    }
}

#[tokio::test]
async fn deadline_covers_cookie_harvest() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut settings = settings(dir.path());
    settings.request_deadline_secs = Some(1);

    let h = harness(&settings, Arc::new(SlowHarvester), |_, _| {
        reported("ERROR: Private video")
    });

    let started = Instant::now();
    let outcome = h.orchestrator.extract(VIDEO_URL).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(h.calls(), 0);
    assert_eq!(leftover_cookie_files(dir.path()), 0);
}

#[tokio::test]
async fn extraction_runs_on_a_spawned_task() {
    let dir = tempfile::tempdir().expect("temp dir");
    let h = harness(&four_agents(dir.path(), 2), Arc::new(OneCookieHarvester), |call, _| {
        if call == 0 {
            reported("HTTP Error 403: Forbidden")
        } else {
            success(&[720])
        }
    });
    let orchestrator = Arc::new(h.orchestrator);

    let task = tokio::spawn(async move { orchestrator.extract(VIDEO_URL).await });
    let outcome = task.await.expect("extraction task");
    assert!(outcome.is_success());
    assert_eq!(leftover_cookie_files(dir.path()), 0);
}
