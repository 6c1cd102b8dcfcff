use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::{
    foundation::error::CardcastError,
    speech::{SpeechProvider, SpeechRequest, Voice},
};

struct FailingProvider {
    calls: Arc<AtomicUsize>,
}

impl SpeechProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn synthesize(&self, _request: &SpeechRequest, _out: &Path) -> CardcastResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CardcastError::speech("quota exceeded"))
    }
}

fn config(dir: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.output_dir = dir.to_path_buf();
    cfg.fonts.dir = dir.join("no-fonts-here");
    cfg.fonts.system_fallback = false;
    cfg
}

fn plenty_of_memory() -> Option<f64> {
    Some(8192.0)
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

#[test]
fn invalid_request_is_counted_and_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let narrator = Narrator::from_config(&config(tmp.path())).unwrap();

    let err = narrator
        .narrate(&RenderRequest::new("", "body"))
        .unwrap_err();
    assert!(err.is_validation());

    let usage = narrator.usage().snapshot();
    assert_eq!(usage.requests, 1);
    assert_eq!(usage.errors, 1);
    assert_eq!(usage.provider_usage.get("openai"), Some(&1));
    assert!(dir_is_empty(tmp.path()));
}

#[test]
fn unconfigured_provider_fails_before_rendering() {
    let tmp = tempfile::tempdir().unwrap();
    let narrator = Narrator::from_config(&config(tmp.path())).unwrap();

    let mut req = RenderRequest::new("Title", "Body");
    req.voice_provider = "google".to_string();
    let err = narrator.narrate(&req).unwrap_err();
    assert!(matches!(err, CardcastError::Speech(_)));
    assert!(dir_is_empty(tmp.path()));

    req.voice_provider = "festival".to_string();
    assert!(narrator.narrate(&req).unwrap_err().is_validation());
    assert_eq!(narrator.usage().snapshot().errors, 2);
}

#[test]
fn speech_failure_removes_the_rendered_card() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut speech = SpeechRegistry::new();
    speech.register(Box::new(FailingProvider {
        calls: Arc::clone(&calls),
    }));
    let usage = Arc::new(UsageStats::new());
    let narrator = Narrator::new(&config(tmp.path()), speech, Arc::clone(&usage))
        .with_memory_probe(plenty_of_memory);

    let err = narrator
        .narrate(&RenderRequest::new("Title", "Body text"))
        .unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(dir_is_empty(tmp.path()));
    assert_eq!(usage.snapshot().errors, 1);
}

#[test]
fn kept_intermediates_survive_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let mut speech = SpeechRegistry::new();
    speech.register(Box::new(FailingProvider {
        calls: Arc::new(AtomicUsize::new(0)),
    }));
    let narrator = Narrator::new(&config(tmp.path()), speech, Arc::new(UsageStats::new()))
        .with_memory_probe(plenty_of_memory)
        .keep_intermediates(true);

    assert!(narrator.narrate(&RenderRequest::new("Title", "Body")).is_err());
    let pngs = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .map(|e| e.path().extension().is_some_and(|x| x == "png"))
                .unwrap_or(false)
        })
        .count();
    assert_eq!(pngs, 1);
}

#[test]
fn low_memory_refuses_before_rendering() {
    let tmp = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut speech = SpeechRegistry::new();
    speech.register(Box::new(FailingProvider {
        calls: Arc::clone(&calls),
    }));
    let narrator = Narrator::new(&config(tmp.path()), speech, Arc::new(UsageStats::new()))
        .with_memory_probe(|| Some(128.0));

    let err = narrator
        .narrate(&RenderRequest::new("Title", "Body"))
        .unwrap_err();
    assert!(matches!(err, CardcastError::Resource(_)), "{err}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(dir_is_empty(tmp.path()));
    assert_eq!(narrator.usage().snapshot().errors, 1);
}

#[test]
fn video_settings_follow_available_memory() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = config(tmp.path());
    let narrator = Narrator::from_config(&cfg).unwrap();

    assert_eq!(narrator.video_config(None), cfg.video);
    assert_eq!(narrator.video_config(Some(4096.0)), cfg.video);
    let low = narrator.video_config(Some(400.0));
    assert_eq!(low.max_dimension, Some(854));
    assert_eq!(low.threads, Some(1));

    cfg.memory.adapt_video = false;
    let fixed = Narrator::from_config(&cfg).unwrap();
    assert_eq!(fixed.video_config(Some(400.0)), cfg.video);
}
