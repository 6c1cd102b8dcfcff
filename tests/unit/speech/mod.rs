use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

fn configured() -> SpeechConfig {
    SpeechConfig {
        openai_api_key: Some("sk-test".to_string()),
        azure_speech_key: Some("   ".to_string()),
        ..SpeechConfig::default()
    }
}

#[test]
fn registry_holds_the_four_builtin_providers() {
    let registry = SpeechRegistry::from_config(&SpeechConfig::default()).unwrap();
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names, vec!["azure", "elevenlabs", "google", "openai"]);
}

#[test]
fn availability_follows_configured_keys() {
    let registry = SpeechRegistry::from_config(&configured()).unwrap();
    assert!(registry.get("openai").unwrap().is_available());
    assert!(!registry.get("elevenlabs").unwrap().is_available());
    assert!(!registry.get("google").unwrap().is_available());
    // Blank keys do not count.
    assert!(!registry.get("azure").unwrap().is_available());

    assert!(registry.available("openai").is_ok());
    let err = registry.available("google").err().unwrap();
    assert!(matches!(err, CardcastError::Speech(_)));
}

#[test]
fn unknown_provider_is_a_validation_error() {
    let registry = SpeechRegistry::from_config(&SpeechConfig::default()).unwrap();
    let err = registry.get("espeak").err().unwrap();
    assert!(err.is_validation());
}

#[test]
fn each_provider_lists_six_voices() {
    let registry = SpeechRegistry::from_config(&SpeechConfig::default()).unwrap();
    for name in ["openai", "elevenlabs", "google", "azure"] {
        let voices = registry.voices(name).unwrap();
        assert_eq!(voices.len(), 6, "{name}");
    }
    let openai = registry.voices("openai").unwrap();
    assert_eq!(openai[0].value, "alloy");
    assert_eq!(openai[0].name, "Alloy (Neutral)");
}

#[test]
fn unconfigured_provider_refuses_to_synthesize() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("speech.mp3");
    let registry = SpeechRegistry::from_config(&SpeechConfig::default()).unwrap();
    let req = SpeechRequest::new("hello", "alloy");
    for name in ["openai", "elevenlabs", "google", "azure"] {
        let err = registry.get(name).unwrap().synthesize(&req, &out).unwrap_err();
        assert!(err.to_string().contains("API key"), "{name}: {err}");
    }
    assert!(!out.exists());
}

struct CountingProvider {
    calls: AtomicUsize,
}

impl SpeechProvider for CountingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        Voice::list(&[("only", "Only")])
    }

    fn synthesize(&self, _request: &SpeechRequest, out: &Path) -> CardcastResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        write_audio(self.name(), out, b"ID3")
    }
}

#[test]
fn register_replaces_provider_with_same_name() {
    let mut registry = SpeechRegistry::from_config(&SpeechConfig::default()).unwrap();
    registry.register(Box::new(CountingProvider {
        calls: AtomicUsize::new(0),
    }));
    assert_eq!(registry.names().count(), 4);
    assert_eq!(registry.voices("openai").unwrap().len(), 1);

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("a").join("speech.mp3");
    registry
        .available("openai")
        .unwrap()
        .synthesize(&SpeechRequest::new("hi", "only"), &out)
        .unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"ID3");
}

#[test]
fn empty_audio_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("speech.mp3");
    assert!(write_audio("test", &out, b"").is_err());
    assert!(!out.exists());
}

#[test]
fn openai_body_uses_tts1_and_speed() {
    let mut req = SpeechRequest::new("Hello there", "nova");
    req.speed = 1.5;
    let body = openai::request_body(&req);
    assert_eq!(body["model"], "tts-1");
    assert_eq!(body["voice"], "nova");
    assert_eq!(body["input"], "Hello there");
    assert_eq!(body["speed"], 1.5);
}

#[test]
fn elevenlabs_maps_voice_names_to_ids() {
    assert_eq!(elevenlabs::voice_id("adam"), "pNInz6obpgDQGcFmaJgB");
    assert_eq!(elevenlabs::voice_id("nobody"), "21m00Tcm4TlvDq8ikWAM");

    let mut req = SpeechRequest::new("x", "bella");
    req.stability = 0.25;
    let body = elevenlabs::request_body(&req);
    assert_eq!(body["model_id"], "eleven_monolingual_v1");
    assert_eq!(body["voice_settings"]["stability"], 0.25);
    assert_eq!(body["voice_settings"]["similarity_boost"], 0.5);
}

#[test]
fn google_picks_language_and_decodes_audio() {
    assert_eq!(google::language_code("zh-CN-Wavenet-A"), "zh-CN");
    assert_eq!(google::language_code("en-US-Standard-A"), "en-US");

    let body = google::request_body(&SpeechRequest::new("x", "zh-CN-Standard-A"));
    assert_eq!(body["voice"]["languageCode"], "zh-CN");
    assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");

    let audio = google::decode_audio(br#"{"audioContent":"SUQz"}"#).unwrap();
    assert_eq!(audio, b"ID3");
    assert!(google::decode_audio(br#"{"audioContent":"***"}"#).is_err());
    assert!(google::decode_audio(b"not json").is_err());
}

#[test]
fn azure_rate_and_ssml() {
    assert_eq!(azure::prosody_rate(1.0), "+0%");
    assert_eq!(azure::prosody_rate(1.25), "+25%");
    assert_eq!(azure::prosody_rate(0.5), "-50%");

    let mut req = SpeechRequest::new("Fish & chips", "en-US-AriaNeural");
    req.speed = 1.5;
    let ssml = azure::ssml(&req);
    assert!(ssml.contains("name='en-US-AriaNeural'"));
    assert!(ssml.contains("rate='+50%'"));
    assert!(ssml.contains("Fish &amp; chips"));

    let provider = azure::AzureProvider::new(
        http_client(Duration::from_secs(1)).unwrap(),
        None,
        "westeurope",
    );
    assert_eq!(
        provider.endpoint(),
        "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
    );
}
