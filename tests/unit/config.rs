use std::collections::HashMap;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k: &str| map.get(k).cloned()
}

#[test]
fn defaults_validate() {
    let cfg = AppConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.limits.max_text_chars, 2000);
    assert_eq!(cfg.limits.max_title_chars, 100);
    assert_eq!(cfg.video.fps, 24);
}

#[test]
fn partial_json_keeps_other_defaults() {
    let json = r#"{ "output_dir": "out", "storage": { "max_age_hours": 1.5 } }"#;
    let cfg = AppConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.output_dir, PathBuf::from("out"));
    assert_eq!(cfg.storage.max_age_hours, 1.5);
    assert_eq!(cfg.storage.max_storage_gb, 5.0);
    assert_eq!(cfg.layout, CardGeometry::default());
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = AppConfig::from_reader("{ not json".as_bytes()).unwrap_err();
    assert!(matches!(err, CardcastError::Serde(_)));
}

#[test]
fn env_overrides_apply() {
    let mut cfg = AppConfig::default();
    cfg.apply_env_with(env(&[
        ("MAX_TEXT_LENGTH", "500"),
        ("CARDCAST_MAX_STORAGE_GB", "0.25"),
        ("OPENAI_API_KEY", "sk-test"),
        ("ELEVENLABS_API_KEY", "   "),
    ]))
    .unwrap();
    assert_eq!(cfg.limits.max_text_chars, 500);
    assert_eq!(cfg.storage.max_storage_gb, 0.25);
    assert_eq!(cfg.speech.openai_api_key.as_deref(), Some("sk-test"));
    assert_eq!(cfg.speech.elevenlabs_api_key, None);
}

#[test]
fn bad_env_value_is_rejected() {
    let mut cfg = AppConfig::default();
    let err = cfg
        .apply_env_with(env(&[("MAX_TITLE_LENGTH", "lots")]))
        .unwrap_err();
    assert!(err.to_string().contains("MAX_TITLE_LENGTH"));
}

#[test]
fn storage_policy_converts_units() {
    let s = StorageConfig {
        max_age_hours: 2.0,
        max_storage_gb: 1.0,
        cleanup_interval_hours: 0.5,
    };
    let p = s.policy();
    assert_eq!(p.max_age, Duration::from_secs(7200));
    assert_eq!(p.max_total_bytes, 1024 * 1024 * 1024);
    assert_eq!(s.cleanup_interval(), Duration::from_secs(1800));
}

#[test]
fn font_paths_join_dir() {
    let fonts = FontConfig::default();
    let paths = fonts.paths();
    assert_eq!(
        paths.get("roboto"),
        Some(&PathBuf::from("static/fonts/Roboto-Regular.ttf"))
    );
}

#[test]
fn zero_interval_fails_validation() {
    let mut cfg = AppConfig::default();
    cfg.storage.cleanup_interval_hours = 0.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn huge_storage_values_fail_validation() {
    let mut cfg = AppConfig::default();
    cfg.apply_env_with(env(&[("CARDCAST_MAX_AGE_HOURS", "1e20")]))
        .unwrap();
    let err = cfg.validate().unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("max_age_hours"));

    let mut cfg = AppConfig::default();
    cfg.storage.max_storage_gb = 1e30;
    assert!(cfg.validate().unwrap_err().is_validation());

    let mut cfg = AppConfig::default();
    cfg.storage.cleanup_interval_hours = f64::INFINITY;
    assert!(cfg.validate().unwrap_err().is_validation());
}

#[test]
fn unvalidated_huge_durations_saturate() {
    let mut cfg = AppConfig::default();
    cfg.storage.max_age_hours = 1e20;
    cfg.storage.cleanup_interval_hours = f64::NAN;
    assert_eq!(cfg.storage.policy().max_age, Duration::MAX);
    assert_eq!(cfg.storage.cleanup_interval(), Duration::ZERO);
}

#[test]
fn memory_floor_env_override_and_video_limits() {
    let mut cfg = AppConfig::default();
    assert_eq!(cfg.memory.min_available_mb, 500);
    assert!(cfg.memory.adapt_video);
    cfg.apply_env_with(env(&[("CARDCAST_MIN_MEMORY_MB", "256")]))
        .unwrap();
    assert_eq!(cfg.memory.min_available_mb, 256);

    cfg.video.threads = Some(0);
    assert!(cfg.validate().unwrap_err().is_validation());
    cfg.video.threads = Some(2);
    cfg.video.max_dimension = Some(1);
    assert!(cfg.validate().unwrap_err().is_validation());
    cfg.video.max_dimension = Some(720);
    assert!(cfg.validate().is_ok());
}
