use super::*;

const MEMINFO: &str = "MemTotal:        8055128 kB
MemFree:          512000 kB
MemAvailable:    2097152 kB
Buffers:          102400 kB
Cached:          1048576 kB
";

#[test]
fn meminfo_prefers_mem_available() {
    assert_eq!(parse_meminfo(MEMINFO), Some(2048.0));
}

#[test]
fn meminfo_without_mem_available_sums_free_and_cached() {
    let old = "MemTotal: 100 kB\nMemFree: 1024 kB\nCached: 2048 kB\n";
    assert_eq!(parse_meminfo(old), Some(3.0));
    assert_eq!(parse_meminfo("garbage"), None);
}

#[test]
fn memory_floor_is_enforced_only_when_known() {
    assert!(ensure_available_memory(Some(600.0), 500).is_ok());
    assert!(ensure_available_memory(None, 500).is_ok());
    let err = ensure_available_memory(Some(120.0), 500).unwrap_err();
    assert!(matches!(err, CardcastError::Resource(_)));
    assert!(err.to_string().contains("120 MiB available"));
}

#[test]
fn tiers_follow_thresholds() {
    assert_eq!(MemoryTier::for_available_mb(300.0), MemoryTier::Low);
    assert_eq!(MemoryTier::for_available_mb(512.0), MemoryTier::Reduced);
    assert_eq!(MemoryTier::for_available_mb(1023.9), MemoryTier::Reduced);
    assert_eq!(MemoryTier::for_available_mb(1024.0), MemoryTier::Full);
}

#[test]
fn tiers_scale_video_settings_down_only() {
    let base = VideoConfig::default();
    assert_eq!(MemoryTier::Full.apply(&base), base);

    let low = MemoryTier::Low.apply(&base);
    assert_eq!(low.fps, 20);
    assert_eq!(low.video_bitrate, "300k");
    assert_eq!(low.audio_bitrate, "48k");
    assert_eq!(low.preset, "ultrafast");
    assert_eq!(low.threads, Some(1));
    assert_eq!(low.max_dimension, Some(854));
    assert_eq!(low.video_codec, base.video_codec);

    let slow = VideoConfig {
        fps: 12,
        max_dimension: Some(640),
        ..VideoConfig::default()
    };
    let reduced = MemoryTier::Reduced.apply(&slow);
    assert_eq!(reduced.fps, 12);
    assert_eq!(reduced.max_dimension, Some(640));
    assert_eq!(reduced.threads, Some(2));
    assert_eq!(reduced.preset, "fast");
}
