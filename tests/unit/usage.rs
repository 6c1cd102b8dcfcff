use std::sync::Arc;

use super::*;

#[test]
fn empty_stats_do_not_divide_by_zero() {
    let s = UsageStats::new().snapshot();
    assert_eq!(s, UsageSnapshot::default());
}

#[test]
fn track_accumulates_rates_and_providers() {
    let stats = UsageStats::new();
    stats.track(true, Duration::from_secs(2), Some("openai"));
    stats.track(false, Duration::from_secs(4), Some("openai"));
    stats.track(true, Duration::ZERO, Some("azure"));
    stats.track(false, Duration::ZERO, None);

    let s = stats.snapshot();
    assert_eq!(s.requests, 4);
    assert_eq!(s.errors, 2);
    assert_eq!(s.error_rate, 0.5);
    assert_eq!(s.avg_generation_secs, 1.5);
    assert_eq!(s.provider_usage.get("openai"), Some(&2));
    assert_eq!(s.provider_usage.get("azure"), Some(&1));
}

#[test]
fn concurrent_tracking_is_not_lost() {
    let stats = Arc::new(UsageStats::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stats = Arc::clone(&stats);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    stats.track(true, Duration::from_millis(1), Some("google"));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let s = stats.snapshot();
    assert_eq!(s.requests, 800);
    assert_eq!(s.provider_usage["google"], 800);
}
