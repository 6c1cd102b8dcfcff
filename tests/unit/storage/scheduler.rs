use std::time::SystemTime;

use super::*;
use crate::storage::manager::StoragePolicy;

#[test]
fn scheduler_reclaims_on_each_tick_and_stops() {
    let tmp = tempfile::tempdir().unwrap();
    let stale = tmp.path().join("stale.mp4");
    std::fs::write(&stale, b"old").unwrap();
    std::fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(48 * 3600))
        .unwrap();

    let manager = Arc::new(StorageManager::new(tmp.path(), StoragePolicy::default()).unwrap());
    let scheduler = ReclaimScheduler::start(manager, Duration::from_millis(20)).unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while stale.exists() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    let ticks = scheduler.stop();
    assert!(!stale.exists());
    assert!(ticks >= 1);
}

#[test]
fn dropping_scheduler_joins_thread_promptly() {
    let tmp = tempfile::tempdir().unwrap();
    let manager = Arc::new(StorageManager::new(tmp.path(), StoragePolicy::default()).unwrap());
    let started = std::time::Instant::now();
    {
        let _scheduler = ReclaimScheduler::start(manager, Duration::from_secs(3600)).unwrap();
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}
