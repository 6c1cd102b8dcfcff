use std::{
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError},
    },
    thread::JoinHandle,
    time::Duration,
};

use anyhow::Context;
use tracing::{error, info, warn};

use crate::{foundation::error::CardcastResult, storage::manager::StorageManager};

/// Background thread that runs [`StorageManager::try_reclaim`] on a fixed interval.
///
/// Ticks that find a reclaim already in progress are skipped. The thread stops on [`stop`] or
/// when the scheduler is dropped.
///
/// [`stop`]: ReclaimScheduler::stop
#[derive(Debug)]
pub struct ReclaimScheduler {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl ReclaimScheduler {
    pub fn start(manager: Arc<StorageManager>, interval: Duration) -> CardcastResult<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("cardcast-reclaim".to_string())
            .spawn(move || {
                let mut ticks = 0u64;
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    ticks += 1;
                    if let Some(report) = manager.try_reclaim() {
                        if report.errors.is_empty() {
                            info!(
                                tick = ticks,
                                deleted = report.deleted_count,
                                remaining_size = report.remaining_size,
                                "scheduled reclaim"
                            );
                        } else {
                            warn!(
                                tick = ticks,
                                deleted = report.deleted_count,
                                errors = ?report.errors,
                                "scheduled reclaim finished with errors"
                            );
                        }
                    }
                }
                ticks
            })
            .context("spawn reclaim thread")?;

        info!(interval_secs = interval.as_secs_f64(), "reclaim scheduler started");
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and return how many ticks it ran.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(ticks)) => ticks,
            Some(Err(_)) => {
                error!("reclaim thread panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for ReclaimScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/scheduler.rs"]
mod tests;
