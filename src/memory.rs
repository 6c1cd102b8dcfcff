//! Available-memory checks and memory-scaled encoder settings.
//!
//! Encoding a looped still image is the most memory-hungry step of a narration. Before a job
//! starts, the available system memory is compared against a floor, and the encoder settings are
//! scaled down on small machines: lower resolution cap, frame rate, bitrates and thread count.

use tracing::{debug, warn};

use crate::{
    config::VideoConfig,
    foundation::error::{CardcastError, CardcastResult},
};

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Available system memory in MiB, or `None` where it cannot be determined.
pub fn available_memory_mb() -> Option<f64> {
    match std::fs::read_to_string(MEMINFO_PATH) {
        Ok(text) => parse_meminfo(&text),
        Err(e) => {
            debug!(error = %e, "available memory unknown");
            None
        }
    }
}

/// `MemAvailable` from `/proc/meminfo` text, in MiB. Older kernels without it report
/// `MemFree + Cached` instead.
pub fn parse_meminfo(text: &str) -> Option<f64> {
    let field = |name: &str| {
        text.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            rest.split_whitespace().next()?.parse::<u64>().ok()
        })
    };
    let kib = match field("MemAvailable") {
        Some(kib) => kib,
        None => field("MemFree")? + field("Cached").unwrap_or(0),
    };
    Some(kib as f64 / 1024.0)
}

/// Fail with [`CardcastError::Resource`] when less than `required_mb` is available.
///
/// An unknown amount passes.
pub fn ensure_available_memory(
    available_mb: Option<f64>,
    required_mb: u64,
) -> CardcastResult<()> {
    let Some(available) = available_mb else {
        return Ok(());
    };
    if available < required_mb as f64 {
        warn!(available_mb = available, required_mb, "low memory, refusing job");
        return Err(CardcastError::resource(format!(
            "insufficient memory: {available:.0} MiB available, {required_mb} MiB required"
        )));
    }
    Ok(())
}

/// Encoder budget chosen from the available memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    /// Under 512 MiB.
    Low,
    /// 512 MiB up to 1 GiB.
    Reduced,
    /// 1 GiB or more.
    Full,
}

impl MemoryTier {
    pub fn for_available_mb(available_mb: f64) -> Self {
        if available_mb < 512.0 {
            Self::Low
        } else if available_mb < 1024.0 {
            Self::Reduced
        } else {
            Self::Full
        }
    }

    /// `base` limited to this tier. [`MemoryTier::Full`] leaves it unchanged.
    pub fn apply(self, base: &VideoConfig) -> VideoConfig {
        let (max_dimension, fps, video_bitrate, audio_bitrate, threads, preset) = match self {
            Self::Full => return base.clone(),
            Self::Reduced => (1280, 24, "500k", "64k", 2, "fast"),
            Self::Low => (854, 20, "300k", "48k", 1, "ultrafast"),
        };
        VideoConfig {
            fps: base.fps.min(fps),
            video_bitrate: video_bitrate.to_string(),
            audio_bitrate: audio_bitrate.to_string(),
            preset: preset.to_string(),
            threads: Some(base.threads.map_or(threads, |t| t.min(threads))),
            max_dimension: Some(
                base.max_dimension
                    .map_or(max_dimension, |d| d.min(max_dimension)),
            ),
            ..base.clone()
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/memory.rs"]
mod tests;
