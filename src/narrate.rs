//! The end-to-end narration pipeline: validate, check memory, render the card, synthesize speech,
//! probe the audio duration and mux both into an MP4.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    card::compositor::CardCompositor,
    config::{AppConfig, InputLimits, MemoryConfig, VideoConfig},
    encode::ffmpeg::{mux_still_image, probe_duration},
    foundation::error::CardcastResult,
    memory::{MemoryTier, available_memory_mb, ensure_available_memory},
    request::{RenderRequest, output_path},
    speech::SpeechRegistry,
    usage::UsageStats,
};

/// Result of a successful narration.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct NarrationOutput {
    pub stem: String,
    pub video_path: PathBuf,
    pub duration_secs: f64,
    pub elapsed_secs: f64,
}

/// Files produced on the way to the video; removed on drop unless kept.
struct Intermediates {
    paths: Vec<PathBuf>,
    keep: bool,
}

impl Drop for Intermediates {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for p in &self.paths {
            match std::fs::remove_file(p) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %p.display(), error = %e, "failed to remove intermediate"),
            }
        }
    }
}

pub struct Narrator {
    compositor: CardCompositor,
    speech: SpeechRegistry,
    video: VideoConfig,
    limits: InputLimits,
    output_dir: PathBuf,
    usage: Arc<UsageStats>,
    keep_intermediates: bool,
    memory: MemoryConfig,
    memory_probe: fn() -> Option<f64>,
}

impl Narrator {
    pub fn new(config: &AppConfig, speech: SpeechRegistry, usage: Arc<UsageStats>) -> Self {
        Self {
            compositor: CardCompositor::from_config(config),
            speech,
            video: config.video.clone(),
            limits: config.limits,
            output_dir: config.output_dir.clone(),
            usage,
            keep_intermediates: false,
            memory: config.memory,
            memory_probe: available_memory_mb,
        }
    }

    /// Built-in speech providers and fresh usage counters.
    pub fn from_config(config: &AppConfig) -> CardcastResult<Self> {
        let speech = SpeechRegistry::from_config(&config.speech)?;
        Ok(Self::new(config, speech, Arc::new(UsageStats::new())))
    }

    /// Keep the card PNG and speech MP3 next to the video.
    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Replace the source of the available-memory figure (MiB).
    pub fn with_memory_probe(mut self, probe: fn() -> Option<f64>) -> Self {
        self.memory_probe = probe;
        self
    }

    /// Encoder settings for a job, scaled to the memory available when it starts.
    fn video_config(&self, available_mb: Option<f64>) -> VideoConfig {
        match available_mb {
            Some(mb) if self.memory.adapt_video => {
                let tier = MemoryTier::for_available_mb(mb);
                debug!(available_mb = mb, ?tier, "memory tier");
                tier.apply(&self.video)
            }
            _ => self.video.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn speech(&self) -> &SpeechRegistry {
        &self.speech
    }

    pub fn usage(&self) -> &Arc<UsageStats> {
        &self.usage
    }

    /// Run the full pipeline for `request`; every call is recorded in the usage counters.
    pub fn narrate(&self, request: &RenderRequest) -> CardcastResult<NarrationOutput> {
        let started = Instant::now();
        let result = self.run(request, started);
        self.usage.track(
            result.is_ok(),
            started.elapsed(),
            Some(request.voice_provider.as_str()),
        );
        if let Err(e) = &result {
            warn!(provider = %request.voice_provider, error = %e, "narration failed");
        }
        result
    }

    fn run(&self, request: &RenderRequest, started: Instant) -> CardcastResult<NarrationOutput> {
        request.validate(&self.limits)?;
        let request = request.trimmed();
        let provider = self.speech.available(&request.voice_provider)?;
        let available_mb = (self.memory_probe)();
        ensure_available_memory(available_mb, self.memory.min_available_mb)?;
        let video_cfg = self.video_config(available_mb);

        let stem = request.output_stem(Utc::now());
        let image = output_path(&self.output_dir, &stem, "png");
        let audio = output_path(&self.output_dir, &stem, "mp3");
        let video = output_path(&self.output_dir, &stem, "mp4");
        let _intermediates = Intermediates {
            paths: vec![image.clone(), audio.clone()],
            keep: self.keep_intermediates,
        };

        self.compositor.render(&request.card_job(&image))?;
        provider.synthesize(&request.speech_request(), &audio)?;
        let duration_secs = probe_duration(&audio)?;
        mux_still_image(&image, &audio, duration_secs, &video, &video_cfg)?;

        let elapsed_secs = started.elapsed().as_secs_f64();
        info!(
            stem = %stem,
            provider = provider.name(),
            duration_secs,
            elapsed_secs,
            "narration complete"
        );
        Ok(NarrationOutput {
            stem,
            video_path: video,
            duration_secs,
            elapsed_secs,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/narrate.rs"]
mod tests;
