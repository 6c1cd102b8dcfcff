//! Process configuration.
//!
//! [`AppConfig`] is assembled once at startup: defaults, then an optional JSON file, then
//! environment overrides. Every section is `#[serde(default)]` so a config file only needs to
//! name the values it changes.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    card::layout::CardGeometry,
    foundation::error::{CardcastError, CardcastResult},
    storage::manager::StoragePolicy,
};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
/// Upper bound for age and interval settings: 100 years.
const MAX_HOURS: f64 = 100.0 * 365.0 * 24.0;
/// Upper bound for the storage cap: 1 PiB.
const MAX_STORAGE_GB: f64 = 1024.0 * 1024.0;

/// Top-level configuration for rendering, storage, speech and video assembly.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where cards, audio and videos are written (and reclaimed from).
    pub output_dir: PathBuf,
    /// Input length limits.
    pub limits: InputLimits,
    /// Card geometry and typography.
    pub layout: CardGeometry,
    /// Font registry.
    pub fonts: FontConfig,
    /// Output storage lifecycle.
    pub storage: StorageConfig,
    /// Video muxing parameters.
    pub video: VideoConfig,
    /// Speech provider credentials.
    pub speech: SpeechConfig,
    /// Pre-flight memory check and memory-scaled encoding.
    pub memory: MemoryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("static/outputs"),
            limits: InputLimits::default(),
            layout: CardGeometry::default(),
            fonts: FontConfig::default(),
            storage: StorageConfig::default(),
            video: VideoConfig::default(),
            speech: SpeechConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

/// Maximum accepted input sizes, counted in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InputLimits {
    pub max_text_chars: usize,
    pub max_title_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_text_chars: 2000,
            max_title_chars: 100,
        }
    }
}

/// Static font registry: `font_key -> file name` resolved against `dir`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub dir: PathBuf,
    pub files: BTreeMap<String, String>,
    /// Try an installed sans-serif face before the built-in block face.
    pub system_fallback: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        let files = [
            ("msyh", "MSYH.TTC"),
            ("roboto", "Roboto-Regular.ttf"),
            ("vera", "Vera.ttf"),
            ("wqy", "wqy-zenhei.ttc"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            dir: PathBuf::from("static/fonts"),
            files,
            system_fallback: true,
        }
    }
}

impl FontConfig {
    /// Absolute-or-relative path for every registered key.
    pub fn paths(&self) -> BTreeMap<String, PathBuf> {
        self.files
            .iter()
            .map(|(k, f)| (k.clone(), self.dir.join(f)))
            .collect()
    }
}

/// Age and size bounds for the output directory.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub max_age_hours: f64,
    pub max_storage_gb: f64,
    pub cleanup_interval_hours: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24.0,
            max_storage_gb: 5.0,
            cleanup_interval_hours: 6.0,
        }
    }
}

impl StorageConfig {
    /// Unvalidated values saturate instead of panicking.
    pub fn policy(&self) -> StoragePolicy {
        StoragePolicy {
            max_age: hours_to_duration(self.max_age_hours),
            max_total_bytes: (self.max_storage_gb * BYTES_PER_GB) as u64,
        }
    }

    pub fn cleanup_interval(&self) -> Duration {
        hours_to_duration(self.cleanup_interval_hours)
    }

    fn validate(&self) -> CardcastResult<()> {
        for (name, v, max) in [
            ("max_age_hours", self.max_age_hours, MAX_HOURS),
            ("max_storage_gb", self.max_storage_gb, MAX_STORAGE_GB),
            ("cleanup_interval_hours", self.cleanup_interval_hours, MAX_HOURS),
        ] {
            if !v.is_finite() || v < 0.0 || v > max {
                return Err(CardcastError::validation(format!(
                    "storage.{name} must be within 0..={max}, got {v}"
                )));
            }
        }
        if self.cleanup_interval_hours <= 0.0 {
            return Err(CardcastError::validation(
                "storage.cleanup_interval_hours must be > 0",
            ));
        }
        Ok(())
    }
}

fn hours_to_duration(hours: f64) -> Duration {
    Duration::try_from_secs_f64(hours * 3600.0).unwrap_or(if hours > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Parameters handed to ffmpeg when muxing a card with its narration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub preset: String,
    /// Encoder thread count; `None` lets ffmpeg decide.
    pub threads: Option<u32>,
    /// Downscale so neither side exceeds this many pixels; `None` keeps the card size.
    pub max_dimension: Option<u32>,
    pub overwrite: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            video_bitrate: "800k".to_string(),
            audio_bitrate: "128k".to_string(),
            preset: "medium".to_string(),
            threads: None,
            max_dimension: None,
            overwrite: true,
        }
    }
}

/// Memory requirements checked before a narration starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Refuse to start when less than this many MiB are available.
    pub min_available_mb: u64,
    /// Pick encoder settings from the available memory.
    pub adapt_video: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min_available_mb: 500,
            adapt_video: true,
        }
    }
}

/// Credentials for the speech providers; a provider is available iff its key is set.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub openai_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub azure_speech_key: Option<String>,
    pub azure_region: String,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            elevenlabs_api_key: None,
            google_api_key: None,
            azure_speech_key: None,
            azure_region: "eastus".to_string(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Parse a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> CardcastResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CardcastError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Parse JSON config from any reader.
    pub fn from_reader(r: impl Read) -> CardcastResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| CardcastError::serde(format!("parse config JSON: {e}")))
    }

    /// Defaults or `path`, then process environment, then validation.
    pub fn load(path: Option<&Path>) -> CardcastResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::default(),
        };
        cfg.apply_env_with(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_env_with<F>(&mut self, lookup: F) -> CardcastResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CARDCAST_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CARDCAST_FONTS_DIR") {
            self.fonts.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MAX_TEXT_LENGTH") {
            self.limits.max_text_chars = parse_env("MAX_TEXT_LENGTH", &v)?;
        }
        if let Some(v) = lookup("MAX_TITLE_LENGTH") {
            self.limits.max_title_chars = parse_env("MAX_TITLE_LENGTH", &v)?;
        }
        if let Some(v) = lookup("CARDCAST_MAX_AGE_HOURS") {
            self.storage.max_age_hours = parse_env("CARDCAST_MAX_AGE_HOURS", &v)?;
        }
        if let Some(v) = lookup("CARDCAST_MAX_STORAGE_GB") {
            self.storage.max_storage_gb = parse_env("CARDCAST_MAX_STORAGE_GB", &v)?;
        }
        if let Some(v) = lookup("CARDCAST_CLEANUP_INTERVAL_HOURS") {
            self.storage.cleanup_interval_hours =
                parse_env("CARDCAST_CLEANUP_INTERVAL_HOURS", &v)?;
        }
        if let Some(v) = lookup("CARDCAST_MIN_MEMORY_MB") {
            self.memory.min_available_mb = parse_env("CARDCAST_MIN_MEMORY_MB", &v)?;
        }

        let key = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(v) = key("OPENAI_API_KEY") {
            self.speech.openai_api_key = Some(v);
        }
        if let Some(v) = key("ELEVENLABS_API_KEY") {
            self.speech.elevenlabs_api_key = Some(v);
        }
        if let Some(v) = key("GOOGLE_CLOUD_API_KEY") {
            self.speech.google_api_key = Some(v);
        }
        if let Some(v) = key("AZURE_SPEECH_KEY") {
            self.speech.azure_speech_key = Some(v);
        }
        if let Some(v) = key("AZURE_SPEECH_REGION") {
            self.speech.azure_region = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> CardcastResult<()> {
        if self.limits.max_text_chars == 0 || self.limits.max_title_chars == 0 {
            return Err(CardcastError::validation(
                "input limits must be non-zero",
            ));
        }
        self.storage.validate()?;
        if self.video.fps == 0 {
            return Err(CardcastError::validation("video.fps must be non-zero"));
        }
        if self.video.threads == Some(0) || self.video.max_dimension.is_some_and(|d| d < 2) {
            return Err(CardcastError::validation(
                "video.threads must be non-zero and video.max_dimension at least 2",
            ));
        }
        self.layout.validate()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> CardcastResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| CardcastError::validation(format!("invalid value for {name}: '{raw}'")))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
