//! Narration requests as they arrive from a caller, before any rendering happens.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{
    card::{layout::RenderJob, template::DEFAULT_TEMPLATE_KEY},
    config::InputLimits,
    foundation::error::{CardcastError, CardcastResult},
    speech::{DEFAULT_PROVIDER, SpeechRequest},
};

/// Characters refused anywhere in the title or body.
pub const FORBIDDEN_CHARS: &[char] = &['<', '>', '"', '\''];

const MAX_STEM_CHARS: usize = 100;

fn default_template() -> String {
    DEFAULT_TEMPLATE_KEY.to_string()
}

fn default_font() -> String {
    "msyh".to_string()
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_stability() -> f32 {
    0.5
}

/// A request for one narrated card video.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderRequest {
    pub title: String,
    pub text: String,
    #[serde(default = "default_template")]
    pub color_template: String,
    #[serde(default = "default_font")]
    pub title_font: String,
    #[serde(default = "default_font")]
    pub body_font: String,
    #[serde(default = "default_provider")]
    pub voice_provider: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub voice_speed: f32,
    #[serde(default = "default_stability")]
    pub voice_stability: f32,
}

impl RenderRequest {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            color_template: default_template(),
            title_font: default_font(),
            body_font: default_font(),
            voice_provider: default_provider(),
            voice: default_voice(),
            voice_speed: default_speed(),
            voice_stability: default_stability(),
        }
    }

    /// Copy with title and body trimmed.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            text: self.text.trim().to_string(),
            ..self.clone()
        }
    }

    /// Check required fields, length limits and forbidden characters.
    ///
    /// Lengths are counted in characters after trimming.
    pub fn validate(&self, limits: &InputLimits) -> CardcastResult<()> {
        let title = self.title.trim();
        let text = self.text.trim();
        if title.is_empty() || text.is_empty() {
            return Err(CardcastError::validation("text and title are required"));
        }
        if text.chars().count() > limits.max_text_chars {
            return Err(CardcastError::validation(format!(
                "text too long (max {} characters)",
                limits.max_text_chars
            )));
        }
        if title.chars().count() > limits.max_title_chars {
            return Err(CardcastError::validation(format!(
                "title too long (max {} characters)",
                limits.max_title_chars
            )));
        }
        if title.contains(FORBIDDEN_CHARS) || text.contains(FORBIDDEN_CHARS) {
            return Err(CardcastError::validation("invalid characters in input"));
        }
        if !(0.25..=4.0).contains(&self.voice_speed) {
            return Err(CardcastError::validation(format!(
                "voice speed {} is outside 0.25..=4.0",
                self.voice_speed
            )));
        }
        if !(0.0..=1.0).contains(&self.voice_stability) {
            return Err(CardcastError::validation(format!(
                "voice stability {} is outside 0.0..=1.0",
                self.voice_stability
            )));
        }
        Ok(())
    }

    /// Unique file stem: sanitized title, UTC timestamp and a random suffix.
    pub fn output_stem(&self, now: DateTime<Utc>) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}_{}",
            sanitize_filename(&self.title),
            now.format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        )
    }

    pub fn card_job(&self, output_path: impl Into<PathBuf>) -> RenderJob {
        RenderJob {
            text: self.text.clone(),
            title: self.title.clone(),
            color_template_key: self.color_template.clone(),
            title_font_key: self.title_font.clone(),
            body_font_key: self.body_font.clone(),
            output_path: output_path.into(),
        }
    }

    pub fn speech_request(&self) -> SpeechRequest {
        SpeechRequest {
            text: self.text.clone(),
            voice: self.voice.clone(),
            speed: self.voice_speed,
            stability: self.voice_stability,
        }
    }
}

/// Reduce `name` to a safe file stem: alphanumerics, `-` and `_` only, at most 100 characters.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.trim().chars() {
        let keep = c.is_alphanumeric() || c == '-';
        if keep {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
        if out.chars().count() >= MAX_STEM_CHARS {
            break;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "card".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<dir>/<stem>.<ext>`
pub fn output_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    dir.join(format!("{stem}.{ext}"))
}

#[cfg(test)]
#[path = "../tests/unit/request.rs"]
mod tests;
