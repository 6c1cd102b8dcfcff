//! Text-to-speech providers.
//!
//! Every backend implements [`SpeechProvider`] and writes an MP3 file for the narrated body text.
//! Providers are selected by name from a [`SpeechRegistry`]; a provider is available only when
//! its API key is configured.

pub mod azure;
pub mod elevenlabs;
pub mod google;
pub mod openai;

use std::{collections::BTreeMap, path::Path, time::Duration};

use anyhow::Context;
use tracing::{debug, info};

use crate::{
    config::SpeechConfig,
    foundation::error::{CardcastError, CardcastResult},
};

/// Provider used when a request does not name one.
pub const DEFAULT_PROVIDER: &str = "openai";

/// A selectable voice: `value` is sent to the provider, `name` is for display.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Voice {
    pub value: String,
    pub name: String,
}

impl Voice {
    pub(crate) fn list(pairs: &[(&str, &str)]) -> Vec<Voice> {
        pairs
            .iter()
            .map(|(value, name)| Voice {
                value: (*value).to_string(),
                name: (*name).to_string(),
            })
            .collect()
    }
}

/// What to say and how.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    /// Playback rate; 1.0 is normal speed.
    pub speed: f32,
    /// Voice stability in `0.0..=1.0`; only some providers use it.
    pub stability: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            speed: 1.0,
            stability: 0.5,
        }
    }
}

pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    fn voices(&self) -> Vec<Voice>;

    /// Synthesize `request` into an audio file at `out`.
    fn synthesize(&self, request: &SpeechRequest, out: &Path) -> CardcastResult<()>;
}

/// Named set of speech providers.
#[derive(Default)]
pub struct SpeechRegistry {
    providers: BTreeMap<&'static str, Box<dyn SpeechProvider>>,
}

impl std::fmt::Debug for SpeechRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SpeechRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four built-in HTTP providers sharing one blocking client.
    pub fn from_config(config: &SpeechConfig) -> CardcastResult<Self> {
        let client = http_client(Duration::from_secs(config.timeout_secs))?;
        let mut registry = Self::new();
        registry.register(Box::new(openai::OpenAiProvider::new(
            client.clone(),
            config.openai_api_key.clone(),
        )));
        registry.register(Box::new(elevenlabs::ElevenLabsProvider::new(
            client.clone(),
            config.elevenlabs_api_key.clone(),
        )));
        registry.register(Box::new(google::GoogleProvider::new(
            client.clone(),
            config.google_api_key.clone(),
        )));
        registry.register(Box::new(azure::AzureProvider::new(
            client,
            config.azure_speech_key.clone(),
            &config.azure_region,
        )));
        Ok(registry)
    }

    /// Add or replace a provider under its own name.
    pub fn register(&mut self, provider: Box<dyn SpeechProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.keys().copied()
    }

    pub fn get(&self, name: &str) -> CardcastResult<&dyn SpeechProvider> {
        self.providers
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| CardcastError::validation(format!("unknown voice provider '{name}'")))
    }

    /// Like [`get`](Self::get), but also requires the provider to be configured.
    pub fn available(&self, name: &str) -> CardcastResult<&dyn SpeechProvider> {
        let provider = self.get(name)?;
        if !provider.is_available() {
            return Err(CardcastError::speech(format!(
                "voice provider '{name}' is not configured"
            )));
        }
        Ok(provider)
    }

    pub fn voices(&self, name: &str) -> CardcastResult<Vec<Voice>> {
        self.get(name).map(|p| p.voices())
    }
}

pub(crate) fn http_client(timeout: Duration) -> CardcastResult<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("cardcast/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("build http client")?;
    Ok(client)
}

pub(crate) fn require_key<'a>(provider: &str, key: &'a Option<String>) -> CardcastResult<&'a str> {
    key.as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| CardcastError::speech(format!("{provider}: API key is not configured")))
}

/// Send `req` and return the body bytes of a successful response.
pub(crate) fn send_for_bytes(
    provider: &str,
    req: reqwest::blocking::RequestBuilder,
) -> CardcastResult<Vec<u8>> {
    let resp = req
        .send()
        .map_err(|e| CardcastError::speech(format!("{provider}: request failed: {e}")))?;
    let status = resp.status();
    let bytes = resp
        .bytes()
        .map_err(|e| CardcastError::speech(format!("{provider}: read body: {e}")))?;
    if !status.is_success() {
        let text = String::from_utf8_lossy(&bytes);
        return Err(CardcastError::speech(format!(
            "{provider}: status {status} body {text}"
        )));
    }
    debug!(provider, bytes = bytes.len(), "speech response received");
    Ok(bytes.to_vec())
}

pub(crate) fn write_audio(provider: &str, out: &Path, audio: &[u8]) -> CardcastResult<()> {
    if audio.is_empty() {
        return Err(CardcastError::speech(format!("{provider}: empty audio")));
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create audio directory '{}'", parent.display()))?;
    }
    std::fs::write(out, audio).with_context(|| format!("write audio '{}'", out.display()))?;
    info!(provider, path = %out.display(), bytes = audio.len(), "speech synthesized");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/speech/mod.rs"]
mod tests;
