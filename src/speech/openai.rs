use std::path::Path;

use crate::{
    foundation::error::CardcastResult,
    speech::{SpeechProvider, SpeechRequest, Voice, require_key, send_for_bytes, write_audio},
};

const ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";
const MODEL: &str = "tts-1";

const VOICES: &[(&str, &str)] = &[
    ("alloy", "Alloy (Neutral)"),
    ("echo", "Echo (Male)"),
    ("fable", "Fable (British Male)"),
    ("onyx", "Onyx (Deep Male)"),
    ("nova", "Nova (Female)"),
    ("shimmer", "Shimmer (Soft Female)"),
];

pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::blocking::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

pub(crate) fn request_body(request: &SpeechRequest) -> serde_json::Value {
    serde_json::json!({
        "model": MODEL,
        "voice": request.voice,
        "input": request.text,
        "speed": request.speed,
        "response_format": "mp3",
    })
}

impl SpeechProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_available(&self) -> bool {
        require_key(self.name(), &self.api_key).is_ok()
    }

    fn voices(&self) -> Vec<Voice> {
        Voice::list(VOICES)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(voice = %request.voice))]
    fn synthesize(&self, request: &SpeechRequest, out: &Path) -> CardcastResult<()> {
        let key = require_key(self.name(), &self.api_key)?;
        let req = self
            .client
            .post(ENDPOINT)
            .bearer_auth(key)
            .json(&request_body(request));
        let audio = send_for_bytes(self.name(), req)?;
        write_audio(self.name(), out, &audio)
    }
}
