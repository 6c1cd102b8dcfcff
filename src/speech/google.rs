use std::path::Path;

use base64::Engine as _;

use crate::{
    foundation::error::{CardcastError, CardcastResult},
    speech::{SpeechProvider, SpeechRequest, Voice, require_key, send_for_bytes, write_audio},
};

const ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

const VOICES: &[(&str, &str)] = &[
    ("en-US-Standard-A", "US English (Female A)"),
    ("en-US-Standard-B", "US English (Male B)"),
    ("en-US-Standard-C", "US English (Female C)"),
    ("en-US-Standard-D", "US English (Male D)"),
    ("en-US-Wavenet-A", "US English Wavenet (Female A)"),
    ("en-US-Wavenet-B", "US English Wavenet (Male B)"),
];

pub struct GoogleProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
}

impl GoogleProvider {
    pub fn new(client: reqwest::blocking::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

pub(crate) fn language_code(voice: &str) -> &'static str {
    if voice.starts_with("zh-CN") {
        "zh-CN"
    } else {
        "en-US"
    }
}

pub(crate) fn request_body(request: &SpeechRequest) -> serde_json::Value {
    serde_json::json!({
        "input": { "text": request.text },
        "voice": {
            "languageCode": language_code(&request.voice),
            "name": request.voice,
        },
        "audioConfig": {
            "audioEncoding": "MP3",
            "speakingRate": request.speed,
        },
    })
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Extract the base64 `audioContent` of a synthesize response.
pub(crate) fn decode_audio(body: &[u8]) -> CardcastResult<Vec<u8>> {
    let resp: SynthesizeResponse = serde_json::from_slice(body)
        .map_err(|e| CardcastError::speech(format!("google: parse response: {e}")))?;
    base64::engine::general_purpose::STANDARD
        .decode(resp.audio_content.as_bytes())
        .map_err(|e| CardcastError::speech(format!("google: decode audio: {e}")))
}

impl SpeechProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
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
            .post(format!("{ENDPOINT}?key={key}"))
            .json(&request_body(request));
        let body = send_for_bytes(self.name(), req)?;
        let audio = decode_audio(&body)?;
        write_audio(self.name(), out, &audio)
    }
}
