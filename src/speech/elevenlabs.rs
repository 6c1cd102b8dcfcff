use std::path::Path;

use crate::{
    foundation::error::CardcastResult,
    speech::{SpeechProvider, SpeechRequest, Voice, require_key, send_for_bytes, write_audio},
};

const BASE_URL: &str = "https://api.elevenlabs.io/v1";
const MODEL: &str = "eleven_monolingual_v1";
const SIMILARITY_BOOST: f32 = 0.5;
const DEFAULT_VOICE: &str = "rachel";

/// (display key, provider voice id, display name)
const VOICES: &[(&str, &str, &str)] = &[
    ("rachel", "21m00Tcm4TlvDq8ikWAM", "Rachel (American Female)"),
    ("domi", "AZnzlk1XvdvUeBnXmlld", "Domi (American Female)"),
    ("bella", "EXAVITQu4vr4xnSDxMaL", "Bella (American Female)"),
    ("antoni", "ErXwobaYiN019PkySvjV", "Antoni (American Male)"),
    ("josh", "TxGEqnHWrfWFTfGW9XjX", "Josh (American Male)"),
    ("adam", "pNInz6obpgDQGcFmaJgB", "Adam (American Male)"),
];

pub struct ElevenLabsProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
}

impl ElevenLabsProvider {
    pub fn new(client: reqwest::blocking::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

/// Provider voice id for `voice`; unknown names use the default voice.
pub(crate) fn voice_id(voice: &str) -> &'static str {
    let lookup = |key: &str| VOICES.iter().find(|(k, _, _)| *k == key).map(|v| v.1);
    lookup(voice)
        .or_else(|| lookup(DEFAULT_VOICE))
        .unwrap_or(VOICES[0].1)
}

pub(crate) fn request_body(request: &SpeechRequest) -> serde_json::Value {
    serde_json::json!({
        "text": request.text,
        "model_id": MODEL,
        "voice_settings": {
            "stability": request.stability,
            "similarity_boost": SIMILARITY_BOOST,
        },
    })
}

impl SpeechProvider for ElevenLabsProvider {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    fn is_available(&self) -> bool {
        require_key(self.name(), &self.api_key).is_ok()
    }

    fn voices(&self) -> Vec<Voice> {
        VOICES
            .iter()
            .map(|(value, _, name)| Voice {
                value: (*value).to_string(),
                name: (*name).to_string(),
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(voice = %request.voice))]
    fn synthesize(&self, request: &SpeechRequest, out: &Path) -> CardcastResult<()> {
        let key = require_key(self.name(), &self.api_key)?;
        let url = format!("{BASE_URL}/text-to-speech/{}", voice_id(&request.voice));
        let req = self
            .client
            .post(url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", key)
            .json(&request_body(request));
        let audio = send_for_bytes(self.name(), req)?;
        write_audio(self.name(), out, &audio)
    }
}
