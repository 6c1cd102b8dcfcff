use std::path::Path;

use crate::{
    foundation::error::CardcastResult,
    speech::{SpeechProvider, SpeechRequest, Voice, require_key, send_for_bytes, write_audio},
};

const OUTPUT_FORMAT: &str = "audio-16khz-128kbitrate-mono-mp3";

const VOICES: &[(&str, &str)] = &[
    ("en-US-AriaNeural", "Aria (US Female)"),
    ("en-US-DavisNeural", "Davis (US Male)"),
    ("en-US-GuyNeural", "Guy (US Male)"),
    ("en-US-JaneNeural", "Jane (US Female)"),
    ("en-US-JasonNeural", "Jason (US Male)"),
    ("en-US-JennyNeural", "Jenny (US Female)"),
];

pub struct AzureProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl AzureProvider {
    pub fn new(client: reqwest::blocking::Client, api_key: Option<String>, region: &str) -> Self {
        Self {
            client,
            api_key,
            endpoint: format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1"),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Prosody rate as a signed whole percentage, e.g. `1.25` -> `+25%`.
pub(crate) fn prosody_rate(speed: f32) -> String {
    let percent = ((speed - 1.0) * 100.0).round() as i32;
    format!("{percent:+}%")
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn ssml(request: &SpeechRequest) -> String {
    format!(
        "<speak version='1.0' xml:lang='en-US'><voice xml:lang='en-US' name='{}'>\
         <prosody rate='{}'>{}</prosody></voice></speak>",
        escape_xml(&request.voice),
        prosody_rate(request.speed),
        escape_xml(&request.text)
    )
}

impl SpeechProvider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
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
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(ssml(request));
        let audio = send_for_bytes(self.name(), req)?;
        write_audio(self.name(), out, &audio)
    }
}
