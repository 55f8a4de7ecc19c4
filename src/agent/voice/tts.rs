// MKAI Voice Synthesis
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Cloud TTS first, translate TTS when the cloud path is unusable. Once the cloud
// backend fails it stays off for the rest of the process.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::agent::sentiment::Emotion;
use crate::error::MkaiError;

const GOOGLE_TTS_API_BASE: &str = "https://texttospeech.googleapis.com/v1";
const TRANSLATE_TTS_URL: &str = "https://translate.google.com/translate_tts";
/// The translate endpoint rejects longer queries.
const TRANSLATE_CHUNK_CHARS: usize = 100;

/// Voice selection and prosody for one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub language_code: String,
    pub voice_name: Option<String>,
    pub speaking_rate: f32,
    pub pitch: f32,
}

impl VoiceParams {
    /// Brighter, faster voice for positive replies; calmer ones otherwise.
    pub fn for_emotion(emotion: Emotion) -> Self {
        let (voice, speaking_rate, pitch) = match emotion {
            Emotion::Positive => ("ar-XA-Standard-B", 1.2, 2.0),
            Emotion::Neutral => ("ar-XA-Standard-D", 1.0, 0.0),
            Emotion::Negative => ("ar-XA-Standard-D", 0.9, -1.0),
        };
        Self {
            language_code: "ar-XA".to_string(),
            voice_name: Some(voice.to_string()),
            speaking_rate,
            pitch,
        }
    }

    /// Engine defaults for a bare language code.
    pub fn default_for_language(language: &str) -> Self {
        Self {
            language_code: language.to_string(),
            voice_name: None,
            speaking_rate: 1.0,
            pitch: 0.0,
        }
    }
}

#[async_trait]
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Encoded audio (MP3) for `text`.
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>>;
}

/// Contents of the credentials file gating the cloud backend.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCredentials {
    pub api_key: String,
}

impl GoogleCredentials {
    pub fn load(path: &Path) -> Result<Self, MkaiError> {
        if !path.exists() {
            return Err(MkaiError::CredentialsMissing(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MkaiError::BackendUnusable(format!("Failed to read {:?}: {}", path, e)))?;
        let creds: GoogleCredentials = serde_json::from_str(&raw)
            .map_err(|e| MkaiError::BackendUnusable(format!("Invalid credentials file {:?}: {}", path, e)))?;
        if creds.api_key.trim().is_empty() {
            return Err(MkaiError::BackendUnusable(format!("Empty api_key in {:?}", path)));
        }
        Ok(creds)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTtsResponse {
    audio_content: String,
}

/// Google Cloud Text-to-Speech over REST.
pub struct GoogleCloudTts {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GoogleCloudTts {
    pub fn new(credentials: GoogleCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: GOOGLE_TTS_API_BASE.to_string(),
            api_key: credentials.api_key,
        }
    }

    fn request_body(text: &str, voice: &VoiceParams) -> serde_json::Value {
        let mut voice_json = json!({
            "languageCode": voice.language_code,
            "ssmlGender": "MALE",
        });
        if let Some(name) = &voice.voice_name {
            voice_json["name"] = json!(name);
        }

        json!({
            "input": { "text": text },
            "voice": voice_json,
            "audioConfig": {
                "audioEncoding": "MP3",
                "speakingRate": voice.speaking_rate,
                "pitch": voice.pitch,
            }
        })
    }
}

#[async_trait]
impl SpeechBackend for GoogleCloudTts {
    fn name(&self) -> &str {
        "google-cloud-tts"
    }

    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>> {
        // Key goes in a header so it never shows up in a logged request URL.
        let response = self
            .client
            .post(format!("{}/text:synthesize", self.api_base))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(text, voice))
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("Cloud TTS request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Cloud TTS API error {}: {}", status, body);
        }

        let payload: GoogleTtsResponse = response.json().await.context("Decode cloud TTS response")?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(payload.audio_content)
            .context("Decode audio content")?;
        Ok(audio)
    }
}

/// Keyless translate TTS endpoint. Lower fidelity, fixed voice per language.
pub struct TranslateTts {
    client: reqwest::Client,
}

impl TranslateTts {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for TranslateTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechBackend for TranslateTts {
    fn name(&self) -> &str {
        "translate-tts"
    }

    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>> {
        let chunks = split_for_translate(text, TRANSLATE_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("Nothing to synthesize");
        }

        let language = voice
            .language_code
            .split('-')
            .next()
            .unwrap_or(&voice.language_code)
            .to_string();
        let total = chunks.len().to_string();

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let response = self
                .client
                .get(TRANSLATE_TTS_URL)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", language.as_str()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await
                .context("Translate TTS request failed")?;

            let status = response.status();
            if !status.is_success() {
                anyhow::bail!("Translate TTS error {} on chunk {}", status, idx);
            }
            audio.extend_from_slice(&response.bytes().await?);
        }

        Ok(audio)
    }
}

/// Split on whitespace into pieces of at most `max_chars` characters.
/// A single word longer than the limit is cut hard.
pub fn split_for_translate(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Whether the primary backend may still be tried. Only ever degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendState {
    primary_usable: bool,
}

impl BackendState {
    pub fn new(primary_usable: bool) -> Self {
        Self { primary_usable }
    }

    pub fn primary_usable(&self) -> bool {
        self.primary_usable
    }

    pub fn degrade(&mut self) {
        self.primary_usable = false;
    }
}

/// Primary then fallback synthesis into one well-known output file.
pub struct SynthesisChain {
    primary: Option<Box<dyn SpeechBackend>>,
    fallback: Box<dyn SpeechBackend>,
    output_path: PathBuf,
    fallback_language: String,
}

impl SynthesisChain {
    pub fn new(
        primary: Option<Box<dyn SpeechBackend>>,
        fallback: Box<dyn SpeechBackend>,
        output_path: PathBuf,
        fallback_language: &str,
    ) -> Self {
        Self {
            primary,
            fallback,
            output_path,
            fallback_language: fallback_language.to_string(),
        }
    }

    /// Initial backend state: usable only when a primary backend was configured.
    pub fn initial_state(&self) -> BackendState {
        BackendState::new(self.primary.is_some())
    }

    pub async fn synthesize(
        &self,
        state: &mut BackendState,
        text: &str,
        emotion: Emotion,
    ) -> Result<PathBuf, MkaiError> {
        if state.primary_usable() {
            if let Some(primary) = &self.primary {
                let voice = VoiceParams::for_emotion(emotion);
                match self.run_backend(primary.as_ref(), text, &voice).await {
                    Ok(path) => return Ok(path),
                    Err(e) => {
                        warn!(
                            "[TTS] {} failed: {:#}. Using fallback TTS for the rest of this run.",
                            primary.name(),
                            e
                        );
                        state.degrade();
                    }
                }
            } else {
                state.degrade();
            }
        }

        let voice = VoiceParams::default_for_language(&self.fallback_language);
        match self.run_backend(self.fallback.as_ref(), text, &voice).await {
            Ok(path) => Ok(path),
            Err(e) => {
                error!("[TTS] Fallback {} failed: {:#}", self.fallback.name(), e);
                Err(MkaiError::SynthesisUnavailable)
            }
        }
    }

    async fn run_backend(&self, backend: &dyn SpeechBackend, text: &str, voice: &VoiceParams) -> Result<PathBuf> {
        let audio = backend.synthesize(text, voice).await?;
        if audio.is_empty() {
            anyhow::bail!("{} returned no audio", backend.name());
        }
        tokio::fs::write(&self.output_path, &audio)
            .await
            .with_context(|| format!("Write {:?}", self.output_path))?;
        info!(
            "[TTS] {} wrote {} bytes to {:?}",
            backend.name(),
            audio.len(),
            self.output_path
        );
        Ok(self.output_path.clone())
    }
}
