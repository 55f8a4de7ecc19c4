// MKAI Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Defaults reproduce the fixed-path behaviour of the interactive loop.
// `.env` and MKAI_* variables override them, command-line flags override those.

use std::path::PathBuf;
use std::str::FromStr;

use crate::agent::dialect::TypedDialectPolicy;
use crate::agent::responses::ResponseStrategy;

pub const DEFAULT_SENTIMENT_MODEL: &str = "CAMeL-Lab/bert-base-arabic-camelbert-mix-sentiment";
pub const DEFAULT_WHISPER_MODEL: &str = "base";
const CREDENTIALS_FILE: &str = "mkai-google-tts.json";

#[derive(Debug, Clone)]
pub struct MkaiConfig {
    /// JSON file holding the cloud TTS API key. Absence disables the primary backend.
    pub credentials_path: PathBuf,
    /// Captured microphone buffer, overwritten every voice turn.
    pub input_audio_path: PathBuf,
    /// Synthesized reply, overwritten every turn.
    pub output_audio_path: PathBuf,
    pub record_secs: u32,
    pub sample_rate: u32,
    pub whisper_model: String,
    pub whisper_gpu: bool,
    pub sentiment_model: String,
    pub cache_dir: PathBuf,
    /// Skip microphone capture and always prompt for typed input.
    pub text_only: bool,
    pub typed_dialect: TypedDialectPolicy,
    pub response_strategy: ResponseStrategy,
    /// Language code handed to the fallback TTS.
    pub fallback_language: String,
}

impl Default for MkaiConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mkai")
            .join("models");

        Self {
            credentials_path: home.join("Downloads").join(CREDENTIALS_FILE),
            input_audio_path: PathBuf::from("input.wav"),
            output_audio_path: PathBuf::from("response.mp3"),
            record_secs: 5,
            sample_rate: 16000,
            whisper_model: DEFAULT_WHISPER_MODEL.to_string(),
            whisper_gpu: false,
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            cache_dir,
            text_only: false,
            typed_dialect: TypedDialectPolicy::AssumeMsa,
            response_strategy: ResponseStrategy::First,
            fallback_language: "ar".to_string(),
        }
    }
}

impl MkaiConfig {
    /// Defaults overlaid with MKAI_* environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MkaiConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("MKAI_CREDENTIALS") {
            config.credentials_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("MKAI_INPUT_AUDIO") {
            config.input_audio_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("MKAI_OUTPUT_AUDIO") {
            config.output_audio_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("MKAI_RECORD_SECS").and_then(|v| v.parse().ok()) {
            config.record_secs = v;
        }
        if let Some(v) = lookup("MKAI_SAMPLE_RATE").and_then(|v| v.parse().ok()) {
            config.sample_rate = v;
        }
        if let Some(v) = lookup("MKAI_WHISPER_MODEL") {
            config.whisper_model = v;
        }
        if let Some(v) = lookup("MKAI_WHISPER_GPU") {
            config.whisper_gpu = parse_flag(&v);
        }
        if let Some(v) = lookup("MKAI_SENTIMENT_MODEL") {
            config.sentiment_model = v;
        }
        if let Some(v) = lookup("MKAI_CACHE_DIR") {
            config.cache_dir = PathBuf::from(v).join("models");
        }
        if let Some(v) = lookup("MKAI_TEXT_ONLY") {
            config.text_only = parse_flag(&v);
        }
        if let Some(v) = lookup("MKAI_TYPED_DIALECT").and_then(|v| TypedDialectPolicy::from_str(&v).ok()) {
            config.typed_dialect = v;
        }
        if let Some(v) = lookup("MKAI_RESPONSE_STRATEGY").and_then(|v| ResponseStrategy::from_str(&v).ok()) {
            config.response_strategy = v;
        }
        if let Some(v) = lookup("MKAI_FALLBACK_LANG") {
            config.fallback_language = v;
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
