// MKAI Ear
// Native Rust Whisper for local, private Arabic transcription.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hf_hub::api::sync::Api;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const WHISPER_RATE: u32 = 16000;

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Best-effort transcript of a WAV file.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

pub struct WhisperRecognizer {
    ctx: Arc<WhisperContext>,
    language: String,
}

impl WhisperRecognizer {
    pub async fn new(model_name: &str, cache_dir: &Path, use_gpu: bool) -> Result<Self> {
        let model_name = model_name.to_string();
        let cache_dir = cache_dir.to_path_buf();

        let ctx = tokio::task::spawn_blocking(move || {
            let model_path = Self::ensure_model(&model_name, &cache_dir)?;
            let params = WhisperContextParameters {
                use_gpu,
                ..Default::default()
            };
            let path = model_path
                .to_str()
                .context("Model path is not valid UTF-8")?;
            WhisperContext::new_with_params(path, params)
                .map_err(|e| anyhow::anyhow!("Failed to load model: {:?}", e))
        })
        .await??;

        Ok(Self {
            ctx: Arc::new(ctx),
            language: "ar".to_string(),
        })
    }

    /// Ensure the GGML model is present in `cache_dir`, downloading it if needed.
    fn ensure_model(model_name: &str, cache_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(cache_dir)?;

        let filename = format!("ggml-{}.bin", model_name);
        let model_path = cache_dir.join(&filename);

        if model_path.exists() {
            info!("[EAR] Found cached Whisper model: {:?}", model_path);
            return Ok(model_path);
        }

        info!("[EAR] Downloading Whisper model: {}...", filename);

        let api = Api::new()?;
        let repo = api.model("ggerganov/whisper.cpp".to_string());
        let downloaded_path = repo.get(&filename)?;

        fs::copy(&downloaded_path, &model_path)?;

        info!("[EAR] Model secured: {:?}", model_path);
        Ok(model_path)
    }

    fn transcribe_blocking(ctx: &WhisperContext, language: &str, audio_path: &Path) -> Result<String> {
        let pcm_data = load_pcm_16k_mono(audio_path)?;

        let mut state = ctx.create_state().context("Create state")?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let num_threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4) as i32;
        params.set_n_threads(num_threads);

        state.full(params, &pcm_data).context("Running inference")?;

        let num_segments = state.full_n_segments().context("Get segments count")?;
        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state.full_get_segment_text(i).unwrap_or_default();
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(segment);
        }

        Ok(text)
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("[EAR] Transcribing: {:?}", audio_path);

        let ctx = self.ctx.clone();
        let language = self.language.clone();
        let audio_path = audio_path.to_path_buf();

        let text = tokio::task::spawn_blocking(move || Self::transcribe_blocking(&ctx, &language, &audio_path))
            .await??;

        info!("[EAR] Transcript: \"{}\"", text);
        Ok(text)
    }
}

/// Read a WAV file as f32 samples, downmixed to mono and resampled to 16 kHz.
pub fn load_pcm_16k_mono(audio_path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(audio_path).context("Open WAV")?;
    let spec = reader.spec();

    let channels = spec.channels.max(1) as usize;
    let mut mono = Vec::with_capacity(reader.duration() as usize);
    let mut sample_iter = reader.samples::<i16>();

    while let Some(Ok(first_sample)) = sample_iter.next() {
        let mut sum = first_sample as f32;
        for _ in 1..channels {
            if let Some(Ok(s)) = sample_iter.next() {
                sum += s as f32;
            }
        }
        mono.push((sum / channels as f32) / 32768.0);
    }

    if spec.sample_rate == WHISPER_RATE {
        return Ok(mono);
    }

    // Naive linear index mapping
    let ratio = WHISPER_RATE as f32 / spec.sample_rate as f32;
    let new_len = (mono.len() as f32 * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_len);
    for i in 0..new_len {
        let src_idx = (i as f32 / ratio) as usize;
        if src_idx < mono.len() {
            resampled.push(mono[src_idx]);
        }
    }
    Ok(resampled)
}
