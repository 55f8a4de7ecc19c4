// MKAI Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use mkai::agent::console::{interrupt_on, Console, StdConsole};
use mkai::agent::dialect::TypedDialectPolicy;
use mkai::agent::feedback::MemoryFeedback;
use mkai::agent::responses::{ResponseSelector, ResponseStrategy};
use mkai::agent::sentiment::CamelBertClassifier;
use mkai::agent::session::{Session, SessionParts};
use mkai::agent::voice::tts::GoogleCredentials;
use mkai::agent::voice::{
    AudioIO, CaptureSettings, GoogleCloudTts, InputChain, SpeechBackend, SpeechRecognizer, SynthesisChain,
    TranslateTts, WhisperRecognizer,
};
use mkai::{MkaiConfig, MkaiError};

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "mkai")]
#[command(about = "Arabic voice assistant loop", long_about = None)]
struct Cli {
    /// Skip the microphone and always ask for typed input
    #[arg(long)]
    text_only: bool,

    /// Cloud TTS credentials file (JSON with an "api_key" field)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Seconds of audio to capture per turn
    #[arg(long)]
    record_secs: Option<u32>,

    /// Run dialect detection on typed input too
    #[arg(long)]
    detect_typed_dialect: bool,

    /// Reply selection: first, rotate or random
    #[arg(long)]
    response_strategy: Option<ResponseStrategy>,

    /// Whisper GGML model name (e.g. base, small)
    #[arg(long)]
    whisper_model: Option<String>,

    /// HuggingFace id of the sentiment classifier
    #[arg(long)]
    sentiment_model: Option<String>,
}

impl Cli {
    fn apply(self, mut config: MkaiConfig) -> MkaiConfig {
        if self.text_only {
            config.text_only = true;
        }
        if let Some(path) = self.credentials {
            config.credentials_path = path;
        }
        if let Some(secs) = self.record_secs {
            config.record_secs = secs;
        }
        if self.detect_typed_dialect {
            config.typed_dialect = TypedDialectPolicy::Detect;
        }
        if let Some(strategy) = self.response_strategy {
            config.response_strategy = strategy;
        }
        if let Some(model) = self.whisper_model {
            config.whisper_model = model;
        }
        if let Some(model) = self.sentiment_model {
            config.sentiment_model = model;
        }
        config
    }
}

fn primary_backend(config: &MkaiConfig, console: &dyn Console) -> Option<Box<dyn SpeechBackend>> {
    match GoogleCredentials::load(&config.credentials_path) {
        Ok(creds) => {
            console.say("Google Cloud TTS initialized successfully");
            Some(Box::new(GoogleCloudTts::new(creds)))
        }
        Err(MkaiError::CredentialsMissing(path)) => {
            info!("[TTS] No credentials at {:?}", path);
            console.say("Google Cloud credentials not found. Using fallback TTS.");
            None
        }
        Err(e) => {
            warn!("[TTS] {}", e);
            console.say(&format!("Error initializing Google Cloud TTS: {}. Using fallback TTS.", e));
            None
        }
    }
}

async fn recognizer(config: &MkaiConfig) -> Option<Arc<dyn SpeechRecognizer>> {
    if config.text_only {
        return None;
    }
    match WhisperRecognizer::new(&config.whisper_model, &config.cache_dir, config.whisper_gpu).await {
        Ok(r) => Some(Arc::new(r)),
        Err(e) => {
            warn!("[EAR] Whisper unavailable ({:#}). Continuing with typed input only.", e);
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Keep model and audio crates quiet unless explicitly overridden.
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,whisper_rs=warn,hf_hub=warn,cpal=warn,rodio=warn,reqwest=warn");
    }

    tracing_subscriber::fmt::init();

    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[MKAI PANIC] at {}: {}", location, message);
    }));

    let config = Cli::parse().apply(MkaiConfig::from_env());

    info!("--- MKAI ARABIC VOICE LOOP v{} ---", env!("CARGO_PKG_VERSION"));

    let console: Arc<dyn Console> = Arc::new(StdConsole::new());
    let device = Arc::new(AudioIO::new());

    let synthesis = SynthesisChain::new(
        primary_backend(&config, console.as_ref()),
        Box::new(TranslateTts::new()),
        config.output_audio_path.clone(),
        &config.fallback_language,
    );

    let classifier = CamelBertClassifier::load(&config.sentiment_model)
        .await
        .context("Failed to load sentiment classifier")?;

    let input = InputChain::new(
        device.clone(),
        recognizer(&config).await,
        console.clone(),
        CaptureSettings {
            buffer_path: config.input_audio_path.clone(),
            duration_secs: config.record_secs,
            sample_rate: config.sample_rate,
            text_only: config.text_only,
        },
        config.typed_dialect,
    );

    let mut session = Session::new(SessionParts {
        input,
        classifier: Arc::new(classifier),
        responses: ResponseSelector::new(config.response_strategy),
        synthesis,
        device,
        console,
        feedback: Box::new(MemoryFeedback::new()),
    });

    let shutdown = session
        .run(interrupt_on(tokio::signal::ctrl_c()))
        .await;
    info!("Session ended: {}", shutdown.reason);

    // A stdin read may still be parked on a blocking thread; don't wait for it.
    std::process::exit(0);
}
