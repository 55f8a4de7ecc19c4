// MKAI Input Acquisition
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Microphone first, keyboard when there is no usable audio path.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::agent::console::{Console, Prompted};
use crate::agent::dialect::{detect_dialect, Dialect, TypedDialectPolicy};
use crate::agent::normalize::strip_diacritics;
use crate::agent::voice::audio_io::AudioDevice;
use crate::agent::voice::transcription::SpeechRecognizer;

pub const TEXT_PROMPT: &str = "\nEnter Arabic text (or 'exit' to quit): ";
const EXIT_SENTINEL: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Voice,
    Text,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Voice => f.write_str("voice"),
            InputSource::Text => f.write_str("text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    Input {
        text: String,
        dialect: Dialect,
        source: InputSource,
    },
    /// Exit sentinel typed, stdin closed, or Ctrl-C at the prompt.
    Exit,
}

/// Capture parameters for the microphone path.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub buffer_path: PathBuf,
    pub duration_secs: u32,
    pub sample_rate: u32,
    /// Never touch the microphone.
    pub text_only: bool,
}

pub struct InputChain {
    device: Arc<dyn AudioDevice>,
    /// `None` when no recognizer could be loaded; only typed input is possible then.
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    console: Arc<dyn Console>,
    capture: CaptureSettings,
    typed_dialect: TypedDialectPolicy,
}

impl InputChain {
    pub fn new(
        device: Arc<dyn AudioDevice>,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        console: Arc<dyn Console>,
        capture: CaptureSettings,
        typed_dialect: TypedDialectPolicy,
    ) -> Self {
        Self {
            device,
            recognizer,
            console,
            capture,
            typed_dialect,
        }
    }

    pub async fn acquire(&self) -> Acquired {
        if let (false, Some(recognizer)) = (self.capture.text_only, &self.recognizer) {
            if let Some(acquired) = self.acquire_voice(recognizer.as_ref()).await {
                return acquired;
            }
        }
        self.acquire_text().await
    }

    /// `None` means there is no audio path this turn.
    async fn acquire_voice(&self, recognizer: &dyn SpeechRecognizer) -> Option<Acquired> {
        self.console.say("Recording...");
        if let Err(e) = self
            .device
            .record(&self.capture.buffer_path, self.capture.duration_secs, self.capture.sample_rate)
            .await
        {
            warn!("[VOICE] Capture failed: {}", e);
            self.console.say(&format!("Error recording audio: {}", e));
            self.console
                .say("Please ensure your microphone is connected and permissions are granted.");
            return None;
        }
        self.console.say("Recording complete");

        let transcript = match recognizer.transcribe(&self.capture.buffer_path).await {
            Ok(t) => t,
            Err(e) => {
                warn!("[EAR] Transcription failed: {:#}", e);
                return None;
            }
        };

        let text = strip_diacritics(transcript.trim());
        if text.is_empty() {
            info!("[EAR] Empty transcript, switching to text entry.");
            return None;
        }

        let dialect = detect_dialect(&text);
        info!("[INPUT] Detected dialect: {}", dialect);
        Some(Acquired::Input {
            text,
            dialect,
            source: InputSource::Voice,
        })
    }

    async fn acquire_text(&self) -> Acquired {
        loop {
            let line = match self.console.read_line(TEXT_PROMPT).await {
                Ok(Prompted::Line(line)) => line,
                Ok(Prompted::Interrupted) | Ok(Prompted::Closed) => return Acquired::Exit,
                Err(e) => {
                    warn!("[INPUT] Console read failed: {:#}", e);
                    return Acquired::Exit;
                }
            };

            if line.to_lowercase() == EXIT_SENTINEL {
                return Acquired::Exit;
            }
            if line.trim().is_empty() {
                self.console.say("Please enter some text.");
                continue;
            }

            let dialect = self.typed_dialect.resolve(&line);
            return Acquired::Input {
                text: line,
                dialect,
                source: InputSource::Text,
            };
        }
    }
}
