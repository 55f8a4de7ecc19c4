#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mkai::agent::console::{Console, Prompted};
use mkai::agent::sentiment::{Sentiment, SentimentClassifier};
use mkai::agent::voice::{AudioDevice, SpeechBackend, SpeechRecognizer, VoiceParams};
use mkai::MkaiError;

/// Replays scripted answers and records everything said and asked.
#[derive(Default)]
pub struct ScriptedConsole {
    answers: Mutex<VecDeque<Prompted>>,
    pub prompts: Mutex<Vec<String>>,
    pub said: Mutex<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new(answers: Vec<Prompted>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        })
    }

    pub fn lines(lines: &[&str]) -> Arc<Self> {
        Self::new(lines.iter().map(|l| Prompted::Line(l.to_string())).collect())
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn said_containing(&self, needle: &str) -> usize {
        self.said.lock().unwrap().iter().filter(|l| l.contains(needle)).count()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&self, prompt: &str) -> Result<Prompted> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        // Running out of script behaves like a closed stdin.
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(Prompted::Closed))
    }

    fn say(&self, line: &str) {
        self.said.lock().unwrap().push(line.to_string());
    }
}

/// Audio device whose capture and playback can each be made to fail.
pub struct FakeDevice {
    pub capture_works: bool,
    pub playback_works: bool,
    pub recordings: AtomicUsize,
    pub played: Mutex<Vec<PathBuf>>,
}

impl FakeDevice {
    fn build(capture_works: bool, playback_works: bool) -> Arc<Self> {
        Arc::new(Self {
            capture_works,
            playback_works,
            recordings: AtomicUsize::new(0),
            played: Mutex::new(Vec::new()),
        })
    }

    /// No microphone; playback works.
    pub fn broken() -> Arc<Self> {
        Self::build(false, true)
    }

    pub fn working() -> Arc<Self> {
        Self::build(true, true)
    }

    /// No microphone and no output device.
    pub fn silent() -> Arc<Self> {
        Self::build(false, false)
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioDevice for FakeDevice {
    async fn record(&self, _output_path: &Path, _duration_secs: u32, _sample_rate: u32) -> Result<(), MkaiError> {
        self.recordings.fetch_add(1, Ordering::SeqCst);
        if self.capture_works {
            Ok(())
        } else {
            Err(MkaiError::DeviceUnavailable("no input device".to_string()))
        }
    }

    async fn play(&self, audio_path: &Path) -> Result<(), MkaiError> {
        if !self.playback_works {
            return Err(MkaiError::DeviceUnavailable("no output device".to_string()));
        }
        self.played.lock().unwrap().push(audio_path.to_path_buf());
        Ok(())
    }
}

/// Returns canned transcripts in order, then errors.
pub struct FakeRecognizer {
    transcripts: Mutex<VecDeque<String>>,
}

impl FakeRecognizer {
    pub fn new(transcripts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            transcripts: Mutex::new(transcripts.iter().map(|t| t.to_string()).collect()),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
        self.transcripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no more audio"))
    }
}

/// Classifier that answers with a fixed label, or fails when `label` is None.
pub struct FakeClassifier {
    pub label: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn labelling(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: Some(label.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            label: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SentimentClassifier for FakeClassifier {
    async fn classify(&self, _text: &str) -> Result<Sentiment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.label {
            Some(label) => Ok(Sentiment {
                label: label.clone(),
                confidence: 0.91,
            }),
            None => anyhow::bail!("model crashed"),
        }
    }
}

/// Synthesis backend counting calls; fails the first `failures` calls.
pub struct FakeBackend {
    pub label: &'static str,
    pub failures: usize,
    pub calls: Arc<AtomicUsize>,
    pub voices: Arc<Mutex<Vec<VoiceParams>>>,
}

impl FakeBackend {
    pub fn new(label: &'static str, failures: usize) -> Self {
        Self {
            label,
            failures,
            calls: Arc::new(AtomicUsize::new(0)),
            voices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always_failing(label: &'static str) -> Self {
        Self::new(label, usize::MAX)
    }
}

#[async_trait]
impl SpeechBackend for FakeBackend {
    fn name(&self) -> &str {
        self.label
    }

    async fn synthesize(&self, _text: &str, voice: &VoiceParams) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices.lock().unwrap().push(voice.clone());
        if call < self.failures {
            anyhow::bail!("{} unavailable", self.label);
        }
        Ok(self.label.as_bytes().to_vec())
    }
}
