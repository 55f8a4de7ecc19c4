// MKAI Session Loop
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// One turn: input -> sentiment -> canned reply -> speech -> playback -> rating.
// Collaborator failures degrade or skip the affected step; only an exit request
// or an interrupt ends the loop.

use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::agent::console::{Console, Prompted};
use crate::agent::dialect::Dialect;
use crate::agent::feedback::{FeedbackRecord, FeedbackSink};
use crate::agent::responses::ResponseSelector;
use crate::agent::sentiment::{Emotion, SentimentClassifier};
use crate::agent::voice::{
    Acquired, AudioDevice, BackendState, InputChain, InputSource, SynthesisChain,
};
use crate::error::MkaiError;

pub const RATING_PROMPT: &str = "Was this response good? (y/n/correct): ";
pub const CORRECTION_PROMPT: &str = "Enter correct response: ";
const AFFIRMATIVE: &str = "y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Classifying,
    Responding,
    Synthesizing,
    Playing,
    AwaitingFeedback,
    Stopped,
}

/// Everything produced during one pass of the loop. Dropped when the turn ends.
#[derive(Debug, Clone)]
pub struct Turn {
    pub raw_text: String,
    pub dialect: Dialect,
    pub source: InputSource,
    pub emotion: Emotion,
    pub confidence: f32,
    pub reply: String,
    pub audio: Option<PathBuf>,
}

#[derive(Debug)]
pub enum TurnOutcome {
    Completed(Turn),
    /// Classification failed; nothing was said back.
    Abandoned,
}

/// Summary handed back when the loop stops.
#[derive(Debug)]
pub struct Shutdown {
    /// `UserExit` or `Interrupted`.
    pub reason: MkaiError,
    pub feedback_count: usize,
}

pub struct SessionParts {
    pub input: InputChain,
    pub classifier: Arc<dyn SentimentClassifier>,
    pub responses: ResponseSelector,
    pub synthesis: SynthesisChain,
    pub device: Arc<dyn AudioDevice>,
    pub console: Arc<dyn Console>,
    pub feedback: Box<dyn FeedbackSink>,
}

pub struct Session {
    input: InputChain,
    classifier: Arc<dyn SentimentClassifier>,
    responses: ResponseSelector,
    synthesis: SynthesisChain,
    backend: BackendState,
    device: Arc<dyn AudioDevice>,
    console: Arc<dyn Console>,
    feedback: Box<dyn FeedbackSink>,
    state: SessionState,
}

impl Session {
    pub fn new(parts: SessionParts) -> Self {
        let backend = parts.synthesis.initial_state();
        Self {
            input: parts.input,
            classifier: parts.classifier,
            responses: parts.responses,
            synthesis: parts.synthesis,
            backend,
            device: parts.device,
            console: parts.console,
            feedback: parts.feedback,
            state: SessionState::AwaitingInput,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn backend(&self) -> &BackendState {
        &self.backend
    }

    pub fn feedback(&self) -> &dyn FeedbackSink {
        self.feedback.as_ref()
    }

    fn enter(&mut self, state: SessionState) {
        debug!("[SESSION] {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Run turns until the user exits or `interrupt` resolves.
    pub async fn run<F>(&mut self, interrupt: F) -> Shutdown
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        info!("[SESSION] Loop started.");

        let reason = loop {
            tokio::select! {
                biased;
                _ = &mut interrupt => {
                    info!("[SESSION] Interrupt received.");
                    break MkaiError::Interrupted;
                }
                outcome = self.run_turn() => match outcome {
                    Ok(_) => continue,
                    Err(reason) => break reason,
                },
            }
        };

        self.enter(SessionState::Stopped);
        self.shutdown(reason)
    }

    /// Walk one turn through every state. `Err` is always an exit request.
    pub async fn run_turn(&mut self) -> Result<TurnOutcome, MkaiError> {
        self.enter(SessionState::AwaitingInput);
        let (raw_text, dialect, source) = match self.input.acquire().await {
            Acquired::Input { text, dialect, source } => (text, dialect, source),
            Acquired::Exit => return Err(MkaiError::UserExit),
        };
        self.console.say(&format!("User ({}): {} ({})", source, raw_text, dialect));

        self.enter(SessionState::Classifying);
        let sentiment = match self.classifier.classify(&raw_text).await {
            Ok(s) => s,
            Err(e) => {
                warn!("[SESSION] Classifier failed, abandoning turn: {:#}", e);
                self.console.say(&format!("Could not analyze emotion: {:#}", e));
                return Ok(TurnOutcome::Abandoned);
            }
        };
        let emotion = match Emotion::from_str(&sentiment.label) {
            Ok(emotion) => emotion,
            Err(e) => {
                error!("[SESSION] {} (expected one of positive/negative/neutral)", e);
                self.console.say(&format!("Error: {}", e));
                return Ok(TurnOutcome::Abandoned);
            }
        };
        self.console.say(&format!("Detected emotion: {} ({:.2})", emotion, sentiment.confidence));

        self.enter(SessionState::Responding);
        let reply = self.responses.select(emotion).to_string();
        self.console.say(&format!("Bot: {}", reply));

        self.enter(SessionState::Synthesizing);
        let audio = match self.synthesis.synthesize(&mut self.backend, &reply, emotion).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("[SESSION] {}; skipping playback.", e);
                None
            }
        };

        self.enter(SessionState::Playing);
        if let Some(path) = &audio {
            if let Err(e) = self.device.play(path).await {
                warn!("[SESSION] Playback skipped: {}", e);
                self.console.say(&format!("Could not play response: {}", e));
            }
        }

        let turn = Turn {
            raw_text,
            dialect,
            source,
            emotion,
            confidence: sentiment.confidence,
            reply,
            audio,
        };

        self.enter(SessionState::AwaitingFeedback);
        self.collect_feedback(&turn).await?;

        Ok(TurnOutcome::Completed(turn))
    }

    async fn collect_feedback(&mut self, turn: &Turn) -> Result<(), MkaiError> {
        let rating = self.prompt(RATING_PROMPT).await?;
        if rating.trim().to_lowercase() == AFFIRMATIVE {
            return Ok(());
        }

        let correction = self.prompt(CORRECTION_PROMPT).await?;
        self.feedback.append(FeedbackRecord::new(&turn.raw_text, &turn.reply, &correction));
        Ok(())
    }

    async fn prompt(&self, prompt: &str) -> Result<String, MkaiError> {
        match self.console.read_line(prompt).await {
            Ok(Prompted::Line(line)) => Ok(line),
            Ok(Prompted::Interrupted) => Err(MkaiError::Interrupted),
            Ok(Prompted::Closed) => Err(MkaiError::UserExit),
            Err(e) => {
                warn!("[SESSION] Console read failed: {:#}", e);
                Err(MkaiError::UserExit)
            }
        }
    }

    fn shutdown(&self, reason: MkaiError) -> Shutdown {
        let feedback_count = self.feedback.len();
        info!("[SESSION] Stopped ({}). {} feedback entries.", reason, feedback_count);

        // Retraining from the collected corrections is not wired up yet.
        self.console.say("\nTraining with feedback data...");
        self.console.say(&format!("Saved {} feedback entries for training", feedback_count));

        Shutdown {
            reason,
            feedback_count,
        }
    }
}
