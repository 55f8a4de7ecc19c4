// MKAI Error Taxonomy
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds the session loop branches on.
///
/// Collaborator internals report `anyhow::Error`; these are the shapes the loop
/// degrades on (device, backend) or surfaces (emotion mismatch, exit).
#[derive(Debug, Error)]
pub enum MkaiError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("cloud TTS credentials not found at {0:?}")]
    CredentialsMissing(PathBuf),

    #[error("primary synthesis backend unusable: {0}")]
    BackendUnusable(String),

    #[error("no synthesis backend produced audio")]
    SynthesisUnavailable,

    #[error("classifier emitted unknown emotion category '{0}'")]
    UnknownEmotionCategory(String),

    #[error("user requested exit")]
    UserExit,

    #[error("interrupted")]
    Interrupted,
}
