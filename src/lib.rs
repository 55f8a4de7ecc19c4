// MKAI Core Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod agent;
pub mod config;
pub mod error;

pub use config::MkaiConfig;
pub use error::MkaiError;
