// MKAI Agent Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod console;
pub mod dialect;
pub mod feedback;
pub mod normalize;
pub mod responses;
pub mod sentiment;
pub mod session;
pub mod voice;
