// MKAI Feedback Collector
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// User corrections gathered for later retraining. Records are append-only and
// live as long as the process; swap the sink to persist them elsewhere.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Local>,
    pub original_input: String,
    pub bot_response: String,
    pub correction: String,
}

impl FeedbackRecord {
    pub fn new(original_input: &str, bot_response: &str, correction: &str) -> Self {
        Self {
            timestamp: Local::now(),
            original_input: original_input.to_string(),
            bot_response: bot_response.to_string(),
            correction: correction.to_string(),
        }
    }
}

/// Destination for feedback records.
pub trait FeedbackSink: Send {
    fn append(&mut self, record: FeedbackRecord);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime, unbounded, in-memory collector.
#[derive(Debug, Default)]
pub struct MemoryFeedback {
    records: Vec<FeedbackRecord>,
}

impl MemoryFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    /// Convenience for `append(FeedbackRecord::new(..))`.
    pub fn record(&mut self, original_input: &str, bot_response: &str, correction: &str) {
        self.append(FeedbackRecord::new(original_input, bot_response, correction));
    }
}

impl FeedbackSink for MemoryFeedback {
    fn append(&mut self, record: FeedbackRecord) {
        info!(
            "[FEEDBACK] Stored correction #{} for \"{}\"",
            self.records.len() + 1,
            record.original_input
        );
        self.records.push(record);
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_appended_in_order() {
        let mut feedback = MemoryFeedback::new();
        assert!(feedback.is_empty());

        feedback.record("مش عارف", "فهمت.", "حاول مرة أخرى");
        feedback.record("hello", "فهمت.", "");
        feedback.record("hello", "فهمت.", "");

        assert_eq!(feedback.len(), 3);
        assert_eq!(feedback.records()[0].original_input, "مش عارف");
        assert_eq!(feedback.records()[0].correction, "حاول مرة أخرى");
        // no deduplication
        assert_eq!(feedback.records()[1].original_input, feedback.records()[2].original_input);
        assert!(feedback.records()[1].timestamp <= feedback.records()[2].timestamp);
    }

    #[test]
    fn test_record_serializes() {
        let record = FeedbackRecord::new("a", "b", "c");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["original_input"], "a");
        assert_eq!(json["bot_response"], "b");
        assert_eq!(json["correction"], "c");
        assert!(json["timestamp"].is_string());
    }
}
