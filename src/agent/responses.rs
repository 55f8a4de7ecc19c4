// MKAI Response Selector
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

use crate::agent::sentiment::Emotion;

/// Canned replies per emotion. The first entry is the preferred one.
pub fn candidates(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Positive => &[
            "أمر رائع! هل تريد المزيد من المساعدة؟",
            "هذا ممتع! ماذا تريد أن تفعل بعد ذلك؟",
        ],
        Emotion::Negative => &[
            "أنا آسف لسماع ذلك. هل تريد التحدث أكثر؟",
            "يبدو أن هذا صعب. كيف يمكنني المساعدة؟",
        ],
        Emotion::Neutral => &["فهمت. ماذا تريد أن تفعل الآن؟", "حسنًا، ما الخطوة التالية؟"],
    }
}

/// How a reply is picked among an emotion's candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStrategy {
    First,
    Rotate,
    Random,
}

impl FromStr for ResponseStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(ResponseStrategy::First),
            "rotate" => Ok(ResponseStrategy::Rotate),
            "random" => Ok(ResponseStrategy::Random),
            other => Err(format!("unknown response strategy '{}'", other)),
        }
    }
}

pub struct ResponseSelector {
    strategy: ResponseStrategy,
    cursors: HashMap<Emotion, usize>,
}

impl ResponseSelector {
    pub fn new(strategy: ResponseStrategy) -> Self {
        Self {
            strategy,
            cursors: HashMap::new(),
        }
    }

    pub fn select(&mut self, emotion: Emotion) -> &'static str {
        let pool = candidates(emotion);
        let reply = match self.strategy {
            ResponseStrategy::First => pool[0],
            ResponseStrategy::Rotate => {
                let cursor = self.cursors.entry(emotion).or_insert(0);
                let reply = pool[*cursor % pool.len()];
                *cursor += 1;
                reply
            }
            ResponseStrategy::Random => pool.choose(&mut rand::thread_rng()).copied().unwrap_or(pool[0]),
        };
        debug!("[RESPONSE] {} -> {}", emotion, reply);
        reply
    }
}

impl Default for ResponseSelector {
    fn default() -> Self {
        Self::new(ResponseStrategy::First)
    }
}
