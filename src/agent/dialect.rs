// MKAI Dialect Detector
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Keyword heuristics only. The first dialect (in table order) with a keyword
// occurring anywhere in the text wins; no match means Modern Standard Arabic.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Egyptian,
    Gulf,
    Levantine,
    Msa,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Egyptian => "egyptian",
            Dialect::Gulf => "gulf",
            Dialect::Levantine => "levantine",
            Dialect::Msa => "msa",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trigger keywords per regional dialect, in lookup order.
/// "مش" is also a prefix of the levantine "مشان الله", so egyptian must stay first.
pub const DIALECT_LEXICON: &[(Dialect, &[&str])] = &[
    (Dialect::Egyptian, &["مش", "هعمل", "عاوز"]),
    (Dialect::Gulf, &["شلونك", "وينك", "ابشر"]),
    (Dialect::Levantine, &["شو أخبارك", "مشان الله", "يما"]),
];

/// Classify `text` against [`DIALECT_LEXICON`].
pub fn detect_dialect(text: &str) -> Dialect {
    DIALECT_LEXICON
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(dialect, _)| *dialect)
        .unwrap_or(Dialect::Msa)
}

/// What to do with the dialect of typed (non-speech) input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedDialectPolicy {
    /// Typed text is assumed to be standard Arabic.
    AssumeMsa,
    /// Run the keyword detector on typed text as well.
    Detect,
}

impl TypedDialectPolicy {
    pub fn resolve(&self, text: &str) -> Dialect {
        match self {
            TypedDialectPolicy::AssumeMsa => Dialect::Msa,
            TypedDialectPolicy::Detect => detect_dialect(text),
        }
    }
}

impl FromStr for TypedDialectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "msa" | "assume-msa" => Ok(TypedDialectPolicy::AssumeMsa),
            "detect" => Ok(TypedDialectPolicy::Detect),
            other => Err(format!("unknown typed dialect policy '{}'", other)),
        }
    }
}
