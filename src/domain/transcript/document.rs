//! Transcript document as written by the transcription service

use serde::Deserialize;

use super::token::WordToken;
use crate::domain::error::TranscriptError;

#[derive(Debug, Deserialize)]
struct TranscriptFile {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    items: Vec<WordToken>,
}

/// Ordered token stream of one recording
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    tokens: Vec<WordToken>,
}

impl Transcript {
    pub fn new(tokens: Vec<WordToken>) -> Self {
        Self { tokens }
    }

    /// Parse the service's JSON output (`results.items`).
    pub fn from_json(content: &str) -> Result<Self, TranscriptError> {
        let file: TranscriptFile = serde_json::from_str(content)
            .map_err(|e| TranscriptError::ParseError(e.to_string()))?;
        Ok(Self::new(file.results.items))
    }

    pub fn tokens(&self) -> &[WordToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
