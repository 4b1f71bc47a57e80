//! Word token value object

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of a transcript item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Pronunciation,
    Punctuation,
    #[serde(other)]
    Other,
}

impl TokenKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pronunciation => "pronunciation",
            Self::Punctuation => "punctuation",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One timed item of a transcript.
///
/// Only pronunciation tokens are required to carry timestamps; the
/// transcription service omits them on punctuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordToken {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Decimal>,
}

impl WordToken {
    /// Spoken word spanning `start..end`
    pub fn pronunciation(start: Decimal, end: Decimal) -> Self {
        Self {
            kind: TokenKind::Pronunciation,
            start_time: Some(start),
            end_time: Some(end),
        }
    }

    /// Untimed punctuation mark
    pub fn punctuation() -> Self {
        Self {
            kind: TokenKind::Punctuation,
            start_time: None,
            end_time: None,
        }
    }

    pub fn is_pronunciation(&self) -> bool {
        self.kind == TokenKind::Pronunciation
    }

    /// Both timestamps, if present
    pub fn span(&self) -> Option<(Decimal, Decimal)> {
        Some((self.start_time?, self.end_time?))
    }
}
