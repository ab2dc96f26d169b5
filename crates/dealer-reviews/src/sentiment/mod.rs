//! Review sentiment classification through an external NLU provider.

mod watson;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use watson::WatsonNluClient;

/// Document-level sentiment reported for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    #[default]
    Unknown,
}

impl SentimentLabel {
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "neutral" => Self::Neutral,
            "negative" => Self::Negative,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SentimentError {
    #[error("sentiment request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sentiment provider answered {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("sentiment response missing document label")]
    MissingLabel,
}

/// Classifies free text into a [`SentimentLabel`].
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn classify(&self, text: &str) -> Result<SentimentLabel, SentimentError>;
}

/// Analyzer used when no NLU credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSentiment;

#[async_trait]
impl SentimentAnalyzer for DisabledSentiment {
    async fn classify(&self, _text: &str) -> Result<SentimentLabel, SentimentError> {
        Ok(SentimentLabel::Unknown)
    }
}
