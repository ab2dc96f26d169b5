use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SentimentAnalyzer, SentimentError, SentimentLabel};
use crate::config::SentimentConfig;

const ANALYZE_PATH: &str = "/v1/analyze";

/// Watson Natural Language Understanding client scoped to document sentiment.
#[derive(Clone)]
pub struct WatsonNluClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    version: String,
}

impl std::fmt::Debug for WatsonNluClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatsonNluClient")
            .field("endpoint", &self.endpoint)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    features: Features,
    language: &'static str,
    return_analyzed_text: bool,
}

#[derive(Serialize)]
struct Features {
    sentiment: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    sentiment: Option<SentimentSection>,
}

#[derive(Deserialize)]
struct SentimentSection {
    document: Option<DocumentSentiment>,
}

#[derive(Deserialize)]
struct DocumentSentiment {
    label: String,
}

impl WatsonNluClient {
    pub fn new(http: reqwest::Client, config: &SentimentConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", config.url.trim_end_matches('/'), ANALYZE_PATH),
            api_key: config.api_key.clone(),
            version: config.version.clone(),
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for WatsonNluClient {
    async fn classify(&self, text: &str) -> Result<SentimentLabel, SentimentError> {
        if text.trim().is_empty() {
            return Ok(SentimentLabel::Neutral);
        }

        let request = AnalyzeRequest {
            text,
            features: Features {
                sentiment: serde_json::Map::new(),
            },
            language: "en",
            return_analyzed_text: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("version", self.version.as_str())])
            .basic_auth("apikey", Some(&self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "sentiment analysis answered");
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SentimentError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: AnalyzeResponse = response.json().await?;
        let label = body
            .sentiment
            .and_then(|section| section.document)
            .map(|document| document.label)
            .ok_or(SentimentError::MissingLabel)?;

        Ok(SentimentLabel::from_provider(&label))
    }
}
