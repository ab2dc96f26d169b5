use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info};

use super::domain::{Dealer, Review, ReviewEnvelope, ReviewSubmission};
use super::parser;
use crate::config::UpstreamConfig;

/// Remote collaborator holding dealerships and their reviews.
#[async_trait]
pub trait DealerApi: Send + Sync {
    async fn fetch_dealers(&self) -> Result<Vec<Dealer>, DealerApiError>;
    async fn fetch_dealers_by_state(&self, state: &str) -> Result<Vec<Dealer>, DealerApiError>;
    async fn fetch_dealer(&self, dealer_id: i64) -> Result<Option<Dealer>, DealerApiError>;
    async fn fetch_reviews(&self, dealer_id: i64) -> Result<Vec<Review>, DealerApiError>;
    async fn submit_review(&self, review: &ReviewSubmission) -> Result<(), DealerApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DealerApiError {
    #[error("dealer api unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("dealer api answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("dealer api returned malformed json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected dealer api envelope: {0}")]
    Envelope(String),
    #[error("document {index} could not be mapped: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// reqwest-backed client for the dealership and review cloud functions.
#[derive(Debug, Clone)]
pub struct HttpDealerClient {
    http: reqwest::Client,
    dealership_url: String,
    review_url: String,
}

/// Outcome of a GET where a 404 means "nothing stored" rather than a failure.
enum Lookup {
    Found(Value),
    Missing,
}

impl HttpDealerClient {
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            dealership_url: config.dealership_url.clone(),
            review_url: config.review_url.clone(),
        }
    }

    /// Builds the shared HTTP client honouring the configured upstream timeout.
    pub fn http_client(config: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(config.timeout).build()
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Lookup, DealerApiError> {
        info!(%url, ?query, "GET from dealer api");
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        info!(status = status.as_u16(), "dealer api answered");

        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::Missing);
        }
        if !status.is_success() {
            return Err(DealerApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Lookup::Found(Value::Null));
        }
        Ok(Lookup::Found(serde_json::from_str(&body)?))
    }

    async fn dealers_matching(&self, query: &[(&str, String)]) -> Result<Vec<Dealer>, DealerApiError> {
        match self.get_json(&self.dealership_url, query).await? {
            Lookup::Found(payload) => parser::decode(parser::documents(payload)?),
            Lookup::Missing => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl DealerApi for HttpDealerClient {
    async fn fetch_dealers(&self) -> Result<Vec<Dealer>, DealerApiError> {
        self.dealers_matching(&[]).await
    }

    async fn fetch_dealers_by_state(&self, state: &str) -> Result<Vec<Dealer>, DealerApiError> {
        self.dealers_matching(&[("state", state.trim().to_string())])
            .await
    }

    async fn fetch_dealer(&self, dealer_id: i64) -> Result<Option<Dealer>, DealerApiError> {
        let dealers = self
            .dealers_matching(&[("dealerId", dealer_id.to_string())])
            .await?;
        // Some deployments ignore the filter and return the full list.
        Ok(dealers.into_iter().find(|dealer| dealer.id == dealer_id))
    }

    async fn fetch_reviews(&self, dealer_id: i64) -> Result<Vec<Review>, DealerApiError> {
        let payload = match self
            .get_json(&self.review_url, &[("dealerId", dealer_id.to_string())])
            .await?
        {
            Lookup::Found(payload) => payload,
            Lookup::Missing => return Ok(Vec::new()),
        };

        let reviews: Vec<Review> = parser::decode(parser::documents(payload)?)?;
        debug!(dealer_id, count = reviews.len(), "reviews decoded");
        Ok(reviews
            .into_iter()
            .filter(|review| review.dealership == dealer_id)
            .collect())
    }

    async fn submit_review(&self, review: &ReviewSubmission) -> Result<(), DealerApiError> {
        let url = &self.review_url;
        info!(%url, dealer_id = review.dealership, "POST review to dealer api");
        let response = self
            .http
            .post(url)
            .query(&[("dealerId", review.dealership.to_string())])
            .json(&ReviewEnvelope { review })
            .send()
            .await?;

        let status = response.status();
        info!(status = status.as_u16(), "dealer api answered");
        if status.is_success() {
            Ok(())
        } else {
            Err(DealerApiError::Status {
                status: status.as_u16(),
                url: url.clone(),
            })
        }
    }
}
