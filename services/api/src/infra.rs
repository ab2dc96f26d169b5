use async_trait::async_trait;
use dealer_reviews::catalog::InMemoryCatalog;
use dealer_reviews::config::AppConfig;
use dealer_reviews::dealers::HttpDealerClient;
use dealer_reviews::error::AppError;
use dealer_reviews::sentiment::{
    DisabledSentiment, SentimentAnalyzer, SentimentError, SentimentLabel, WatsonNluClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Sentiment backend selected from configuration at startup.
#[derive(Debug)]
pub(crate) enum ConfiguredSentiment {
    Watson(WatsonNluClient),
    Disabled(DisabledSentiment),
}

#[async_trait]
impl SentimentAnalyzer for ConfiguredSentiment {
    async fn classify(&self, text: &str) -> Result<SentimentLabel, SentimentError> {
        match self {
            ConfiguredSentiment::Watson(client) => client.classify(text).await,
            ConfiguredSentiment::Disabled(disabled) => disabled.classify(text).await,
        }
    }
}

/// Upstream clients sharing one connection pool.
pub(crate) struct Upstreams {
    pub(crate) dealers: HttpDealerClient,
    pub(crate) sentiment: ConfiguredSentiment,
}

pub(crate) fn build_upstreams(config: &AppConfig) -> Result<Upstreams, AppError> {
    let http = HttpDealerClient::http_client(&config.upstream)?;
    let dealers = HttpDealerClient::new(http.clone(), &config.upstream);

    let sentiment = match &config.sentiment {
        Some(sentiment) => {
            info!(url = %sentiment.url, "sentiment analysis enabled");
            ConfiguredSentiment::Watson(WatsonNluClient::new(http, sentiment))
        }
        None => {
            warn!("NLU credentials missing, review sentiment reported as unknown");
            ConfiguredSentiment::Disabled(DisabledSentiment)
        }
    };

    Ok(Upstreams { dealers, sentiment })
}

pub(crate) fn build_catalog(config: &AppConfig) -> Result<InMemoryCatalog, AppError> {
    match &config.catalog_fixture {
        Some(path) => Ok(InMemoryCatalog::from_fixture_path(path)?),
        None => Ok(InMemoryCatalog::default()),
    }
}
