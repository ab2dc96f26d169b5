use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::accounts::{AccountService, InMemoryUserStore, User};
use crate::catalog::{CarType, CatalogRepository, InMemoryCatalog, NewCarMake, NewCarModel};
use crate::dealers::{Dealer, DealerApi, DealerApiError, Review, ReviewSubmission};
use crate::reviews::{dealership_router, ReviewService};
use crate::sentiment::{SentimentAnalyzer, SentimentError, SentimentLabel};

pub(super) fn dealer(id: i64, st: &str) -> Dealer {
    Dealer {
        id,
        full_name: format!("Dealer {id} Motors"),
        short_name: format!("D{id}"),
        address: "3 Nova Court".to_string(),
        city: "El Paso".to_string(),
        st: st.to_string(),
        state: None,
        zip: "88563".to_string(),
        lat: 31.69,
        long: -106.3,
    }
}

pub(super) fn review(dealership: i64, text: &str) -> Review {
    Review {
        id: None,
        name: "Berkly Shepley".to_string(),
        dealership,
        review: text.to_string(),
        purchase: false,
        purchase_date: None,
        car_make: None,
        car_model: None,
        car_year: None,
        sentiment: SentimentLabel::Unknown,
    }
}

pub(super) fn user() -> User {
    User {
        username: "ada".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        password_hash: String::new(),
    }
}

/// Dealer API double that records submissions.
#[derive(Default)]
pub(super) struct MemoryDealers {
    pub(super) dealers: Vec<Dealer>,
    pub(super) reviews: Vec<Review>,
    pub(super) submitted: Mutex<Vec<ReviewSubmission>>,
}

impl MemoryDealers {
    pub(super) fn seeded() -> Self {
        Self {
            dealers: vec![dealer(15, "TX"), dealer(29, "KS")],
            reviews: vec![
                review(15, "Great service, would buy again"),
                review(15, "Terrible paperwork delays"),
                review(29, "Fine"),
            ],
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn submitted(&self) -> Vec<ReviewSubmission> {
        self.submitted.lock().expect("submission mutex poisoned").clone()
    }
}

#[async_trait]
impl DealerApi for MemoryDealers {
    async fn fetch_dealers(&self) -> Result<Vec<Dealer>, DealerApiError> {
        Ok(self.dealers.clone())
    }

    async fn fetch_dealers_by_state(&self, state: &str) -> Result<Vec<Dealer>, DealerApiError> {
        Ok(self
            .dealers
            .iter()
            .filter(|dealer| dealer.st.eq_ignore_ascii_case(state))
            .cloned()
            .collect())
    }

    async fn fetch_dealer(&self, dealer_id: i64) -> Result<Option<Dealer>, DealerApiError> {
        Ok(self.dealers.iter().find(|dealer| dealer.id == dealer_id).cloned())
    }

    async fn fetch_reviews(&self, dealer_id: i64) -> Result<Vec<Review>, DealerApiError> {
        Ok(self
            .reviews
            .iter()
            .filter(|review| review.dealership == dealer_id)
            .cloned()
            .collect())
    }

    async fn submit_review(&self, review: &ReviewSubmission) -> Result<(), DealerApiError> {
        self.submitted
            .lock()
            .expect("submission mutex poisoned")
            .push(review.clone());
        Ok(())
    }
}

/// Dealer API double whose every call fails upstream.
pub(super) struct OfflineDealers;

#[async_trait]
impl DealerApi for OfflineDealers {
    async fn fetch_dealers(&self) -> Result<Vec<Dealer>, DealerApiError> {
        Err(offline())
    }

    async fn fetch_dealers_by_state(&self, _state: &str) -> Result<Vec<Dealer>, DealerApiError> {
        Err(offline())
    }

    async fn fetch_dealer(&self, _dealer_id: i64) -> Result<Option<Dealer>, DealerApiError> {
        Err(offline())
    }

    async fn fetch_reviews(&self, _dealer_id: i64) -> Result<Vec<Review>, DealerApiError> {
        Err(offline())
    }

    async fn submit_review(&self, _review: &ReviewSubmission) -> Result<(), DealerApiError> {
        Err(offline())
    }
}

fn offline() -> DealerApiError {
    DealerApiError::Status {
        status: 503,
        url: "http://dealers.test/api/dealership".to_string(),
    }
}

/// Keyword classifier standing in for the NLU provider.
pub(super) struct KeywordSentiment;

#[async_trait]
impl SentimentAnalyzer for KeywordSentiment {
    async fn classify(&self, text: &str) -> Result<SentimentLabel, SentimentError> {
        let lowered = text.to_lowercase();
        if lowered.contains("great") {
            Ok(SentimentLabel::Positive)
        } else if lowered.contains("terrible") {
            Ok(SentimentLabel::Negative)
        } else {
            Ok(SentimentLabel::Neutral)
        }
    }
}

pub(super) struct BrokenSentiment;

#[async_trait]
impl SentimentAnalyzer for BrokenSentiment {
    async fn classify(&self, _text: &str) -> Result<SentimentLabel, SentimentError> {
        Err(SentimentError::MissingLabel)
    }
}

pub(super) fn catalog() -> Arc<InMemoryCatalog> {
    let catalog = InMemoryCatalog::default();
    let audi = catalog
        .add_make(NewCarMake {
            name: "Audi".to_string(),
            description: Some("German manufacturer".to_string()),
        })
        .expect("make stored");
    catalog
        .add_model(NewCarModel {
            make_id: audi.id,
            dealer_id: Some(15),
            name: "A6".to_string(),
            car_type: CarType::Sedan,
            year: NaiveDate::from_ymd_opt(2010, 1, 1),
        })
        .expect("model stored");
    Arc::new(catalog)
}

pub(super) fn build_service<D, S>(dealers: Arc<D>, sentiment: S) -> ReviewService<D, S>
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
{
    ReviewService::new(dealers, Arc::new(sentiment), catalog())
}

pub(super) fn router_with(dealers: Arc<MemoryDealers>) -> axum::Router {
    let reviews = Arc::new(build_service(dealers, KeywordSentiment));
    let accounts = Arc::new(AccountService::new(Arc::new(InMemoryUserStore::default())));
    dealership_router(reviews, accounts)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
