use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accounts::User;
use crate::catalog::{CarModelDetail, CarModelId, CatalogError, CatalogRepository};
use crate::dealers::{Dealer, DealerApi, DealerApiError, Review, ReviewSubmission};
use crate::sentiment::{SentimentAnalyzer, SentimentLabel};

const FORM_DATE_FORMAT: &str = "%m/%d/%Y";
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Reviews of one dealer, each carrying its sentiment.
#[derive(Debug, Clone, Serialize)]
pub struct DealerDetails {
    pub dealer_id: i64,
    pub reviews: Vec<Review>,
}

/// Everything the add-review page needs.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewForm {
    pub dealer: Dealer,
    pub cars: Vec<CarModelDetail>,
}

/// Posted review form; field names follow the add-review page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewFormInput {
    pub content: String,
    #[serde(default)]
    pub purchasecheck: Option<String>,
    #[serde(default)]
    pub purchasedate: Option<String>,
    #[serde(default)]
    pub car: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Upstream(#[from] DealerApiError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("dealer {0} not found")]
    DealerNotFound(i64),
    #[error("car {0} is not in the catalog")]
    UnknownCar(u64),
    #[error("invalid review form: {0}")]
    InvalidForm(String),
}

/// Composes the dealer API, the sentiment analyzer and the local catalog.
pub struct ReviewService<D, S> {
    dealers: Arc<D>,
    sentiment: Arc<S>,
    catalog: Arc<dyn CatalogRepository>,
}

impl<D, S> ReviewService<D, S>
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
{
    pub fn new(dealers: Arc<D>, sentiment: Arc<S>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self {
            dealers,
            sentiment,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogRepository> {
        &self.catalog
    }

    pub async fn dealerships(&self, state: Option<&str>) -> Result<Vec<Dealer>, ReviewServiceError> {
        let dealers = match state.map(str::trim).filter(|state| !state.is_empty()) {
            Some(state) => self.dealers.fetch_dealers_by_state(state).await?,
            None => self.dealers.fetch_dealers().await?,
        };
        Ok(dealers)
    }

    pub async fn dealer_details(&self, dealer_id: i64) -> Result<DealerDetails, ReviewServiceError> {
        let mut reviews = self.dealers.fetch_reviews(dealer_id).await?;
        for review in &mut reviews {
            review.sentiment = self.classify(&review.review).await;
        }
        Ok(DealerDetails { dealer_id, reviews })
    }

    /// Sentiment failures never fail the page; the review is shown as unknown.
    pub async fn classify(&self, text: &str) -> SentimentLabel {
        match self.sentiment.classify(text).await {
            Ok(label) => label,
            Err(err) => {
                warn!(error = %err, "sentiment analysis failed");
                SentimentLabel::Unknown
            }
        }
    }

    pub async fn review_form(&self, dealer_id: i64) -> Result<ReviewForm, ReviewServiceError> {
        let dealer = self
            .dealers
            .fetch_dealer(dealer_id)
            .await?
            .ok_or(ReviewServiceError::DealerNotFound(dealer_id))?;
        let cars = self.catalog.model_details()?;
        Ok(ReviewForm { dealer, cars })
    }

    pub async fn post_review(
        &self,
        user: &User,
        dealer_id: i64,
        input: ReviewFormInput,
    ) -> Result<ReviewSubmission, ReviewServiceError> {
        let submission = self.build_submission(user, dealer_id, input)?;
        self.dealers.submit_review(&submission).await?;
        info!(dealer_id, username = %user.username, "review posted");
        Ok(submission)
    }

    fn build_submission(
        &self,
        user: &User,
        dealer_id: i64,
        input: ReviewFormInput,
    ) -> Result<ReviewSubmission, ReviewServiceError> {
        let review = input.content.trim().to_string();
        if review.is_empty() {
            return Err(ReviewServiceError::InvalidForm(
                "review content is required".to_string(),
            ));
        }

        let purchase = input.purchasecheck.is_some();
        let purchase_date = if purchase {
            let raw = input.purchasedate.as_deref().unwrap_or_default();
            Some(parse_purchase_date(raw)?.format("%Y-%m-%dT00:00:00").to_string())
        } else {
            None
        };

        let (car_make, car_model, car_year) = match input
            .car
            .as_deref()
            .map(str::trim)
            .filter(|car| !car.is_empty())
        {
            Some(raw) => {
                let car_id = raw.parse::<u64>().map_err(|_| {
                    ReviewServiceError::InvalidForm(format!("'{raw}' is not a car id"))
                })?;
                let model = self
                    .catalog
                    .model(CarModelId(car_id))?
                    .ok_or(ReviewServiceError::UnknownCar(car_id))?;
                let make = self
                    .catalog
                    .make(model.make_id)?
                    .ok_or(ReviewServiceError::UnknownCar(car_id))?;
                (
                    Some(make.name),
                    Some(model.name),
                    model.year.map(|year| year.year()),
                )
            }
            None => (None, None, None),
        };

        Ok(ReviewSubmission {
            name: user.full_name(),
            dealership: dealer_id,
            review,
            purchase,
            purchase_date,
            car_make,
            car_model,
            car_year,
        })
    }
}

/// Accepts the form's `MM/DD/YYYY` as well as `YYYY-MM-DD` from date pickers.
pub fn parse_purchase_date(raw: &str) -> Result<NaiveDate, ReviewServiceError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, FORM_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT))
        .map_err(|_| {
            ReviewServiceError::InvalidForm(format!(
                "purchase date '{raw}' must be formatted MM/DD/YYYY"
            ))
        })
}
