use serde::{Deserialize, Serialize};

use super::lenient;
use crate::sentiment::SentimentLabel;

/// Dealership as stored in the remote document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dealer {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub st: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub zip: String,
    #[serde(default, deserialize_with = "lenient::float")]
    pub lat: f64,
    #[serde(default, deserialize_with = "lenient::float")]
    pub long: f64,
}

/// Customer review attached to a dealership, enriched with its sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(deserialize_with = "lenient::integer")]
    pub dealership: i64,
    pub review: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub purchase: bool,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub purchase_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub car_make: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub car_model: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_year")]
    pub car_year: Option<i32>,
    #[serde(default, skip_deserializing)]
    pub sentiment: SentimentLabel,
}

/// Review document posted to the review cloud function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub name: String,
    pub dealership: i64,
    pub review: String,
    pub purchase: bool,
    pub purchase_date: Option<String>,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
}

/// Envelope expected by the review cloud function.
#[derive(Debug, Serialize)]
pub(crate) struct ReviewEnvelope<'a> {
    pub(crate) review: &'a ReviewSubmission,
}
