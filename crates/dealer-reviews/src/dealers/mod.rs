//! Data-access layer for dealerships and reviews held by the remote document store.

pub mod client;
pub mod domain;
mod lenient;
mod parser;

pub use client::{DealerApi, DealerApiError, HttpDealerClient};
pub use domain::{Dealer, Review, ReviewSubmission};
