//! Dealer listings, review pages and review submission.

pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use router::{dealership_router, SESSION_COOKIE};
pub use service::{
    parse_purchase_date, DealerDetails, ReviewForm, ReviewFormInput, ReviewService,
    ReviewServiceError,
};
