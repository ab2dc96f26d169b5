//! Dealership review service: dealer listings and reviews from a remote
//! document store, review sentiment from an NLU provider, and a local car
//! catalog plus user accounts backing the review form.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod dealers;
pub mod error;
pub mod reviews;
pub mod sentiment;
pub mod telemetry;
