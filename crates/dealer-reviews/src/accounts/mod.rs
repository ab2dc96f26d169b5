//! Site users, password storage and login sessions.

pub mod password;
pub mod service;
pub mod store;

pub use service::{AccountError, AccountService, Credentials, Registration, Session};
pub use store::{InMemoryUserStore, SessionToken, StoreError, User, UserStore};
