//! Token module
//!
//! Access-token lifecycle for the upstream API: lazy acquisition, caching,
//! single-flight refresh and retry-once on 401.

pub mod error;
pub mod manager;
pub mod retry;

pub use error::AuthError;
pub use manager::TokenManager;
pub use retry::{AuthorizedUpstream, RetryBudget};
