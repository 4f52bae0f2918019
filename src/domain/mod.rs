//! Domain module
//!
//! Core gateway types: credentials, tokens and aggregation results.

pub mod context;
pub mod token;
pub mod transaction;

pub use context::{RequestContext, REQUEST_ID_HEADER};
pub use token::{AccessToken, Credentials};
pub use transaction::{AggregatedResult, TransactionRecord, UserId, UserOutcome, UserTransactions};
