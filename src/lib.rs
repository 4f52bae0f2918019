//! Finance Gateway Library
//!
//! Authenticated gateway between a browser front-end and a third-party
//! financial-data API. Re-exports modules for integration testing and
//! external use.

pub mod api;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod token;
pub mod upstream;

mod error;

#[cfg(test)]
mod test_support;

pub use api::AppState;
pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{AccessToken, AggregatedResult, Credentials, RequestContext, UserId};
