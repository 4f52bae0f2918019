//! Upstream module
//!
//! Client for the third-party financial-data API.

pub mod client;
pub mod envelope;
pub mod error;
pub mod request;

pub use client::{HttpUpstream, Upstream};
pub use envelope::Envelope;
pub use error::UpstreamError;
pub use request::{Method, UpstreamRequest};
