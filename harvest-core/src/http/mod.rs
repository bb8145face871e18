//! Outbound HTTP for the harvester.
//!
//! All requests to the directory API go through an [`HttpClient`]. The
//! client itself never waits or retries; pacing is done by the pipeline
//! scheduler with a [`Throttle`].

mod client;
mod headers;
mod throttle;

pub use client::{ApiClient, ApiClientBuilder, HttpClient, MockClient, MockResponse};
pub use headers::HeaderSet;
pub use throttle::Throttle;
