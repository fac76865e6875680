//! HTTP transport module
//!
//! Provides the transport seam the API client talks through.
//!
//! # Features
//!
//! - **Capability trait**: [`Transport`] so tests and callers can substitute
//!   implementations
//! - **Retry policy**: one retry after a fixed sleep, any non-success status
//! - **Rate limiting**: token bucket request pacing using governor

mod rate_limit;
mod transport;

pub use rate_limit::RateLimiter;
pub use transport::{HttpTransport, Transport};

#[cfg(test)]
mod tests;
