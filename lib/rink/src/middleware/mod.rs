//! Tower middleware for the hyper transport.
//!
//! Layers wrap the type-erased transport service and see every compiled
//! [`Request`](crate::Request) before it is encoded.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `middleware-logging` | `.with_logging()` / `.with_debug_logging()` helpers |
//! | `middleware-concurrency` | `.with_concurrency_limit()` helper |
//!
//! Both are enabled by default. Any other tower layer whose service speaks
//! `Request -> Response<Bytes>` can be added with
//! [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer).

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};

pub use tower::limit::ConcurrencyLimitLayer;
