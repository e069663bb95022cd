//! Concrete implementations of trait abstractions.
//!
//! Production-ready adapters implementing the traits defined in
//! `crate::traits`, plus test doubles in [`mock`].
//!
//! # Adapters
//!
//! - [`ReqwestTransport`] - streaming HTTP transport using reqwest
//! - [`TokioSleeper`] - delays using tokio timers
//!
//! # Mock Implementations
//!
//! - [`mock::MockTransport`] - scripted connections for testing
//! - [`mock::RecordingSleeper`] - instant, recorded delays

pub mod mock;
pub mod reqwest_http;
pub mod tokio_sleep;

pub use mock::{MockConnection, MockTransport, RecordingSleeper};
pub use reqwest_http::ReqwestTransport;
pub use tokio_sleep::TokioSleeper;
