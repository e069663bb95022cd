//! Mock implementations for testing.
//!
//! Test doubles for the trait abstractions, enabling deterministic tests of
//! the reconnect loop without network access or real delays.
//!
//! # Available Mocks
//!
//! - [`MockTransport`] - scripted streaming connections with request recording
//! - [`RecordingSleeper`] - instant sleeps with delay recording

pub mod http;
pub mod sleep;

pub use http::{MockConnection, MockTransport, RecordedRequest};
pub use sleep::RecordingSleeper;
