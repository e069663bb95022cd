//! Trait abstractions for dependency injection and testability.
//!
//! This module provides trait-based abstractions for the pieces of the
//! client that touch the outside world, enabling dependency injection and
//! mocking in tests.
//!
//! # Traits
//!
//! - [`StreamingTransport`] - opening one streaming HTTP session
//! - [`Sleeper`] - awaiting reconnect/cooldown delays
//! - [`RequestFactory`] - per-attempt base request options (e.g. auth)

pub mod http;
pub mod request;
pub mod sleep;

pub use http::{ByteStream, Headers, StreamingTransport, TransportError};
pub use request::{RequestFactory, RequestOptions};
pub use sleep::Sleeper;
