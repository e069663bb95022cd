//! Per-attempt request configuration.
//!
//! A caller-supplied factory can contribute base request options to every
//! connect attempt, e.g. a fresh auth token. The client always overrides the
//! method, `Content-Type`, and body.

use async_trait::async_trait;

use super::http::{Headers, TransportError};

/// Base request options merged into each connect attempt.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers to send with the request. `Content-Type` is always forced to
    /// `application/json` afterwards.
    pub headers: Headers,
}

/// Asynchronous factory for base request options.
///
/// Invoked once per connect attempt, before the streaming request is opened.
/// A factory failure fails the attempt and goes through the normal
/// failure/cooldown path.
#[async_trait]
pub trait RequestFactory: Send + Sync {
    async fn base_request(&self) -> Result<RequestOptions, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_options_default_is_empty() {
        let options = RequestOptions::default();
        assert!(options.headers.is_empty());
    }
}
