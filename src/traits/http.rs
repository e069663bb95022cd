//! Streaming transport trait abstraction.
//!
//! Abstracts the HTTP streaming session so the connection loop can be driven
//! by the production reqwest adapter or by a scripted mock in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// Request headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Incremental response body: raw chunks until the stream ends or fails.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Transport-level errors.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// Connection could not be established
    ConnectionFailed(String),
    /// Request or read timed out
    Timeout(String),
    /// Server returned a non-success status
    ServerError { status: u16, message: String },
    /// IO error while reading the stream
    Io(String),
    /// Other transport error
    Other(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Timeout(msg) => write!(f, "timeout: {}", msg),
            TransportError::ServerError { status, message } => {
                write!(f, "server error ({}): {}", status, message)
            }
            TransportError::Io(msg) => write!(f, "io error: {}", msg),
            TransportError::Other(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Trait for opening one streaming session.
///
/// The client always posts: the method, `Content-Type` header, and body are
/// owned by the connection loop, so the trait only carries what varies.
#[async_trait]
pub trait StreamingTransport: Send + Sync {
    /// Open a streaming POST request and return the response body stream.
    ///
    /// Implementations must map a non-success response status to
    /// [`TransportError::ServerError`] instead of returning a stream.
    async fn open_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::ConnectionFailed("refused".to_string()).to_string(),
            "connection failed: refused"
        );
        assert_eq!(
            TransportError::ServerError {
                status: 500,
                message: "boom".to_string()
            }
            .to_string(),
            "server error (500): boom"
        );
        assert_eq!(
            TransportError::Io("reset".to_string()).to_string(),
            "io error: reset"
        );
    }

    #[test]
    fn test_transport_error_clone() {
        let err = TransportError::Timeout("30s".to_string());
        assert_eq!(err.to_string(), err.clone().to_string());
    }
}
