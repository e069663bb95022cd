//! Error taxonomy for the streaming client.
//!
//! Every variant here is handled internally by the connection loop and
//! published on the `"error"` channel for observability; none of them is
//! ever surfaced as an `Err` to API consumers. The client never permanently
//! fails, it retries forever with growing cooldowns.

use crate::frame::DecodeError;
use crate::traits::TransportError;

/// Error type for a failed connect-and-stream cycle.
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Transport-level failure (connect, TLS, mid-stream IO).
    Transport(TransportError),
    /// Server answered the connect attempt with a non-success status.
    HttpStatus { status: u16, message: String },
    /// A record failed to decode at either JSON stage. Aborts the whole
    /// connection rather than skipping the offending record.
    Decode(DecodeError),
    /// The stream ended cleanly before the configured minimum duration,
    /// e.g. an intermediary idle-timeout.
    PrematureDisconnect { elapsed_ms: u64 },
}

impl ClientError {
    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "E_TRANSPORT",
            ClientError::HttpStatus { .. } => "E_HTTP_STATUS",
            ClientError::Decode(_) => "E_DECODE",
            ClientError::PrematureDisconnect { .. } => "E_PREMATURE_EOF",
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
            ClientError::HttpStatus { status, message } => {
                write!(f, "server error ({}): {}", status, message)
            }
            ClientError::Decode(e) => write!(f, "decode error: {}", e),
            ClientError::PrematureDisconnect { elapsed_ms } => {
                write!(f, "stream ended prematurely after {} ms", elapsed_ms)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(e) => Some(e),
            ClientError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::ServerError { status, message } => {
                ClientError::HttpStatus { status, message }
            }
            other => ClientError::Transport(other),
        }
    }
}

impl From<DecodeError> for ClientError {
    fn from(e: DecodeError) -> Self {
        ClientError::Decode(e)
    }
}
