//! Client construction configuration.

use std::time::Duration;

/// Configuration for a [`crate::FramelineClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Streaming endpoint URL.
    pub url: String,
    /// Floor below which a cleanly terminated stream is treated as a
    /// premature disconnect (an intermediary idle-timeout, typically).
    pub min_stream_duration: Duration,
    /// Delay before reconnecting after a stream ran past the floor and
    /// terminated cleanly.
    pub completed_reconnect_delay: Duration,
    /// Cooldown per accumulated consecutive failure: the n-th failure in a
    /// row waits `n * cooldown_step`, starting at zero.
    pub cooldown_step: Duration,
    /// Upper bound on a single cooldown.
    pub max_cooldown: Duration,
}

impl ClientConfig {
    /// Configuration with production defaults for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_stream_duration: Duration::from_secs(5),
            completed_reconnect_delay: Duration::from_millis(100),
            cooldown_step: Duration::from_secs(1),
            max_cooldown: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://example.com/stream");
        assert_eq!(config.url, "http://example.com/stream");
        assert_eq!(config.min_stream_duration, Duration::from_secs(5));
        assert_eq!(config.completed_reconnect_delay, Duration::from_millis(100));
        assert_eq!(config.cooldown_step, Duration::from_secs(1));
        assert_eq!(config.max_cooldown, Duration::from_secs(60));
    }
}
