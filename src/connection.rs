//! Reconnection state machine driving the streaming transport.
//!
//! One loop per client: connect, stream, classify the ending as failure or
//! completion, cool down, reconnect, forever. Failures are published on the
//! error channel and never surfaced to API consumers. The loop is an
//! explicit iteration with an injectable sleep primitive and a polled
//! shutdown flag, so tests can run it with zero real delay and shutdown is
//! honored at every phase boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::frame::Frame;
use crate::reassembler::FrameReassembler;
use crate::tickets::TicketTracker;
use crate::traits::{Headers, RequestFactory, Sleeper, StreamingTransport};

/// Phase reported through the client's state watch channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Building and opening the next streaming request.
    Connecting,
    /// Reading frames from an open stream.
    Streaming,
    /// Waiting out a failure cooldown; `attempt` counts consecutive failures.
    Cooldown { attempt: u32 },
    /// The loop has stopped; no further reconnects will happen.
    Shutdown,
}

/// How one connect-and-stream cycle ended.
enum CycleOutcome {
    /// Clean termination after the minimum stream duration.
    Completed,
    /// Anything else: transport error, bad status, decode failure, or a
    /// too-quick clean termination.
    Failed(ClientError),
}

pub(crate) struct ConnectionLoop {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn StreamingTransport>,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) factory: Option<Arc<dyn RequestFactory>>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) shutdown: Arc<AtomicBool>,
    pub(crate) state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionLoop {
    /// Run until the shutdown flag is set.
    pub(crate) async fn run(self) {
        // Session state lives for the client's lifetime but is only ever
        // touched by this task.
        let mut tickets = TicketTracker::new();
        let mut backoff: u32 = 0;

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let _ = self.state_tx.send(ConnectionState::Connecting);
            let outcome = self.run_cycle(&mut tickets, &mut backoff).await;

            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match outcome {
                CycleOutcome::Completed => {
                    debug!("stream completed cleanly, reconnecting shortly");
                    self.sleeper.sleep(self.config.completed_reconnect_delay).await;
                }
                CycleOutcome::Failed(error) => {
                    warn!(code = error.error_code(), "stream cycle failed: {}", error);
                    self.dispatcher.publish_error(error);

                    let delay = cooldown_delay(&self.config, backoff);
                    let _ = self.state_tx.send(ConnectionState::Cooldown { attempt: backoff });
                    self.sleeper.sleep(delay).await;
                    backoff = backoff.saturating_add(1);
                }
            }
        }

        let _ = self.state_tx.send(ConnectionState::Shutdown);
        info!("connection loop stopped");
    }

    /// One connect-and-stream cycle.
    async fn run_cycle(
        &self,
        tickets: &mut TicketTracker,
        backoff: &mut u32,
    ) -> CycleOutcome {
        let headers = match self.base_headers().await {
            Ok(headers) => headers,
            Err(error) => return CycleOutcome::Failed(error),
        };
        let body = match tickets.request_body() {
            Ok(body) => body,
            Err(e) => {
                return CycleOutcome::Failed(ClientError::Transport(
                    crate::traits::TransportError::Other(e.to_string()),
                ))
            }
        };

        let mut stream = match self
            .transport
            .open_stream(&self.config.url, &body, &headers)
            .await
        {
            Ok(stream) => stream,
            Err(error) => return CycleOutcome::Failed(error.into()),
        };

        let _ = self.state_tx.send(ConnectionState::Streaming);
        debug!(url = %self.config.url, "streaming");

        let started = Instant::now();
        let mut reassembler = FrameReassembler::new();

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return CycleOutcome::Completed;
            }

            match stream.next().await {
                Some(Ok(chunk)) => {
                    reassembler.add(&String::from_utf8_lossy(&chunk));
                    // One chunk may complete several records; drain them all
                    // in arrival order.
                    while let Some(record) = reassembler.take() {
                        match Frame::decode(&record) {
                            Ok(frame) => {
                                *backoff = 0;
                                tickets.record(&frame);
                                self.dispatcher.accept_frame(frame);
                            }
                            Err(e) => {
                                // A bad record aborts the whole connection
                                // rather than being skipped.
                                return CycleOutcome::Failed(e.into());
                            }
                        }
                    }
                }
                Some(Err(error)) => return CycleOutcome::Failed(error.into()),
                None => {
                    let elapsed = started.elapsed();
                    if elapsed < self.config.min_stream_duration {
                        return CycleOutcome::Failed(ClientError::PrematureDisconnect {
                            elapsed_ms: elapsed.as_millis() as u64,
                        });
                    }
                    return CycleOutcome::Completed;
                }
            }
        }
    }

    /// Base headers for the next attempt, with `Content-Type` forced.
    async fn base_headers(&self) -> Result<Headers, ClientError> {
        let mut headers = match &self.factory {
            Some(factory) => factory.base_request().await.map_err(ClientError::from)?.headers,
            None => Headers::new(),
        };
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Ok(headers)
    }
}

/// Cooldown for the given consecutive-failure count, capped.
fn cooldown_delay(config: &ClientConfig, backoff: u32) -> Duration {
    config.cooldown_step.saturating_mul(backoff).min(config.max_cooldown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("http://test/stream")
    }

    #[test]
    fn test_cooldown_grows_linearly_from_zero() {
        let config = config();
        assert_eq!(cooldown_delay(&config, 0), Duration::ZERO);
        assert_eq!(cooldown_delay(&config, 1), Duration::from_secs(1));
        assert_eq!(cooldown_delay(&config, 2), Duration::from_secs(2));
    }

    #[test]
    fn test_cooldown_is_capped() {
        let config = config();
        assert_eq!(cooldown_delay(&config, 90), Duration::from_secs(60));
        assert_eq!(cooldown_delay(&config, u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_connection_state_equality() {
        assert_eq!(ConnectionState::Connecting, ConnectionState::Connecting);
        assert_eq!(
            ConnectionState::Cooldown { attempt: 2 },
            ConnectionState::Cooldown { attempt: 2 }
        );
        assert_ne!(
            ConnectionState::Cooldown { attempt: 1 },
            ConnectionState::Cooldown { attempt: 2 }
        );
        assert_ne!(ConnectionState::Streaming, ConnectionState::Shutdown);
    }
}
