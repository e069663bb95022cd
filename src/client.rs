//! Public client: subscription API over the store and dispatcher.
//!
//! Constructing a client spawns its connection loop; the loop reconnects
//! forever until [`FramelineClient::shutdown`] is called or the client is
//! dropped. Connection trouble is published on the `"error"` channel, never
//! returned from this API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future;
use tokio::sync::watch;
use tracing::info;

use crate::adapters::{ReqwestTransport, TokioSleeper};
use crate::config::ClientConfig;
use crate::connection::{ConnectionLoop, ConnectionState};
use crate::dispatch::{ClientEvent, Dispatcher, FrameQuery, ListenerHandle, ListenerOptions};
use crate::traits::{RequestFactory, Sleeper, StreamingTransport};

/// Client for a resumable newline-delimited JSON frame stream.
///
/// Holds the latest frame per event name and notifies subscribers as new
/// frames arrive. All constructors must be called from within a tokio
/// runtime because they spawn the connection loop and the dispatch task.
pub struct FramelineClient {
    dispatcher: Dispatcher,
    shutdown: Arc<AtomicBool>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl FramelineClient {
    /// Connect to `config.url` with the production transport and timers.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(ReqwestTransport::new()),
            Arc::new(TokioSleeper),
            None,
        )
    }

    /// Like [`new`](Self::new), with a factory contributing base request
    /// options (e.g. fresh auth headers) to every connect attempt.
    pub fn with_request_factory(config: ClientConfig, factory: Arc<dyn RequestFactory>) -> Self {
        Self::with_parts(
            config,
            Arc::new(ReqwestTransport::new()),
            Arc::new(TokioSleeper),
            Some(factory),
        )
    }

    /// Construct from explicit parts. This is the seam tests use to inject
    /// a scripted transport and an instant sleeper.
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn StreamingTransport>,
        sleeper: Arc<dyn Sleeper>,
        factory: Option<Arc<dyn RequestFactory>>,
    ) -> Self {
        let dispatcher = Dispatcher::new();
        let shutdown = Arc::new(AtomicBool::new(false));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let connection = ConnectionLoop {
            config,
            transport,
            sleeper,
            factory,
            dispatcher: dispatcher.clone(),
            shutdown: Arc::clone(&shutdown),
            state_tx,
        };
        tokio::spawn(connection.run());

        Self {
            dispatcher,
            shutdown,
            state_rx,
        }
    }

    /// Resolve with the data of the latest frame for `name`.
    ///
    /// Resolves immediately if such a frame is already stored; otherwise
    /// waits for the first frame subsequently dispatched for `name`. Never
    /// errors and never times out on its own.
    pub async fn get_frame(&self, name: &str) -> serde_json::Value {
        match self.dispatcher.query_frame(name) {
            FrameQuery::Ready(data) => data,
            FrameQuery::Wait(rx) => match rx.await {
                Ok(ClientEvent::Data(data)) => data,
                // A waiter channel only ever carries frame data; a dropped
                // sender means client teardown, after which no frame can
                // arrive, so the contract is to stay pending.
                _ => future::pending().await,
            },
        }
    }

    /// Resolve once every requested name has produced a frame.
    ///
    /// Results are in the caller's requested order, independent of the
    /// order the frames arrived in.
    pub async fn get_frames(&self, names: &[&str]) -> Vec<serde_json::Value> {
        let pending: Vec<_> = names.iter().map(|name| self.get_frame(name)).collect();
        future::join_all(pending).await
    }

    /// Register a listener on `channel`.
    ///
    /// Reserved channels: [`crate::FRAME_RECEIVED_CHANNEL`] carries every
    /// accepted frame, [`crate::ERROR_CHANNEL`] carries connection errors;
    /// any other channel name delivers the data of frames for that event.
    pub fn add_event_listener<F>(
        &self,
        channel: &str,
        handler: F,
        options: ListenerOptions,
    ) -> ListenerHandle
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.dispatcher.add_listener(channel, Arc::new(handler), options)
    }

    /// Remove a listener previously registered on `channel`.
    pub fn remove_event_listener(&self, channel: &str, handle: ListenerHandle) {
        self.dispatcher.remove_listener(channel, handle);
    }

    /// Current connection phase.
    pub fn connection_state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to connection phase changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Stop the reconnect loop at its next flag check.
    ///
    /// Already-queued notifications still drain; pending `get_frame` calls
    /// will not resolve after shutdown.
    pub fn shutdown(&self) {
        info!("shutting down frameline client");
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Drop for FramelineClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
