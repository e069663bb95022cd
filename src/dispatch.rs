//! Frame store and asynchronous event dispatch.
//!
//! Accepted frames are cached (latest frame per event name) and announced to
//! subscribers through a queue drained by a dedicated dispatcher task.
//! Delivery is therefore always asynchronous relative to the call that
//! produced it: a listener registered in the same scheduling turn a frame
//! arrives still observes it, and subscriber reentrancy never blocks the
//! read loop. Queue order preserves record order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::error::ClientError;
use crate::frame::Frame;

/// Reserved channel receiving every accepted frame.
pub const FRAME_RECEIVED_CHANNEL: &str = "frame-received";
/// Reserved channel receiving connection errors.
pub const ERROR_CHANNEL: &str = "error";

/// Payload delivered to listeners.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Frame payload, delivered on the channel named by the frame's event.
    Data(serde_json::Value),
    /// Whole frame, delivered on [`FRAME_RECEIVED_CHANNEL`].
    Frame(Frame),
    /// Connection error, delivered on [`ERROR_CHANNEL`].
    Error(ClientError),
}

/// Options for [`crate::FramelineClient::add_event_listener`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// Deregister the listener after its first delivery.
    pub once: bool,
}

/// Handle identifying a registered listener, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

type HandlerFn = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

enum Listener {
    /// Callback registered through the public listener API.
    Handler {
        id: u64,
        handler: HandlerFn,
        once: bool,
    },
    /// One-shot waiter backing a pending `get_frame`.
    Waiter { tx: oneshot::Sender<ClientEvent> },
}

/// Result of a store lookup that atomically registers a waiter on a miss.
pub(crate) enum FrameQuery {
    /// The store already held a frame; here is its data.
    Ready(serde_json::Value),
    /// No frame yet; resolves with the first delivery on the channel.
    Wait(oneshot::Receiver<ClientEvent>),
}

#[derive(Default)]
struct Inner {
    frames: HashMap<String, Frame>,
    listeners: HashMap<String, Vec<Listener>>,
}

struct Notification {
    channel: String,
    event: ClientEvent,
}

/// Shared frame store plus listener registry with queued delivery.
///
/// A single mutex guards the store and the registry because listener
/// registration/removal can be invoked concurrently with dispatch.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    inner: Arc<Mutex<Inner>>,
    queue: mpsc::UnboundedSender<Notification>,
    next_id: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Create the dispatcher and spawn its delivery task.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn new() -> Self {
        let (queue, mut rx) = mpsc::unbounded_channel::<Notification>();
        let inner = Arc::new(Mutex::new(Inner::default()));

        let task_inner = Arc::clone(&inner);
        tokio::spawn(async move {
            while let Some(note) = rx.recv().await {
                deliver(&task_inner, note);
            }
            debug!("dispatch queue closed");
        });

        Self {
            inner,
            queue,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Store an accepted frame and enqueue its two notifications.
    ///
    /// Frames without a non-empty event name are dropped here, before any
    /// state is touched.
    pub(crate) fn accept_frame(&self, frame: Frame) {
        let event = match frame.event_name() {
            Some(event) => event.to_string(),
            None => {
                trace!("dropping frame without event name");
                return;
            }
        };

        {
            let mut state = self.inner.lock().unwrap();
            state.frames.insert(event.clone(), frame.clone());
        }

        // Enqueued in this order so the named channel always fires before the
        // catch-all for the same frame.
        self.enqueue(Notification {
            channel: event,
            event: ClientEvent::Data(frame.data.clone()),
        });
        self.enqueue(Notification {
            channel: FRAME_RECEIVED_CHANNEL.to_string(),
            event: ClientEvent::Frame(frame),
        });
    }

    /// Publish a connection error on the reserved error channel.
    pub(crate) fn publish_error(&self, error: ClientError) {
        self.enqueue(Notification {
            channel: ERROR_CHANNEL.to_string(),
            event: ClientEvent::Error(error),
        });
    }

    /// Register a listener on `channel`.
    pub(crate) fn add_listener(
        &self,
        channel: &str,
        handler: HandlerFn,
        options: ListenerOptions,
    ) -> ListenerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut state = self.inner.lock().unwrap();
        state
            .listeners
            .entry(channel.to_string())
            .or_default()
            .push(Listener::Handler {
                id,
                handler,
                once: options.once,
            });
        ListenerHandle(id)
    }

    /// Remove a previously registered listener. Unknown handles are ignored.
    pub(crate) fn remove_listener(&self, channel: &str, handle: ListenerHandle) {
        let mut state = self.inner.lock().unwrap();
        if let Some(list) = state.listeners.get_mut(channel) {
            list.retain(|l| !matches!(l, Listener::Handler { id, .. } if *id == handle.0));
            if list.is_empty() {
                state.listeners.remove(channel);
            }
        }
    }

    /// Look up the latest frame for `name`, or register a one-shot waiter.
    ///
    /// The lookup and the registration happen under one lock so a frame
    /// accepted in between cannot be missed.
    pub(crate) fn query_frame(&self, name: &str) -> FrameQuery {
        let mut state = self.inner.lock().unwrap();
        if let Some(frame) = state.frames.get(name) {
            return FrameQuery::Ready(frame.data.clone());
        }

        let (tx, rx) = oneshot::channel();
        state
            .listeners
            .entry(name.to_string())
            .or_default()
            .push(Listener::Waiter { tx });
        FrameQuery::Wait(rx)
    }

    fn enqueue(&self, note: Notification) {
        // The delivery task only stops when the queue closes, which only
        // happens when every Dispatcher clone is gone.
        if self.queue.send(note).is_err() {
            debug!("dispatch queue receiver gone, dropping notification");
        }
    }
}

/// Deliver one notification to the listeners of its channel.
///
/// Listeners are collected under the lock but invoked outside it, so a
/// handler may re-enter the registry freely.
fn deliver(inner: &Arc<Mutex<Inner>>, note: Notification) {
    let mut handlers: Vec<HandlerFn> = Vec::new();
    let mut waiters: Vec<oneshot::Sender<ClientEvent>> = Vec::new();

    {
        let mut state = inner.lock().unwrap();
        if let Some(list) = state.listeners.get_mut(&note.channel) {
            let mut kept = Vec::with_capacity(list.len());
            for listener in list.drain(..) {
                match listener {
                    Listener::Handler { id, handler, once } => {
                        handlers.push(Arc::clone(&handler));
                        if !once {
                            kept.push(Listener::Handler { id, handler, once });
                        }
                    }
                    Listener::Waiter { tx } => waiters.push(tx),
                }
            }
            *list = kept;
            if list.is_empty() {
                state.listeners.remove(&note.channel);
            }
        }
    }

    for handler in handlers {
        handler(&note.event);
    }
    for tx in waiters {
        if tx.send(note.event.clone()).is_err() {
            trace!("waiter dropped before delivery");
        }
    }
}
