//! Frameline - client for resumable newline-delimited JSON frame streams.
//!
//! The server pushes named, JSON-carrying frames over a long-lived HTTP
//! response, one frame per line. The client reassembles records from raw
//! chunks, decodes them (the payload is double-encoded on the wire), caches
//! the latest frame per event name, tracks per-event resumption ids replayed
//! on every reconnect, and keeps the connection alive forever through a
//! backoff-driven reconnect loop.
//!
//! ```ignore
//! use frameline::{ClientConfig, FramelineClient};
//!
//! let client = FramelineClient::new(ClientConfig::new("https://example.com/stream"));
//! let settings = client.get_frame("settings").await;
//! ```

pub mod adapters;
pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod reassembler;
pub mod tickets;
pub mod traits;

pub use client::FramelineClient;
pub use config::ClientConfig;
pub use connection::ConnectionState;
pub use dispatch::{
    ClientEvent, ListenerHandle, ListenerOptions, ERROR_CHANNEL, FRAME_RECEIVED_CHANNEL,
};
pub use error::ClientError;
pub use frame::{DecodeError, Frame};
pub use reassembler::FrameReassembler;
pub use tickets::TicketTracker;
