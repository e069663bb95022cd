//! Mock streaming transport for testing.
//!
//! Provides a scripted transport: each connect attempt consumes the next
//! scripted connection, and every attempt's request is recorded so tests can
//! verify the resumption body and headers the client sent.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use crate::traits::{ByteStream, Headers, StreamingTransport, TransportError};

/// A recorded connect attempt.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request body (the serialized resumption map)
    pub body: String,
    /// Request headers
    pub headers: Headers,
}

/// Script for one connect attempt.
#[derive(Debug)]
pub enum MockConnection {
    /// Refuse the attempt with this error.
    Error(TransportError),
    /// Accept the attempt and yield these chunk results, then end cleanly.
    Stream(Vec<Result<Bytes, TransportError>>),
}

impl MockConnection {
    /// Convenience: a connection that streams the given text chunks and ends.
    pub fn chunks<S: AsRef<str>>(chunks: &[S]) -> Self {
        MockConnection::Stream(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from(c.as_ref().to_string())))
                .collect(),
        )
    }
}

/// Scripted [`StreamingTransport`] for tests.
///
/// Once the script is exhausted, further attempts return a stream that never
/// yields, parking the connection loop so tests can inspect recorded state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    connections: Arc<Mutex<VecDeque<MockConnection>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Create a mock transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one scripted connection.
    pub fn push_connection(&self, connection: MockConnection) {
        self.connections.lock().unwrap().push_back(connection);
    }

    /// All recorded connect attempts, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of connect attempts made so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl StreamingTransport for MockTransport {
    async fn open_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body: body.to_string(),
            headers: headers.clone(),
        });

        let next = self.connections.lock().unwrap().pop_front();
        match next {
            Some(MockConnection::Error(err)) => Err(err),
            Some(MockConnection::Stream(chunks)) => Ok(Box::pin(stream::iter(chunks))),
            // Script exhausted: park the loop on a stream that never yields.
            None => Ok(Box::pin(stream::pending())),
        }
    }
}
