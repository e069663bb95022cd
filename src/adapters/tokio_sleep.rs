//! Tokio-based sleeper adapter.

use async_trait::async_trait;
use std::time::Duration;

use crate::traits::Sleeper;

/// Production [`Sleeper`] delegating to `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
