//! Injectable delay primitive.
//!
//! The reconnect loop sleeps between attempts; abstracting the sleep lets
//! tests run the loop with zero real delay while still observing every
//! scheduled cooldown.

use async_trait::async_trait;
use std::time::Duration;

/// Trait for awaiting a delay.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}
