//! Local simulated responder used when no backend is configured

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use super::ReplyProvider;
use crate::error::{Error, Result};

/// Default simulated latency, in milliseconds
pub const DEFAULT_DELAY_MS: RangeInclusive<u64> = 650..=1100;

/// Replies with canned text after a randomized, interruptible delay
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    delay_ms: RangeInclusive<u64>,
}

impl SimulatedProvider {
    /// Create a provider with the default latency range
    pub fn new() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
        }
    }

    /// Create a provider with a custom latency range in milliseconds
    pub fn with_delay(delay_ms: RangeInclusive<u64>) -> Self {
        Self { delay_ms }
    }

    fn pick_delay(&self) -> Duration {
        let (lo, hi) = (*self.delay_ms.start(), *self.delay_ms.end());
        if lo >= hi {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyProvider for SimulatedProvider {
    async fn get_reply(&self, text: &str, cancel: CancellationToken) -> Result<String> {
        let delay = self.pick_delay();
        tracing::debug!("Simulating reply latency of {:?}", delay);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Canceled),
            _ = tokio::time::sleep(delay) => {}
        }

        Ok(canned_reply(text))
    }
}

/// Build the deterministic reply for `text`
pub fn canned_reply(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "Please type a message and press Send.".to_string();
    }

    format!(
        "Mock reply (no backend configured): I received:\n\n\u{201c}{}\u{201d}\n\n\
         Set OCEAN_API_BASE to connect to a backend when available.",
        trimmed
    )
}
