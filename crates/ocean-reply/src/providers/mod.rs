//! Reply provider implementations

pub mod remote;
pub mod simulated;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Result;

pub use remote::RemoteProvider;
pub use simulated::SimulatedProvider;

/// Trait for reply providers
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Produce a complete reply for `text`.
    ///
    /// Implementations must watch `cancel` and fail with
    /// [`Error::Canceled`](crate::Error::Canceled) as soon as it fires.
    async fn get_reply(&self, text: &str, cancel: CancellationToken) -> Result<String>;
}

#[async_trait]
impl<T: ReplyProvider + ?Sized> ReplyProvider for Arc<T> {
    async fn get_reply(&self, text: &str, cancel: CancellationToken) -> Result<String> {
        (**self).get_reply(text, cancel).await
    }
}

/// How replies are produced, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMode {
    /// Canned replies after a simulated latency; no backend needed
    Simulated,
    /// Replies fetched from `<base_url>/chat`
    Remote { base_url: String },
}

impl ReplyMode {
    /// Whether this is the simulated (mock) mode
    pub fn is_simulated(&self) -> bool {
        matches!(self, ReplyMode::Simulated)
    }
}

/// Build the provider for a resolved mode
pub fn provider_for(mode: &ReplyMode) -> Result<Arc<dyn ReplyProvider>> {
    match mode {
        ReplyMode::Simulated => Ok(Arc::new(SimulatedProvider::new())),
        ReplyMode::Remote { base_url } => Ok(Arc::new(RemoteProvider::new(base_url.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_mode_flag() {
        assert!(ReplyMode::Simulated.is_simulated());
        let remote = ReplyMode::Remote {
            base_url: "http://localhost:3001".into(),
        };
        assert!(!remote.is_simulated());
    }

    #[test]
    fn test_provider_for_remote_rejects_blank_url() {
        let mode = ReplyMode::Remote {
            base_url: "   ".into(),
        };
        assert!(provider_for(&mode).is_err());
    }

    #[tokio::test]
    async fn test_provider_for_simulated_replies() {
        let provider = provider_for(&ReplyMode::Simulated).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = provider.get_reply("hello", cancel).await.unwrap_err();
        assert!(err.is_canceled());
    }
}
