//! `reasoning-client`: HTTP-backed [`ReasoningGateway`] implementations.
//!
//! [`from_config`] picks the gateway for a [`ReasoningConfig`]: a live
//! Anthropic or OpenAI client when an API key is available, otherwise the
//! [`OfflineGateway`].

pub mod client;
pub mod error;
pub mod offline;

use std::sync::Arc;

use tracing::warn;

use osint_core::config::{Provider, ReasoningConfig};
use osint_core::gateway::ReasoningGateway;

pub use client::{ModelInfo, ReasoningClient};
pub use error::ReasoningError;
pub use offline::OfflineGateway;

/// Gateway for `config`. Missing credentials degrade to [`OfflineGateway`]
/// with a warning instead of failing.
pub fn from_config(config: &ReasoningConfig) -> Arc<dyn ReasoningGateway> {
    if config.provider == Provider::Offline {
        return Arc::new(OfflineGateway);
    }
    match ReasoningClient::from_env(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(provider = %config.provider, error = %e, "falling back to offline reasoning");
            Arc::new(OfflineGateway)
        }
    }
}

/// Model details `from_config` would use, without building a client.
pub fn model_info(config: &ReasoningConfig) -> ModelInfo {
    let live = config.provider != Provider::Offline
        && std::env::var(config.api_key_env()).is_ok_and(|k| !k.trim().is_empty());
    if live {
        ModelInfo::from(config)
    } else {
        OfflineGateway.model_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osint_core::gateway::CompletionRequest;

    #[tokio::test]
    async fn missing_key_degrades_to_offline() {
        let config = ReasoningConfig {
            api_key_env: Some("OSINT_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..Default::default()
        };
        let gateway = from_config(&config);
        let text = gateway.complete(CompletionRequest::new("hello")).await.unwrap();
        assert_eq!(text, offline::OFFLINE_TEXT);
        assert_eq!(model_info(&config).provider, "offline");
    }
}
