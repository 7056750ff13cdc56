use super::provider::{ChatProvider, ProviderError};
use super::state::RouterState;
use super::{ChatMessage, ChatResult, FallbackProvider, PrimaryProvider, ToolSchema};
use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("all providers failed: {last_error}")]
    AllProvidersFailed { last_error: String },
}

/// Routes chat requests to the primary provider, rotating credentials on
/// failure, and to the fallback provider once every primary credential has
/// failed within one request.
pub struct LlmRouter {
    primary: Option<Arc<dyn ChatProvider>>,
    fallback: Option<Arc<dyn ChatProvider>>,
    state: Arc<RouterState>,
    attempt_timeout: Duration,
}

impl LlmRouter {
    pub fn new(
        primary: Option<Arc<dyn ChatProvider>>,
        fallback: Option<Arc<dyn ChatProvider>>,
        attempt_timeout: Duration,
    ) -> Self {
        let credential_count = primary.as_ref().map_or(0, |p| p.credential_count());

        Self {
            primary,
            fallback,
            state: Arc::new(RouterState::new(credential_count)),
            attempt_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let attempt_timeout = Duration::from_secs(config.router.request_timeout_secs);

        let primary = config
            .primary
            .as_ref()
            .filter(|p| !p.api_keys.is_empty())
            .map(|p| Arc::new(PrimaryProvider::new(p)) as Arc<dyn ChatProvider>);

        let fallback = match config.fallback.as_ref().filter(|f| f.token.is_some()) {
            Some(f) => Some(Arc::new(FallbackProvider::new(f, attempt_timeout)?) as Arc<dyn ChatProvider>),
            None => None,
        };

        Ok(Self::new(primary, fallback, attempt_timeout))
    }

    pub fn state(&self) -> Arc<RouterState> {
        self.state.clone()
    }

    pub fn primary_label(&self) -> Option<&str> {
        self.primary.as_deref().map(|p| p.label())
    }

    pub fn fallback_label(&self) -> Option<&str> {
        self.fallback.as_deref().map(|p| p.label())
    }

    /// Answer `conversation`, trying the primary tier before the fallback tier
    #[tracing::instrument(name = "router.chat", skip_all, fields(messages = conversation.len(), tools = tools.map_or(0, |t| t.len())))]
    pub async fn chat(
        &self,
        conversation: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResult, RouterError> {
        let mut last_error = None;

        if let Some(primary) = self.primary.as_deref().filter(|p| p.credential_count() > 0) {
            match self.try_primary(primary, conversation, tools).await {
                Ok(result) => return Ok(result),
                Err(err) => last_error = err,
            }
        }

        let Some(fallback) = self.fallback.as_deref() else {
            error!("No fallback provider configured and primary unavailable");
            return Err(RouterError::AllProvidersFailed {
                last_error: last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no provider configured".to_string()),
            });
        };

        debug!(provider = %fallback.label(), "Using fallback provider");
        match self.attempt(fallback, 0, conversation, tools).await {
            Ok(result) => Ok(result),
            Err(err) => {
                error!(provider = %fallback.label(), error = %err, "Fallback provider failed");
                Err(RouterError::AllProvidersFailed {
                    last_error: err.to_string(),
                })
            }
        }
    }

    /// One pass over the primary credentials starting at the current index.
    ///
    /// On failure returns the last provider error, if any attempt was made.
    async fn try_primary(
        &self,
        primary: &dyn ChatProvider,
        conversation: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResult, Option<ProviderError>> {
        let mut last_error = None;

        for _ in 0..primary.credential_count() {
            let status = self.state.snapshot().await;
            if status.primary_exhausted {
                debug!(provider = %primary.label(), "Primary provider exhausted, skipping");
                return Err(last_error);
            }

            let index = status.credential_index;
            match self.attempt(primary, index, conversation, tools).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    warn!(
                        provider = %primary.label(),
                        credential = index,
                        error = %err,
                        "Primary credential failed"
                    );
                    let next = self.state.advance(index).await;
                    debug!(credential = next, "Rotated to next credential");
                    last_error = Some(err);
                }
            }
        }

        if self.state.mark_exhausted().await {
            error!(
                provider = %primary.label(),
                credentials = primary.credential_count(),
                "All primary credentials failed, switching to fallback for the rest of the process"
            );
        }

        Err(last_error)
    }

    async fn attempt(
        &self,
        provider: &dyn ChatProvider,
        credential: usize,
        conversation: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResult, ProviderError> {
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            self.attempt_timeout,
            provider.call(credential, conversation, tools),
        )
        .await
        .unwrap_or_else(|_| Err(ProviderError::timeout(self.attempt_timeout)));

        if result.is_ok() {
            info!(
                provider = %provider.label(),
                credential,
                latency_ms = started.elapsed().as_millis() as u64,
                "Provider answered"
            );
        }

        result
    }

    /// Clear exhaustion and rewind to the first credential
    pub async fn reset(&self) {
        self.state.reset().await;
        info!("Router state reset; primary provider re-enabled");
    }
}
