use super::{ChatMessage, ChatResult, ToolSchema};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Connection could not be established or was dropped
    Network,
    /// The attempt exceeded its deadline
    Timeout,
    /// Provider answered with a non-2xx status
    BadStatus,
    /// Response body could not be decoded into a chat result
    MalformedBody,
    /// Response contained something the canonical model cannot carry
    UnsupportedResponse,
    /// The outgoing request could not be built
    Request,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::BadStatus => "bad status",
            Self::MalformedBody => "malformed body",
            Self::UnsupportedResponse => "unsupported response",
            Self::Request => "request",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            ProviderErrorKind::Timeout,
            format!("no response within {}s", after.as_secs()),
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else if err.is_decode() {
            ProviderErrorKind::MalformedBody
        } else if err.is_status() {
            ProviderErrorKind::BadStatus
        } else if err.is_builder() {
            ProviderErrorKind::Request
        } else {
            ProviderErrorKind::Network
        };
        Self::new(kind, err.to_string())
    }
}

/// Uniform capability over heterogeneous LLM backends.
///
/// An implementation performs exactly one attempt per `call`; it never
/// retries or rotates. `credential` selects which configured key to use and
/// is always below `credential_count()`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Label recorded in `ChatResult::model_label`
    fn label(&self) -> &str;

    fn credential_count(&self) -> usize {
        1
    }

    async fn call(
        &self,
        credential: usize,
        conversation: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResult, ProviderError>;
}
