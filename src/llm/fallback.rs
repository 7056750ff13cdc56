use super::provider::{ChatProvider, ProviderError, ProviderErrorKind};
use super::{ChatMessage, ChatResult, Role, ToolSchema};
use crate::config::FallbackProviderConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u16,
    temperature: f64,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: String,
}

/// Single-credential text-generation provider.
///
/// The endpoint only accepts a flat prompt, so the conversation is rendered
/// as a role-prefixed transcript and tool schemas are never sent.
pub struct FallbackProvider {
    http: reqwest::Client,
    config: FallbackProviderConfig,
}

impl FallbackProvider {
    pub fn new(config: &FallbackProviderConfig, request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// Render a conversation as a transcript ending in an open assistant turn
pub fn format_transcript(conversation: &[ChatMessage]) -> String {
    let mut formatted: Vec<String> = conversation
        .iter()
        .map(|msg| {
            let prefix = match msg.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::Tool => "Tool",
            };
            format!("{}: {}", prefix, msg.content)
        })
        .collect();

    formatted.push("Assistant:".to_string());
    formatted.join("\n\n")
}

#[async_trait]
impl ChatProvider for FallbackProvider {
    fn label(&self) -> &str {
        &self.config.name
    }

    async fn call(
        &self,
        _credential: usize,
        conversation: &[ChatMessage],
        _tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResult, ProviderError> {
        let prompt = format_transcript(conversation);
        let body = GenerationRequest {
            inputs: &prompt,
            parameters: GenerationParameters {
                max_new_tokens: self.config.max_new_tokens,
                temperature: self.config.temperature,
                return_full_text: false,
            },
        };

        let mut req = self.http.post(self.endpoint()).json(&body);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }

        tracing::debug!(provider = %self.config.name, model = %self.config.model, "Sending text generation request");

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                ProviderErrorKind::BadStatus,
                format!("status={} body={}", status, text),
            ));
        }

        let raw: serde_json::Value = resp.json().await?;
        let generated: Vec<GeneratedText> = serde_json::from_value(raw.clone()).map_err(|_| {
            ProviderError::new(
                ProviderErrorKind::MalformedBody,
                format!("unexpected response: {}", raw),
            )
        })?;

        let first = generated.into_iter().next().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::MalformedBody, "empty generation list")
        })?;

        Ok(ChatResult {
            content: first.generated_text,
            tool_calls: Vec::new(),
            model_label: self.config.name.clone(),
            finish_reason: "stop".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_format() {
        let conversation = vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("What's 2+2?"),
        ];

        assert_eq!(
            format_transcript(&conversation),
            "System: Be brief.\n\nUser: Hi\n\nAssistant: Hello!\n\nUser: What's 2+2?\n\nAssistant:"
        );
    }

    #[test]
    fn test_transcript_includes_tool_output() {
        let conversation = vec![
            ChatMessage::user("time?"),
            ChatMessage::tool("call_1", r#"{"result":"2024-01-01 00:00:00"}"#),
        ];
        let transcript = format_transcript(&conversation);
        assert!(transcript.contains("Tool: {\"result\":\"2024-01-01 00:00:00\"}"));
        assert!(transcript.ends_with("\n\nAssistant:"));
    }

    #[test]
    fn test_empty_conversation_is_open_turn() {
        assert_eq!(format_transcript(&[]), "Assistant:");
    }

    #[test]
    fn test_endpoint_joins_model_path() {
        let config = FallbackProviderConfig {
            base_url: "http://localhost:9000/".to_string(),
            model: "org/model".to_string(),
            ..Default::default()
        };
        let provider = FallbackProvider::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9000/models/org/model");
        assert_eq!(provider.credential_count(), 1);
    }
}
