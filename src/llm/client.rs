use super::provider::{ChatProvider, ProviderError, ProviderErrorKind};
use super::{ChatMessage, ChatResult, Role, ToolCall, ToolSchema};
use crate::config::PrimaryProviderConfig;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs,
    },
    Client as OpenAIClient,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// OpenAI-compatible chat-completions provider holding one client per API key
#[derive(Clone)]
pub struct PrimaryProvider {
    clients: Vec<OpenAIClient<OpenAIConfig>>,
    config: PrimaryProviderConfig,
}

impl PrimaryProvider {
    pub fn new(config: &PrimaryProviderConfig) -> Self {
        let clients = config
            .api_keys
            .iter()
            .map(|key| {
                let openai_config = OpenAIConfig::new()
                    .with_api_base(&config.base_url)
                    .with_api_key(key);
                OpenAIClient::with_config(openai_config).with_backoff(no_retry())
            })
            .collect();

        Self {
            clients,
            config: config.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn convert_message(&self, msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        match msg.role {
            Role::System => Ok(ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.clone())
                .build()?
                .into()),
            Role::User => Ok(ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.clone())
                .build()?
                .into()),
            Role::Assistant => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                if !msg.content.is_empty() || msg.tool_calls.is_empty() {
                    builder.content(msg.content.clone());
                }
                if !msg.tool_calls.is_empty() {
                    builder.tool_calls(
                        msg.tool_calls
                            .iter()
                            .map(|call| ChatCompletionMessageToolCall {
                                id: call.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.name.clone(),
                                    arguments: call.arguments.clone(),
                                },
                            })
                            .collect::<Vec<_>>(),
                    );
                }
                Ok(builder.build()?.into())
            }
            Role::Tool => Ok(ChatCompletionRequestToolMessageArgs::default()
                .content(msg.content.clone())
                .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
                .build()?
                .into()),
        }
    }

    fn convert_tool(&self, schema: &ToolSchema) -> Result<ChatCompletionTool, OpenAIError> {
        ChatCompletionToolArgs::default()
            .r#type(ChatCompletionToolType::Function)
            .function(
                FunctionObjectArgs::default()
                    .name(schema.name.clone())
                    .description(schema.description.clone())
                    .parameters(schema.parameters.clone())
                    .build()?,
            )
            .build()
    }
}

#[async_trait]
impl ChatProvider for PrimaryProvider {
    fn label(&self) -> &str {
        &self.config.name
    }

    fn credential_count(&self) -> usize {
        self.clients.len()
    }

    async fn call(
        &self,
        credential: usize,
        conversation: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResult, ProviderError> {
        let client = self.clients.get(credential).ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::Request,
                format!("no credential at index {}", credential),
            )
        })?;

        let messages = conversation
            .iter()
            .map(|msg| self.convert_message(msg))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_openai_error)?;

        let mut req_builder = CreateChatCompletionRequestArgs::default();
        req_builder
            .model(&self.config.model)
            .messages(messages)
            .temperature(self.config.temperature as f32)
            .max_tokens(self.config.max_tokens);

        let offered_tools = tools.filter(|t| !t.is_empty());
        if let Some(tools) = offered_tools {
            let tools = tools
                .iter()
                .map(|t| self.convert_tool(t))
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_openai_error)?;
            req_builder.tools(tools);
        }

        let req = req_builder.build().map_err(map_openai_error)?;

        tracing::debug!(
            provider = %self.config.name,
            model = %self.config.model,
            credential,
            messages = conversation.len(),
            "Sending chat completion request"
        );

        let response = client
            .chat()
            .create(req)
            .await
            .map_err(map_openai_error)?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::MalformedBody,
                "No choices in chat completion response",
            )
        })?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        if !tool_calls.is_empty() && offered_tools.is_none() {
            return Err(ProviderError::new(
                ProviderErrorKind::UnsupportedResponse,
                format!("{} tool call(s) returned but no tools were offered", tool_calls.len()),
            ));
        }

        let finish_reason = choice
            .finish_reason
            .and_then(|r| serde_json::to_value(r).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "stop".to_string());

        Ok(ChatResult {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model_label: self.config.name.clone(),
            finish_reason,
        })
    }
}

/// Backoff policy that gives up on the first transient error, so a
/// rate-limited key fails straight back to the router.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

fn map_openai_error(err: OpenAIError) -> ProviderError {
    match err {
        OpenAIError::Reqwest(e) => e.into(),
        OpenAIError::ApiError(e) => ProviderError::new(ProviderErrorKind::BadStatus, e.message),
        OpenAIError::JSONDeserialize(e) => {
            ProviderError::new(ProviderErrorKind::MalformedBody, e.to_string())
        }
        OpenAIError::InvalidArgument(msg) => ProviderError::new(ProviderErrorKind::Request, msg),
        other => ProviderError::new(ProviderErrorKind::Network, other.to_string()),
    }
}
