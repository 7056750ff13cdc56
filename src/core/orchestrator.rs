use crate::llm::{ChatMessage, ChatResult, LlmRouter, RouterError, ToolCall};
use crate::tools::{ToolError, ToolOutcome, ToolRegistry, ToolResult};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("initial completion failed: {0}")]
    InitialCompletion(#[source] RouterError),

    #[error("completion after tool execution failed: {0}")]
    FinalCompletion(#[source] RouterError),
}

impl OrchestrationError {
    pub fn router_error(&self) -> &RouterError {
        match self {
            Self::InitialCompletion(e) | Self::FinalCompletion(e) => e,
        }
    }
}

/// Drives one chat request: a completion, at most one round of tool
/// execution, and a second completion over the tool results.
#[derive(Clone)]
pub struct ChatOrchestrator {
    router: Arc<LlmRouter>,
    tools: ToolRegistry,
}

impl ChatOrchestrator {
    pub fn new(router: Arc<LlmRouter>, tools: ToolRegistry) -> Self {
        Self { router, tools }
    }

    pub fn router(&self) -> &Arc<LlmRouter> {
        &self.router
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `conversation`, appending tool traffic to it when the model
    /// requests tools. Appended messages are kept even if a later step fails.
    pub async fn handle(
        &self,
        conversation: &mut Vec<ChatMessage>,
        use_tools: bool,
    ) -> Result<ChatResult, OrchestrationError> {
        let tools = use_tools.then(|| self.tools.list_tools());

        let response = self
            .router
            .chat(conversation, tools.as_deref())
            .await
            .map_err(OrchestrationError::InitialCompletion)?;

        if !response.has_tool_calls() {
            return Ok(response);
        }

        info!(
            count = response.tool_calls.len(),
            provider = %response.model_label,
            "Model requested tool calls"
        );

        let results = self.execute_tool_calls(&response.tool_calls).await;

        conversation.push(ChatMessage::assistant_with_tool_calls(
            response.content,
            response.tool_calls,
        ));
        conversation.extend(results.iter().map(ToolResult::to_message));

        let final_response = self
            .router
            .chat(conversation, tools.as_deref())
            .await
            .map_err(OrchestrationError::FinalCompletion)?;

        debug!(provider = %final_response.model_label, "Final response generated");
        Ok(final_response)
    }

    /// Execute calls concurrently; results keep the order of `calls`
    pub async fn execute_tool_calls(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.execute_tool_call(call))).await
    }

    async fn execute_tool_call(&self, call: &ToolCall) -> ToolResult {
        let outcome = match parse_arguments(&call.arguments) {
            Ok(arguments) => self.tools.execute(&call.name, &arguments).await.into(),
            Err(err) => ToolOutcome::Failure {
                error: err.to_string(),
            },
        };
        ToolResult::new(call.id.clone(), outcome)
    }
}

fn parse_arguments(raw: &str) -> Result<Map<String, Value>, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(ToolError::InvalidInput(format!(
            "arguments must be a JSON object, got {}",
            other
        ))),
        Err(e) => Err(ToolError::InvalidInput(format!(
            "arguments are not valid JSON: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatProvider, ProviderError, ProviderErrorKind, Role, ToolSchema};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Requests tools on the first turn, then echoes the tool messages it saw
    struct ToolHappyProvider {
        calls: Vec<ToolCall>,
        seen_tools: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ChatProvider for ToolHappyProvider {
        fn label(&self) -> &str {
            "scripted"
        }

        async fn call(
            &self,
            _credential: usize,
            conversation: &[ChatMessage],
            tools: Option<&[ToolSchema]>,
        ) -> Result<ChatResult, ProviderError> {
            self.seen_tools
                .lock()
                .unwrap()
                .push(tools.map_or(0, |t| t.len()));

            let tool_outputs: Vec<&str> = conversation
                .iter()
                .filter(|m| m.role == Role::Tool)
                .map(|m| m.content.as_str())
                .collect();

            if tool_outputs.is_empty() {
                Ok(ChatResult {
                    content: String::new(),
                    tool_calls: self.calls.clone(),
                    model_label: "scripted".to_string(),
                    finish_reason: "tool_calls".to_string(),
                })
            } else {
                Ok(ChatResult {
                    content: tool_outputs.join(" | "),
                    tool_calls: vec![],
                    model_label: "scripted".to_string(),
                    finish_reason: "stop".to_string(),
                })
            }
        }
    }

    struct DownProvider;

    #[async_trait]
    impl ChatProvider for DownProvider {
        fn label(&self) -> &str {
            "down"
        }

        async fn call(
            &self,
            _credential: usize,
            _conversation: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ChatResult, ProviderError> {
            Err(ProviderError::new(ProviderErrorKind::BadStatus, "HTTP 503"))
        }
    }

    /// Requests a tool on the first turn, then goes down
    struct FailsAfterToolsProvider;

    #[async_trait]
    impl ChatProvider for FailsAfterToolsProvider {
        fn label(&self) -> &str {
            "flaky"
        }

        async fn call(
            &self,
            _credential: usize,
            conversation: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ChatResult, ProviderError> {
            if conversation.iter().any(|m| m.role == Role::Tool) {
                return Err(ProviderError::new(ProviderErrorKind::Network, "connection reset"));
            }
            Ok(ChatResult {
                content: String::new(),
                tool_calls: vec![call("call_1", "calculate", r#"{"expression":"10*5"}"#)],
                model_label: "flaky".to_string(),
                finish_reason: "tool_calls".to_string(),
            })
        }
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn orchestrator(provider: Arc<dyn ChatProvider>) -> ChatOrchestrator {
        let router = LlmRouter::new(Some(provider), None, Duration::from_secs(5));
        ChatOrchestrator::new(Arc::new(router), ToolRegistry::builtin())
    }

    #[tokio::test]
    async fn test_tool_results_follow_call_order() {
        let provider = Arc::new(ToolHappyProvider {
            calls: vec![
                call("call_1", "calculate", r#"{"expression":"10*5"}"#),
                call("call_2", "reverse_string", r#"{"text":"abc"}"#),
            ],
            seen_tools: Mutex::new(vec![]),
        });
        let orchestrator = orchestrator(provider.clone());

        let mut conversation = vec![ChatMessage::user("What's 10*5?")];
        let result = orchestrator.handle(&mut conversation, true).await.unwrap();

        assert_eq!(
            result.content,
            r#"{"result":"10*5 = 50"} | {"result":"cba"}"#
        );
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation[1].role, Role::Assistant);
        assert_eq!(conversation[1].tool_calls.len(), 2);
        assert_eq!(conversation[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(conversation[3].tool_call_id.as_deref(), Some("call_2"));

        // Both passes were offered the full catalog
        assert_eq!(*provider.seen_tools.lock().unwrap(), vec![5, 5]);
    }

    #[tokio::test]
    async fn test_tool_errors_are_fed_back() {
        let provider = Arc::new(ToolHappyProvider {
            calls: vec![
                call("a", "calculate", r#"{"expression":"2; import os"}"#),
                call("b", "launch_rockets", "{}"),
                call("c", "count_words", "not json"),
            ],
            seen_tools: Mutex::new(vec![]),
        });
        let orchestrator = orchestrator(provider);

        let mut conversation = vec![ChatMessage::user("do things")];
        orchestrator.handle(&mut conversation, true).await.unwrap();

        let outputs: Vec<Value> = conversation[2..]
            .iter()
            .map(|m| serde_json::from_str(&m.content).unwrap())
            .collect();
        assert!(outputs[0]["error"].as_str().unwrap().starts_with("Invalid input"));
        assert_eq!(outputs[1]["error"], "Unknown tool: launch_rockets");
        assert!(outputs[2]["error"].as_str().unwrap().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_without_tools_no_catalog_is_sent() {
        let provider = Arc::new(ToolHappyProvider {
            calls: vec![],
            seen_tools: Mutex::new(vec![]),
        });
        let orchestrator = orchestrator(provider.clone());

        let mut conversation = vec![ChatMessage::user("hi")];
        orchestrator.handle(&mut conversation, false).await.unwrap();

        assert_eq!(conversation.len(), 1);
        assert_eq!(*provider.seen_tools.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_router_failure_is_initial_phase() {
        let orchestrator = orchestrator(Arc::new(DownProvider));
        let mut conversation = vec![ChatMessage::user("hi")];

        let err = orchestrator.handle(&mut conversation, true).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InitialCompletion(_)));
        assert!(matches!(
            err.router_error(),
            RouterError::AllProvidersFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_router_failure_after_tools_is_final_phase() {
        let orchestrator = orchestrator(Arc::new(FailsAfterToolsProvider));
        let mut conversation = vec![ChatMessage::user("What's 10*5?")];

        let err = orchestrator.handle(&mut conversation, true).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::FinalCompletion(RouterError::AllProvidersFailed { .. })
        ));

        // Tool traffic appended before the failure is kept
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation[2].content, r#"{"result":"10*5 = 50"}"#);
        assert!(orchestrator.router().state().snapshot().await.primary_exhausted);
    }

    #[test]
    fn test_parse_arguments() {
        assert!(parse_arguments("").unwrap().is_empty());
        assert!(parse_arguments("null").unwrap().is_empty());
        assert_eq!(parse_arguments(r#"{"text":"x"}"#).unwrap()["text"], "x");
        assert!(parse_arguments("[1,2]").is_err());
    }
}
