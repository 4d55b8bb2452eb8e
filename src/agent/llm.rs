//! OpenAI-compatible chat-completion client.

use std::sync::Arc;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

const CHAT_ENDPOINT: &str = "/v1/chat/completions";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("LLM API error: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("LLM response had no message content")]
    EmptyResponse,
    #[error("LLM tool call arguments were not valid JSON: {0}")]
    InvalidToolArguments(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Function the model may ask to call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolSpec {
    fn to_request(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// What the model decided to do with a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    Finish(String),
    ToolCall { name: String, arguments: Value },
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    base_url: String,
    api_key: Arc<SecretString>,
}

impl LlmClient {
    pub fn new(http: Client, base_url: &str, api_key: Arc<SecretString>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Plain completion; returns the assistant's text.
    pub async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = json!({ "model": model, "messages": messages });
        let message = self.send(body).await?;
        message.content.ok_or(LlmError::EmptyResponse)
    }

    /// Completion with function calling. The first tool call wins.
    pub async fn complete_with_tools(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<AgentDecision, LlmError> {
        let tools: Vec<Value> = tools.iter().map(ToolSpec::to_request).collect();
        let body = json!({
            "model": model,
            "messages": messages,
            "tools": tools,
            "tool_choice": "auto",
        });
        let message = self.send(body).await?;

        if let Some(call) = message.tool_calls.into_iter().next() {
            let raw = if call.function.arguments.trim().is_empty() {
                "{}".to_string()
            } else {
                call.function.arguments
            };
            let arguments: Value = serde_json::from_str(&raw)
                .map_err(|e| LlmError::InvalidToolArguments(e.to_string()))?;
            debug!(tool = %call.function.name, "Model requested tool call");
            return Ok(AgentDecision::ToolCall {
                name: call.function.name,
                arguments,
            });
        }

        message
            .content
            .map(AgentDecision::Finish)
            .ok_or(LlmError::EmptyResponse)
    }

    async fn send(&self, body: Value) -> Result<ResponseMessage, LlmError> {
        let url = format!("{}{}", self.base_url, CHAT_ENDPOINT);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, "Chat completion request failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};

    fn client(prefix: &str) -> LlmClient {
        LlmClient::new(
            Client::new(),
            &format!("{}{}", mockito::server_url(), prefix),
            Arc::new(SecretString::new("sk-test".to_string())),
        )
    }

    #[tokio::test]
    async fn complete_returns_message_content() {
        let _m = mock("POST", "/llm-plain/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({ "model": "o4-mini" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
            .create();

        let text = client("/llm-plain")
            .complete("o4-mini", &[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn tool_call_arguments_are_parsed() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "kadena_transaction",
                            "arguments": "{\"endpoint\":\"quote\",\"chainId\":\"2\"}"
                        }
                    }]
                }
            }]
        });
        let _m = mock("POST", "/llm-tools/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create();

        let tool = ToolSpec {
            name: "kadena_transaction",
            description: "test",
            parameters: json!({ "type": "object" }),
        };
        let decision = client("/llm-tools")
            .complete_with_tools("o4-mini", &[ChatMessage::user("quote")], &[tool])
            .await
            .unwrap();
        assert_eq!(
            decision,
            AgentDecision::ToolCall {
                name: "kadena_transaction".into(),
                arguments: json!({ "endpoint": "quote", "chainId": "2" }),
            }
        );
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let _m = mock("POST", "/llm-error/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create();

        let err = client("/llm-error")
            .complete("o4-mini", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 429, .. }));
    }
}
