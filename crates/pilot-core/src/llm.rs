use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::agent::wire::{ContentBlock, Message, TokenUsage};

/// Whether the model must, may, or must not call tools this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Mandatory,
    Auto,
    None,
}

/// One complete request to the remote model: the window snapshot, the
/// serialized tool catalog, and the policy flags.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<Value>,
    pub tool_choice: ToolChoice,
    pub allow_parallel: bool,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ModelReply {
    pub content: Vec<ContentBlock>,
    pub usage: TokenUsage,
}

pub trait ModelClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ModelReply>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL, e.g. `https://api.anthropic.com`.
    pub base_url: String,
}

impl AnthropicConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    /// Reads `ANTHROPIC_API_KEY` from the environment. A missing key is a
    /// configuration error and aborts before any session begins.
    pub fn from_env(model: impl Into<String>) -> anyhow::Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .context("ANTHROPIC_API_KEY environment variable is required")?;
        Ok(Self {
            api_key,
            model: model.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }
}

/// Messages API client.
pub struct AnthropicClient {
    config: AnthropicConfig,
    http: Client,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [Value],
    tool_choice: Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: UsageBody,
}

#[derive(Deserialize, Default)]
struct UsageBody {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

fn tool_choice_body(choice: ToolChoice, allow_parallel: bool) -> Value {
    match choice {
        ToolChoice::None => json!({ "type": "none" }),
        ToolChoice::Auto => json!({
            "type": "auto",
            "disable_parallel_tool_use": !allow_parallel,
        }),
        ToolChoice::Mandatory => json!({
            "type": "any",
            "disable_parallel_tool_use": !allow_parallel,
        }),
    }
}

impl ModelClient for AnthropicClient {
    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ModelReply>> + Send + 'a>> {
        Box::pin(async move {
            let body = MessagesRequest {
                model: &self.config.model,
                max_tokens: request.max_tokens,
                system: &request.system,
                messages: &request.messages,
                tools: &request.tools,
                tool_choice: tool_choice_body(request.tool_choice, request.allow_parallel),
            };

            debug!(
                model = %self.config.model,
                messages = request.messages.len(),
                tools = request.tools.len(),
                "calling remote model"
            );

            let response = self
                .http
                .post(format!("{}/v1/messages", self.config.base_url))
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&body)
                .send()
                .await
                .context("model request failed")?
                .error_for_status()
                .context("model returned non-2xx response")?
                .json::<MessagesResponse>()
                .await
                .context("model response decode failed")?;

            Ok(ModelReply {
                content: response.content,
                usage: TokenUsage {
                    input_tokens: response.usage.input_tokens,
                    output_tokens: response.usage.output_tokens,
                },
            })
        })
    }
}
