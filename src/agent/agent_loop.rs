//! Agent loop for answering questions about the survey.
//!
//! The question is sent to an Ollama-compatible chat endpoint together with
//! the survey tools. Tool calls are executed locally and fed back to the
//! model for up to `max_steps` round trips; the last round trip is made
//! without tools so the model has to answer, and can be streamed.

use crate::agent::tools::{get_tool_definitions, ToolCall, ToolExecutor};
use crate::dataset::Dataset;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about a survey of university students on academic stress and mental health. Use the `count` and `get_responses` tools to look at the survey data before answering, and base your answer only on that data.";

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    /// Maximum model round trips per question.
    pub max_steps: usize,
    pub timeout_seconds: u64,
    /// Stream the final answer as it is generated.
    pub stream: bool,
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.2,
            max_steps: 2,
            timeout_seconds: 300,
            stream: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: None,
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// One line of a streamed Ollama response.
#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// The survey question-answering agent.
pub struct InsightAgent {
    config: AgentConfig,
    http_client: reqwest::Client,
    tool_executor: ToolExecutor,
    messages: Vec<ChatMessage>,
}

impl InsightAgent {
    /// Create a new agent over the given dataset.
    pub fn new(config: AgentConfig, dataset: Dataset) -> Result<Self> {
        info!(
            "Initializing agent with model {} over {} responses",
            config.model_name,
            dataset.len()
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
            tool_executor: ToolExecutor::new(dataset),
            messages: Vec::new(),
        })
    }

    /// Conversation so far.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Answer a question. Answer text is passed to `on_chunk` as it arrives
    /// and the full answer is returned.
    pub async fn ask<F>(&mut self, question: &str, mut on_chunk: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        self.start_conversation(question);

        let max_steps = self.config.max_steps.max(1);
        for step in 1..max_steps {
            debug!("Agent step {} of {}", step, max_steps);

            let response = self.chat(true).await?;
            match response.tool_calls {
                Some(tool_calls) if !tool_calls.is_empty() => self.run_tools(&tool_calls),
                _ => {
                    on_chunk(&response.content);
                    return Ok(response.content);
                }
            }
        }

        debug!("Agent step {} of {} (final)", max_steps, max_steps);
        if self.config.stream {
            self.chat_streaming(&mut on_chunk).await
        } else {
            let response = self.chat(false).await?;
            on_chunk(&response.content);
            Ok(response.content)
        }
    }

    fn start_conversation(&mut self, question: &str) {
        self.messages.clear();
        self.messages
            .push(ChatMessage::new("system", self.config.system_prompt.clone()));
        self.messages.push(ChatMessage::new("user", question));
    }

    fn run_tools(&mut self, tool_calls: &[ToolCall]) {
        for tool_call in tool_calls {
            let result = self.tool_executor.execute(tool_call);
            if !result.success {
                warn!(
                    "Tool {} failed: {}",
                    tool_call.function.name,
                    result.error.as_deref().unwrap_or_default()
                );
            }

            self.messages
                .push(ChatMessage::new("tool", result.into_message_content()));
            info!("Tool {} executed", tool_call.function.name);
        }
    }

    fn request(&self, with_tools: bool, stream: bool) -> Result<reqwest::RequestBuilder> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let tools = if with_tools {
            get_tool_definitions()
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to encode tool definitions")?
        } else {
            Vec::new()
        };

        let request = OllamaChatRequest {
            model: &self.config.model_name,
            messages: &self.messages,
            tools,
            stream,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!(
            "Sending chat request with {} messages (tools: {}, stream: {})",
            self.messages.len(),
            with_tools,
            stream
        );

        Ok(self.http_client.post(&url).json(&request))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!(
                    "Request timed out after {}s. Try a smaller model or a longer --timeout.",
                    self.config.timeout_seconds
                )
            } else if e.is_connect() {
                anyhow::anyhow!(
                    "Cannot connect to Ollama at {}. Is Ollama running?",
                    self.config.ollama_url
                )
            } else {
                anyhow::anyhow!("Failed to send request: {}", e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error {}: {}", status, body));
        }

        Ok(response)
    }

    /// Send a non-streamed chat request.
    async fn chat(&mut self, with_tools: bool) -> Result<ResponseMessage> {
        let request = self.request(with_tools, false)?;
        let response = self.send(request).await?;

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        self.messages.push(ChatMessage {
            role: "assistant".to_string(),
            content: chat_response.message.content.clone(),
            tool_calls: chat_response.message.tool_calls.clone(),
        });

        Ok(chat_response.message)
    }

    /// Send a streamed chat request without tools and forward the answer.
    async fn chat_streaming<F>(&mut self, on_chunk: &mut F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let request = self.request(false, true)?;
        let response = self.send(request).await?;

        let mut answer = String::new();
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = Box::pin(response.bytes_stream());
        let mut done = false;

        while !done {
            let Some(bytes) = stream.next().await else {
                break;
            };
            let bytes = bytes.context("Failed to read Ollama stream")?;
            buffer.extend_from_slice(&bytes);

            for line in drain_lines(&mut buffer) {
                if apply_stream_line(&line, &mut answer, on_chunk)? {
                    done = true;
                    break;
                }
            }
        }

        if !done {
            let rest = String::from_utf8_lossy(&buffer).into_owned();
            apply_stream_line(&rest, &mut answer, on_chunk)?;
        }

        self.messages.push(ChatMessage::new("assistant", answer.clone()));
        Ok(answer)
    }
}

/// Remove every complete line from `buffer`, leaving a trailing partial line.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let Some(last_newline) = buffer.iter().rposition(|&b| b == b'\n') else {
        return Vec::new();
    };

    let complete: Vec<u8> = buffer.drain(..=last_newline).collect();
    complete
        .split(|&b| b == b'\n')
        .map(|line| String::from_utf8_lossy(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Apply one NDJSON line to the answer. Returns whether the stream is done.
fn apply_stream_line<F>(line: &str, answer: &mut String, on_chunk: &mut F) -> Result<bool>
where
    F: FnMut(&str),
{
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }

    let chunk: OllamaStreamChunk =
        serde_json::from_str(line).context("Failed to parse Ollama stream chunk")?;

    if let Some(error) = chunk.error {
        return Err(anyhow::anyhow!("Ollama stream error: {}", error));
    }

    if let Some(message) = chunk.message {
        if !message.content.is_empty() {
            on_chunk(&message.content);
            answer.push_str(&message.content);
        }
    }

    Ok(chunk.done)
}
