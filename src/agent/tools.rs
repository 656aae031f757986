//! Tool definitions for the survey insights agent.
//!
//! This module defines the tools the LLM can call to read the survey
//! dataset: a total count and the full list of normalized responses.

use crate::analysis::Aggregator;
use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Tool definition for Ollama's tool-calling API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool call made by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message),
        }
    }

    /// Content of the tool message sent back to the model.
    pub fn into_message_content(self) -> String {
        if self.success {
            self.output
        } else {
            format!("Error: {}", self.error.unwrap_or_default())
        }
    }
}

pub const COUNT_TOOL: &str = "count";
pub const GET_RESPONSES_TOOL: &str = "get_responses";

/// Executes tool calls against the survey dataset.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    dataset: Dataset,
    aggregator: Aggregator,
}

impl ToolExecutor {
    /// Create a tool executor over the given dataset.
    pub fn new(dataset: Dataset) -> Self {
        Self {
            aggregator: Aggregator::new(dataset.clone()),
            dataset,
        }
    }

    /// Execute a tool call and return the result.
    pub fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let name = &tool_call.function.name;
        let args = &tool_call.function.arguments;

        debug!("Executing tool: {} with args: {:?}", name, args);

        match name.as_str() {
            COUNT_TOOL => self.count(),
            GET_RESPONSES_TOOL => self.get_responses(args),
            _ => ToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    /// Total number of survey responses.
    fn count(&self) -> ToolResult {
        ToolResult::success(self.aggregator.total_count().to_string())
    }

    /// All normalized survey responses as a JSON array.
    fn get_responses(&self, args: &Value) -> ToolResult {
        if let Some(question) = args.get("question").and_then(|v| v.as_str()) {
            debug!("get_responses requested for question: {}", question);
        }

        match serde_json::to_string(self.dataset.records()) {
            Ok(json) => ToolResult::success(json),
            Err(e) => ToolResult::error(format!("Failed to serialize responses: {}", e)),
        }
    }
}

/// Get the tool definitions for the Ollama API.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: COUNT_TOOL.to_string(),
                description: "Get the total count of survey responses.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: GET_RESPONSES_TOOL.to_string(),
                description: "Get the list of survey responses. Each response has stress_source, overwhelmed_frequency, stress_management (comma-separated), mental_health_rating (1-10) and desired_support.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The target question"
                        }
                    },
                    "required": []
                }),
            },
        },
    ]
}
