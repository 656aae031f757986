//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.studentpulse.toml` files.

use crate::agent::agent_loop::DEFAULT_SYSTEM_PROMPT;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".studentpulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file for the report. Printed to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum model round trips per question.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Stream the final answer to the terminal.
    #[serde(default = "default_true")]
    pub stream: bool,

    /// System prompt sent before the question.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            max_steps: default_max_steps(),
            stream: true,
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    300
}

fn default_max_steps() -> usize {
    2
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// Dataset settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// JSON file with raw survey responses. The embedded dataset is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Drop invalid responses instead of failing the whole load.
    #[serde(default)]
    pub skip_invalid: bool,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Entries per ranking on the summary cards.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Include the full per-field distribution tables.
    #[serde(default = "default_true")]
    pub include_frequency_tables: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            include_frequency_tables: true,
        }
    }
}

fn default_top_n() -> usize {
    crate::analysis::SUMMARY_TOP_N
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.studentpulse.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided CLI values override the config.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(max_steps) = args.max_steps {
            self.model.max_steps = max_steps;
        }
        if args.no_stream {
            self.model.stream = false;
        }

        if let Some(ref data) = args.data {
            self.dataset.path = Some(data.display().to_string());
        }
        if args.skip_invalid {
            self.dataset.skip_invalid = true;
        }

        if let Some(top) = args.top {
            self.report.top_n = top;
        }
        if args.no_tables {
            self.report.include_frequency_tables = false;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Range checks on the merged settings, same limits as the flags.
    pub fn validate(&self) -> Result<()> {
        let url = &self.model.ollama_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("Ollama URL must start with 'http://' or 'https://': {}", url);
        }
        if !(0.0..=1.0).contains(&self.model.temperature) {
            bail!(
                "Temperature must be between 0.0 and 1.0, got {}",
                self.model.temperature
            );
        }
        if self.model.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if self.model.max_steps == 0 {
            bail!("Max steps must be at least 1");
        }
        if self.report.top_n == 0 {
            bail!("Top must be at least 1");
        }
        if self.model.name.trim().is_empty() {
            bail!("Model name must not be empty");
        }
        Ok(())
    }

    /// Log level from the merged settings. `quiet` wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
