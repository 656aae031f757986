//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation.

use clap::Parser;
use std::path::PathBuf;

/// StudentPulse - ask questions about student academic-stress survey data
///
/// Without --ask, prints the dashboard summary (top stressors, average
/// mental-health rating, most common strategies) and answer distributions.
/// With --ask, a local LLM answers the question using the survey tools.
///
/// Examples:
///   studentpulse
///   studentpulse --format json --output dashboard.json
///   studentpulse --ask "What are the most common sources of academic stress?"
///   studentpulse --ask "How many students rated their mental health below 5?" --model qwen2.5:14b
///   studentpulse --data survey.json --skip-invalid
///   studentpulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Question to ask about the survey data
    #[arg(short, long, value_name = "QUESTION")]
    pub ask: Option<String>,

    /// JSON file with raw survey responses
    ///
    /// Defaults to the dataset embedded in the binary.
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Ollama model used to answer questions
    ///
    /// Can also be set via STUDENTPULSE_MODEL env var or .studentpulse.toml config.
    #[arg(short, long, env = "STUDENTPULSE_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Output file for the report (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .studentpulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of entries per ranking on the summary cards
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Omit the per-field distribution tables from the report
    #[arg(long)]
    pub no_tables: bool,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum model round trips per question
    ///
    /// Tool calls happen in every round trip but the last.
    #[arg(long, value_name = "STEPS")]
    pub max_steps: Option<usize>,

    /// Skip invalid survey responses instead of failing
    #[arg(long)]
    pub skip_invalid: bool,

    /// Wait for the complete answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .studentpulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref question) = self.ask {
            if question.trim().is_empty() {
                return Err("Please enter a question".to_string());
            }
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if self.max_steps == Some(0) {
            return Err("Max steps must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Dataset file does not exist: {}", data.display()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            ask: None,
            data: None,
            model: None,
            ollama_url: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            top: None,
            no_tables: false,
            temperature: None,
            timeout: None,
            max_steps: None,
            skip_invalid: false,
            no_stream: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "studentpulse",
            "--ask",
            "What support do students want?",
            "--format",
            "json",
            "--top",
            "5",
            "--no-stream",
        ])
        .unwrap();

        assert_eq!(args.ask.as_deref(), Some("What support do students want?"));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.top, Some(5));
        assert!(args.no_stream);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_question() {
        let mut args = make_args();
        args.ask = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.top = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_steps = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_data_file() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/nonexistent/responses.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }
}
