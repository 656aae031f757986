//! StudentPulse - AI-powered insights into student academic stress
//!
//! A CLI tool that summarizes a survey of university students on academic
//! stress and mental health, and answers natural-language questions about
//! it through an Ollama model with tool-calling.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid data, connection, config, etc.)

mod agent;
mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;

use analysis::Aggregator;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use dataset::LoadedDataset;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Logging is configured from the merged settings
    let config = match prepare_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_level(args.quiet));

    info!("StudentPulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(args, config).await {
        error!("Failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .studentpulse.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, dataset, and report.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the config file, apply the flags and check the result.
fn prepare_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load the dataset, then either answer the question or write the report.
async fn run(args: Args, config: Config) -> Result<()> {
    let loaded = dataset::load(
        config.dataset.path.as_deref().map(Path::new),
        config.dataset.skip_invalid,
    )?;

    if !loaded.rejected.is_empty() {
        warn!(
            "{} responses failed validation and were skipped",
            loaded.rejected.len()
        );
    }

    match args.ask {
        Some(ref question) => ask(question, &config, loaded, args.quiet).await,
        None => write_report(&config, loaded, args.format),
    }
}

/// Answer a question with the LLM agent and print the answer.
async fn ask(question: &str, config: &Config, loaded: LoadedDataset, quiet: bool) -> Result<()> {
    let agent_config = agent::AgentConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        max_steps: config.model.max_steps,
        timeout_seconds: config.model.timeout_seconds,
        stream: config.model.stream,
        system_prompt: config.model.system_prompt.clone(),
    };

    let mut agent = agent::InsightAgent::new(agent_config, loaded.dataset)?;

    let spinner = if quiet {
        None
    } else {
        Some(thinking_spinner(&config.model.name))
    };

    let mut stdout = std::io::stdout();
    let mut spinner_active = spinner.is_some();
    let answer = agent
        .ask(question, |chunk| {
            if spinner_active {
                if let Some(ref pb) = spinner {
                    pb.finish_and_clear();
                }
                spinner_active = false;
            }
            let _ = stdout.write_all(chunk.as_bytes());
            let _ = stdout.flush();
        })
        .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let answer = answer?;
    println!();
    debug!(
        "Answer has {} characters after {} messages",
        answer.len(),
        agent.messages().len()
    );

    Ok(())
}

fn thinking_spinner(model: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(format!("🤖 {} is analyzing the survey...", model));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Build the dashboard report and write it to the output file or stdout.
fn write_report(config: &Config, loaded: LoadedDataset, format: OutputFormat) -> Result<()> {
    let aggregator = Aggregator::new(loaded.dataset);

    let report = report::build_report(
        &aggregator,
        report::ReportOptions {
            dataset_source: loaded.source,
            rejected: loaded.rejected.len(),
            top_n: config.report.top_n,
            include_frequency_tables: config.report.include_frequency_tables,
        },
    )
    .context("Failed to summarize survey data")?;

    let output = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report saved to: {}", path);
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Runs before logging is set up, so problems go straight to stderr.
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
