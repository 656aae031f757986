//! Report generation modules.

pub mod generator;

pub use generator::{build_report, generate_json_report, generate_markdown_report, ReportOptions};
