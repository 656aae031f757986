//! Data models for the survey dashboard.
//!
//! This module contains the raw and normalized survey records, the value
//! objects produced by aggregation, and the report structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single answer in a raw survey record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    /// Free-text or select answer.
    Text(String),
    /// Numeric answer (e.g. a rating).
    Number(f64),
    /// Anything else the source file contains (null, bool, nested values).
    Other(serde_json::Value),
}

impl RawAnswer {
    /// Short name of the answer's type, used in validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RawAnswer::Text(_) => "text",
            RawAnswer::Number(_) => "number",
            RawAnswer::Other(serde_json::Value::Null) => "null",
            RawAnswer::Other(serde_json::Value::Bool(_)) => "boolean",
            RawAnswer::Other(serde_json::Value::Array(_)) => "array",
            RawAnswer::Other(_) => "object",
        }
    }
}

impl From<&str> for RawAnswer {
    fn from(s: &str) -> Self {
        RawAnswer::Text(s.to_string())
    }
}

impl From<f64> for RawAnswer {
    fn from(n: f64) -> Self {
        RawAnswer::Number(n)
    }
}

/// An unvalidated survey answer set keyed by full question text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawResponse(BTreeMap<String, RawAnswer>);

impl RawResponse {
    /// Look up the answer to a question.
    pub fn get(&self, question: &str) -> Option<&RawAnswer> {
        self.0.get(question)
    }

    /// Builder used by tests and fixtures.
    #[cfg(test)]
    pub fn with(mut self, question: &str, answer: impl Into<RawAnswer>) -> Self {
        self.0.insert(question.to_string(), answer.into());
        self
    }
}

/// A validated record in the canonical five-field schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    /// Main sources of academic stress (free text).
    pub stress_source: String,
    /// How often the student feels overwhelmed.
    pub overwhelmed_frequency: String,
    /// Comma-joined list of stress-management strategies.
    pub stress_management: String,
    /// Self-rated mental health, 1 to 10.
    pub mental_health_rating: u8,
    /// Support services the student would like.
    pub desired_support: String,
}

/// A label with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedValue {
    pub label: String,
    pub count: usize,
}

/// A label with its count and share of the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyBucket {
    pub label: String,
    /// Category slug, for stress-source buckets.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<String>,
    pub count: usize,
    /// Share of the total, formatted like `"25.0%"`.
    pub percentage: String,
}

/// Stressor entry on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressorCount {
    pub source: String,
    pub count: usize,
}

/// Strategy entry on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyCount {
    pub strategy: String,
    pub count: usize,
}

/// The three dashboard summary cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub top_stressors: Vec<StressorCount>,
    pub avg_mental_health: f64,
    pub common_strategies: Vec<StrategyCount>,
}

/// Frequency distribution of one survey field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyTable {
    /// Display title of the field.
    pub field: String,
    pub buckets: Vec<FrequencyBucket>,
}

/// Where the dataset was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum DatasetSource {
    /// The dataset compiled into the binary.
    Embedded,
    /// A JSON file on disk.
    File(String),
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Embedded => write!(f, "embedded survey dataset"),
            DatasetSource::File(path) => write!(f, "{}", path),
        }
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Origin of the dataset.
    pub dataset_source: DatasetSource,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of records that passed validation.
    pub records: usize,
    /// Number of records rejected by lenient normalization.
    pub rejected: usize,
    /// Number of entries shown per ranking.
    pub top_n: usize,
}

/// The complete dashboard report.
///
/// Keys are camelCase throughout, matching the dashboard summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: DashboardSummary,
    /// Students who rated their mental health below 5.
    pub low_ratings: usize,
    /// Full distributions per field (empty when disabled).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub frequency_tables: Vec<FrequencyTable>,
}
