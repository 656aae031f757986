//! Dashboard report generation.
//!
//! This module builds the dashboard report from the aggregator and renders
//! it as Markdown or JSON.

use crate::analysis::{Aggregator, Field, NumericField};
use crate::error::InsightError;
use crate::models::{DashboardSummary, FrequencyTable, Report, ReportMetadata};
use anyhow::Result;
use chrono::Utc;

/// Ratings strictly below this count as low.
pub const LOW_RATING_THRESHOLD: f64 = 5.0;

/// Inputs describing how the report was produced.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub dataset_source: crate::models::DatasetSource,
    pub rejected: usize,
    pub top_n: usize,
    pub include_frequency_tables: bool,
}

/// Build the dashboard report.
pub fn build_report(aggregator: &Aggregator, options: ReportOptions) -> Result<Report, InsightError> {
    let summary = aggregator.summarize_top(options.top_n)?;
    let low_ratings = aggregator.count_where(NumericField::MentalHealthRating, |r| {
        r < LOW_RATING_THRESHOLD
    });

    let frequency_tables = if options.include_frequency_tables {
        Field::ALL
            .iter()
            .map(|field| {
                Ok(FrequencyTable {
                    field: field.title().to_string(),
                    buckets: aggregator.frequency_table(*field)?,
                })
            })
            .collect::<Result<Vec<_>, InsightError>>()?
    } else {
        Vec::new()
    };

    Ok(Report {
        metadata: ReportMetadata {
            dataset_source: options.dataset_source,
            generated_at: Utc::now(),
            records: aggregator.total_count(),
            rejected: options.rejected,
            top_n: options.top_n,
        },
        summary,
        low_ratings,
        frequency_tables,
    })
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Student Insights Dashboard\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(
        &report.summary,
        report.low_ratings,
        report.metadata.records,
    ));
    output.push_str(&generate_frequency_section(&report.frequency_tables));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** {}\n", metadata.dataset_source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Responses:** {}\n", metadata.records));
    if metadata.rejected > 0 {
        section.push_str(&format!(
            "- **Rejected Responses:** {}\n",
            metadata.rejected
        ));
    }
    section.push('\n');

    section
}

/// Generate the three summary cards.
fn generate_summary_section(summary: &DashboardSummary, low_ratings: usize, records: usize) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    section.push_str("### 🧠 Top Stressors\n\n");
    for (i, stressor) in summary.top_stressors.iter().enumerate() {
        section.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            stressor.source,
            stressor.count
        ));
    }
    section.push('\n');

    section.push_str("### ❤️ Mental Health\n\n");
    section.push_str(&format!(
        "**{:.1}** average rating (scale: 1-10)\n\n",
        summary.avg_mental_health
    ));
    section.push_str(&format!(
        "{} of {} students rated their mental health below {}.\n\n",
        low_ratings, records, LOW_RATING_THRESHOLD
    ));

    section.push_str("### 🏃 Top Strategies\n\n");
    for (i, strategy) in summary.common_strategies.iter().enumerate() {
        section.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            strategy.strategy,
            strategy.count
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-field distribution tables.
fn generate_frequency_section(tables: &[FrequencyTable]) -> String {
    if tables.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Response Distributions\n\n");

    for table in tables {
        section.push_str(&format!("### {}\n\n", table.field));
        section.push_str("| Answer | Count | Share |\n");
        section.push_str("|:---|:---:|:---:|\n");

        for bucket in &table.buckets {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                bucket.label.replace('|', "\\|"),
                bucket.count,
                bucket.percentage
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by StudentPulse*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::models::{DatasetSource, NormalizedResponse};

    fn create_test_aggregator() -> Aggregator {
        let record = |source: &str, strategies: &str, rating: u8| NormalizedResponse {
            stress_source: source.to_string(),
            overwhelmed_frequency: "Often".to_string(),
            stress_management: strategies.to_string(),
            mental_health_rating: rating,
            desired_support: "Peer | tutoring".to_string(),
        };

        Aggregator::new(Dataset::new(vec![
            record("exam season", "Exercise, Sleep", 3),
            record("assignment deadlines", "Sleep", 6),
            record("Homesickness", "Meditation", 9),
        ]))
    }

    fn options(include_frequency_tables: bool) -> ReportOptions {
        ReportOptions {
            dataset_source: DatasetSource::Embedded,
            rejected: 1,
            top_n: 3,
            include_frequency_tables,
        }
    }

    #[test]
    fn test_build_report() {
        let report = build_report(&create_test_aggregator(), options(true)).unwrap();

        assert_eq!(report.metadata.records, 3);
        assert_eq!(report.low_ratings, 1);
        assert_eq!(report.summary.avg_mental_health, 6.0);
        assert_eq!(report.frequency_tables.len(), 4);
        assert_eq!(
            report.frequency_tables[0].buckets[0].category.as_deref(),
            Some("exam-prep")
        );
        assert_eq!(report.frequency_tables[2].buckets[0].label, "Sleep");
        assert_eq!(report.frequency_tables[2].buckets[0].percentage, "50.0%");
    }

    #[test]
    fn test_build_report_empty_dataset() {
        let aggregator = Aggregator::new(Dataset::default());
        let err = build_report(&aggregator, options(true)).unwrap_err();
        assert_eq!(err, InsightError::EmptyDataset);
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = build_report(&create_test_aggregator(), options(true)).unwrap();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Student Insights Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Rejected Responses:** 1"));
        assert!(markdown.contains("1. I'm mainly stressed about preparing for exams. (1)"));
        assert!(markdown.contains("**6.0** average rating"));
        assert!(markdown.contains("1 of 3 students rated their mental health below 5."));
        assert!(markdown.contains("## Response Distributions"));
        assert!(markdown.contains("| Peer \\| tutoring | 3 | 100.0% |"));
    }

    #[test]
    fn test_markdown_without_tables() {
        let report = build_report(&create_test_aggregator(), options(false)).unwrap();
        let markdown = generate_markdown_report(&report);
        assert!(!markdown.contains("## Response Distributions"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = build_report(&create_test_aggregator(), options(false)).unwrap();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"topStressors\""));
        assert!(json.contains("\"lowRatings\": 1"));
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"datasetSource\""));
        assert!(!json.contains("\"frequencyTables\""));
    }
}
