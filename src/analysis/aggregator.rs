//! Survey aggregation and statistics.
//!
//! This module groups, counts and ranks the normalized survey records and
//! computes the dashboard summary. Every operation is a pure function of the
//! dataset it was constructed with.

use crate::analysis::categorizer::categorize;
use crate::dataset::Dataset;
use crate::error::InsightError;
use crate::models::{
    DashboardSummary, FrequencyBucket, NormalizedResponse, RankedValue, StrategyCount,
    StressorCount,
};
use std::collections::HashMap;

/// Number of entries on each dashboard card.
pub const SUMMARY_TOP_N: usize = 3;

/// Text field selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Grouped by stressor category.
    StressSource,
    /// Grouped by raw answer.
    OverwhelmedFrequency,
    /// Split into individual strategies.
    StressManagement,
    /// Grouped by raw answer.
    DesiredSupport,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::StressSource,
        Field::OverwhelmedFrequency,
        Field::StressManagement,
        Field::DesiredSupport,
    ];

    /// Display title of the field.
    pub fn title(&self) -> &'static str {
        match self {
            Field::StressSource => "Sources of Academic Stress",
            Field::OverwhelmedFrequency => "Feeling Overwhelmed",
            Field::StressManagement => "Stress Management Strategies",
            Field::DesiredSupport => "Desired Support Services",
        }
    }

    /// Values this field contributes for one record.
    fn values(&self, record: &NormalizedResponse) -> Vec<String> {
        match self {
            Field::StressSource => vec![categorize(&record.stress_source).label().to_string()],
            Field::OverwhelmedFrequency => vec![record.overwhelmed_frequency.clone()],
            Field::StressManagement => split_multi_value(&record.stress_management),
            Field::DesiredSupport => vec![record.desired_support.clone()],
        }
    }
}

/// Numeric field selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    MentalHealthRating,
}

impl NumericField {
    fn value(&self, record: &NormalizedResponse) -> f64 {
        match self {
            NumericField::MentalHealthRating => f64::from(record.mental_health_rating),
        }
    }
}

/// Split a comma-joined multi-select answer into trimmed tokens.
pub fn split_multi_value(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Format `count / total` as a percentage with one decimal, e.g. `"25.0%"`.
pub fn percentage_of(count: usize, total: usize) -> Result<String, InsightError> {
    if total == 0 {
        return Err(InsightError::DivisionByZero);
    }

    let percentage = (count as f64 / total as f64) * 100.0;
    let rounded = (percentage * 10.0).round() / 10.0;
    Ok(format!("{:.1}%", rounded))
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Result<f64, InsightError> {
    if values.is_empty() {
        return Err(InsightError::EmptyDataset);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Count occurrences and rank them by count, highest first.
///
/// Ties keep the order in which values were first seen.
pub fn rank<I>(values: I) -> Vec<RankedValue>
where
    I: IntoIterator<Item = String>,
{
    let mut ranked: Vec<RankedValue> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for value in values {
        match positions.get(&value) {
            Some(&pos) => ranked[pos].count += 1,
            None => {
                positions.insert(value.clone(), ranked.len());
                ranked.push(RankedValue {
                    label: value,
                    count: 1,
                });
            }
        }
    }

    // stable: equal counts stay in first-seen order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Aggregation over one dataset.
#[derive(Debug, Clone)]
pub struct Aggregator {
    dataset: Dataset,
}

impl Aggregator {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Number of records.
    pub fn total_count(&self) -> usize {
        self.dataset.len()
    }

    /// All values of a field across the dataset, in record order.
    pub fn values(&self, field: Field) -> Vec<String> {
        self.dataset
            .records()
            .iter()
            .flat_map(|r| field.values(r))
            .collect()
    }

    /// The `n` most frequent values of a field.
    pub fn top_categories(&self, field: Field, n: usize) -> Vec<RankedValue> {
        let mut ranked = rank(self.values(field));
        ranked.truncate(n);
        ranked
    }

    /// Full ranked distribution of a field with percentages.
    ///
    /// Percentages are relative to the number of values counted, which for
    /// multi-select fields exceeds the number of records.
    /// Stress-source buckets also carry the category slug.
    pub fn frequency_table(&self, field: Field) -> Result<Vec<FrequencyBucket>, InsightError> {
        let values = self.values(field);
        let total = values.len();
        let slugs = self.category_slugs(field);

        rank(values)
            .into_iter()
            .map(|r| {
                Ok(FrequencyBucket {
                    percentage: percentage_of(r.count, total)?,
                    category: slugs.get(&r.label).cloned(),
                    label: r.label,
                    count: r.count,
                })
            })
            .collect()
    }

    /// Label to slug map of the categories seen in `field`.
    fn category_slugs(&self, field: Field) -> HashMap<String, String> {
        match field {
            Field::StressSource => self
                .dataset
                .records()
                .iter()
                .map(|r| {
                    let category = categorize(&r.stress_source);
                    (category.label().to_string(), category.slug().to_string())
                })
                .collect(),
            _ => HashMap::new(),
        }
    }

    /// Mean of a numeric field.
    pub fn average(&self, field: NumericField) -> Result<f64, InsightError> {
        let values: Vec<f64> = self
            .dataset
            .records()
            .iter()
            .map(|r| field.value(r))
            .collect();
        mean(&values)
    }

    /// Number of records whose numeric field satisfies `predicate`.
    pub fn count_where<P>(&self, field: NumericField, predicate: P) -> usize
    where
        P: Fn(f64) -> bool,
    {
        self.dataset
            .records()
            .iter()
            .filter(|r| predicate(field.value(r)))
            .count()
    }

    /// Dashboard summary with the default number of entries per card.
    pub fn summarize(&self) -> Result<DashboardSummary, InsightError> {
        self.summarize_top(SUMMARY_TOP_N)
    }

    /// Dashboard summary with `n` entries per card.
    pub fn summarize_top(&self, n: usize) -> Result<DashboardSummary, InsightError> {
        let avg_mental_health = self.average(NumericField::MentalHealthRating)?;

        let top_stressors = self
            .top_categories(Field::StressSource, n)
            .into_iter()
            .map(|r| StressorCount {
                source: r.label,
                count: r.count,
            })
            .collect();

        let common_strategies = self
            .top_categories(Field::StressManagement, n)
            .into_iter()
            .map(|r| StrategyCount {
                strategy: r.label,
                count: r.count,
            })
            .collect();

        Ok(DashboardSummary {
            top_stressors,
            avg_mental_health,
            common_strategies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_response(source: &str, strategies: &str, rating: u8) -> NormalizedResponse {
        NormalizedResponse {
            stress_source: source.to_string(),
            overwhelmed_frequency: "Often".to_string(),
            stress_management: strategies.to_string(),
            mental_health_rating: rating,
            desired_support: "Counseling".to_string(),
        }
    }

    fn aggregator(records: Vec<NormalizedResponse>) -> Aggregator {
        Aggregator::new(Dataset::new(records))
    }

    fn sample() -> Aggregator {
        aggregator(vec![
            create_test_response("exam season", "Exercise, Sleep", 4),
            create_test_response("meeting deadlines", "Sleep", 6),
            create_test_response("final exam stress", "Exercise, Meditation", 5),
            create_test_response("Homesickness", "Sleep, Exercise", 8),
            create_test_response("tuition fees", "Hobbies", 7),
        ])
    }

    #[test]
    fn test_top_categories_sorted_and_bounded() {
        let agg = sample();
        let top = agg.top_categories(Field::StressSource, 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].label, "I'm mainly stressed about preparing for exams.");
        assert_eq!(top[0].count, 2);
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
        assert!(top.iter().map(|r| r.count).sum::<usize>() <= agg.total_count());
    }

    #[test]
    fn test_three_way_tie_keeps_first_seen_order() {
        let ranked = rank(
            ["b", "a", "c", "a", "b", "c"]
                .into_iter()
                .map(String::from),
        );
        let labels: Vec<_> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert!(ranked.iter().all(|r| r.count == 2));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let agg = sample();
        let first = agg.top_categories(Field::StressManagement, 10);
        for _ in 0..5 {
            assert_eq!(agg.top_categories(Field::StressManagement, 10), first);
        }
    }

    #[test]
    fn test_average() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Ok(3.0));
        assert_eq!(mean(&[]), Err(InsightError::EmptyDataset));
        assert_eq!(sample().average(NumericField::MentalHealthRating), Ok(6.0));
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(1, 4), Ok("25.0%".to_string()));
        assert_eq!(percentage_of(1, 3), Ok("33.3%".to_string()));
        assert_eq!(percentage_of(2, 3), Ok("66.7%".to_string()));
        assert_eq!(percentage_of(0, 0), Err(InsightError::DivisionByZero));
    }

    #[test]
    fn test_split_multi_value() {
        assert_eq!(
            split_multi_value("Exercise, Meditation, Sleep"),
            vec!["Exercise", "Meditation", "Sleep"]
        );
        assert_eq!(split_multi_value("Sleep,, "), vec!["Sleep"]);
    }

    #[test]
    fn test_multi_value_tokens_counted_once_each() {
        let agg = aggregator(vec![create_test_response(
            "exams",
            "Exercise, Meditation, Sleep",
            5,
        )]);
        let ranked = agg.top_categories(Field::StressManagement, 10);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.count == 1));
    }

    #[test]
    fn test_frequency_table_percentages() {
        let table = sample().frequency_table(Field::StressManagement).unwrap();

        // 8 tokens: Exercise 3, Sleep 3, Meditation 1, Hobbies 1
        assert_eq!(table[0].label, "Exercise");
        assert_eq!(table[0].percentage, "37.5%");
        assert_eq!(table[1].label, "Sleep");
        assert_eq!(table[3].label, "Hobbies");
        assert_eq!(table[3].percentage, "12.5%");
    }

    #[test]
    fn test_frequency_table_stress_source_slugs() {
        let table = sample().frequency_table(Field::StressSource).unwrap();

        assert_eq!(table[0].label, "I'm mainly stressed about preparing for exams.");
        assert_eq!(table[0].category.as_deref(), Some("exam-prep"));
        assert!(table.iter().all(|b| b.category.is_some()));

        let strategies = sample().frequency_table(Field::StressManagement).unwrap();
        assert!(strategies.iter().all(|b| b.category.is_none()));
    }

    #[test]
    fn test_frequency_table_empty_dataset() {
        let table = aggregator(vec![]).frequency_table(Field::DesiredSupport);
        assert_eq!(table, Ok(vec![]));
    }

    #[test]
    fn test_count_where() {
        let agg = sample();
        assert_eq!(
            agg.count_where(NumericField::MentalHealthRating, |r| r < 5.0),
            1
        );
    }

    #[test]
    fn test_summarize() {
        let summary = sample().summarize().unwrap();

        assert_eq!(summary.top_stressors.len(), 3);
        assert_eq!(summary.top_stressors[0].count, 2);
        assert_eq!(summary.avg_mental_health, 6.0);
        assert_eq!(summary.common_strategies[0].strategy, "Exercise");
        assert_eq!(summary.common_strategies[1].strategy, "Sleep");
    }

    #[test]
    fn test_summarize_empty_dataset_fails() {
        assert_eq!(
            aggregator(vec![]).summarize(),
            Err(InsightError::EmptyDataset)
        );
    }
}
