//! Projection of raw survey records onto the canonical schema.
//!
//! Each raw record is keyed by the full question text; the normalizer picks
//! out the five known questions, validates them, and produces a
//! [`NormalizedResponse`].

use crate::error::InsightError;
use crate::models::{NormalizedResponse, RawAnswer, RawResponse};

pub const STRESS_SOURCE_QUESTION: &str =
    "What are the main sources of academic stress you experience as a university student?";
pub const OVERWHELMED_FREQUENCY_QUESTION: &str =
    "How often do you feel overwhelmed by your academic workload?";
pub const STRESS_MANAGEMENT_QUESTION: &str =
    "Which of the following strategies do you use to manage academic stress? (Select all that apply)";
pub const MENTAL_HEALTH_RATING_QUESTION: &str =
    "On a scale from 1 to 10, how would you rate your overall mental health during the academic year?";
pub const DESIRED_SUPPORT_QUESTION: &str =
    "What support services do you think would help improve your academic experience and mental health?";

/// Lowest accepted mental-health rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted mental-health rating.
pub const MAX_RATING: u8 = 10;

/// Result of lenient normalization.
#[derive(Debug, Clone, Default)]
pub struct NormalizationOutcome {
    /// Records that passed validation, in input order.
    pub records: Vec<NormalizedResponse>,
    /// One error per rejected record, in input order.
    pub rejected: Vec<InsightError>,
}

/// Normalize every record, failing the whole batch on the first invalid one.
pub fn normalize(raw: &[RawResponse]) -> Result<Vec<NormalizedResponse>, InsightError> {
    raw.iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record))
        .collect()
}

/// Normalize every record, keeping the valid ones and reporting the rest.
pub fn normalize_lenient(raw: &[RawResponse]) -> NormalizationOutcome {
    let mut outcome = NormalizationOutcome::default();

    for (index, record) in raw.iter().enumerate() {
        match normalize_record(index, record) {
            Ok(normalized) => outcome.records.push(normalized),
            Err(e) => outcome.rejected.push(e),
        }
    }

    outcome
}

/// Normalize a single record. `index` is only used for error reporting.
pub fn normalize_record(
    index: usize,
    record: &RawResponse,
) -> Result<NormalizedResponse, InsightError> {
    Ok(NormalizedResponse {
        stress_source: required_text(index, record, STRESS_SOURCE_QUESTION, "stress_source")?,
        overwhelmed_frequency: required_text(
            index,
            record,
            OVERWHELMED_FREQUENCY_QUESTION,
            "overwhelmed_frequency",
        )?,
        stress_management: required_text(
            index,
            record,
            STRESS_MANAGEMENT_QUESTION,
            "stress_management",
        )?,
        mental_health_rating: required_rating(index, record)?,
        desired_support: required_text(index, record, DESIRED_SUPPORT_QUESTION, "desired_support")?,
    })
}

fn required_text(
    index: usize,
    record: &RawResponse,
    question: &str,
    field: &'static str,
) -> Result<String, InsightError> {
    match record.get(question) {
        None => Err(InsightError::validation(index, field, "missing")),
        Some(RawAnswer::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(InsightError::validation(index, field, "empty text"))
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(other) => Err(InsightError::validation(
            index,
            field,
            format!("expected text, found {}", other.kind()),
        )),
    }
}

fn required_rating(index: usize, record: &RawResponse) -> Result<u8, InsightError> {
    const FIELD: &str = "mental_health_rating";

    let value = match record.get(MENTAL_HEALTH_RATING_QUESTION) {
        None => return Err(InsightError::validation(index, FIELD, "missing")),
        Some(RawAnswer::Number(n)) => *n,
        Some(RawAnswer::Text(text)) => parse_number(text)
            .map_err(|reason| InsightError::validation(index, FIELD, reason))?,
        Some(other) => {
            return Err(InsightError::validation(
                index,
                FIELD,
                format!("expected number, found {}", other.kind()),
            ))
        }
    };

    rating_from_number(value).map_err(|reason| InsightError::validation(index, FIELD, reason))
}

/// Parse a textual numeric answer.
pub fn parse_number(text: &str) -> Result<f64, String> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("`{}` is not a number", trimmed))
}

/// Check that a number is an integral rating within range.
pub fn rating_from_number(value: f64) -> Result<u8, String> {
    if value.fract() != 0.0 {
        return Err(format!("{} is not a whole number", value));
    }
    if value < f64::from(MIN_RATING) || value > f64::from(MAX_RATING) {
        return Err(format!(
            "{} is outside {}-{}",
            value, MIN_RATING, MAX_RATING
        ));
    }
    Ok(value as u8)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn raw_record(source: &str, strategies: &str, rating: f64) -> RawResponse {
        RawResponse::default()
            .with(STRESS_SOURCE_QUESTION, source)
            .with(OVERWHELMED_FREQUENCY_QUESTION, "Often")
            .with(STRESS_MANAGEMENT_QUESTION, strategies)
            .with(MENTAL_HEALTH_RATING_QUESTION, rating)
            .with(DESIRED_SUPPORT_QUESTION, "Counseling services")
    }

    fn without_rating() -> RawResponse {
        RawResponse::default()
            .with(STRESS_SOURCE_QUESTION, "Exams")
            .with(OVERWHELMED_FREQUENCY_QUESTION, "Often")
            .with(STRESS_MANAGEMENT_QUESTION, "Exercise")
            .with(DESIRED_SUPPORT_QUESTION, "Tutoring")
    }

    #[test]
    fn test_normalize_projects_fields() {
        let raw = vec![raw_record("  Exam preparation ", "Exercise, Sleep", 6.0)];
        let normalized = normalize(&raw).unwrap();

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].stress_source, "Exam preparation");
        assert_eq!(normalized[0].overwhelmed_frequency, "Often");
        assert_eq!(normalized[0].stress_management, "Exercise, Sleep");
        assert_eq!(normalized[0].mental_health_rating, 6);
        assert_eq!(normalized[0].desired_support, "Counseling services");
    }

    #[test]
    fn test_missing_rating_fails_whole_batch() {
        let raw = vec![raw_record("Exams", "Exercise", 5.0), without_rating()];

        let err = normalize(&raw).unwrap_err();
        match err {
            InsightError::Validation { index, field, .. } => {
                assert_eq!(index, 1);
                assert_eq!(field, "mental_health_rating");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rating_as_text_is_parsed() {
        let raw = vec![without_rating().with(MENTAL_HEALTH_RATING_QUESTION, " 7 ")];
        let normalized = normalize(&raw).unwrap();
        assert_eq!(normalized[0].mental_health_rating, 7);
    }

    #[test]
    fn test_rating_rejections() {
        for answer in [
            RawAnswer::from("seven"),
            RawAnswer::from(7.5),
            RawAnswer::from(11.0),
            RawAnswer::from(0.0),
            RawAnswer::Other(serde_json::Value::Bool(true)),
        ] {
            let raw = vec![without_rating().with(MENTAL_HEALTH_RATING_QUESTION, answer.clone())];
            let err = normalize(&raw).unwrap_err();
            assert!(
                matches!(err, InsightError::Validation { field: "mental_health_rating", .. }),
                "{:?} should be rejected",
                answer
            );
        }
    }

    #[test]
    fn test_empty_text_rejected() {
        let raw = vec![raw_record("   ", "Exercise", 5.0)];
        let err = normalize(&raw).unwrap_err();
        assert_eq!(
            err,
            InsightError::validation(0, "stress_source", "empty text")
        );
    }

    #[test]
    fn test_number_in_text_field_rejected() {
        let raw = vec![raw_record("Exams", "Exercise", 5.0).with(DESIRED_SUPPORT_QUESTION, 3.0)];
        let err = normalize(&raw).unwrap_err();
        assert_eq!(
            err,
            InsightError::validation(0, "desired_support", "expected text, found number")
        );
    }

    #[test]
    fn test_lenient_keeps_valid_records() {
        let raw = vec![
            raw_record("Exams", "Exercise", 5.0),
            without_rating(),
            raw_record("Deadlines", "Sleep", 8.0),
            raw_record("", "Sleep", 8.0),
        ];

        let outcome = normalize_lenient(&raw);

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].stress_source, "Deadlines");
        assert_eq!(outcome.rejected.len(), 2);
        assert!(matches!(
            outcome.rejected[0],
            InsightError::Validation { index: 1, .. }
        ));
        assert!(matches!(
            outcome.rejected[1],
            InsightError::Validation { index: 3, field: "stress_source", .. }
        ));
    }
}
