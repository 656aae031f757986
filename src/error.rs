//! Error types for survey normalization and aggregation.
//!
//! The application layer uses `anyhow` for I/O and transport failures;
//! everything the core can reject is described here.

use thiserror::Error;

/// Errors raised by the normalizer and the aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsightError {
    /// A raw record failed schema validation.
    #[error("record {index}: invalid `{field}`: {reason}")]
    Validation {
        /// Position of the offending record in the raw input.
        index: usize,
        /// Canonical name of the offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// An average or summary was requested over zero records.
    #[error("no data: the dataset contains no records")]
    EmptyDataset,

    /// A percentage was requested against a zero total.
    #[error("cannot compute a percentage of a zero total")]
    DivisionByZero,
}

impl InsightError {
    pub(crate) fn validation(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        InsightError::Validation {
            index,
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field_and_index() {
        let err = InsightError::validation(4, "mental_health_rating", "missing");
        assert_eq!(
            err.to_string(),
            "record 4: invalid `mental_health_rating`: missing"
        );
    }
}
