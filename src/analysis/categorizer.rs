//! Canonicalization of free-text stress sources.
//!
//! Stress sources are matched against an ordered rule table; the first rule
//! whose predicate holds decides the category. Text no rule matches is kept
//! verbatim, so the label set is open.

use std::fmt;

/// Canonical stressor category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StressorCategory {
    ExamPrep,
    Deadlines,
    WorkStudyBalance,
    MultiplePriorities,
    Financial,
    GroupProjects,
    /// Unmatched source text, kept as-is.
    Other(String),
}

impl StressorCategory {
    /// Stable identifier of the category, used as the bucket key in reports.
    pub fn slug(&self) -> &str {
        match self {
            StressorCategory::ExamPrep => "exam-prep",
            StressorCategory::Deadlines => "deadlines",
            StressorCategory::WorkStudyBalance => "work-study-balance",
            StressorCategory::MultiplePriorities => "multiple-priorities",
            StressorCategory::Financial => "financial-pressure",
            StressorCategory::GroupProjects => "group-projects",
            StressorCategory::Other(text) => text,
        }
    }

    /// Human-readable label shown on the dashboard.
    pub fn label(&self) -> &str {
        match self {
            StressorCategory::ExamPrep => "I'm mainly stressed about preparing for exams.",
            StressorCategory::Deadlines => "I often worry about meeting assignment deadlines.",
            StressorCategory::WorkStudyBalance => {
                "Balancing work and studies is challenging for me."
            }
            StressorCategory::MultiplePriorities => "Managing multiple priorities is stressful.",
            StressorCategory::Financial => "Financial pressure is a major concern.",
            StressorCategory::GroupProjects => "Group project coordination is challenging.",
            StressorCategory::Other(text) => text,
        }
    }
}

impl fmt::Display for StressorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Substring predicate of a rule. Matching is case-sensitive.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// Text contains at least one of the needles.
    Any(&'static [&'static str]),
    /// Text contains every needle.
    All(&'static [&'static str]),
}

impl Predicate {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Predicate::Any(needles) => needles.iter().any(|n| text.contains(n)),
            Predicate::All(needles) => needles.iter().all(|n| text.contains(n)),
        }
    }
}

/// Kind of a closed category, used by the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    ExamPrep,
    Deadlines,
    WorkStudyBalance,
    MultiplePriorities,
    Financial,
    GroupProjects,
}

impl From<RuleTarget> for StressorCategory {
    fn from(target: RuleTarget) -> Self {
        match target {
            RuleTarget::ExamPrep => StressorCategory::ExamPrep,
            RuleTarget::Deadlines => StressorCategory::Deadlines,
            RuleTarget::WorkStudyBalance => StressorCategory::WorkStudyBalance,
            RuleTarget::MultiplePriorities => StressorCategory::MultiplePriorities,
            RuleTarget::Financial => StressorCategory::Financial,
            RuleTarget::GroupProjects => StressorCategory::GroupProjects,
        }
    }
}

/// Stressor rules in priority order.
pub const STRESSOR_RULES: &[(Predicate, RuleTarget)] = &[
    (Predicate::Any(&["exam"]), RuleTarget::ExamPrep),
    (Predicate::Any(&["deadline"]), RuleTarget::Deadlines),
    (Predicate::All(&["work", "studies"]), RuleTarget::WorkStudyBalance),
    (
        Predicate::Any(&["multiple priorities"]),
        RuleTarget::MultiplePriorities,
    ),
    (Predicate::Any(&["tuition", "financial"]), RuleTarget::Financial),
    (Predicate::Any(&["group projects"]), RuleTarget::GroupProjects),
];

/// Categorize a stress source with [`STRESSOR_RULES`].
pub fn categorize(text: &str) -> StressorCategory {
    categorize_with(STRESSOR_RULES, text)
}

/// Categorize against an arbitrary rule table.
pub fn categorize_with(rules: &[(Predicate, RuleTarget)], text: &str) -> StressorCategory {
    rules
        .iter()
        .find(|(predicate, _)| predicate.matches(text))
        .map(|(_, target)| StressorCategory::from(*target))
        .unwrap_or_else(|| StressorCategory::Other(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_rule() {
        let category = categorize("I worry about exam prep");
        assert_eq!(category, StressorCategory::ExamPrep);
        assert_eq!(category.slug(), "exam-prep");
    }

    #[test]
    fn test_work_and_studies_both_required() {
        assert_eq!(
            categorize("Balancing work and studies"),
            StressorCategory::WorkStudyBalance
        );
        assert_eq!(
            categorize("Too much work"),
            StressorCategory::Other("Too much work".to_string())
        );
    }

    #[test]
    fn test_priority_order() {
        // matches deadline, work+studies and financial; deadline comes first
        let text = "deadline pressure at work and in my studies, plus financial worries";
        assert_eq!(categorize(text), StressorCategory::Deadlines);

        // exam outranks everything
        assert_eq!(
            categorize("exam deadlines and tuition"),
            StressorCategory::ExamPrep
        );
    }

    #[test]
    fn test_any_predicate_alternatives() {
        assert_eq!(categorize("rising tuition"), StressorCategory::Financial);
        assert_eq!(categorize("financial stress"), StressorCategory::Financial);
        assert_eq!(
            categorize("coordinating group projects"),
            StressorCategory::GroupProjects
        );
        assert_eq!(
            categorize("juggling multiple priorities"),
            StressorCategory::MultiplePriorities
        );
    }

    #[test]
    fn test_fallback_is_verbatim() {
        let text = "Homesickness and adjusting to university life.";
        let category = categorize(text);
        assert_eq!(category, StressorCategory::Other(text.to_string()));
        assert_eq!(category.label(), text);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(
            categorize("Exam anxiety"),
            StressorCategory::Other("Exam anxiety".to_string())
        );
    }

    #[test]
    fn test_rule_table_order() {
        let targets: Vec<_> = STRESSOR_RULES.iter().map(|(_, t)| *t).collect();
        assert_eq!(
            targets,
            vec![
                RuleTarget::ExamPrep,
                RuleTarget::Deadlines,
                RuleTarget::WorkStudyBalance,
                RuleTarget::MultiplePriorities,
                RuleTarget::Financial,
                RuleTarget::GroupProjects,
            ]
        );
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = [(Predicate::Any(&["rent"]), RuleTarget::Financial)];
        assert_eq!(
            categorize_with(&rules, "paying rent"),
            StressorCategory::Financial
        );
        assert_eq!(
            categorize_with(&rules, "exam"),
            StressorCategory::Other("exam".to_string())
        );
    }
}
