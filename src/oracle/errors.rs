//! Errors that are an expected outcome of random queries, not findings.

/// A message fragment and why hitting it is uninteresting.
#[derive(Debug, Clone, Copy)]
pub struct BenignPattern {
    pub pattern: &'static str,
    pub rationale: &'static str,
}

/// Matched case-insensitively against the rendered error message.
pub const BENIGN_ERRORS: &[BenignPattern] = &[
    BenignPattern {
        pattern: "does not exist",
        rationale: "query built from a schema snapshot that no longer matches the database",
    },
    BenignPattern {
        pattern: "already exists",
        rationale: "name reused by an earlier run sharing the database",
    },
    BenignPattern {
        pattern: "syntax error",
        rationale: "generated text the engine does not accept",
    },
    BenignPattern {
        pattern: "type mismatch",
        rationale: "literal not comparable with the column type",
    },
    BenignPattern {
        pattern: "conversion error",
        rationale: "literal could not be cast to the column type",
    },
    BenignPattern {
        pattern: "could not convert",
        rationale: "literal could not be cast to the column type",
    },
    BenignPattern {
        pattern: "no function matches",
        rationale: "operator applied to a type it is not defined for",
    },
    BenignPattern {
        pattern: "not found",
        rationale: "column or table resolved against a stale snapshot",
    },
    BenignPattern {
        pattern: "invalid",
        rationale: "input rejected by the engine's validation",
    },
];

/// The benign pattern `message` matches, if any.
pub fn classify(message: &str) -> Option<&'static BenignPattern> {
    let lower = message.to_lowercase();
    BENIGN_ERRORS.iter().find(|p| lower.contains(p.pattern))
}

pub fn is_expected_error(message: &str) -> bool {
    classify(message).is_some()
}
