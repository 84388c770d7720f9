//! Wire-level validator output types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Match,
    NoMatch,
    Review,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Match => "MATCH",
            Decision::NoMatch => "NO_MATCH",
            Decision::Review => "REVIEW",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub decision: Decision,
    pub confidence: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

impl ValidationResult {
    pub fn synthetic(decision: Decision, flag: &str) -> Self {
        Self {
            decision,
            confidence: 0.0,
            reasons: vec![format!("synthetic:{flag}")],
            risk_flags: vec![flag.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_serializes_and_parses_as_screaming_snake_case() {
        let json = serde_json::to_value(Decision::NoMatch).unwrap();
        assert_eq!(json, serde_json::json!("NO_MATCH"));
        let parsed: Decision = serde_json::from_value(serde_json::json!("NO_MATCH")).unwrap();
        assert_eq!(parsed, Decision::NoMatch);
    }

    #[test]
    fn match_and_review_still_round_trip() {
        for (decision, label) in [(Decision::Match, "MATCH"), (Decision::Review, "REVIEW")] {
            let json = serde_json::to_value(decision).unwrap();
            assert_eq!(json, serde_json::json!(label));
            let parsed: Decision = serde_json::from_value(serde_json::json!(label)).unwrap();
            assert_eq!(parsed, decision);
        }
    }
}
