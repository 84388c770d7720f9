//! Gray-zone adjudication: turns a candidate pair's signals into a
//! `ValidationResult` by asking the configured LLM, or falling back to a
//! synthetic result when the LLM path is disabled, unconfigured, or erroring.

use serde_json::Value as Json;

use super::adapters::ValidationCandidate;
use super::llm_client::{LlmClient, LlmClientError};
use super::schemas::{Decision, ValidationResult};

const SYSTEM_PROMPT: &str = "You are adjudicating whether two football data records describe the \
same real-world entity. You will be given the entity type, both records' fields, a numeric \
matcher score, and a set of derived signals. Respond with a JSON object with exactly these keys: \
`decision` (one of \"MATCH\", \"NO_MATCH\", \"REVIEW\"), `confidence` (0 to 1), `reasons` (array \
of short strings), `risk_flags` (array of short strings). Prefer REVIEW when evidence conflicts.";

fn user_prompt(entity_type: &str, left_id: &str, right_id: &str, matcher_score: f64, signals: &Json) -> String {
    format!(
        "entity_type: {entity_type}\nleft_id: {left_id}\nright_id: {right_id}\nmatcher_score: {matcher_score}\nsignals: {signals}"
    )
}

/// `Ok` always carries a usable `ValidationResult` plus the call's latency in
/// milliseconds; only genuine LLM transport/parse failure after the client's
/// own retry bubbles an error, and even then the caller is expected to fall
/// back rather than abort.
pub async fn validate_pair(
    client: &dyn LlmClient,
    candidate: &ValidationCandidate,
) -> Result<(ValidationResult, u64), LlmClientError> {
    let prompt = user_prompt(
        candidate.entity_type.as_str(),
        &candidate.left_id,
        &candidate.right_id,
        candidate.matcher_score,
        &candidate.signals,
    );
    let response = client.request_json(SYSTEM_PROMPT, &prompt).await?;
    let mut result: ValidationResult = serde_json::from_value(response.body).unwrap_or_else(|_| {
        ValidationResult::synthetic(Decision::Review, "llm_error")
    });
    if response.invalid_json_retry {
        result.risk_flags.push("llm_invalid_json_retry".to_string());
    }
    Ok((result, response.latency_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityType;
    use crate::validation::llm_client::MockLlmClient;
    use serde_json::json;

    fn candidate() -> ValidationCandidate {
        ValidationCandidate {
            entity_type: EntityType::Player,
            left_id: "1".to_string(),
            right_id: "2".to_string(),
            matcher_score: 0.7,
            signals: json!({}),
            conflict: false,
        }
    }

    #[tokio::test]
    async fn parses_a_well_formed_response() {
        let client = MockLlmClient::new(vec![Ok(json!({
            "decision": "MATCH",
            "confidence": 0.9,
            "reasons": ["names align"],
            "risk_flags": []
        }))]);
        let (result, _latency_ms) = validate_pair(&client, &candidate()).await.unwrap();
        assert_eq!(result.decision, Decision::Match);
        assert_eq!(result.confidence, 0.9);
    }

    #[tokio::test]
    async fn parses_a_no_match_response() {
        let client = MockLlmClient::new(vec![Ok(json!({
            "decision": "NO_MATCH",
            "confidence": 0.1,
            "reasons": ["names diverge"],
            "risk_flags": []
        }))]);
        let (result, _latency_ms) = validate_pair(&client, &candidate()).await.unwrap();
        assert_eq!(result.decision, Decision::NoMatch);
        assert!(!result.risk_flags.contains(&"llm_error".to_string()));
    }

    #[tokio::test]
    async fn malformed_payload_becomes_synthetic_review() {
        let client = MockLlmClient::new(vec![Ok(json!({ "unexpected": true }))]);
        let (result, _latency_ms) = validate_pair(&client, &candidate()).await.unwrap();
        assert_eq!(result.decision, Decision::Review);
        assert!(result.risk_flags.contains(&"llm_error".to_string()));
    }
}
