//! Provenance records and the deterministic UES identifier scheme.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageSource {
    pub source: &'static str,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lineage {
    pub sources: Vec<LineageSource>,
    pub confidence: f64,
    pub confidence_breakdown: Json,
    pub entity_type: &'static str,
}

/// Builds the per-entity provenance record pointing back at the ALPHA/BETA
/// pair that produced it. One `Lineage` always carries exactly one ALPHA and
/// one BETA source id (data model invariant 2).
pub fn build_lineage(
    entity_type: &'static str,
    alpha_id: impl std::fmt::Display,
    beta_id: impl std::fmt::Display,
    confidence: f64,
    breakdown: Json,
) -> Lineage {
    Lineage {
        sources: vec![
            LineageSource { source: "ALPHA", id: alpha_id.to_string() },
            LineageSource { source: "BETA", id: beta_id.to_string() },
        ],
        confidence,
        confidence_breakdown: breakdown,
        entity_type,
    }
}

/// Deterministic 8-hex-digest UES identifier: `PREFIX-HHHHHHHH`.
///
/// Pure function of `(prefix, alpha_id, beta_id)` — invariant 1 requires the
/// same inputs to yield the same output across processes, which rules out
/// anything seeded from process state (clocks, random ids).
pub fn generate_ues_id(
    prefix: &str,
    alpha_id: impl std::fmt::Display,
    beta_id: impl std::fmt::Display,
) -> String {
    let hash_input = format!("{prefix}-{alpha_id}-{beta_id}");
    let digest = Md5::digest(hash_input.as_bytes());
    let hex = format!("{digest:x}");
    format!("{prefix}-{}", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_ues_id_is_deterministic() {
        let a = generate_ues_id("UEST", 1, 2);
        let b = generate_ues_id("UEST", 1, 2);
        assert_eq!(a, b);
        assert!(a.starts_with("UEST-"));
        assert_eq!(a.len(), "UEST-".len() + 8);
    }

    #[test]
    fn generate_ues_id_differs_on_inputs() {
        let a = generate_ues_id("UEST", 1, 2);
        let b = generate_ues_id("UEST", 1, 3);
        assert_ne!(a, b);
    }

    #[test]
    fn build_lineage_carries_exactly_two_sources() {
        let lineage = build_lineage("team", 1, 2, 0.9, serde_json::json!({}));
        assert_eq!(lineage.sources.len(), 2);
        assert_eq!(lineage.sources[0].source, "ALPHA");
        assert_eq!(lineage.sources[1].source, "BETA");
    }
}
