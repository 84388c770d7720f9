//! Competition canonicalization: fields taken directly from the matcher record.

use std::collections::HashMap;

use serde_json::json;

use crate::domain::{build_lineage, generate_ues_id, EntityType, UesCompetition};
use crate::matchers::CompetitionCandidate;

pub struct CompetitionMergeOutput {
    pub ues_competitions: Vec<UesCompetition>,
    pub alpha_to_ues: HashMap<i64, String>,
    pub beta_to_ues: HashMap<i64, String>,
}

pub fn merge_competitions(approved: &[CompetitionCandidate]) -> CompetitionMergeOutput {
    let mut ues_competitions = Vec::with_capacity(approved.len());
    let mut alpha_to_ues = HashMap::with_capacity(approved.len());
    let mut beta_to_ues = HashMap::with_capacity(approved.len());

    for candidate in approved {
        let ues_id = generate_ues_id(
            EntityType::Competition.ues_prefix(),
            candidate.alpha_competition_id,
            candidate.beta_competition_id,
        );
        let lineage = build_lineage(
            "competition",
            candidate.alpha_competition_id,
            candidate.beta_competition_id,
            candidate.confidence,
            json!({ "name_similarity": candidate.confidence }),
        );
        ues_competitions.push(UesCompetition {
            ues_competition_id: ues_id.clone(),
            name: candidate.name.clone(),
            country: candidate.country.clone(),
            merge_confidence: candidate.confidence,
            lineage: serde_json::to_value(lineage).expect("lineage serializes"),
        });
        alpha_to_ues.insert(candidate.alpha_competition_id, ues_id.clone());
        beta_to_ues.insert(candidate.beta_competition_id, ues_id);
    }

    CompetitionMergeOutput { ues_competitions, alpha_to_ues, beta_to_ues }
}
