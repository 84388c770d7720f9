//! Team canonicalization: ALPHA fields win, BETA fills in the rest.

use std::collections::HashMap;

use serde_json::json;

use crate::domain::{generate_ues_id, AlphaTeam, BetaTeam, EntityType, UesTeam};
use crate::matchers::TeamCandidate;

pub struct TeamMergeOutput {
    pub ues_teams: Vec<UesTeam>,
    pub alpha_to_ues: HashMap<i64, String>,
    pub beta_to_ues: HashMap<i64, String>,
}

pub fn merge_teams(
    approved: &[TeamCandidate],
    alpha_teams: &HashMap<i64, AlphaTeam>,
    beta_teams: &HashMap<i64, BetaTeam>,
) -> TeamMergeOutput {
    let mut ues_teams = Vec::with_capacity(approved.len());
    let mut alpha_to_ues = HashMap::with_capacity(approved.len());
    let mut beta_to_ues = HashMap::with_capacity(approved.len());

    for candidate in approved {
        let alpha = alpha_teams.get(&candidate.alpha_team_id);
        let beta = beta_teams.get(&candidate.beta_team_id);
        let name = alpha
            .map(|a| a.name.clone())
            .or_else(|| beta.map(|b| b.display_name.clone()))
            .unwrap_or_else(|| candidate.name.clone());
        let country = alpha
            .and_then(|a| a.country.clone())
            .or_else(|| beta.and_then(|b| b.region.clone()))
            .or_else(|| candidate.country.clone());

        let ues_id = generate_ues_id(EntityType::Team.ues_prefix(), candidate.alpha_team_id, candidate.beta_team_id);
        let lineage = crate::domain::build_lineage(
            "team",
            candidate.alpha_team_id,
            candidate.beta_team_id,
            candidate.confidence,
            json!({ "name_similarity": candidate.confidence }),
        );

        ues_teams.push(UesTeam {
            ues_team_id: ues_id.clone(),
            name,
            country,
            merge_confidence: candidate.confidence,
            lineage: serde_json::to_value(lineage).expect("lineage serializes"),
        });
        alpha_to_ues.insert(candidate.alpha_team_id, ues_id.clone());
        beta_to_ues.insert(candidate.beta_team_id, ues_id);
    }

    TeamMergeOutput { ues_teams, alpha_to_ues, beta_to_ues }
}
