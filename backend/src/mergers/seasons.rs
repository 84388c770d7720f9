//! Season canonicalization: years taken from the matcher, competition id
//! resolved through the competitions stage's UES map.

use std::collections::HashMap;

use serde_json::json;

use crate::domain::{build_lineage, generate_ues_id, EntityType, UesSeason};
use crate::matchers::SeasonCandidate;

pub struct SeasonMergeOutput {
    pub ues_seasons: Vec<UesSeason>,
    pub alpha_to_ues: HashMap<i64, String>,
    pub beta_to_ues: HashMap<i64, String>,
}

/// `competition_ues_map` is keyed by ALPHA competition id; falls back to the
/// BETA competition id when the ALPHA side isn't mapped (§4.5).
pub fn merge_seasons(
    approved: &[SeasonCandidate],
    alpha_competition_ues_map: &HashMap<i64, String>,
    beta_competition_ues_map: &HashMap<i64, String>,
) -> SeasonMergeOutput {
    let mut ues_seasons = Vec::with_capacity(approved.len());
    let mut alpha_to_ues = HashMap::with_capacity(approved.len());
    let mut beta_to_ues = HashMap::with_capacity(approved.len());

    for candidate in approved {
        let ues_id = generate_ues_id(
            EntityType::Season.ues_prefix(),
            candidate.alpha_season_id,
            candidate.beta_season_id,
        );
        let competition_ues_id = alpha_competition_ues_map
            .get(&candidate.alpha_competition_id)
            .or_else(|| beta_competition_ues_map.get(&candidate.beta_competition_id))
            .cloned();
        let lineage = build_lineage(
            "season",
            candidate.alpha_season_id,
            candidate.beta_season_id,
            candidate.confidence,
            json!({ "start_year": candidate.start_year }),
        );
        ues_seasons.push(UesSeason {
            ues_season_id: ues_id.clone(),
            start_year: candidate.start_year,
            end_year: candidate.end_year,
            competition_ues_id,
            merge_confidence: candidate.confidence,
            lineage: serde_json::to_value(lineage).expect("lineage serializes"),
        });
        alpha_to_ues.insert(candidate.alpha_season_id, ues_id.clone());
        beta_to_ues.insert(candidate.beta_season_id, ues_id);
    }

    SeasonMergeOutput { ues_seasons, alpha_to_ues, beta_to_ues }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_beta_competition_map_when_alpha_unmapped() {
        let candidate = SeasonCandidate {
            alpha_season_id: 1,
            beta_season_id: 2,
            confidence: 1.0,
            start_year: Some(2020),
            end_year: Some(2021),
            alpha_competition_id: 100,
            beta_competition_id: 900,
        };
        let alpha_map = HashMap::new();
        let mut beta_map = HashMap::new();
        beta_map.insert(900, "UESC-deadbeef".to_string());

        let out = merge_seasons(&[candidate], &alpha_map, &beta_map);
        assert_eq!(out.ues_seasons[0].competition_ues_id, Some("UESC-deadbeef".to_string()));
    }
}
