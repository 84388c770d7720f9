//! Match canonicalization: every id resolved through the ALPHA-side UES maps
//! produced by earlier stages; `match_date` taken from ALPHA.

use std::collections::HashMap;

use serde_json::json;

use crate::domain::{build_lineage, generate_ues_id, AlphaMatch, EntityType, UesMatch};
use crate::matchers::MatchCandidate;

pub fn merge_matches(
    approved: &[MatchCandidate],
    alpha_matches: &HashMap<i64, AlphaMatch>,
    alpha_team_to_ues: &HashMap<i64, String>,
    alpha_season_to_ues: &HashMap<i64, String>,
    alpha_competition_to_ues: &HashMap<i64, String>,
) -> Vec<UesMatch> {
    let mut ues_matches = Vec::with_capacity(approved.len());

    for candidate in approved {
        let Some(alpha) = alpha_matches.get(&candidate.alpha_match_id) else { continue };

        let ues_id =
            generate_ues_id(EntityType::Match.ues_prefix(), candidate.alpha_match_id, candidate.beta_match_id);
        let lineage = build_lineage(
            "match",
            candidate.alpha_match_id,
            candidate.beta_match_id,
            candidate.confidence,
            json!({ "team": candidate.confidence, "date_similarity": candidate.date_similarity }),
        );

        ues_matches.push(UesMatch {
            ues_match_id: ues_id,
            home_team_ues_id: alpha_team_to_ues.get(&alpha.home_team_id).cloned(),
            away_team_ues_id: alpha_team_to_ues.get(&alpha.away_team_id).cloned(),
            season_ues_id: alpha_season_to_ues.get(&alpha.season_id).cloned(),
            competition_ues_id: alpha_competition_to_ues.get(&alpha.competition_id).cloned(),
            match_date: alpha.match_date,
            merge_confidence: candidate.confidence,
            lineage: serde_json::to_value(lineage).expect("lineage serializes"),
        });
    }

    ues_matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn resolves_all_four_relations_through_alpha_side_maps() {
        let alpha = AlphaMatch {
            match_id: 1,
            competition_id: 100,
            season_id: 200,
            home_team_id: 10,
            away_team_id: 20,
            match_date: NaiveDate::from_ymd_opt(2021, 5, 1),
        };
        let candidate = MatchCandidate { alpha_match_id: 1, beta_match_id: 2, confidence: 0.9, date_similarity: 1.0 };
        let mut alpha_matches = HashMap::new();
        alpha_matches.insert(1, alpha);
        let mut team_map = HashMap::new();
        team_map.insert(10, "UEST-aaaa1111".to_string());
        team_map.insert(20, "UEST-bbbb2222".to_string());
        let mut season_map = HashMap::new();
        season_map.insert(200, "UESS-cccc3333".to_string());
        let mut comp_map = HashMap::new();
        comp_map.insert(100, "UESC-dddd4444".to_string());

        let out = merge_matches(&[candidate], &alpha_matches, &team_map, &season_map, &comp_map);
        assert_eq!(out[0].home_team_ues_id, Some("UEST-aaaa1111".to_string()));
        assert_eq!(out[0].away_team_ues_id, Some("UEST-bbbb2222".to_string()));
        assert_eq!(out[0].season_ues_id, Some("UESS-cccc3333".to_string()));
        assert_eq!(out[0].competition_ues_id, Some("UESC-dddd4444".to_string()));
    }
}
