//! Player canonicalization: ALPHA name/height win, BETA fills birth year and
//! footedness, nationality goes through country normalization.

use std::collections::HashMap;

use serde_json::json;

use crate::domain::{build_lineage, generate_ues_id, AlphaPlayer, BetaPlayer, EntityType, UesPlayer};
use crate::matchers::PlayerCandidate;
use crate::normalizers::normalize_country;

pub struct PlayerMergeOutput {
    pub ues_players: Vec<UesPlayer>,
    pub alpha_to_ues: HashMap<i64, String>,
    pub beta_to_ues: HashMap<i64, String>,
}

pub fn merge_players(
    approved: &[PlayerCandidate],
    alpha_players: &HashMap<i64, AlphaPlayer>,
    beta_players: &HashMap<i64, BetaPlayer>,
    alpha_team_to_ues: &HashMap<i64, String>,
    countries: &HashMap<String, String>,
) -> PlayerMergeOutput {
    let mut ues_players = Vec::with_capacity(approved.len());
    let mut alpha_to_ues = HashMap::with_capacity(approved.len());
    let mut beta_to_ues = HashMap::with_capacity(approved.len());

    for candidate in approved {
        let Some(alpha) = alpha_players.get(&candidate.alpha_player_id) else { continue };
        let Some(beta) = beta_players.get(&candidate.beta_player_id) else { continue };

        let ues_id =
            generate_ues_id(EntityType::Player.ues_prefix(), candidate.alpha_player_id, candidate.beta_player_id);
        let canonical_name =
            if !alpha.name.is_empty() { alpha.name.clone() } else { beta.full_name.clone() };
        let nationality = alpha
            .nationality
            .as_deref()
            .or(beta.nationality.as_deref())
            .map(|n| normalize_country(n, countries));
        let foot = beta
            .footedness
            .as_deref()
            .or(alpha.foot.as_deref())
            .map(|f| f.to_lowercase());
        let height_cm = alpha.height_cm.or(beta.height_cm);
        let team_ues_id = alpha.team_id.and_then(|id| alpha_team_to_ues.get(&id).cloned());

        let lineage = build_lineage(
            "player",
            candidate.alpha_player_id,
            candidate.beta_player_id,
            candidate.confidence,
            json!({
                "name_similarity": candidate.breakdown.name_similarity,
                "dob_similarity": candidate.breakdown.dob_similarity,
                "team_similarity": candidate.breakdown.team_similarity,
            }),
        );

        ues_players.push(UesPlayer {
            ues_player_id: ues_id.clone(),
            canonical_name,
            dob: alpha.dob,
            birth_year: beta.birth_year,
            nationality,
            height_cm,
            foot,
            team_ues_id,
            merge_confidence: candidate.confidence,
            lineage: serde_json::to_value(lineage).expect("lineage serializes"),
        });
        alpha_to_ues.insert(candidate.alpha_player_id, ues_id.clone());
        beta_to_ues.insert(candidate.beta_player_id, ues_id);
    }

    PlayerMergeOutput { ues_players, alpha_to_ues, beta_to_ues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::PlayerBreakdown;
    use chrono::NaiveDate;

    fn alpha() -> AlphaPlayer {
        AlphaPlayer {
            player_id: 1,
            name: "John Doe".to_string(),
            dob: NaiveDate::from_ymd_opt(1995, 4, 10),
            team_id: Some(1),
            nationality: Some("England".to_string()),
            height_cm: Some(180),
            foot: Some("Right".to_string()),
        }
    }

    fn beta() -> BetaPlayer {
        BetaPlayer {
            id: 2,
            full_name: "Jon Doe".to_string(),
            birth_year: Some(1995),
            team_name: Some("City FC".to_string()),
            nationality: None,
            footedness: Some("LEFT".to_string()),
            height_cm: None,
        }
    }

    #[test]
    fn prefers_alpha_name_beta_foot_alpha_height() {
        let candidate = PlayerCandidate {
            alpha_player_id: 1,
            beta_player_id: 2,
            confidence: 0.9,
            breakdown: PlayerBreakdown { name_similarity: 0.9, dob_similarity: 1.0, team_similarity: 1.0 },
        };
        let mut alpha_players = HashMap::new();
        alpha_players.insert(1, alpha());
        let mut beta_players = HashMap::new();
        beta_players.insert(2, beta());
        let out = merge_players(&[candidate], &alpha_players, &beta_players, &HashMap::new(), &HashMap::new());
        let p = &out.ues_players[0];
        assert_eq!(p.canonical_name, "John Doe");
        assert_eq!(p.foot, Some("left".to_string()));
        assert_eq!(p.height_cm, Some(180));
        assert_eq!(p.birth_year, Some(1995));
    }
}
