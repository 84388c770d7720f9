//! Player candidate generation: argmax over a weighted name/dob/team blend.

use std::collections::HashMap;

use chrono::Datelike;

use crate::domain::{AlphaPlayer, BetaPlayer};
use crate::normalizers::{normalize_name, token_sort_ratio};

#[derive(Debug, Clone, Copy)]
pub struct PlayerBreakdown {
    pub name_similarity: f64,
    pub dob_similarity: f64,
    pub team_similarity: f64,
}

#[derive(Debug, Clone)]
pub struct PlayerCandidate {
    pub alpha_player_id: i64,
    pub beta_player_id: i64,
    pub confidence: f64,
    pub breakdown: PlayerBreakdown,
}

const NAME_WEIGHT: f64 = 0.6;
const DOB_WEIGHT: f64 = 0.3;
const TEAM_WEIGHT: f64 = 0.1;

fn dob_similarity(alpha_year: Option<i32>, beta_year: Option<i32>, dob_partial_score: f64) -> f64 {
    match (alpha_year, beta_year) {
        (Some(a), Some(b)) if a == b => 1.0,
        (Some(a), Some(b)) if (a - b).abs() == 1 => dob_partial_score,
        _ => 0.0,
    }
}

fn team_similarity(
    alpha_team_id: Option<i64>,
    beta_team_name: Option<&str>,
    team_map: &HashMap<i64, i64>,
    beta_team_name_index: &HashMap<String, i64>,
) -> f64 {
    let (Some(alpha_team_id), Some(beta_team_name)) = (alpha_team_id, beta_team_name) else {
        return 0.0;
    };
    let Some(&mapped_beta_id) = team_map.get(&alpha_team_id) else {
        return 0.0;
    };
    let normalized = normalize_name(beta_team_name);
    match beta_team_name_index.get(&normalized) {
        Some(&resolved_beta_id) if resolved_beta_id == mapped_beta_id => 1.0,
        _ => 0.0,
    }
}

/// `team_map` is ALPHA team id → BETA team id (from the teams stage).
/// `beta_team_name_index` is normalized BETA team display name → BETA team id.
pub fn match_players(
    alpha_players: &[AlphaPlayer],
    beta_players: &[BetaPlayer],
    team_map: &HashMap<i64, i64>,
    beta_team_name_index: &HashMap<String, i64>,
    dob_partial_score: f64,
    threshold: f64,
) -> Vec<PlayerCandidate> {
    let mut out = Vec::new();
    for alpha in alpha_players {
        let alpha_norm = normalize_name(&alpha.name);
        let alpha_dob_year = alpha.dob.map(|d| d.year());
        let mut best: Option<(&BetaPlayer, f64, PlayerBreakdown)> = None;
        for beta in beta_players {
            let beta_norm = normalize_name(&beta.full_name);
            let name_similarity = token_sort_ratio(&alpha_norm, &beta_norm);
            let dob_sim = dob_similarity(alpha_dob_year, beta.birth_year, dob_partial_score);
            let team_sim = team_similarity(
                alpha.team_id,
                beta.team_name.as_deref(),
                team_map,
                beta_team_name_index,
            );
            let confidence = NAME_WEIGHT * name_similarity + DOB_WEIGHT * dob_sim + TEAM_WEIGHT * team_sim;
            let breakdown = PlayerBreakdown {
                name_similarity,
                dob_similarity: dob_sim,
                team_similarity: team_sim,
            };
            let is_better = match &best {
                Some((_, best_score, _)) => confidence > *best_score,
                None => true,
            };
            if is_better {
                best = Some((beta, confidence, breakdown));
            }
        }
        if let Some((beta, confidence, breakdown)) = best {
            if confidence >= threshold {
                out.push(PlayerCandidate {
                    alpha_player_id: alpha.player_id,
                    beta_player_id: beta.id,
                    confidence,
                    breakdown,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn happy_path_player_match() {
        let alphas = vec![AlphaPlayer {
            player_id: 1,
            name: "John Doe".to_string(),
            dob: Some(NaiveDate::from_ymd_opt(1995, 4, 10).unwrap()),
            team_id: Some(1),
            nationality: Some("England".to_string()),
            height_cm: None,
            foot: None,
        }];
        let betas = vec![BetaPlayer {
            id: 1,
            full_name: "Jon Doe".to_string(),
            birth_year: Some(1995),
            team_name: Some("City FC".to_string()),
            nationality: Some("England".to_string()),
            footedness: None,
            height_cm: None,
        }];
        let mut team_map = HashMap::new();
        team_map.insert(1, 1);
        let mut index = HashMap::new();
        index.insert(normalize_name("City FC"), 1);

        let candidates = match_players(&alphas, &betas, &team_map, &index, 0.6, 0.85);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert!(c.confidence >= 0.85);
        assert!(c.breakdown.name_similarity > 0.8);
        assert_eq!(c.breakdown.dob_similarity, 1.0);
        assert_eq!(c.breakdown.team_similarity, 1.0);
    }

    #[test]
    fn below_threshold_is_dropped() {
        let alphas = vec![AlphaPlayer {
            player_id: 1,
            name: "John Doe".to_string(),
            dob: None,
            team_id: None,
            nationality: None,
            height_cm: None,
            foot: None,
        }];
        let betas = vec![BetaPlayer {
            id: 1,
            full_name: "Someone Else".to_string(),
            birth_year: None,
            team_name: None,
            nationality: None,
            footedness: None,
            height_cm: None,
        }];
        let candidates = match_players(&alphas, &betas, &HashMap::new(), &HashMap::new(), 0.6, 0.85);
        assert!(candidates.is_empty());
    }
}
