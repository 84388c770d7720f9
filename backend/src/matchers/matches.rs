//! Match candidate generation: id-aligned team/competition/season restriction
//! plus a date-proximity score.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{AlphaMatch, BetaMatch};
use crate::normalizers::normalize_name;

#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub alpha_match_id: i64,
    pub beta_match_id: i64,
    pub confidence: f64,
    pub date_similarity: f64,
}

const TEAM_WEIGHT: f64 = 0.4;
const DATE_WEIGHT: f64 = 0.3;
const BASE_SCORE: f64 = 0.3;

fn date_similarity(a: Option<NaiveDate>, b: Option<NaiveDate>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a == b => 1.0,
        (Some(a), Some(b)) if (a - b).num_days().abs() <= 1 => 0.8,
        _ => 0.0,
    }
}

/// Resolves a BETA team id directly when present, else via normalized-name
/// lookup into `beta_team_lookup` (normalized team display name → id). The
/// orchestrator passes an empty lookup, making this effectively the
/// stricter id-only form; the parameter stays for the name-tolerant path.
fn resolve_beta_team_id(
    direct: Option<i64>,
    name: Option<&str>,
    beta_team_lookup: &HashMap<String, i64>,
) -> Option<i64> {
    if let Some(id) = direct {
        return Some(id);
    }
    let name = name?;
    beta_team_lookup.get(&normalize_name(name)).copied()
}

/// `competition_map`/`season_map` are ALPHA id → BETA id, from the
/// competitions/seasons stages. `team_map` is ALPHA team id → BETA team id.
pub fn match_matches(
    alpha_matches: &[AlphaMatch],
    beta_matches: &[BetaMatch],
    competition_map: &HashMap<i64, i64>,
    season_map: &HashMap<i64, i64>,
    team_map: &HashMap<i64, i64>,
    beta_team_lookup: &HashMap<String, i64>,
    threshold: f64,
) -> Vec<MatchCandidate> {
    let mut out = Vec::new();
    for alpha in alpha_matches {
        let Some(&beta_competition_id) = competition_map.get(&alpha.competition_id) else {
            continue;
        };
        let Some(&beta_season_id) = season_map.get(&alpha.season_id) else {
            continue;
        };
        let expected_home = team_map.get(&alpha.home_team_id).copied();
        let expected_away = team_map.get(&alpha.away_team_id).copied();

        for beta in beta_matches {
            if beta.competition_id != beta_competition_id || beta.season_id != beta_season_id {
                continue;
            }
            let resolved_home = resolve_beta_team_id(beta.home_team_id, beta.home_team.as_deref(), beta_team_lookup);
            let resolved_away = resolve_beta_team_id(beta.away_team_id, beta.away_team.as_deref(), beta_team_lookup);
            if resolved_home.is_none() || resolved_home != expected_home {
                continue;
            }
            if resolved_away.is_none() || resolved_away != expected_away {
                continue;
            }
            let date_sim = date_similarity(alpha.match_date, beta.match_date);
            let confidence = TEAM_WEIGHT * 1.0 + DATE_WEIGHT * date_sim + BASE_SCORE;
            if confidence >= threshold {
                out.push(MatchCandidate {
                    alpha_match_id: alpha.match_id,
                    beta_match_id: beta.id,
                    confidence,
                    date_similarity: date_sim,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_match() -> AlphaMatch {
        AlphaMatch {
            match_id: 1,
            competition_id: 100,
            season_id: 200,
            home_team_id: 10,
            away_team_id: 20,
            match_date: NaiveDate::from_ymd_opt(2021, 5, 1),
        }
    }

    #[test]
    fn rejects_misaligned_team_ids() {
        let alphas = vec![AlphaMatch { home_team_id: 10, away_team_id: 20, ..alpha_match() }];
        let betas = vec![BetaMatch {
            id: 900,
            competition_id: 900,
            season_id: 901,
            home_team_id: Some(30),
            away_team_id: Some(40),
            home_team: None,
            away_team: None,
            match_date: NaiveDate::from_ymd_opt(2021, 5, 1),
        }];
        let mut competition_map = HashMap::new();
        competition_map.insert(100, 900);
        let mut season_map = HashMap::new();
        season_map.insert(200, 901);
        let mut team_map = HashMap::new();
        team_map.insert(10, 11);
        team_map.insert(20, 22);

        let candidates = match_matches(&alphas, &betas, &competition_map, &season_map, &team_map, &HashMap::new(), 0.6);
        assert!(candidates.is_empty());
    }

    #[test]
    fn accepts_aligned_ids_with_exact_date() {
        let alphas = vec![alpha_match()];
        let betas = vec![BetaMatch {
            id: 900,
            competition_id: 900,
            season_id: 901,
            home_team_id: Some(11),
            away_team_id: Some(22),
            home_team: None,
            away_team: None,
            match_date: NaiveDate::from_ymd_opt(2021, 5, 1),
        }];
        let mut competition_map = HashMap::new();
        competition_map.insert(100, 900);
        let mut season_map = HashMap::new();
        season_map.insert(200, 901);
        let mut team_map = HashMap::new();
        team_map.insert(10, 11);
        team_map.insert(20, 22);

        let candidates = match_matches(&alphas, &betas, &competition_map, &season_map, &team_map, &HashMap::new(), 0.6);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].date_similarity, 1.0);
    }
}
