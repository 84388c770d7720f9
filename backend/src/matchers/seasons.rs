//! Season candidate generation: every qualifying pair within a mapped competition.

use std::collections::HashMap;

use crate::domain::{AlphaSeason, BetaSeason};
use crate::normalizers::normalize_season;

#[derive(Debug, Clone)]
pub struct SeasonCandidate {
    pub alpha_season_id: i64,
    pub beta_season_id: i64,
    pub confidence: f64,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub alpha_competition_id: i64,
    pub beta_competition_id: i64,
}

/// Restricts BETA candidates to the ALPHA→BETA competition map produced by
/// the competitions stage, then compares start years: equal scores 1.0,
/// off-by-one scores 0.7, anything else 0.0. Emits every qualifying pair —
/// unlike the team/competition/player matchers this is not an argmax, since
/// the same season label can legitimately repeat across a competition.
pub fn match_seasons(
    alpha_seasons: &[AlphaSeason],
    beta_seasons: &[BetaSeason],
    competition_map: &HashMap<i64, i64>,
    threshold: f64,
) -> Vec<SeasonCandidate> {
    let mut out = Vec::new();
    for alpha in alpha_seasons {
        let Some(&beta_competition_id) = competition_map.get(&alpha.competition_id) else {
            continue;
        };
        let (alpha_start, alpha_end) = normalize_season(&alpha.name);
        let Some(alpha_start) = alpha_start else { continue };
        for beta in beta_seasons {
            if beta.competition_id != beta_competition_id {
                continue;
            }
            let (beta_start, _) = normalize_season(&beta.label);
            let Some(beta_start) = beta_start else { continue };
            let confidence = if beta_start == alpha_start {
                1.0
            } else if (beta_start - alpha_start).abs() == 1 {
                0.7
            } else {
                0.0
            };
            if confidence >= threshold {
                out.push(SeasonCandidate {
                    alpha_season_id: alpha.season_id,
                    beta_season_id: beta.id,
                    confidence,
                    start_year: Some(alpha_start),
                    end_year: alpha_end,
                    alpha_competition_id: alpha.competition_id,
                    beta_competition_id,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_every_qualifying_pair_in_mapped_competition() {
        let alphas = vec![AlphaSeason { season_id: 1, competition_id: 100, name: "2020/21".to_string() }];
        let betas = vec![
            BetaSeason { id: 200, competition_id: 900, label: "2020-2021".to_string() },
            BetaSeason { id: 201, competition_id: 900, label: "2020-2021".to_string() },
        ];
        let mut map = HashMap::new();
        map.insert(100, 900);
        let candidates = match_seasons(&alphas, &betas, &map, 0.6);
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.confidence == 1.0));
    }

    #[test]
    fn drops_unmapped_competition() {
        let alphas = vec![AlphaSeason { season_id: 1, competition_id: 100, name: "2020".to_string() }];
        let betas = vec![BetaSeason { id: 200, competition_id: 900, label: "2020".to_string() }];
        let candidates = match_seasons(&alphas, &betas, &HashMap::new(), 0.6);
        assert!(candidates.is_empty());
    }
}
