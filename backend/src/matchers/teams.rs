//! Team candidate generation: argmax over normalized-name similarity.

use std::collections::HashMap;

use crate::domain::{AlphaTeam, BetaTeam};
use crate::normalizers::{normalize_name, token_sort_ratio};

#[derive(Debug, Clone)]
pub struct TeamCandidate {
    pub alpha_team_id: i64,
    pub beta_team_id: i64,
    pub confidence: f64,
    pub name: String,
    pub country: Option<String>,
}

/// Case-insensitive alias substitution applied before normalization, so a
/// configured alias (`"Man Utd" -> "Manchester United"`) counts as an exact
/// token match rather than relying on similarity alone.
fn apply_alias<'a>(name: &'a str, aliases: &'a HashMap<String, String>) -> &'a str {
    aliases.get(&name.to_lowercase()).map(String::as_str).unwrap_or(name)
}

/// For each ALPHA team, picks the BETA team maximizing `token_sort_ratio` over
/// normalized (alias-expanded) names; emits a candidate only when the winning
/// score clears `threshold`. Ties keep the first (lowest-id, by source order)
/// BETA team.
pub fn match_teams(
    alpha_teams: &[AlphaTeam],
    beta_teams: &[BetaTeam],
    aliases: &HashMap<String, String>,
    threshold: f64,
) -> Vec<TeamCandidate> {
    let mut out = Vec::new();
    for alpha in alpha_teams {
        let alpha_norm = normalize_name(apply_alias(&alpha.name, aliases));
        let mut best: Option<(&BetaTeam, f64)> = None;
        for beta in beta_teams {
            let beta_norm = normalize_name(apply_alias(&beta.display_name, aliases));
            let score = token_sort_ratio(&alpha_norm, &beta_norm);
            let is_better = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if is_better {
                best = Some((beta, score));
            }
        }
        if let Some((beta, score)) = best {
            if score >= threshold {
                out.push(TeamCandidate {
                    alpha_team_id: alpha.team_id,
                    beta_team_id: beta.id,
                    confidence: score,
                    name: alpha.name.clone(),
                    country: alpha.country.clone(),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(id: i64, name: &str) -> AlphaTeam {
        AlphaTeam { team_id: id, name: name.to_string(), country: Some("England".to_string()) }
    }

    fn beta(id: i64, name: &str) -> BetaTeam {
        BetaTeam { id, display_name: name.to_string(), region: Some("England".to_string()) }
    }

    #[test]
    fn picks_best_scoring_beta_team() {
        let alphas = vec![alpha(1, "Manchester United")];
        let betas = vec![beta(10, "Man Utd"), beta(11, "Manchester United FC")];
        let candidates = match_teams(&alphas, &betas, &HashMap::new(), 0.5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].beta_team_id, 11);
    }

    #[test]
    fn drops_pairs_below_threshold() {
        let alphas = vec![alpha(1, "Manchester United")];
        let betas = vec![beta(10, "Totally Unrelated")];
        let candidates = match_teams(&alphas, &betas, &HashMap::new(), 0.7);
        assert!(candidates.is_empty());
    }

    #[test]
    fn alias_table_resolves_otherwise_dissimilar_names() {
        let alphas = vec![alpha(1, "Man Utd")];
        let betas = vec![beta(10, "Manchester United")];
        let mut aliases = HashMap::new();
        aliases.insert("man utd".to_string(), "Manchester United".to_string());
        let candidates = match_teams(&alphas, &betas, &aliases, 0.9);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].confidence, 1.0);
    }
}
