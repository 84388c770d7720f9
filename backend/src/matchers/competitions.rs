//! Competition candidate generation: argmax over normalized-competition-name similarity.

use crate::domain::{AlphaCompetition, BetaCompetition};
use crate::normalizers::{normalize_competition, token_sort_ratio};

#[derive(Debug, Clone)]
pub struct CompetitionCandidate {
    pub alpha_competition_id: i64,
    pub beta_competition_id: i64,
    pub confidence: f64,
    pub name: String,
    pub country: Option<String>,
}

pub fn match_competitions(
    alpha_competitions: &[AlphaCompetition],
    beta_competitions: &[BetaCompetition],
    sponsor_phrases: &[String],
    threshold: f64,
) -> Vec<CompetitionCandidate> {
    let mut out = Vec::new();
    for alpha in alpha_competitions {
        let alpha_norm = normalize_competition(&alpha.name, sponsor_phrases);
        let mut best: Option<(&BetaCompetition, f64)> = None;
        for beta in beta_competitions {
            let beta_norm = normalize_competition(&beta.title, sponsor_phrases);
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
                let country = alpha.country.clone().or_else(|| beta.locale.clone());
                out.push(CompetitionCandidate {
                    alpha_competition_id: alpha.competition_id,
                    beta_competition_id: beta.id,
                    confidence: score,
                    name: alpha.name.clone(),
                    country,
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
    fn matches_after_sponsor_strip() {
        let alphas = vec![AlphaCompetition {
            competition_id: 1,
            name: "Premier League".to_string(),
            country: Some("England".to_string()),
        }];
        let betas = vec![BetaCompetition {
            id: 20,
            title: "Barclays Premier League".to_string(),
            locale: Some("en-GB".to_string()),
        }];
        let sponsors = vec!["Barclays".to_string()];
        let candidates = match_competitions(&alphas, &betas, &sponsors, 0.6);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].beta_competition_id, 20);
    }

    #[test]
    fn falls_back_to_beta_locale_when_alpha_country_absent() {
        let alphas = vec![AlphaCompetition {
            competition_id: 1,
            name: "Serie A".to_string(),
            country: None,
        }];
        let betas = vec![BetaCompetition {
            id: 20,
            title: "Serie A".to_string(),
            locale: Some("it-IT".to_string()),
        }];
        let candidates = match_competitions(&alphas, &betas, &[], 0.6);
        assert_eq!(candidates[0].country, Some("it-IT".to_string()));
    }
}
