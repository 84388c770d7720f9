//! Adapts matcher candidates into a uniform shape the router and LLM
//! validator can consume, deriving per-entity conflict flags along the way.

use std::collections::HashMap;

use serde_json::{json, Value as Json};

use crate::domain::EntityType;
use crate::matchers::{CompetitionCandidate, MatchCandidate, PlayerCandidate, SeasonCandidate, TeamCandidate};
use crate::normalizers::normalize_country;

/// A matcher candidate normalized for routing: entity-agnostic score plus a
/// signals blob the LLM prompt and the `llm_match_reviews` row both read.
#[derive(Debug, Clone)]
pub struct ValidationCandidate {
    pub entity_type: EntityType,
    pub left_id: String,
    pub right_id: String,
    pub matcher_score: f64,
    pub signals: Json,
    pub conflict: bool,
}

pub fn adapt_team_candidate(candidate: &TeamCandidate, beta_country: Option<&str>, countries: &HashMap<String, String>) -> ValidationCandidate {
    let alpha_country = candidate.country.as_deref().map(|c| normalize_country(c, countries));
    let beta_country_norm = beta_country.map(|c| normalize_country(c, countries));
    let conflict = match (&alpha_country, &beta_country_norm) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    };
    ValidationCandidate {
        entity_type: EntityType::Team,
        left_id: candidate.alpha_team_id.to_string(),
        right_id: candidate.beta_team_id.to_string(),
        matcher_score: candidate.confidence,
        signals: json!({
            "name": candidate.name,
            "alpha_country": alpha_country,
            "beta_country": beta_country_norm,
        }),
        conflict,
    }
}

pub fn adapt_competition_candidate(
    candidate: &CompetitionCandidate,
    beta_country: Option<&str>,
    countries: &HashMap<String, String>,
) -> ValidationCandidate {
    let alpha_country = candidate.country.as_deref().map(|c| normalize_country(c, countries));
    let beta_country_norm = beta_country.map(|c| normalize_country(c, countries));
    let conflict = match (&alpha_country, &beta_country_norm) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    };
    ValidationCandidate {
        entity_type: EntityType::Competition,
        left_id: candidate.alpha_competition_id.to_string(),
        right_id: candidate.beta_competition_id.to_string(),
        matcher_score: candidate.confidence,
        signals: json!({
            "name": candidate.name,
            "alpha_country": alpha_country,
            "beta_country": beta_country_norm,
        }),
        conflict,
    }
}

pub fn adapt_season_candidate(candidate: &SeasonCandidate, beta_start_year: Option<i32>) -> ValidationCandidate {
    let conflict = match (candidate.start_year, beta_start_year) {
        (Some(a), Some(b)) => (a - b).abs() > 1,
        _ => false,
    };
    ValidationCandidate {
        entity_type: EntityType::Season,
        left_id: candidate.alpha_season_id.to_string(),
        right_id: candidate.beta_season_id.to_string(),
        matcher_score: candidate.confidence,
        signals: json!({
            "alpha_start_year": candidate.start_year,
            "alpha_end_year": candidate.end_year,
            "beta_start_year": beta_start_year,
        }),
        conflict,
    }
}

pub fn adapt_player_candidate(
    candidate: &PlayerCandidate,
    alpha_dob_year: Option<i32>,
    beta_birth_year: Option<i32>,
) -> ValidationCandidate {
    let conflict = match (alpha_dob_year, beta_birth_year) {
        (Some(a), Some(b)) => (a - b).abs() > 1,
        _ => false,
    };
    ValidationCandidate {
        entity_type: EntityType::Player,
        left_id: candidate.alpha_player_id.to_string(),
        right_id: candidate.beta_player_id.to_string(),
        matcher_score: candidate.confidence,
        signals: json!({
            "name_similarity": candidate.breakdown.name_similarity,
            "dob_similarity": candidate.breakdown.dob_similarity,
            "team_similarity": candidate.breakdown.team_similarity,
            "alpha_dob_year": alpha_dob_year,
            "beta_birth_year": beta_birth_year,
        }),
        conflict,
    }
}

pub fn adapt_match_candidate(candidate: &MatchCandidate, alpha_date_days: Option<i64>, beta_date_days: Option<i64>) -> ValidationCandidate {
    let conflict = match (alpha_date_days, beta_date_days) {
        (Some(a), Some(b)) => (a - b).abs() > 2,
        _ => false,
    };
    ValidationCandidate {
        entity_type: EntityType::Match,
        left_id: candidate.alpha_match_id.to_string(),
        right_id: candidate.beta_match_id.to_string(),
        matcher_score: candidate.confidence,
        signals: json!({ "date_similarity": candidate.date_similarity }),
        conflict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_country_mismatch_is_a_conflict() {
        let candidate = TeamCandidate {
            alpha_team_id: 1,
            beta_team_id: 2,
            confidence: 0.9,
            name: "X".to_string(),
            country: Some("England".to_string()),
        };
        let adapted = adapt_team_candidate(&candidate, Some("Spain"), &HashMap::new());
        assert!(adapted.conflict);
    }

    #[test]
    fn season_off_by_more_than_one_is_a_conflict() {
        let candidate = SeasonCandidate {
            alpha_season_id: 1,
            beta_season_id: 2,
            confidence: 0.7,
            start_year: Some(2020),
            end_year: Some(2021),
            alpha_competition_id: 1,
            beta_competition_id: 1,
        };
        let adapted = adapt_season_candidate(&candidate, Some(2025));
        assert!(adapted.conflict);
    }
}
