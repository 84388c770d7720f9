//! LLM validation configuration: gray-zone thresholds, circuit breaker, and
//! the health/env-var gate that decides whether the LLM path is usable at all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::EntityType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrayZoneThreshold {
    pub low: f64,
    pub high: f64,
}

impl Default for GrayZoneThreshold {
    fn default() -> Self {
        Self { low: 0.6, high: 0.85 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub window: usize,
    pub max_fail_rate: f64,
    pub max_invalid_json_rate: f64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { window: 20, max_fail_rate: 0.5, max_invalid_json_rate: 0.3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    AutoApprove,
    Review,
}

impl FallbackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoApprove => "auto_approve",
            Self::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmValidationConfig {
    pub api_url: String,
    pub api_key_env: String,
    pub model: String,
    pub timeout_s: f64,
    pub max_calls_per_entity_type_per_run: u32,
    pub fallback_mode_when_llm_unhealthy: FallbackMode,
    pub mapping_llm_enabled_flag: bool,
    pub reporting_llm_enabled_flag: bool,
    pub circuit: CircuitBreakerConfig,
    pub thresholds: HashMap<EntityType, GrayZoneThreshold>,
}

impl Default for LlmValidationConfig {
    fn default() -> Self {
        let mut thresholds = HashMap::new();
        thresholds.insert(EntityType::Team, GrayZoneThreshold { low: 0.5, high: 0.7 });
        thresholds.insert(EntityType::Competition, GrayZoneThreshold { low: 0.5, high: 0.75 });
        thresholds.insert(EntityType::Season, GrayZoneThreshold { low: 0.3, high: 0.6 });
        thresholds.insert(EntityType::Player, GrayZoneThreshold { low: 0.6, high: 0.85 });
        thresholds.insert(EntityType::Match, GrayZoneThreshold { low: 0.6, high: 0.7 });
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key_env: "LLM_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_s: 15.0,
            max_calls_per_entity_type_per_run: 500,
            fallback_mode_when_llm_unhealthy: FallbackMode::Review,
            mapping_llm_enabled_flag: true,
            reporting_llm_enabled_flag: true,
            circuit: CircuitBreakerConfig::default(),
            thresholds,
        }
    }
}

impl LlmValidationConfig {
    pub fn threshold_for(&self, entity_type: EntityType) -> GrayZoneThreshold {
        self.thresholds.get(&entity_type).copied().unwrap_or_default()
    }

    /// Mirrors the upstream computed property: the feature flag AND a
    /// present API key environment variable.
    pub fn mapping_llm_enabled(&self) -> bool {
        self.mapping_llm_enabled_flag && std::env::var(&self.api_key_env).is_ok()
    }

    pub fn reporting_llm_enabled(&self) -> bool {
        self.reporting_llm_enabled_flag && std::env::var(&self.api_key_env).is_ok()
    }
}
