//! Process-wide configuration: five YAML files plus environment-derived
//! server/database/admin settings, loaded once into a single immutable
//! bundle (mirrors the teacher's `Config::load()` pattern: file → env
//! override → validate, generalized from one TOML file to five YAML ones).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::EntityType;
use crate::qa::gates::QualityGateConfig;
use crate::validation::config::{CircuitBreakerConfig, FallbackMode, GrayZoneThreshold, LlmValidationConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub thresholds: ThresholdsConfig,
    pub llm_validation: LlmValidationConfig,
    pub quality_gates: QualityGateConfig,
    pub normalization: NormalizationConfig,
    pub mapping_rules: MappingRulesConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub alpha_url: String,
    pub beta_url: String,
    pub ues_url: String,
    pub internal_api_key: Option<String>,
    pub auto_triage_during_mapping: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            alpha_url: "sqlite://data/alpha.db".to_string(),
            beta_url: "sqlite://data/beta.db".to_string(),
            ues_url: "sqlite://data/ues.db".to_string(),
            internal_api_key: None,
            auto_triage_during_mapping: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    #[serde(rename = "TEAM_SIM_THRESHOLD")]
    pub team_sim_threshold: f64,
    #[serde(rename = "COMP_SIM_THRESHOLD")]
    pub comp_sim_threshold: f64,
    #[serde(rename = "CONFIDENCE_REVIEW")]
    pub confidence_review: f64,
    #[serde(rename = "CONFIDENCE_AUTOPASS")]
    pub confidence_autopass: f64,
    #[serde(rename = "DOB_PARTIAL_SCORE")]
    pub dob_partial_score: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            team_sim_threshold: 0.7,
            comp_sim_threshold: 0.75,
            confidence_review: 0.6,
            confidence_autopass: 0.85,
            dob_partial_score: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub countries: HashMap<String, String>,
    pub competition_sponsors: Vec<String>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        let mut countries = HashMap::new();
        for (alias, canonical) in [
            ("uk", "England"),
            ("united kingdom", "England"),
            ("gb", "England"),
            ("usa", "United States"),
            ("us", "United States"),
        ] {
            countries.insert(alias.to_string(), canonical.to_string());
        }
        Self { countries, competition_sponsors: vec!["Barclays".to_string(), "Emirates".to_string()] }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MappingRulesConfig {
    pub team_name_aliases: HashMap<String, String>,
}

impl Default for MappingRulesConfig {
    fn default() -> Self {
        Self { team_name_aliases: HashMap::new() }
    }
}

/// On-disk shape of `llm_validation.yml`. Bridged into `LlmValidationConfig`
/// at load time since the model/api_url are resolved from env var *names*
/// (`provider_env`, `model_env`) rather than stored literally.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct LlmValidationFile {
    enabled: bool,
    mapping_enabled: Option<bool>,
    reporting_enabled: Option<bool>,
    gray_zone: HashMap<EntityType, GrayZoneThreshold>,
    internal_api_key_env: String,
    provider_env: String,
    model_env: String,
    api_key_env: String,
    timeout_s: f64,
    max_calls_per_entity_type_per_run: u32,
    circuit_breaker: CircuitBreakerConfig,
    fallback_mode_when_llm_unhealthy: FallbackMode,
}

impl Default for LlmValidationFile {
    fn default() -> Self {
        let default_thresholds = LlmValidationConfig::default().thresholds;
        Self {
            enabled: true,
            mapping_enabled: None,
            reporting_enabled: None,
            gray_zone: default_thresholds,
            internal_api_key_env: "INTERNAL_API_KEY".to_string(),
            provider_env: "LLM_PROVIDER".to_string(),
            model_env: "LLM_MODEL".to_string(),
            api_key_env: "LLM_API_KEY".to_string(),
            timeout_s: 15.0,
            max_calls_per_entity_type_per_run: 500,
            circuit_breaker: CircuitBreakerConfig::default(),
            fallback_mode_when_llm_unhealthy: FallbackMode::Review,
        }
    }
}

/// Provider name (read from the configured `provider_env` var) to chat
/// completion endpoint. Unknown/absent provider falls back to OpenAI's URL,
/// matching the teacher's "warn and use a sane default" posture.
fn api_url_for_provider(provider: &str) -> &'static str {
    match provider {
        "anthropic" => "https://api.anthropic.com/v1/messages",
        _ => "https://api.openai.com/v1/chat/completions",
    }
}

impl From<LlmValidationFile> for LlmValidationConfig {
    fn from(file: LlmValidationFile) -> Self {
        let provider = std::env::var(&file.provider_env).unwrap_or_default();
        let model = std::env::var(&file.model_env).unwrap_or_else(|_| "gpt-4o-mini".to_string());
        Self {
            api_url: api_url_for_provider(&provider).to_string(),
            api_key_env: file.api_key_env,
            model,
            timeout_s: file.timeout_s,
            max_calls_per_entity_type_per_run: file.max_calls_per_entity_type_per_run,
            fallback_mode_when_llm_unhealthy: file.fallback_mode_when_llm_unhealthy,
            mapping_llm_enabled_flag: file.enabled && file.mapping_enabled.unwrap_or(true),
            reporting_llm_enabled_flag: file.enabled && file.reporting_enabled.unwrap_or(true),
            circuit: file.circuit_breaker,
            thresholds: file.gray_zone,
        }
    }
}

impl Config {
    /// Loading order: each of the five YAML files (falling back to its
    /// `Default` when absent from disk), then environment variable
    /// overrides for server/database/admin settings, then validation.
    pub fn load() -> Result<Self, anyhow::Error> {
        let thresholds = Self::load_yaml_or_default::<ThresholdsConfig>("thresholds.yml");
        let llm_file = Self::load_yaml_or_default::<LlmValidationFile>("llm_validation.yml");
        let quality_gates = Self::load_yaml_or_default::<QualityGateConfig>("quality_gates.yml");
        let normalization = Self::load_yaml_or_default::<NormalizationConfig>("normalization.yml");
        let mapping_rules = Self::load_yaml_or_default::<MappingRulesConfig>("mapping_rules.yml");

        let mut database = DatabaseConfig::default();
        database.internal_api_key =
            std::env::var(&llm_file.internal_api_key_env).ok().or_else(|| std::env::var("INTERNAL_API_KEY").ok());

        let mut config = Self {
            server: ServerConfig::default(),
            database,
            thresholds,
            llm_validation: llm_file.into(),
            quality_gates,
            normalization,
            mapping_rules,
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Supported environment variables:
    /// - `APP_SERVER_HOST` / `APP_SERVER_PORT`
    /// - `SOURCE_ALPHA_DB_URL` / `SOURCE_BETA_DB_URL` / `UES_DB_URL`
    /// - `AUTO_TRIAGE_DURING_MAPPING` (boolean)
    /// - `INTERNAL_API_KEY` (already layered in during `load`, re-checked here)
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("override server.host from env");
        }
        if let Ok(port) = std::env::var("APP_SERVER_PORT") {
            match port.parse() {
                Ok(port) => {
                    self.server.port = port;
                    tracing::info!(port, "override server.port from env");
                }
                Err(_) => tracing::warn!(%port, "invalid APP_SERVER_PORT, keeping default"),
            }
        }
        if let Ok(url) = std::env::var("SOURCE_ALPHA_DB_URL") {
            self.database.alpha_url = url;
        }
        if let Ok(url) = std::env::var("SOURCE_BETA_DB_URL") {
            self.database.beta_url = url;
        }
        if let Ok(url) = std::env::var("UES_DB_URL") {
            self.database.ues_url = url;
        }
        if let Ok(raw) = std::env::var("AUTO_TRIAGE_DURING_MAPPING") {
            self.database.auto_triage_during_mapping = matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(key) = std::env::var("INTERNAL_API_KEY") {
            self.database.internal_api_key = Some(key);
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("server port cannot be 0");
        }
        if self.database.internal_api_key.is_none() {
            tracing::warn!("INTERNAL_API_KEY is not set; admin routes will reject every request");
        }
        for entity_type in EntityType::ALL {
            let threshold = self.llm_validation.threshold_for(entity_type);
            if threshold.low > threshold.high {
                anyhow::bail!("llm_validation gray_zone threshold for {entity_type}: low > high");
            }
        }
        Ok(())
    }

    /// Candidate search paths mirror the teacher's `find_config_file`:
    /// current directory, `./config/`, then `/etc/ues/`.
    fn find_config_file(filename: &str) -> Option<PathBuf> {
        let candidates =
            [PathBuf::from(filename), PathBuf::from("config").join(filename), PathBuf::from("/etc/ues").join(filename)];
        candidates.into_iter().find(|path| path.exists())
    }

    fn load_yaml_or_default<T>(filename: &str) -> T
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        match Self::find_config_file(filename) {
            Some(path) => match Self::read_yaml(&path) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(file = %filename, error = %err, "failed to parse config file, using defaults");
                    T::default()
                }
            },
            None => {
                tracing::warn!(file = %filename, "config file not found, using defaults");
                T::default()
            }
        }
    }

    fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_default_matches_spec_defaults() {
        let thresholds = ThresholdsConfig::default();
        assert_eq!(thresholds.team_sim_threshold, 0.7);
        assert_eq!(thresholds.confidence_autopass, 0.85);
    }

    #[test]
    fn llm_validation_file_bridges_into_runtime_config() {
        let file = LlmValidationFile { enabled: true, mapping_enabled: Some(false), ..LlmValidationFile::default() };
        let runtime: LlmValidationConfig = file.into();
        assert!(!runtime.mapping_llm_enabled_flag);
        assert!(runtime.reporting_llm_enabled_flag);
    }
}
