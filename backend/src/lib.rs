//! Unified Entity Store: reconciles the ALPHA and BETA football data
//! sources into canonical entities through a five-stage resolution
//! pipeline, with gray-zone LLM adjudication, anomaly detection, and
//! quality gates along the way.

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod matchers;
pub mod mergers;
pub mod monitoring;
pub mod normalizers;
pub mod pipeline;
pub mod qa;
pub mod validation;

use std::sync::Arc;

use config::Config;
use db::DbPools;
use validation::llm_client::{HttpLlmClient, LlmClient};

/// Shared state handed to every HTTP handler and the CLI's `run` command.
#[derive(Clone)]
pub struct AppState {
    pub pools: DbPools,
    pub config: Arc<Config>,
    pub llm_client: Arc<dyn LlmClient>,
}

impl AppState {
    pub async fn init(config: Config) -> error::ApiResult<Self> {
        let pools = DbPools::connect(&config.database.alpha_url, &config.database.beta_url, &config.database.ues_url).await?;
        pools.migrate().await?;
        let llm_client: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(
            config.llm_validation.api_url.clone(),
            std::env::var(&config.llm_validation.api_key_env).unwrap_or_default(),
            config.llm_validation.model.clone(),
            config.llm_validation.timeout_s,
        ));
        Ok(Self { pools, config: Arc::new(config), llm_client })
    }

    pub async fn run_pipeline(&self, run_id: Option<String>) -> error::ApiResult<pipeline::PipelineOutcome> {
        pipeline::run_pipeline(&self.pools, &self.config, self.llm_client.as_ref(), run_id).await
    }
}
