pub mod adapters;
pub mod config;
pub mod llm_client;
pub mod llm_validator;
pub mod router;
pub mod schemas;

pub use adapters::ValidationCandidate;
pub use config::{FallbackMode, GrayZoneThreshold, LlmValidationConfig};
pub use llm_client::{HttpLlmClient, LlmClient, LlmClientError, MockLlmClient};
pub use router::{route_candidates, RouterDecision, RoutingOutcome, StageMetrics};
pub use schemas::{Decision, ValidationResult};
