pub mod orchestrator;

pub use orchestrator::{run_pipeline, PipelineOutcome};
