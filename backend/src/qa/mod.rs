pub mod gates;
pub mod report;

pub use gates::{evaluate_quality_gates, GateStatus, QualityGateConfig, QualityGateResult};
pub use report::{build_quality_report, QualityReport};
