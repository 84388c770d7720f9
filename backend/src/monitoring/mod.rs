pub mod anomaly;
pub mod triage;

pub use anomaly::{detect_anomalies, AnomalyEvent, StageRates};
pub use triage::{generate_triage_report, TriageReport};
