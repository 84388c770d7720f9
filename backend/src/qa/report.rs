//! Thin re-export point: the actual aggregation query lives in
//! `db::reader::build_quality_report` since it is a pure read with no
//! dependency beyond the connection pool.

pub use crate::db::reader::{build_quality_report, QualityReport};
