//! Aggregation, trend, comparison and projection over university degree-modality records.
//!
//! Raw rows are normalized into [`ModalityRecord`]s once; every report is then a pure
//! function of those records, a [`ReportScope`] and an [`EngineConfig`].

pub mod aggregate;
pub mod classify;
pub mod compare;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod performance;
pub mod period;
pub mod projection;
pub mod report;
pub mod stats;
pub mod trend;

pub use config::EngineConfig;
pub use error::{ConfigError, NormalizationError, ParseEnumError};
pub use filter::FilterSpec;
pub use models::ModalityRecord;
pub use normalize::{normalize, normalize_all, NormalizedBatch, RawModalityRecord};
pub use period::AcademicPeriod;
pub use report::{build_report, Report, ReportKind, ReportRequest, ReportScope};
