pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::filesystem::{DirectorySource, FileRegistration};
pub use adapters::memory::MemorySource;
pub use crate::core::{
    date_range::DateRangeCalculator, engine::ComplianceEngine, sorter::ComplianceSorter,
    store::CertificateStore,
};
pub use domain::model::{ComplianceStatus, DateRange, SystemStatus, UnknownReason};
pub use domain::report::ComplianceReport;
pub use utils::error::{ComplianceError, Result};
