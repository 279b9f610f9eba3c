pub mod attribution;
pub mod date_range;
pub mod engine;
pub mod export;
pub mod report;
pub mod sorter;
pub mod store;
pub mod watcher;

#[cfg(test)]
pub(crate) mod fixtures;

pub use crate::domain::model::{ComplianceStatus, DateRange, SystemStatus};
pub use crate::domain::ports::{
    CertificateSource, Clock, ComplianceObserver, ConfigProvider, RegistrationProvider,
};
pub use crate::utils::error::Result;
