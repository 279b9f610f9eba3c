#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::filesystem::{DirectorySource, FileRegistration};
use crate::core::ConfigProvider;
use crate::domain::model::{ServerReachability, SystemFacts};
use std::time::Duration;

pub const DEFAULT_PRODUCT_DIR: &str = "/etc/pki/product";
pub const DEFAULT_ENTITLEMENT_DIR: &str = "/etc/pki/entitlement";
pub const DEFAULT_CONSUMER_DIR: &str = "/etc/pki/consumer";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

pub fn directory_source<C: ConfigProvider + ?Sized>(config: &C) -> DirectorySource {
    DirectorySource::new(config.product_dir(), config.entitlement_dir())
}

pub fn file_registration<C: ConfigProvider + ?Sized>(config: &C) -> FileRegistration {
    let reachability = if config.server_reachable() {
        ServerReachability::Reachable
    } else {
        ServerReachability::Unreachable
    };
    FileRegistration::new(config.consumer_dir())
        .with_reachability(reachability)
        .with_registered_with_other(config.registered_with_other())
}

pub fn system_facts<C: ConfigProvider + ?Sized>(config: &C) -> SystemFacts {
    SystemFacts {
        arch: config.system_arch().to_string(),
        sockets: config.system_sockets(),
    }
}

pub fn poll_interval<C: ConfigProvider + ?Sized>(config: &C) -> Duration {
    Duration::from_secs(config.poll_interval_secs())
}
