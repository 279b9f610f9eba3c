use crate::domain::model::{EntitlementCertificate, IdentityState, ProductCertificate};
use crate::domain::report::ComplianceReport;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Where installed-product and entitlement certificates come from.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn load_products(&self) -> Result<Vec<ProductCertificate>>;
    async fn load_entitlements(&self) -> Result<Vec<EntitlementCertificate>>;
    /// Changes whenever the underlying certificates change.
    async fn revision(&self) -> Result<u64>;
}

pub trait RegistrationProvider: Send + Sync {
    fn current(&self) -> Result<IdentityState>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Notified with a fresh report after every reload.
pub trait ComplianceObserver: Send + Sync {
    fn on_compliance_changed(&self, report: &ComplianceReport);
}

pub trait ConfigProvider: Send + Sync {
    fn product_dir(&self) -> &str;
    fn entitlement_dir(&self) -> &str;
    fn consumer_dir(&self) -> &str;
    fn system_arch(&self) -> &str;
    fn system_sockets(&self) -> u32;
    fn server_reachable(&self) -> bool;
    fn registered_with_other(&self) -> bool;
    fn poll_interval_secs(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A registration provider that always reports the same state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRegistration(pub IdentityState);

impl RegistrationProvider for StaticRegistration {
    fn current(&self) -> Result<IdentityState> {
        Ok(self.0)
    }
}
