use crate::core::date_range::DateRangeCalculator;
use crate::core::report::build_report;
use crate::core::sorter::ComplianceSorter;
use crate::core::store::CertificateStore;
use crate::domain::model::{IdentityState, SystemFacts};
use crate::domain::ports::{CertificateSource, Clock, ComplianceObserver, RegistrationProvider};
use crate::domain::report::ComplianceReport;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Certificates and identity as they were at one reload.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub store: CertificateStore,
    pub identity: IdentityState,
    pub loaded_at: Option<DateTime<Utc>>,
}

pub struct ComplianceEngine<S: CertificateSource, R: RegistrationProvider, C: Clock> {
    source: S,
    registration: R,
    clock: C,
    facts: SystemFacts,
    snapshot: Arc<Snapshot>,
    observers: Vec<Box<dyn ComplianceObserver>>,
}

impl<S: CertificateSource, R: RegistrationProvider, C: Clock> ComplianceEngine<S, R, C> {
    pub fn new(source: S, registration: R, clock: C, facts: SystemFacts) -> Self {
        Self {
            source,
            registration,
            clock,
            facts,
            snapshot: Arc::new(Snapshot::default()),
            observers: Vec::new(),
        }
    }

    /// Builds the engine and performs the first load.
    pub async fn load(source: S, registration: R, clock: C, facts: SystemFacts) -> Result<Self> {
        let mut engine = Self::new(source, registration, clock, facts);
        engine.reload().await?;
        Ok(engine)
    }

    pub async fn reload(&mut self) -> Result<Arc<Snapshot>> {
        let product_certs = self.source.load_products().await?;
        let entitlements = self.source.load_entitlements().await?;

        // 無法判斷註冊狀態時視為未註冊，產品會被歸類為 Unknown
        let identity = match self.registration.current() {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Could not determine registration state: {}", e);
                IdentityState::unregistered()
            }
        };

        tracing::info!(
            "🔄 Loaded {} product certificates and {} entitlement certificates (registered: {})",
            product_certs.len(),
            entitlements.len(),
            identity.registered
        );

        self.snapshot = Arc::new(Snapshot {
            store: CertificateStore::new(product_certs, entitlements),
            identity,
            loaded_at: Some(self.clock.now()),
        });
        Ok(Arc::clone(&self.snapshot))
    }

    pub async fn source_revision(&self) -> Result<u64> {
        self.source.revision().await
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn facts(&self) -> &SystemFacts {
        &self.facts
    }

    pub fn sorter(&self) -> ComplianceSorter<'_> {
        ComplianceSorter::new(
            &self.snapshot.store,
            self.snapshot.identity,
            self.facts.clone(),
            self.clock.now(),
        )
    }

    pub fn range_calculator(&self) -> DateRangeCalculator<'_> {
        DateRangeCalculator::new(&self.snapshot.store, self.clock.now())
    }

    pub fn report(&self) -> ComplianceReport {
        build_report(&self.sorter())
    }

    pub fn subscribe(&mut self, observer: Box<dyn ComplianceObserver>) {
        self.observers.push(observer);
    }

    /// Reloads everything and pushes the new report to every observer.
    pub async fn refresh(&mut self) -> Result<ComplianceReport> {
        self.reload().await?;
        let report = self.report();

        tracing::info!(
            "System status: {} ({} products, notifying {} observers)",
            report.summary.status,
            report.products.len(),
            self.observers.len()
        );
        for observer in &self.observers {
            observer.on_compliance_changed(&report);
        }
        Ok(report)
    }
}
