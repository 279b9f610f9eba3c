use crate::core::date_range::DateRangeCalculator;
use crate::core::store::CertificateStore;
use crate::domain::model::{
    ComplianceStatus, DateRange, EntitlementCertificate, IdentityState, ServerReachability,
    SystemFacts, SystemStatus, UnknownReason,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Classifies every installed product against the entitlement certificates
/// of one snapshot at one evaluation instant.
///
/// All results are computed up front in [`ComplianceSorter::new`]; a reload
/// builds a new sorter instead of mutating this one.
#[derive(Debug, Clone)]
pub struct ComplianceSorter<'a> {
    store: &'a CertificateStore,
    identity: IdentityState,
    facts: SystemFacts,
    now: DateTime<Utc>,
    statuses: Vec<(String, ComplianceStatus)>,
    status_by_product: HashMap<String, ComplianceStatus>,
    ranges: HashMap<String, DateRange>,
    valid_entitlement_certs: Vec<&'a EntitlementCertificate>,
    expired_products: Vec<String>,
    unentitled_products: Vec<String>,
    future_products: Vec<String>,
    partially_valid_products: Vec<String>,
}

impl<'a> ComplianceSorter<'a> {
    pub fn new(
        store: &'a CertificateStore,
        identity: IdentityState,
        facts: SystemFacts,
        now: DateTime<Utc>,
    ) -> Self {
        let valid_entitlement_certs = store
            .entitlements()
            .iter()
            .filter(|cert| cert.is_valid_at(now))
            .collect();

        let mut sorter = Self {
            store,
            identity,
            facts,
            now,
            statuses: Vec::new(),
            status_by_product: HashMap::new(),
            ranges: HashMap::new(),
            valid_entitlement_certs,
            expired_products: Vec::new(),
            unentitled_products: Vec::new(),
            future_products: Vec::new(),
            partially_valid_products: Vec::new(),
        };
        sorter.sort_products();
        sorter
    }

    fn sort_products(&mut self) {
        let store = self.store;
        let calculator = DateRangeCalculator::new(store, self.now);

        for product in store.installed_products() {
            let range = calculator.calculate(&product.id);
            let status = self.classify(&product.id, range.as_ref());
            tracing::debug!("Product {} ({}) classified as {:?}", product.id, product.name, status);

            match status {
                ComplianceStatus::Expired => self.expired_products.push(product.id.clone()),
                ComplianceStatus::NotSubscribed => {
                    self.unentitled_products.push(product.id.clone())
                }
                ComplianceStatus::FutureSubscribed => {
                    self.future_products.push(product.id.clone());
                    self.unentitled_products.push(product.id.clone());
                }
                ComplianceStatus::PartiallySubscribed => {
                    self.partially_valid_products.push(product.id.clone())
                }
                ComplianceStatus::Unknown(_) | ComplianceStatus::Subscribed => {}
            }

            if let Some(range) = range {
                self.ranges.insert(product.id.clone(), range);
            }
            self.status_by_product.insert(product.id.clone(), status);
            self.statuses.push((product.id.clone(), status));
        }
    }

    fn classify(&self, product_id: &str, range: Option<&DateRange>) -> ComplianceStatus {
        let certs = self.store.find_all_by_product(product_id);
        if certs.is_empty() {
            return ComplianceStatus::NotSubscribed;
        }

        if certs.iter().all(|cert| cert.valid_range.is_future(self.now)) {
            return ComplianceStatus::FutureSubscribed;
        }

        // 有憑證但目前時間點不在任何連續範圍內：最近一張已過期且沒有銜接的憑證
        if range.is_none() {
            return ComplianceStatus::Expired;
        }

        let active: Vec<&EntitlementCertificate> = certs
            .into_iter()
            .filter(|cert| cert.is_valid_at(self.now))
            .collect();
        if !self.requirement_met(product_id, &active) {
            return ComplianceStatus::PartiallySubscribed;
        }

        if !self.identity.is_valid() {
            return ComplianceStatus::Unknown(UnknownReason::NotRegistered);
        }
        if self.identity.reachability == ServerReachability::Unreachable {
            return ComplianceStatus::Unknown(UnknownReason::ServerUnreachable);
        }

        ComplianceStatus::Subscribed
    }

    /// Active certificates must support the system architecture and cover its sockets.
    fn requirement_met(&self, product_id: &str, active: &[&EntitlementCertificate]) -> bool {
        let matching: Vec<&&EntitlementCertificate> = active
            .iter()
            .filter(|cert| {
                cert.provided(product_id)
                    .is_some_and(|p| p.supports_arch(&self.facts.arch))
            })
            .collect();
        if matching.is_empty() {
            return false;
        }

        let mut covered: u32 = 0;
        for cert in matching {
            match cert.socket_capacity() {
                None => return true,
                Some(sockets) => covered = covered.saturating_add(sockets),
            }
        }
        covered >= self.facts.sockets
    }

    pub fn get_status(&self, product_id: &str) -> ComplianceStatus {
        if let Some(status) = self.status_by_product.get(product_id) {
            return *status;
        }
        let range = DateRangeCalculator::new(self.store, self.now).calculate(product_id);
        self.classify(product_id, range.as_ref())
    }

    pub fn compliant_range(&self, product_id: &str) -> Option<DateRange> {
        match self.ranges.get(product_id) {
            Some(range) => Some(*range),
            None => DateRangeCalculator::new(self.store, self.now).calculate(product_id),
        }
    }

    /// Statuses of the installed products, in installation order.
    pub fn installed_products(&self) -> &[(String, ComplianceStatus)] {
        &self.statuses
    }

    pub fn expired_products(&self) -> &[String] {
        &self.expired_products
    }

    /// Installed products with no entitlement valid now, including future-only ones.
    pub fn unentitled_products(&self) -> &[String] {
        &self.unentitled_products
    }

    pub fn future_products(&self) -> &[String] {
        &self.future_products
    }

    pub fn partially_valid_products(&self) -> &[String] {
        &self.partially_valid_products
    }

    pub fn valid_entitlement_certs(&self) -> &[&'a EntitlementCertificate] {
        &self.valid_entitlement_certs
    }

    pub fn is_valid_entitlement(&self, cert: &EntitlementCertificate) -> bool {
        self.valid_entitlement_certs.iter().any(|valid| *valid == cert)
    }

    pub fn is_registered(&self) -> bool {
        self.identity.is_valid()
    }

    pub fn identity(&self) -> &IdentityState {
        &self.identity
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn store(&self) -> &'a CertificateStore {
        self.store
    }

    /// Earliest end among the installed products' compliant ranges.
    pub fn first_invalid_date(&self) -> Option<DateTime<Utc>> {
        self.ranges.values().map(|range| range.end()).min()
    }

    pub fn system_status(&self) -> SystemStatus {
        let statuses = || self.statuses.iter().map(|(_, status)| *status);

        if statuses().any(|s| {
            matches!(
                s,
                ComplianceStatus::Expired
                    | ComplianceStatus::Unknown(UnknownReason::ServerUnreachable)
            )
        }) {
            return SystemStatus::Invalid;
        }
        if statuses().any(|s| s == ComplianceStatus::PartiallySubscribed) {
            return SystemStatus::Partial;
        }
        if !self.identity.is_valid() {
            return SystemStatus::Unknown;
        }
        if !self.unentitled_products.is_empty() {
            return SystemStatus::Invalid;
        }
        SystemStatus::Valid
    }
}
