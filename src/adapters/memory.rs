use crate::domain::model::{EntitlementCertificate, ProductCertificate};
use crate::domain::ports::CertificateSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Contents {
    products: Vec<ProductCertificate>,
    entitlements: Vec<EntitlementCertificate>,
    revision: u64,
}

/// In-memory certificate source; clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<RwLock<Contents>>,
}

impl MemorySource {
    pub fn new(products: Vec<ProductCertificate>, entitlements: Vec<EntitlementCertificate>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Contents {
                products,
                entitlements,
                revision: 0,
            })),
        }
    }

    pub fn set_entitlements(&self, entitlements: Vec<EntitlementCertificate>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.entitlements = entitlements;
            inner.revision += 1;
        }
    }
}

#[async_trait]
impl CertificateSource for MemorySource {
    async fn load_products(&self) -> Result<Vec<ProductCertificate>> {
        Ok(self
            .inner
            .read()
            .map(|inner| inner.products.clone())
            .unwrap_or_default())
    }

    async fn load_entitlements(&self) -> Result<Vec<EntitlementCertificate>> {
        Ok(self
            .inner
            .read()
            .map(|inner| inner.entitlements.clone())
            .unwrap_or_default())
    }

    async fn revision(&self) -> Result<u64> {
        Ok(self.inner.read().map(|inner| inner.revision).unwrap_or(0))
    }
}
