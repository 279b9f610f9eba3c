use crate::domain::model::{EntitlementCertificate, Product, ProductCertificate};
use std::collections::{HashMap, HashSet};

/// Immutable snapshot of installed-product and entitlement certificates.
#[derive(Debug, Clone, Default)]
pub struct CertificateStore {
    product_certs: Vec<ProductCertificate>,
    entitlements: Vec<EntitlementCertificate>,
    by_product: HashMap<String, Vec<usize>>,
}

impl CertificateStore {
    pub fn new(
        product_certs: Vec<ProductCertificate>,
        entitlements: Vec<EntitlementCertificate>,
    ) -> Self {
        let mut by_product: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, cert) in entitlements.iter().enumerate() {
            // 同一張憑證重複列出同一產品時只索引一次
            let ids: HashSet<&str> = cert.products.iter().map(|p| p.id.as_str()).collect();
            for id in ids {
                by_product.entry(id.to_string()).or_default().push(idx);
            }
        }

        Self {
            product_certs,
            entitlements,
            by_product,
        }
    }

    /// Installed products in certificate order; a product id listed twice is kept once.
    pub fn installed_products(&self) -> Vec<&Product> {
        let mut seen = HashSet::new();
        self.product_certs
            .iter()
            .flat_map(|cert| cert.products.iter())
            .filter(|p| seen.insert(p.id.as_str()))
            .collect()
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.product_certs
            .iter()
            .flat_map(|cert| cert.products.iter())
            .find(|p| p.id == product_id)
    }

    pub fn is_installed(&self, product_id: &str) -> bool {
        self.product(product_id).is_some()
    }

    pub fn entitlements(&self) -> &[EntitlementCertificate] {
        &self.entitlements
    }

    pub fn find_all_by_product(&self, product_id: &str) -> Vec<&EntitlementCertificate> {
        self.by_product
            .get(product_id)
            .map(|indices| indices.iter().map(|&i| &self.entitlements[i]).collect())
            .unwrap_or_default()
    }

    pub fn has_entitlements_for(&self, product_id: &str) -> bool {
        self.by_product.contains_key(product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DateRange, Order, ProvidedProduct};
    use chrono::NaiveDate;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            version: "1.0".to_string(),
            architectures: vec!["x86_64".to_string()],
        }
    }

    fn cert(serial: &str, products: &[&str]) -> EntitlementCertificate {
        EntitlementCertificate {
            serial: serial.to_string(),
            order: Order {
                contract: format!("C-{}", serial),
                name: "Sub".to_string(),
                subscription: None,
                sockets: None,
            },
            valid_range: DateRange::from_days(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            ),
            products: products
                .iter()
                .map(|id| ProvidedProduct {
                    id: id.to_string(),
                    architectures: vec![],
                })
                .collect(),
            quantity: 1,
            path: None,
        }
    }

    #[test]
    fn test_index_by_product() {
        let store = CertificateStore::new(
            vec![ProductCertificate {
                path: None,
                products: vec![product("P1"), product("P2")],
            }],
            vec![cert("1", &["P1"]), cert("2", &["P1", "P2", "P1"])],
        );

        assert_eq!(store.find_all_by_product("P1").len(), 2);
        assert_eq!(store.find_all_by_product("P2").len(), 1);
        assert!(store.find_all_by_product("P3").is_empty());
        assert!(!store.has_entitlements_for("P3"));
    }

    #[test]
    fn test_installed_products_are_deduplicated() {
        let store = CertificateStore::new(
            vec![
                ProductCertificate {
                    path: None,
                    products: vec![product("P1")],
                },
                ProductCertificate {
                    path: None,
                    products: vec![product("P1"), product("P2")],
                },
            ],
            vec![],
        );

        let ids: Vec<&str> = store
            .installed_products()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert!(store.is_installed("P2"));
    }
}
