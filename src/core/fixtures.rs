//! Certificate builders shared by the core unit tests.

use crate::core::store::CertificateStore;
use crate::domain::model::{
    parse_instant, DateRange, EntitlementCertificate, Order, Product, ProductCertificate,
    ProvidedProduct,
};
use chrono::{DateTime, Utc};

pub fn at(date: &str) -> DateTime<Utc> {
    parse_instant(date, false).expect("valid test date")
}

pub fn days(begin: &str, end: &str) -> DateRange {
    DateRange::new(
        parse_instant(begin, false).expect("valid begin"),
        parse_instant(end, true).expect("valid end"),
    )
}

pub fn product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        version: "1.0".to_string(),
        architectures: vec!["x86_64".to_string()],
    }
}

pub fn products(ids: &[&str]) -> Vec<ProductCertificate> {
    vec![ProductCertificate {
        path: None,
        products: ids.iter().map(|id| product(id)).collect(),
    }]
}

pub fn ent(serial: &str, contract: &str, product_id: &str, begin: &str, end: &str) -> EntitlementCertificate {
    EntitlementCertificate {
        serial: serial.to_string(),
        order: Order {
            contract: contract.to_string(),
            name: format!("Subscription {}", contract),
            subscription: Some(format!("S-{}", serial)),
            sockets: None,
        },
        valid_range: days(begin, end),
        products: vec![ProvidedProduct {
            id: product_id.to_string(),
            architectures: vec![],
        }],
        quantity: 1,
        path: None,
    }
}

pub fn store(installed: &[&str], ents: Vec<EntitlementCertificate>) -> CertificateStore {
    CertificateStore::new(products(installed), ents)
}
