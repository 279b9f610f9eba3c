use crate::domain::icon::StatusIcon;
use crate::domain::model::{ComplianceStatus, SystemStatus};
use crate::utils::format::{format_date, friendly_join};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Explanation shown next to a product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidityNote {
    NotSubscribed,
    FutureSubscribed,
    Expired {
        subscriptions: Vec<String>,
    },
    PartiallySubscribed,
    NotRegistered,
    ServerUnreachable,
    CoveredBy {
        contracts: Vec<String>,
        through: Option<DateTime<Utc>>,
    },
}

impl fmt::Display for ValidityNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityNote::NotSubscribed => f.write_str("Not Subscribed"),
            ValidityNote::FutureSubscribed => f.write_str("Future Subscribed"),
            ValidityNote::Expired { subscriptions } => {
                write!(f, "Subscription {} is expired", subscriptions.join(", "))
            }
            ValidityNote::PartiallySubscribed => f.write_str("Partially Subscribed"),
            ValidityNote::NotRegistered => f.write_str("System is not registered."),
            ValidityNote::ServerUnreachable => f.write_str("Entitlement server is unreachable."),
            ValidityNote::CoveredBy { contracts, through } => {
                let noun = if contracts.len() == 1 {
                    "contract"
                } else {
                    "contracts"
                };
                let through = through.as_ref().map(format_date).unwrap_or_default();
                write!(
                    f,
                    "Covered by {} {} through {}",
                    noun,
                    friendly_join(contracts),
                    through
                )
            }
        }
    }
}

/// One row of the installed-products table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    pub product: String,
    pub version: String,
    pub product_id: String,
    pub arch: String,
    pub status: ComplianceStatus,
    pub icon: StatusIcon,
    pub start_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub subscriptions: Vec<String>,
    pub contract_ids: Vec<String>,
    pub validity_note: ValidityNote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum StatusMessage {
    RegisteredToOther,
    SubscribedThrough(DateTime<Utc>),
    NoInstalledProducts,
    DoesNotMatchLimits,
    ProductsInvalid(usize),
    NotRegistered,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::RegisteredToOther => {
                f.write_str("This system is registered to another entitlement service.")
            }
            StatusMessage::SubscribedThrough(date) => write!(
                f,
                "System is properly subscribed through {}.",
                format_date(date)
            ),
            StatusMessage::NoInstalledProducts => f.write_str("No installed products detected."),
            StatusMessage::DoesNotMatchLimits => {
                f.write_str("This system does not match subscription limits.")
            }
            StatusMessage::ProductsInvalid(1) => {
                f.write_str("1 installed product does not have a valid subscription.")
            }
            StatusMessage::ProductsInvalid(n) => write!(
                f,
                "{} installed products do not have valid subscriptions.",
                n
            ),
            StatusMessage::NotRegistered => {
                f.write_str("Keep your system up to date by registering.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSummary {
    pub status: SystemStatus,
    pub icon: StatusIcon,
    pub registered: bool,
    pub warn_count: usize,
    pub first_invalid_date: Option<DateTime<Utc>>,
    pub message: StatusMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub evaluated_at: DateTime<Utc>,
    pub products: Vec<ProductEntry>,
    pub summary: SystemSummary,
}

impl ComplianceReport {
    pub fn entry(&self, product_id: &str) -> Option<&ProductEntry> {
        self.products.iter().find(|e| e.product_id == product_id)
    }
}
