use crate::core::attribution::{expired_subscription_numbers, subscriptions_providing};
use crate::core::sorter::ComplianceSorter;
use crate::domain::icon::StatusIcon;
use crate::domain::model::{ComplianceStatus, Product, SystemStatus, UnknownReason};
use crate::domain::report::{
    ComplianceReport, ProductEntry, StatusMessage, SystemSummary, ValidityNote,
};

pub fn build_report(sorter: &ComplianceSorter<'_>) -> ComplianceReport {
    let products: Vec<ProductEntry> = sorter
        .store()
        .installed_products()
        .into_iter()
        .map(|product| product_entry(sorter, product))
        .collect();

    ComplianceReport {
        evaluated_at: sorter.evaluated_at(),
        products,
        summary: system_summary(sorter),
    }
}

pub fn product_entry(sorter: &ComplianceSorter<'_>, product: &Product) -> ProductEntry {
    let status = sorter.get_status(&product.id);
    let mut entry = ProductEntry {
        product: product.name.clone(),
        version: product.version.clone(),
        product_id: product.id.clone(),
        arch: product.architectures.join(","),
        status,
        icon: StatusIcon::from(status),
        start_date: None,
        expiration_date: None,
        subscriptions: Vec::new(),
        contract_ids: Vec::new(),
        validity_note: ValidityNote::NotSubscribed,
    };

    if status == ComplianceStatus::NotSubscribed {
        return entry;
    }

    let compliant_range = sorter.compliant_range(&product.id);
    let attribution = subscriptions_providing(sorter, &product.id, compliant_range.as_ref());

    entry.start_date = compliant_range.map(|r| r.begin());
    entry.expiration_date = compliant_range.map(|r| r.end());
    entry.subscriptions = attribution.subscription_names.into_iter().collect();
    entry.contract_ids = attribution.contract_ids.into_iter().collect();

    entry.validity_note = match status {
        ComplianceStatus::FutureSubscribed => ValidityNote::FutureSubscribed,
        ComplianceStatus::Expired => ValidityNote::Expired {
            subscriptions: expired_subscription_numbers(sorter, &product.id)
                .into_iter()
                .collect(),
        },
        ComplianceStatus::PartiallySubscribed => ValidityNote::PartiallySubscribed,
        ComplianceStatus::Unknown(UnknownReason::NotRegistered) => ValidityNote::NotRegistered,
        ComplianceStatus::Unknown(UnknownReason::ServerUnreachable) => {
            ValidityNote::ServerUnreachable
        }
        ComplianceStatus::Subscribed => ValidityNote::CoveredBy {
            contracts: entry.contract_ids.clone(),
            through: entry.expiration_date,
        },
        ComplianceStatus::NotSubscribed => ValidityNote::NotSubscribed,
    };

    entry
}

pub fn system_summary(sorter: &ComplianceSorter<'_>) -> SystemSummary {
    let identity = sorter.identity();
    let warn_count = sorter.expired_products().len() + sorter.unentitled_products().len();
    let first_invalid_date = sorter.first_invalid_date();

    if identity.registered_with_other {
        return SystemSummary {
            status: SystemStatus::Valid,
            icon: StatusIcon::Valid,
            registered: identity.registered,
            warn_count,
            first_invalid_date,
            message: StatusMessage::RegisteredToOther,
        };
    }

    let status = sorter.system_status();
    let message = match status {
        SystemStatus::Valid => match first_invalid_date {
            Some(date) => StatusMessage::SubscribedThrough(date),
            None => StatusMessage::NoInstalledProducts,
        },
        SystemStatus::Partial => StatusMessage::DoesNotMatchLimits,
        SystemStatus::Invalid => StatusMessage::ProductsInvalid(warn_count.max(1)),
        SystemStatus::Unknown => StatusMessage::NotRegistered,
    };

    SystemSummary {
        status,
        icon: StatusIcon::from(status),
        registered: sorter.is_registered(),
        warn_count,
        first_invalid_date,
        message,
    }
}
