use crate::core::sorter::ComplianceSorter;
use crate::domain::model::{Attribution, DateRange};
use std::collections::BTreeSet;

/// Contract ids and subscription names providing `product_id` while it is covered.
///
/// With a compliant range, a certificate counts when its begin or end falls
/// inside the range. Without one, only certificates valid right now count.
pub fn subscriptions_providing(
    sorter: &ComplianceSorter<'_>,
    product_id: &str,
    compliant_range: Option<&DateRange>,
) -> Attribution {
    let mut attribution = Attribution::default();

    for cert in sorter.store().find_all_by_product(product_id) {
        let included = match compliant_range {
            Some(range) => {
                range.has_date(cert.valid_range.begin()) || range.has_date(cert.valid_range.end())
            }
            None => sorter.is_valid_entitlement(cert),
        };

        if included {
            attribution.contract_ids.insert(cert.order.contract.clone());
            attribution.subscription_names.insert(cert.order.name.clone());
        }
    }

    attribution
}

/// Subscription numbers of every certificate for the product, for the expired note.
pub fn expired_subscription_numbers(
    sorter: &ComplianceSorter<'_>,
    product_id: &str,
) -> BTreeSet<String> {
    sorter
        .store()
        .find_all_by_product(product_id)
        .into_iter()
        .filter_map(|cert| cert.order.subscription.clone())
        .filter(|number| !number.is_empty())
        .collect()
}
