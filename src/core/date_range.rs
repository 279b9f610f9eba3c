use crate::core::store::CertificateStore;
use crate::domain::model::DateRange;
use chrono::{DateTime, Duration, Utc};

/// A certificate starting at most this long after another ends continues its coverage.
pub const CONTIGUITY_TOLERANCE_SECS: i64 = 1;

/// Computes the compliant range of a product: the maximal stretch of
/// continuous coverage that contains the evaluation instant.
#[derive(Debug, Clone, Copy)]
pub struct DateRangeCalculator<'a> {
    store: &'a CertificateStore,
    now: DateTime<Utc>,
}

impl<'a> DateRangeCalculator<'a> {
    pub fn new(store: &'a CertificateStore, now: DateTime<Utc>) -> Self {
        Self { store, now }
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn calculate(&self, product_id: &str) -> Option<DateRange> {
        let range = self
            .coverage_chains(product_id)
            .into_iter()
            .find(|chain| chain.has_date(self.now));

        match &range {
            Some(r) => tracing::debug!("Compliant range for {}: {}", product_id, r),
            None => tracing::debug!("No compliant range for {} at {}", product_id, self.now),
        }
        range
    }

    /// Every certificate interval for the product merged into disjoint chains, ordered by begin.
    pub fn coverage_chains(&self, product_id: &str) -> Vec<DateRange> {
        let mut ranges: Vec<DateRange> = self
            .store
            .find_all_by_product(product_id)
            .iter()
            .map(|cert| cert.valid_range)
            .collect();
        ranges.sort_by_key(|r| (r.begin(), r.end()));

        let tolerance = Duration::seconds(CONTIGUITY_TOLERANCE_SECS);
        let mut chains: Vec<DateRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match chains.last_mut() {
                Some(last) if last.chains_into(&range, tolerance) => {
                    if range.end() > last.end() {
                        *last = DateRange::new(last.begin(), range.end());
                    }
                }
                _ => chains.push(range),
            }
        }
        chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{at, days, ent, store};

    #[test]
    fn test_single_certificate_range() {
        let store = store(
            &["P1"],
            vec![ent("1", "C-100", "P1", "2020-01-01", "2020-12-31")],
        );
        let calc = DateRangeCalculator::new(&store, at("2020-06-01"));

        assert_eq!(
            calc.calculate("P1"),
            Some(days("2020-01-01", "2020-12-31"))
        );
    }

    #[test]
    fn test_overlapping_certificates_merge() {
        let store = store(
            &["P1"],
            vec![
                ent("2", "C-2", "P1", "2020-06-01", "2021-06-30"),
                ent("1", "C-1", "P1", "2020-01-01", "2020-12-31"),
            ],
        );
        let calc = DateRangeCalculator::new(&store, at("2020-03-01"));

        assert_eq!(
            calc.calculate("P1"),
            Some(days("2020-01-01", "2021-06-30"))
        );
    }

    #[test]
    fn test_back_to_back_days_are_contiguous() {
        let store = store(
            &["P1"],
            vec![
                ent("1", "C-1", "P1", "2020-01-01", "2020-12-31"),
                ent("2", "C-2", "P1", "2021-01-01", "2021-12-31"),
            ],
        );
        let calc = DateRangeCalculator::new(&store, at("2020-06-01"));

        assert_eq!(
            calc.calculate("P1"),
            Some(days("2020-01-01", "2021-12-31"))
        );
    }

    #[test]
    fn test_gap_truncates_range() {
        let store = store(
            &["P1"],
            vec![
                ent("1", "C-1", "P1", "2020-01-01", "2020-06-30"),
                ent("2", "C-2", "P1", "2020-08-01", "2020-12-31"),
            ],
        );

        let calc = DateRangeCalculator::new(&store, at("2020-03-01"));
        assert_eq!(
            calc.calculate("P1"),
            Some(days("2020-01-01", "2020-06-30"))
        );

        // 空窗期內沒有任何有效的範圍
        let calc = DateRangeCalculator::new(&store, at("2020-07-15"));
        assert_eq!(calc.calculate("P1"), None);
        assert_eq!(calc.coverage_chains("P1").len(), 2);
    }

    #[test]
    fn test_future_only_coverage_has_no_range() {
        let store = store(
            &["P1"],
            vec![ent("1", "C-1", "P1", "2030-01-01", "2030-12-31")],
        );
        let calc = DateRangeCalculator::new(&store, at("2020-06-01"));
        assert_eq!(calc.calculate("P1"), None);
    }

    #[test]
    fn test_uncovered_product_has_no_range() {
        let store = store(&["P1"], vec![]);
        let calc = DateRangeCalculator::new(&store, at("2020-06-01"));
        assert_eq!(calc.calculate("P1"), None);
        assert!(calc.coverage_chains("P1").is_empty());
    }

    #[test]
    fn test_nested_certificate_does_not_shrink_range() {
        let store = store(
            &["P1"],
            vec![
                ent("1", "C-1", "P1", "2020-01-01", "2020-12-31"),
                ent("2", "C-2", "P1", "2020-03-01", "2020-04-30"),
            ],
        );
        let calc = DateRangeCalculator::new(&store, at("2020-06-01"));
        assert_eq!(
            calc.calculate("P1"),
            Some(days("2020-01-01", "2020-12-31"))
        );
    }
}
