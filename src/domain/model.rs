use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An installed product, as declared by a product certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub architectures: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCertificate {
    #[serde(skip)]
    pub path: Option<String>,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub contract: String,
    pub name: String,
    #[serde(default)]
    pub subscription: Option<String>,
    /// Sockets covered by one unit of this order. `None` means unlimited.
    #[serde(default)]
    pub sockets: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidedProduct {
    pub id: String,
    #[serde(default)]
    pub architectures: Vec<String>,
}

impl ProvidedProduct {
    /// 未列出架構時視為支援所有架構
    pub fn supports_arch(&self, arch: &str) -> bool {
        self.architectures.is_empty()
            || self
                .architectures
                .iter()
                .any(|a| a.eq_ignore_ascii_case(arch) || a.eq_ignore_ascii_case("ALL"))
    }
}

/// An inclusive `[begin, end]` interval of UTC instants.
///
/// Deserializing rejects a range whose `end` precedes its `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawDateRange {
    #[serde(deserialize_with = "deserialize_begin")]
    begin: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_end")]
    end: DateTime<Utc>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = String;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        if raw.end < raw.begin {
            return Err(format!(
                "valid range ends ({}) before it begins ({})",
                raw.end.to_rfc3339(),
                raw.begin.to_rfc3339()
            ));
        }
        Ok(Self {
            begin: raw.begin,
            end: raw.end,
        })
    }
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end < begin {
            Self {
                begin: end,
                end: begin,
            }
        } else {
            Self { begin, end }
        }
    }

    /// Whole-day range: `begin` at 00:00:00 and `end` at 23:59:59 UTC.
    pub fn from_days(begin: NaiveDate, end: NaiveDate) -> Self {
        Self::new(start_of_day(begin), end_of_day(end))
    }

    pub fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn has_date(&self, date: DateTime<Utc>) -> bool {
        self.begin <= date && date <= self.end
    }

    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        self.begin > now
    }

    /// Whether `other` starts inside this range or within `tolerance` after it ends.
    pub fn chains_into(&self, other: &DateRange, tolerance: Duration) -> bool {
        other.begin <= self.end + tolerance
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.begin.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + Duration::days(1) - Duration::seconds(1)
}

/// 解析 RFC 3339 時間或純日期 (YYYY-MM-DD)
pub fn parse_instant(value: &str, end_of_range: bool) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    Some(if end_of_range {
        end_of_day(day)
    } else {
        start_of_day(day)
    })
}

fn deserialize_bound<'de, D>(deserializer: D, end_of_range: bool) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw, end_of_range)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

fn deserialize_begin<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_bound(deserializer, false)
}

fn deserialize_end<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_bound(deserializer, true)
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementCertificate {
    pub serial: String,
    pub order: Order,
    pub valid_range: DateRange,
    pub products: Vec<ProvidedProduct>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(skip)]
    pub path: Option<String>,
}

impl EntitlementCertificate {
    pub fn provides(&self, product_id: &str) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }

    pub fn provided(&self, product_id: &str) -> Option<&ProvidedProduct> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_range.has_date(now)
    }

    /// Sockets this certificate covers, `None` when the order has no socket limit.
    pub fn socket_capacity(&self) -> Option<u32> {
        self.order
            .sockets
            .map(|per_unit| per_unit.saturating_mul(self.quantity.max(1)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    NotRegistered,
    ServerUnreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum ComplianceStatus {
    NotSubscribed,
    FutureSubscribed,
    Expired,
    PartiallySubscribed,
    Unknown(UnknownReason),
    Subscribed,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComplianceStatus::NotSubscribed => "Not Subscribed",
            ComplianceStatus::FutureSubscribed => "Future Subscription",
            ComplianceStatus::Expired => "Expired",
            ComplianceStatus::PartiallySubscribed => "Partially Subscribed",
            ComplianceStatus::Unknown(_) => "Unknown",
            ComplianceStatus::Subscribed => "Subscribed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Valid,
    Partial,
    Invalid,
    Unknown,
}

impl SystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Valid => "valid",
            SystemStatus::Partial => "partial",
            SystemStatus::Invalid => "invalid",
            SystemStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFacts {
    pub arch: String,
    pub sockets: u32,
}

impl Default for SystemFacts {
    fn default() -> Self {
        Self {
            arch: std::env::consts::ARCH.to_string(),
            sockets: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerReachability {
    #[default]
    Reachable,
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityState {
    pub registered: bool,
    pub reachability: ServerReachability,
    /// Registered to a different entitlement service, so local certificates are not authoritative.
    pub registered_with_other: bool,
}

impl IdentityState {
    pub fn registered() -> Self {
        Self {
            registered: true,
            ..Self::default()
        }
    }

    pub fn unregistered() -> Self {
        Self::default()
    }

    pub fn with_reachability(mut self, reachability: ServerReachability) -> Self {
        self.reachability = reachability;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.registered
    }
}

/// Deduplicated contract ids and subscription names providing a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub contract_ids: BTreeSet<String>,
    pub subscription_names: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_day_range_bounds() {
        let range = DateRange::from_days(day("2020-01-01"), day("2020-12-31"));
        assert_eq!(range.begin().to_rfc3339(), "2020-01-01T00:00:00+00:00");
        assert_eq!(range.end().to_rfc3339(), "2020-12-31T23:59:59+00:00");
        assert!(range.has_date(range.begin()));
        assert!(range.has_date(range.end()));
        assert!(!range.has_date(range.end() + Duration::seconds(1)));
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        let a = start_of_day(day("2021-01-01"));
        let b = start_of_day(day("2020-01-01"));
        let range = DateRange::new(a, b);
        assert_eq!(range.begin(), b);
        assert_eq!(range.end(), a);
    }

    #[test]
    fn test_parse_entitlement_with_plain_dates() {
        let json = r#"{
            "serial": "1001",
            "order": {"contract": "C-100", "name": "Premium", "subscription": "S-1", "sockets": 2},
            "valid_range": {"begin": "2020-01-01", "end": "2020-12-31"},
            "products": [{"id": "P1"}],
            "quantity": 2
        }"#;
        let cert: EntitlementCertificate = serde_json::from_str(json).unwrap();
        assert_eq!(cert.order.contract, "C-100");
        assert_eq!(cert.socket_capacity(), Some(4));
        assert!(cert.provides("P1"));
        assert!(cert.is_valid_at(parse_instant("2020-12-31T12:00:00Z", false).unwrap()));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let json = r#"{"begin": "yesterday", "end": "2020-12-31"}"#;
        assert!(serde_json::from_str::<DateRange>(json).is_err());
    }

    #[test]
    fn test_reversed_certificate_range_is_rejected() {
        let json = r#"{"begin": "2020-12-31", "end": "2020-01-01"}"#;
        let err = serde_json::from_str::<DateRange>(json).unwrap_err();
        assert!(err.to_string().contains("before it begins"));

        // 同一天的起訖仍然有效
        let same_day: DateRange =
            serde_json::from_str(r#"{"begin": "2020-06-01", "end": "2020-06-01"}"#).unwrap();
        assert!(same_day.begin() < same_day.end());
    }

    #[test]
    fn test_provided_product_arch_matching() {
        let any = ProvidedProduct {
            id: "P1".to_string(),
            architectures: vec![],
        };
        let x86 = ProvidedProduct {
            id: "P1".to_string(),
            architectures: vec!["x86_64".to_string()],
        };
        assert!(any.supports_arch("ppc64"));
        assert!(x86.supports_arch("x86_64"));
        assert!(!x86.supports_arch("s390x"));
    }

    #[test]
    fn test_status_serialization_keeps_reason() {
        let status = ComplianceStatus::Unknown(UnknownReason::ServerUnreachable);
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"status":"unknown","reason":"server_unreachable"}"#);
        assert_eq!(SystemStatus::Partial.to_string(), "partial");
    }
}
