use entitlement_compliance::app::runner::{run, RunOptions};
use entitlement_compliance::config::toml_config::TomlConfig;
use entitlement_compliance::core::export::ReportFormat;
use entitlement_compliance::domain::model::{parse_instant, IdentityState, SystemFacts};
use entitlement_compliance::domain::ports::{FixedClock, StaticRegistration};
use entitlement_compliance::{
    ComplianceEngine, ComplianceError, ComplianceStatus, DirectorySource, SystemStatus,
    UnknownReason,
};
use std::path::Path;
use tempfile::TempDir;

fn write_product(dir: &Path, file: &str, id: &str, name: &str) {
    let body = serde_json::json!({
        "products": [
            {"id": id, "name": name, "version": "1.0", "architectures": ["x86_64"]}
        ]
    });
    std::fs::write(dir.join(file), body.to_string()).unwrap();
}

fn write_entitlement(dir: &Path, serial: &str, contract: &str, product: &str, begin: &str, end: &str) {
    let body = serde_json::json!({
        "serial": serial,
        "order": {"contract": contract, "name": format!("Subscription {}", contract), "subscription": format!("S-{}", serial)},
        "valid_range": {"begin": begin, "end": end},
        "products": [{"id": product}]
    });
    std::fs::write(dir.join(format!("{}.json", serial)), body.to_string()).unwrap();
}

struct Fixture {
    _root: TempDir,
    product_dir: std::path::PathBuf,
    entitlement_dir: std::path::PathBuf,
    consumer_dir: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let product_dir = root.path().join("product");
    let entitlement_dir = root.path().join("entitlement");
    let consumer_dir = root.path().join("consumer");
    for dir in [&product_dir, &entitlement_dir, &consumer_dir] {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(consumer_dir.join("cert.pem"), "consumer").unwrap();

    Fixture {
        _root: root,
        product_dir,
        entitlement_dir,
        consumer_dir,
    }
}

async fn engine_at(
    fx: &Fixture,
    date: &str,
) -> ComplianceEngine<DirectorySource, StaticRegistration, FixedClock> {
    ComplianceEngine::load(
        DirectorySource::new(&fx.product_dir, &fx.entitlement_dir),
        StaticRegistration(IdentityState::registered()),
        FixedClock(parse_instant(date, false).unwrap()),
        SystemFacts::default(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_subscribed_then_expired_scenario() {
    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    write_entitlement(&fx.entitlement_dir, "1", "C-100", "P1", "2020-01-01", "2020-12-31");

    let engine = engine_at(&fx, "2020-06-01").await;
    let sorter = engine.sorter();
    assert_eq!(sorter.get_status("P1"), ComplianceStatus::Subscribed);

    let range = engine.range_calculator().calculate("P1").unwrap();
    assert_eq!(range.begin().format("%Y-%m-%d").to_string(), "2020-01-01");
    assert_eq!(range.end().format("%Y-%m-%d").to_string(), "2020-12-31");

    let report = engine.report();
    let entry = report.entry("P1").unwrap();
    assert_eq!(entry.contract_ids, vec!["C-100".to_string()]);
    assert_eq!(report.summary.status, SystemStatus::Valid);

    let engine = engine_at(&fx, "2021-01-15").await;
    assert_eq!(engine.sorter().get_status("P1"), ComplianceStatus::Expired);
    assert_eq!(engine.report().summary.status, SystemStatus::Invalid);
}

#[tokio::test]
async fn test_overlapping_certificates_merge_into_one_range() {
    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    write_entitlement(&fx.entitlement_dir, "1", "C-1", "P1", "2020-01-01", "2020-09-30");
    write_entitlement(&fx.entitlement_dir, "2", "C-2", "P1", "2020-06-01", "2021-03-31");

    let engine = engine_at(&fx, "2020-02-01").await;
    let range = engine.range_calculator().calculate("P1").unwrap();

    assert_eq!(range.begin().format("%Y-%m-%d").to_string(), "2020-01-01");
    assert_eq!(range.end().format("%Y-%m-%d").to_string(), "2021-03-31");
    assert_eq!(
        engine.report().entry("P1").unwrap().contract_ids,
        vec!["C-1".to_string(), "C-2".to_string()]
    );
}

#[tokio::test]
async fn test_damaged_certificate_degrades_to_not_subscribed() {
    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    std::fs::write(fx.entitlement_dir.join("1.json"), "{\"serial\": ").unwrap();

    let engine = engine_at(&fx, "2020-06-01").await;
    assert_eq!(engine.sorter().get_status("P1"), ComplianceStatus::NotSubscribed);
}

#[tokio::test]
async fn test_mixed_products_system_status() {
    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    write_product(&fx.product_dir, "p2.json", "P2", "Product Two");
    write_product(&fx.product_dir, "p3.json", "P3", "Product Three");
    write_entitlement(&fx.entitlement_dir, "1", "C-1", "P1", "2020-01-01", "2020-12-31");
    write_entitlement(&fx.entitlement_dir, "2", "C-2", "P2", "2021-01-01", "2021-12-31");

    let engine = engine_at(&fx, "2020-06-01").await;
    let sorter = engine.sorter();

    assert_eq!(sorter.get_status("P1"), ComplianceStatus::Subscribed);
    assert_eq!(sorter.get_status("P2"), ComplianceStatus::FutureSubscribed);
    assert_eq!(sorter.get_status("P3"), ComplianceStatus::NotSubscribed);
    assert_eq!(sorter.unentitled_products().len(), 2);
    assert_eq!(sorter.system_status(), SystemStatus::Invalid);
    assert_eq!(engine.report().summary.warn_count, 2);
}

#[tokio::test]
async fn test_run_with_toml_config_writes_csv() {
    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    write_entitlement(&fx.entitlement_dir, "1", "C-100", "P1", "2020-01-01", "2020-12-31");
    let output = fx.product_dir.parent().unwrap().join("out").join("report.csv");

    let toml_content = format!(
        r#"
[certificates]
product_dir = "{}"
entitlement_dir = "{}"

[registration]
consumer_dir = "{}"
server_reachable = false
"#,
        fx.product_dir.display(),
        fx.entitlement_dir.display(),
        fx.consumer_dir.display()
    );
    let config = TomlConfig::from_toml_str(&toml_content).unwrap();

    let options = RunOptions {
        format: ReportFormat::Csv,
        output: Some(output.clone()),
        at: parse_instant("2020-06-01", false),
        ..RunOptions::default()
    };
    let report = run(&config, options).await.unwrap();

    assert_eq!(
        report.entry("P1").unwrap().status,
        ComplianceStatus::Unknown(UnknownReason::ServerUnreachable)
    );
    let csv = std::fs::read_to_string(&output).unwrap();
    assert!(csv.contains("Entitlement server is unreachable."));
}

#[tokio::test]
async fn test_run_without_consumer_cert_is_unknown() {
    let fx = fixture();
    std::fs::remove_file(fx.consumer_dir.join("cert.pem")).unwrap();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    write_entitlement(&fx.entitlement_dir, "1", "C-100", "P1", "2020-01-01", "2020-12-31");

    let toml_content = format!(
        r#"
[certificates]
product_dir = "{}"
entitlement_dir = "{}"

[registration]
consumer_dir = "{}"
"#,
        fx.product_dir.display(),
        fx.entitlement_dir.display(),
        fx.consumer_dir.display()
    );
    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    let output = fx.consumer_dir.join("report.json");

    let options = RunOptions {
        format: ReportFormat::Json,
        output: Some(output.clone()),
        at: parse_instant("2020-06-01", false),
        ..RunOptions::default()
    };
    let report = run(&config, options).await.unwrap();

    assert_eq!(report.summary.status, SystemStatus::Unknown);
    assert!(!report.summary.registered);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["summary"]["status"], "unknown");
}

#[tokio::test]
async fn test_missing_icon_fails_loudly() {
    let fx = fixture();
    let icon_dir = fx.consumer_dir.join("icons");
    std::fs::create_dir_all(&icon_dir).unwrap();
    std::fs::write(icon_dir.join("valid.svg"), "<svg/>").unwrap();

    let config = TomlConfig::from_toml_str(&format!(
        "[certificates]\nproduct_dir = \"{}\"\nentitlement_dir = \"{}\"\n",
        fx.product_dir.display(),
        fx.entitlement_dir.display()
    ))
    .unwrap();

    let options = RunOptions {
        icon_dir: Some(icon_dir),
        ..RunOptions::default()
    };
    let result = run(&config, options).await;

    tokio_test::assert_err!(&result);
    assert!(matches!(result, Err(ComplianceError::MissingIcon { .. })));
}

#[tokio::test]
async fn test_watcher_picks_up_new_certificate_on_disk() {
    use entitlement_compliance::core::watcher::CertificateWatcher;
    use std::time::Duration;

    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");

    let mut engine = engine_at(&fx, "2020-06-01").await;
    assert_eq!(engine.sorter().get_status("P1"), ComplianceStatus::NotSubscribed);

    let entitlement_dir = fx.entitlement_dir.clone();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        write_entitlement(&entitlement_dir, "1", "C-100", "P1", "2020-01-01", "2020-12-31");
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = tx.send(());
    });

    let refreshes = CertificateWatcher::new(Duration::from_millis(20))
        .run(&mut engine, async {
            let _ = rx.await;
        })
        .await
        .unwrap();

    assert!(refreshes >= 1);
    assert_eq!(engine.sorter().get_status("P1"), ComplianceStatus::Subscribed);
}

#[tokio::test]
async fn test_unlistable_entitlement_dir_degrades_to_not_subscribed() {
    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    std::fs::remove_dir_all(&fx.entitlement_dir).unwrap();
    std::fs::write(&fx.entitlement_dir, "not a directory").unwrap();

    let engine = engine_at(&fx, "2020-06-01").await;
    assert_eq!(engine.sorter().get_status("P1"), ComplianceStatus::NotSubscribed);
    assert_eq!(engine.report().summary.status, SystemStatus::Invalid);
}

#[tokio::test]
async fn test_reversed_validity_range_is_not_coverage() {
    let fx = fixture();
    write_product(&fx.product_dir, "p1.json", "P1", "Product One");
    write_entitlement(&fx.entitlement_dir, "1", "C-100", "P1", "2020-12-31", "2020-01-01");

    let engine = engine_at(&fx, "2020-06-01").await;
    assert_eq!(engine.sorter().get_status("P1"), ComplianceStatus::NotSubscribed);
    assert!(engine.sorter().future_products().is_empty());
}
