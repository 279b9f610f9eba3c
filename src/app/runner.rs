use crate::adapters::filesystem::{DirectorySource, FileRegistration};
use crate::config::{directory_source, file_registration, poll_interval, system_facts};
use crate::core::engine::ComplianceEngine;
use crate::core::export::{render, ReportFormat};
use crate::core::watcher::CertificateWatcher;
use crate::core::ConfigProvider;
use crate::domain::icon::{IconSet, StatusIcon};
use crate::domain::ports::{Clock, ComplianceObserver, FixedClock, SystemClock};
use crate::domain::report::ComplianceReport;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub type DirectoryEngine = ComplianceEngine<DirectorySource, FileRegistration, Box<dyn Clock>>;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub icon_dir: Option<PathBuf>,
    pub at: Option<DateTime<Utc>>,
    pub watch: bool,
}

/// Writes every report it is notified with to stdout or a file.
#[derive(Debug, Clone)]
pub struct ReportPrinter {
    format: ReportFormat,
    output: Option<PathBuf>,
}

impl ReportPrinter {
    pub fn new(format: ReportFormat, output: Option<PathBuf>) -> Self {
        Self { format, output }
    }

    pub fn write(&self, report: &ComplianceReport) -> Result<()> {
        let rendered = render(report, self.format)?;
        match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                std::fs::write(path, rendered)?;
                tracing::info!("📁 Report saved to: {}", path.display());
            }
            None => println!("{}", rendered),
        }
        Ok(())
    }
}

impl ComplianceObserver for ReportPrinter {
    fn on_compliance_changed(&self, report: &ComplianceReport) {
        if let Err(e) = self.write(report) {
            tracing::error!("❌ Failed to write compliance report: {}", e);
        }
    }
}

pub async fn build_engine<C: ConfigProvider>(
    config: &C,
    at: Option<DateTime<Utc>>,
) -> Result<DirectoryEngine> {
    let clock: Box<dyn Clock> = match at {
        Some(instant) => Box::new(FixedClock(instant)),
        None => Box::new(SystemClock),
    };

    ComplianceEngine::load(
        directory_source(config),
        file_registration(config),
        clock,
        system_facts(config),
    )
    .await
}

/// Evaluates once, writes the report, and keeps watching when asked to.
pub async fn run<C: ConfigProvider>(config: &C, options: RunOptions) -> Result<ComplianceReport> {
    // 圖示缺漏屬於安裝問題，啟動時就失敗
    if let Some(dir) = &options.icon_dir {
        let icons = IconSet::load(dir)?;
        tracing::debug!(
            "Status icons ready, system icon path: {}",
            icons.path(StatusIcon::Valid).display()
        );
    }

    let mut engine = build_engine(config, options.at).await?;
    let printer = ReportPrinter::new(options.format, options.output.clone());

    let report = engine.report();
    tracing::info!(
        "✅ Evaluated {} installed products, system status: {}",
        report.products.len(),
        report.summary.status
    );
    printer.write(&report)?;

    if !options.watch {
        return Ok(report);
    }

    engine.subscribe(Box::new(printer));
    let watcher = CertificateWatcher::new(poll_interval(config));
    watcher
        .run(&mut engine, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Could not listen for ctrl-c: {}", e);
            }
        })
        .await?;

    Ok(engine.report())
}
