use crate::domain::report::ComplianceReport;
use crate::utils::error::{ComplianceError, Result};
use crate::utils::format::{format_date, format_optional_date};
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub const NAMES: [&'static str; 3] = ["text", "json", "csv"];
}

impl FromStr for ReportFormat {
    type Err = ComplianceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(ComplianceError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: format!("Valid formats: {}", Self::NAMES.join(", ")),
            }),
        }
    }
}

pub fn render(report: &ComplianceReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
        ReportFormat::Csv => render_csv(report),
    }
}

pub fn render_json(report: &ComplianceReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_csv(report: &ComplianceReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "product",
        "version",
        "product_id",
        "arch",
        "status",
        "start_date",
        "end_date",
        "contracts",
        "subscriptions",
        "note",
    ])?;

    for entry in &report.products {
        writer.write_record(vec![
            entry.product.clone(),
            entry.version.clone(),
            entry.product_id.clone(),
            entry.arch.clone(),
            entry.status.to_string(),
            format_optional_date(entry.start_date.as_ref()),
            format_optional_date(entry.expiration_date.as_ref()),
            entry.contract_ids.join(";"),
            entry.subscriptions.join(";"),
            entry.validity_note.to_string(),
        ])?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| ComplianceError::IoError(e.into_error()))?;
    String::from_utf8(data).map_err(|e| ComplianceError::ConfigError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

pub fn render_text(report: &ComplianceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<32} {:<10} {:<22} {:<10} {:<10}",
        "Product", "Version", "Status", "Start", "End"
    );

    for entry in &report.products {
        let _ = writeln!(
            out,
            "{:<32} {:<10} {:<22} {:<10} {:<10}",
            entry.product,
            entry.version,
            entry.status.to_string(),
            format_optional_date(entry.start_date.as_ref()),
            format_optional_date(entry.expiration_date.as_ref()),
        );
        let _ = writeln!(out, "    {}", entry.validity_note);
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "System status: {} ({})",
        report.summary.status, report.summary.message
    );
    let _ = writeln!(out, "Evaluated at: {}", format_date(&report.evaluated_at));
    out
}
