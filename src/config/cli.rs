use crate::config::{
    DEFAULT_CONSUMER_DIR, DEFAULT_ENTITLEMENT_DIR, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_PRODUCT_DIR, MAX_POLL_INTERVAL_SECS,
};
use crate::core::export::ReportFormat;
use crate::core::ConfigProvider;
use crate::domain::model::parse_instant;
use crate::utils::error::{ComplianceError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_path, validate_positive_number,
    validate_range, Validate,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "entitlement-compliance")]
#[command(about = "Report whether installed products are covered by entitlement certificates")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_PRODUCT_DIR)]
    pub product_dir: String,

    #[arg(long, default_value = DEFAULT_ENTITLEMENT_DIR)]
    pub entitlement_dir: String,

    #[arg(long, default_value = DEFAULT_CONSUMER_DIR)]
    pub consumer_dir: String,

    /// System architecture, defaults to the architecture of this build
    #[arg(long)]
    pub arch: Option<String>,

    #[arg(long, default_value = "1")]
    pub sockets: u32,

    #[arg(long, help = "Treat the entitlement server as unreachable")]
    pub server_unreachable: bool,

    #[arg(long, help = "System is registered to another entitlement service")]
    pub registered_with_other: bool,

    /// Evaluate at this date (YYYY-MM-DD or RFC 3339) instead of now
    #[arg(long)]
    pub at: Option<String>,

    #[arg(long, default_value = "text")]
    pub format: String,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<String>,

    /// Directory with valid/partial/invalid/unknown status icons to validate
    #[arg(long)]
    pub icon_dir: Option<String>,

    #[arg(long, help = "Keep running and re-report when certificates change")]
    pub watch: bool,

    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn report_format(&self) -> Result<ReportFormat> {
        self.format.parse()
    }

    pub fn evaluation_instant(&self) -> Result<Option<DateTime<Utc>>> {
        match &self.at {
            None => Ok(None),
            Some(raw) => parse_instant(raw, false).map(Some).ok_or_else(|| {
                ComplianceError::InvalidConfigValueError {
                    field: "at".to_string(),
                    value: raw.clone(),
                    reason: "Expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
                }
            }),
        }
    }
}

impl ConfigProvider for CliConfig {
    fn product_dir(&self) -> &str {
        &self.product_dir
    }

    fn entitlement_dir(&self) -> &str {
        &self.entitlement_dir
    }

    fn consumer_dir(&self) -> &str {
        &self.consumer_dir
    }

    fn system_arch(&self) -> &str {
        self.arch.as_deref().unwrap_or(std::env::consts::ARCH)
    }

    fn system_sockets(&self) -> u32 {
        self.sockets
    }

    fn server_reachable(&self) -> bool {
        !self.server_unreachable
    }

    fn registered_with_other(&self) -> bool {
        self.registered_with_other
    }

    fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("product_dir", &self.product_dir)?;
        validate_path("entitlement_dir", &self.entitlement_dir)?;
        validate_path("consumer_dir", &self.consumer_dir)?;
        if let Some(output) = &self.output {
            validate_path("output", output)?;
        }
        if let Some(arch) = &self.arch {
            validate_non_empty_string("arch", arch)?;
        }
        validate_positive_number("sockets", self.sockets, 1)?;
        validate_one_of("format", &self.format.to_ascii_lowercase(), &ReportFormat::NAMES)?;
        validate_range(
            "poll_interval_secs",
            self.poll_interval_secs,
            1,
            MAX_POLL_INTERVAL_SECS,
        )?;
        self.evaluation_instant()?;
        Ok(())
    }
}
