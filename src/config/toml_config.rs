use crate::config::{
    DEFAULT_CONSUMER_DIR, DEFAULT_ENTITLEMENT_DIR, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_PRODUCT_DIR, MAX_POLL_INTERVAL_SECS,
};
use crate::core::export::ReportFormat;
use crate::core::ConfigProvider;
use crate::utils::error::{ComplianceError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_path, validate_positive_number,
    validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub certificates: CertificatesConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub report: ReportConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificatesConfig {
    pub product_dir: String,
    pub entitlement_dir: String,
}

impl Default for CertificatesConfig {
    fn default() -> Self {
        Self {
            product_dir: DEFAULT_PRODUCT_DIR.to_string(),
            entitlement_dir: DEFAULT_ENTITLEMENT_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub consumer_dir: String,
    pub server_reachable: Option<bool>,
    pub registered_with_other: Option<bool>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            consumer_dir: DEFAULT_CONSUMER_DIR.to_string(),
            server_reachable: None,
            registered_with_other: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    pub arch: Option<String>,
    pub sockets: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub format: Option<String>,
    pub output_path: Option<String>,
    pub icon_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub poll_interval_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ComplianceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ComplianceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CERT_ROOT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ComplianceError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn report_format(&self) -> Result<ReportFormat> {
        self.report.format.as_deref().unwrap_or("text").parse()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("certificates.product_dir", &self.certificates.product_dir)?;
        validate_path(
            "certificates.entitlement_dir",
            &self.certificates.entitlement_dir,
        )?;
        validate_path("registration.consumer_dir", &self.registration.consumer_dir)?;

        if let Some(arch) = &self.system.arch {
            validate_non_empty_string("system.arch", arch)?;
        }
        if let Some(sockets) = self.system.sockets {
            validate_positive_number("system.sockets", sockets, 1)?;
        }

        if let Some(format) = &self.report.format {
            validate_one_of(
                "report.format",
                &format.to_ascii_lowercase(),
                &ReportFormat::NAMES,
            )?;
        }
        if let Some(output_path) = &self.report.output_path {
            validate_path("report.output_path", output_path)?;
        }

        if let Some(interval) = self.monitoring.as_ref().and_then(|m| m.poll_interval_secs) {
            validate_range(
                "monitoring.poll_interval_secs",
                interval,
                1,
                MAX_POLL_INTERVAL_SECS,
            )?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn product_dir(&self) -> &str {
        &self.certificates.product_dir
    }

    fn entitlement_dir(&self) -> &str {
        &self.certificates.entitlement_dir
    }

    fn consumer_dir(&self) -> &str {
        &self.registration.consumer_dir
    }

    fn system_arch(&self) -> &str {
        self.system
            .arch
            .as_deref()
            .unwrap_or(std::env::consts::ARCH)
    }

    fn system_sockets(&self) -> u32 {
        self.system.sockets.unwrap_or(1)
    }

    fn server_reachable(&self) -> bool {
        self.registration.server_reachable.unwrap_or(true)
    }

    fn registered_with_other(&self) -> bool {
        self.registration.registered_with_other.unwrap_or(false)
    }

    fn poll_interval_secs(&self) -> u64 {
        self.monitoring
            .as_ref()
            .and_then(|m| m.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
