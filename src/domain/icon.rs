use crate::domain::model::{ComplianceStatus, SystemStatus};
use crate::utils::error::{ComplianceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    Valid,
    Partial,
    Invalid,
    Unknown,
}

impl StatusIcon {
    pub const ALL: [StatusIcon; 4] = [
        StatusIcon::Valid,
        StatusIcon::Partial,
        StatusIcon::Invalid,
        StatusIcon::Unknown,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            StatusIcon::Valid => "valid.svg",
            StatusIcon::Partial => "partial.svg",
            StatusIcon::Invalid => "invalid.svg",
            StatusIcon::Unknown => "unknown.svg",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusIcon::Valid => "valid",
            StatusIcon::Partial => "partial",
            StatusIcon::Invalid => "invalid",
            StatusIcon::Unknown => "unknown",
        }
    }
}

impl From<ComplianceStatus> for StatusIcon {
    fn from(status: ComplianceStatus) -> Self {
        match status {
            ComplianceStatus::NotSubscribed
            | ComplianceStatus::FutureSubscribed
            | ComplianceStatus::Expired => StatusIcon::Invalid,
            ComplianceStatus::PartiallySubscribed => StatusIcon::Partial,
            ComplianceStatus::Unknown(_) => StatusIcon::Unknown,
            ComplianceStatus::Subscribed => StatusIcon::Valid,
        }
    }
}

impl From<SystemStatus> for StatusIcon {
    fn from(status: SystemStatus) -> Self {
        match status {
            SystemStatus::Valid => StatusIcon::Valid,
            SystemStatus::Partial => StatusIcon::Partial,
            SystemStatus::Invalid => StatusIcon::Invalid,
            SystemStatus::Unknown => StatusIcon::Unknown,
        }
    }
}

/// Icon image paths, checked for every `StatusIcon` when loaded.
#[derive(Debug, Clone)]
pub struct IconSet {
    paths: BTreeMap<StatusIcon, PathBuf>,
}

impl IconSet {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = BTreeMap::new();

        for icon in StatusIcon::ALL {
            let path = dir.join(icon.file_name());
            if !path.is_file() {
                tracing::error!("Iconset does not contain icon for '{}'", icon.as_str());
                return Err(ComplianceError::MissingIcon {
                    icon: icon.as_str().to_string(),
                    path: path.display().to_string(),
                });
            }
            paths.insert(icon, path);
        }

        tracing::debug!("Loaded {} status icons from {}", paths.len(), dir.display());
        Ok(Self { paths })
    }

    pub fn path(&self, icon: StatusIcon) -> &Path {
        // load() 已確保每個圖示都存在
        &self.paths[&icon]
    }
}
