use crate::domain::model::{
    EntitlementCertificate, IdentityState, ProductCertificate, ServerReachability,
};
use crate::domain::ports::{CertificateSource, RegistrationProvider};
use crate::utils::error::{ComplianceError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

pub const CERTIFICATE_EXTENSION: &str = "json";
pub const CONSUMER_CERT_NAME: &str = "cert.pem";

/// Reads product and entitlement certificates from two directories of JSON records.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    product_dir: PathBuf,
    entitlement_dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>, E: Into<PathBuf>>(product_dir: P, entitlement_dir: E) -> Self {
        Self {
            product_dir: product_dir.into(),
            entitlement_dir: entitlement_dir.into(),
        }
    }

    pub fn product_dir(&self) -> &Path {
        &self.product_dir
    }

    pub fn entitlement_dir(&self) -> &Path {
        &self.entitlement_dir
    }
}

/// Certificate files in `dir`, sorted by name.
///
/// A directory that is missing or cannot be listed has no certificates.
async fn certificate_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Certificate directory {} does not exist", dir.display());
            return files;
        }
        Err(e) => {
            tracing::warn!("⚠️ Cannot read certificate directory {}: {}", dir.display(), e);
            return files;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some(CERTIFICATE_EXTENSION) {
                    files.push(path);
                }
            }
            Ok(None) => break,
            Err(e) => {
                // 列舉中途失敗：保留已取得的檔案
                tracing::warn!("⚠️ Stopped listing {}: {}", dir.display(), e);
                break;
            }
        }
    }
    files.sort();
    files
}

async fn read_certificate<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = tokio::fs::read(path).await?;
    serde_json::from_slice(&data).map_err(|e| ComplianceError::CertificateError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// 讀取目錄內所有憑證；無法讀取或解析的檔案略過，不中斷整體載入
async fn load_dir<T: DeserializeOwned>(dir: &Path) -> Vec<(PathBuf, T)> {
    let mut certs = Vec::new();
    for path in certificate_files(dir).await {
        match read_certificate::<T>(&path).await {
            Ok(cert) => certs.push((path, cert)),
            Err(e) => tracing::warn!("⚠️ Skipping certificate {}: {}", path.display(), e),
        }
    }
    certs
}

async fn hash_dir(dir: &Path, hasher: &mut DefaultHasher) -> Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            // 無法列舉的目錄以錯誤種類作為版本，目錄恢復後版本才會改變
            format!("{:?}", e.kind()).hash(hasher);
            return Ok(());
        }
    };

    let mut stamps = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(CERTIFICATE_EXTENSION) {
            continue;
        }
        let metadata = entry.metadata().await?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        stamps.push((path, metadata.len(), modified));
    }
    stamps.sort();
    stamps.hash(hasher);
    Ok(())
}

#[async_trait]
impl CertificateSource for DirectorySource {
    async fn load_products(&self) -> Result<Vec<ProductCertificate>> {
        let certs = load_dir::<ProductCertificate>(&self.product_dir).await;
        Ok(certs
            .into_iter()
            .map(|(path, mut cert)| {
                cert.path = Some(path.display().to_string());
                cert
            })
            .collect())
    }

    async fn load_entitlements(&self) -> Result<Vec<EntitlementCertificate>> {
        let certs = load_dir::<EntitlementCertificate>(&self.entitlement_dir).await;
        Ok(certs
            .into_iter()
            .map(|(path, mut cert)| {
                cert.path = Some(path.display().to_string());
                cert
            })
            .collect())
    }

    async fn revision(&self) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        hash_dir(&self.product_dir, &mut hasher).await?;
        hash_dir(&self.entitlement_dir, &mut hasher).await?;
        Ok(hasher.finish())
    }
}

/// Registration read from the consumer directory; reachability comes from configuration.
#[derive(Debug, Clone)]
pub struct FileRegistration {
    consumer_dir: PathBuf,
    reachability: ServerReachability,
    registered_with_other: bool,
}

impl FileRegistration {
    pub fn new<P: Into<PathBuf>>(consumer_dir: P) -> Self {
        Self {
            consumer_dir: consumer_dir.into(),
            reachability: ServerReachability::Reachable,
            registered_with_other: false,
        }
    }

    pub fn with_reachability(mut self, reachability: ServerReachability) -> Self {
        self.reachability = reachability;
        self
    }

    pub fn with_registered_with_other(mut self, registered_with_other: bool) -> Self {
        self.registered_with_other = registered_with_other;
        self
    }
}

impl RegistrationProvider for FileRegistration {
    fn current(&self) -> Result<IdentityState> {
        let registered = self.consumer_dir.join(CONSUMER_CERT_NAME).is_file();
        Ok(IdentityState {
            registered,
            reachability: self.reachability,
            registered_with_other: self.registered_with_other,
        })
    }
}
