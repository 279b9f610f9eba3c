use crate::core::engine::ComplianceEngine;
use crate::domain::ports::{CertificateSource, Clock, RegistrationProvider};
use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Polls the certificate source and refreshes the engine whenever its revision changes.
#[derive(Debug, Clone, Copy)]
pub struct CertificateWatcher {
    poll_interval: Duration,
}

impl CertificateWatcher {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Runs until `shutdown` resolves and returns how many refreshes happened.
    pub async fn run<S, R, C, F>(
        &self,
        engine: &mut ComplianceEngine<S, R, C>,
        shutdown: F,
    ) -> Result<usize>
    where
        S: CertificateSource,
        R: RegistrationProvider,
        C: Clock,
        F: Future<Output = ()>,
    {
        let mut last_revision = engine.source_revision().await?;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(
            "👀 Watching certificates every {:?}",
            self.poll_interval
        );

        let mut refreshes = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Certificate watcher stopped after {} refreshes", refreshes);
                    break;
                }
                _ = ticker.tick() => {
                    let revision = match engine.source_revision().await {
                        Ok(revision) => revision,
                        Err(e) => {
                            tracing::warn!("Could not check certificate directories: {}", e);
                            continue;
                        }
                    };
                    if revision == last_revision {
                        continue;
                    }

                    tracing::debug!("Certificates changed, recomputing compliance");
                    last_revision = revision;
                    // 重新載入失敗時保留舊的快照，下次變更再試
                    match engine.refresh().await {
                        Ok(_) => refreshes += 1,
                        Err(e) => tracing::warn!("Reload after certificate change failed: {}", e),
                    }
                }
            }
        }

        Ok(refreshes)
    }
}
