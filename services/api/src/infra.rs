use metrics_exporter_prometheus::PrometheusHandle;
use partner_scorecard::config::AppConfig;
use partner_scorecard::scorecard::{Authenticator, BearerTokenAuthenticator, FileSnapshotStore};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn snapshot_store(config: &AppConfig) -> Arc<FileSnapshotStore> {
    Arc::new(FileSnapshotStore::new(
        config.storage.criteria_path(),
        config.storage.ledger_path(),
    ))
}

pub(crate) fn authenticator(config: &AppConfig) -> Arc<dyn Authenticator> {
    let authenticator = BearerTokenAuthenticator::new(config.auth.api_token.clone());
    if !authenticator.is_enforced() {
        warn!("SCORECARD_API_TOKEN is not set; scorecard routes accept unauthenticated requests");
    }
    Arc::new(authenticator)
}
