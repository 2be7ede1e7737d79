use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::scorecard::auth::{Authenticator, BearerTokenAuthenticator};
use crate::scorecard::criteria::CriteriaSet;
use crate::scorecard::metric::{Metric, ScoreLevel};
use crate::scorecard::repository::{InMemorySnapshotStore, SnapshotStore, StoreError};
use crate::scorecard::{scorecard_router, ScorecardService};

pub(super) const TOKEN: &str = "scorecard-test-token";

pub(super) fn level(value: u8) -> ScoreLevel {
    ScoreLevel::new(value).expect("valid level")
}

pub(super) fn criteria() -> CriteriaSet {
    let mut criteria = CriteriaSet::new();
    let revenue = [
        (5, ">$10,000,000"),
        (4, "$5,000,000-$10,000,000"),
        (3, "$1,000,000-$5,000,000"),
        (2, "$500,000-$1,000,000"),
        (1, "<$500,000"),
    ];
    for (value, band) in revenue {
        criteria.set(Metric::AnnualRevenues, level(value), band);
    }

    let renewal = [(5, ">95%"), (4, "90%-95%"), (3, "80%-90%"), (1, "<80%")];
    for (value, band) in renewal {
        criteria.set(Metric::RenewalRate, level(value), band);
    }

    criteria.set(Metric::KnownLitigation, level(5), "No");
    criteria.set(Metric::KnownLitigation, level(1), "Yes");
    criteria
}

pub(super) fn performance(entries: &[(Metric, &str)]) -> BTreeMap<Metric, String> {
    entries
        .iter()
        .map(|(metric, value)| (*metric, value.to_string()))
        .collect()
}

pub(super) fn strong_performance() -> BTreeMap<Metric, String> {
    performance(&[
        (Metric::AnnualRevenues, "$12,500,000"),
        (Metric::RenewalRate, "97%"),
        (Metric::KnownLitigation, "no"),
    ])
}

pub(super) fn configured_store() -> Arc<InMemorySnapshotStore> {
    Arc::new(InMemorySnapshotStore::with_snapshots(
        Some(criteria().to_json()),
        None,
    ))
}

pub(super) fn build_service() -> (
    ScorecardService<InMemorySnapshotStore>,
    Arc<InMemorySnapshotStore>,
) {
    let store = configured_store();
    let service = ScorecardService::open(store.clone()).expect("snapshots load");
    (service, store)
}

pub(super) fn authenticator() -> Arc<dyn Authenticator> {
    Arc::new(BearerTokenAuthenticator::new(Some(TOKEN.to_string())))
}

pub(super) fn router_with_service<S>(service: ScorecardService<S>) -> axum::Router
where
    S: SnapshotStore + 'static,
{
    scorecard_router(Arc::new(service), authenticator())
}

pub(super) fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

pub(super) async fn read_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose writes always fail; reads report nothing saved.
#[derive(Debug, Default)]
pub(super) struct ReadOnlyStore;

impl SnapshotStore for ReadOnlyStore {
    fn load_criteria(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn save_criteria(&self, _snapshot: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }

    fn load_ledger(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn save_ledger(&self, _snapshot: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }
}

/// Accepts criteria writes but refuses ledger writes.
#[derive(Debug, Default)]
pub(super) struct LedgerOutageStore {
    criteria: Mutex<Option<String>>,
}

impl SnapshotStore for LedgerOutageStore {
    fn load_criteria(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .criteria
            .lock()
            .map_err(|_| StoreError::Unavailable("poisoned".to_string()))?
            .clone())
    }

    fn save_criteria(&self, snapshot: &str) -> Result<(), StoreError> {
        *self
            .criteria
            .lock()
            .map_err(|_| StoreError::Unavailable("poisoned".to_string()))? =
            Some(snapshot.to_string());
        Ok(())
    }

    fn load_ledger(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn save_ledger(&self, _snapshot: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("ledger volume offline".to_string()))
    }
}
