use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{info, warn};

use super::criteria::CriteriaSet;
use super::ledger::PartnerLedger;
use super::metric::{Metric, ScoreLevel};
use super::record::{score_partner, ScoredRecord};
use super::repository::{SnapshotStore, StoreError};
use super::snapshot::SnapshotError;

/// Explicit per-session state: the criteria in force and the partners scored
/// against them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScorecardSession {
    pub criteria: CriteriaSet,
    pub ledger: PartnerLedger,
}

impl ScorecardSession {
    /// Replaces the criteria only if the snapshot parses.
    pub fn restore_criteria(&mut self, snapshot: &str) -> Result<(), SnapshotError> {
        self.criteria = CriteriaSet::from_json(snapshot)?;
        Ok(())
    }

    /// Merges a ledger snapshot into the current ledger, last write wins.
    /// The ledger is untouched when the snapshot is invalid.
    pub fn import_ledger(&mut self, snapshot: &str) -> Result<LedgerImport, SnapshotError> {
        let incoming = PartnerLedger::from_csv(snapshot.as_bytes())?;
        let imported = incoming.len();
        let replaced = self.ledger.absorb(incoming.records().iter().cloned());
        Ok(LedgerImport {
            imported,
            replaced,
            partners: self.ledger.len(),
        })
    }

    pub fn score(
        &mut self,
        partner_name: &str,
        performance: &BTreeMap<Metric, String>,
    ) -> Result<ScoredRecord, ScorecardServiceError> {
        let partner_name = partner_name.trim();
        if partner_name.is_empty() {
            return Err(ScorecardServiceError::EmptyPartnerName);
        }
        if !self.criteria.is_configured() {
            return Err(ScorecardServiceError::CriteriaNotConfigured);
        }

        let record = score_partner(
            partner_name,
            performance
                .iter()
                .map(|(metric, value)| (*metric, value.as_str())),
            &self.criteria,
        );
        self.ledger.upsert(record.clone());
        Ok(record)
    }
}

/// Outcome of merging an imported ledger snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerImport {
    pub imported: usize,
    pub replaced: usize,
    pub partners: usize,
}

/// Service owning one scorecard session and persisting it through a
/// [`SnapshotStore`] after every change.
pub struct ScorecardService<S> {
    session: Mutex<ScorecardSession>,
    store: Arc<S>,
}

impl<S> ScorecardService<S>
where
    S: SnapshotStore + 'static,
{
    /// Starts an empty session without reading the store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            session: Mutex::new(ScorecardSession::default()),
            store,
        }
    }

    /// Starts a session from whatever snapshots the store already holds.
    pub fn open(store: Arc<S>) -> Result<Self, ScorecardServiceError> {
        let mut session = ScorecardSession::default();

        if let Some(snapshot) = store.load_criteria()? {
            session.restore_criteria(&snapshot)?;
        }
        if let Some(snapshot) = store.load_ledger()? {
            session.import_ledger(&snapshot)?;
        }

        if !session.criteria.is_configured() {
            warn!("no scoring criteria configured yet; partner scoring is disabled until criteria are saved");
        }
        info!(partners = session.ledger.len(), "scorecard session opened");

        Ok(Self {
            session: Mutex::new(session),
            store,
        })
    }

    // The session is only ever replaced wholesale, so a poisoned lock still
    // guards a consistent value.
    fn session(&self) -> MutexGuard<'_, ScorecardSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ScorecardSession {
        self.session().clone()
    }

    pub fn criteria(&self) -> CriteriaSet {
        self.session().criteria.clone()
    }

    pub fn criteria_snapshot(&self) -> String {
        self.session().criteria.to_json()
    }

    /// Replaces the criteria from a JSON snapshot. On any failure the current
    /// criteria stay in force.
    pub fn restore_criteria(&self, snapshot: &str) -> Result<(), ScorecardServiceError> {
        let mut session = self.session();
        let mut next = session.clone();
        next.restore_criteria(snapshot)?;
        self.store.save_criteria(&next.criteria.to_json())?;
        *session = next;
        info!("scoring criteria restored");
        Ok(())
    }

    pub fn set_band(
        &self,
        metric: Metric,
        level: ScoreLevel,
        definition: &str,
    ) -> Result<(), ScorecardServiceError> {
        let mut session = self.session();
        let mut next = session.criteria.clone();
        next.set(metric, level, definition);
        self.store.save_criteria(&next.to_json())?;
        session.criteria = next;
        info!(%metric, level = level.value(), "band definition saved");
        Ok(())
    }

    /// Scores a partner against the current criteria and upserts the record.
    pub fn score_partner(
        &self,
        partner_name: &str,
        performance: &BTreeMap<Metric, String>,
    ) -> Result<ScoredRecord, ScorecardServiceError> {
        let mut session = self.session();
        let mut next = session.clone();
        let record = next.score(partner_name, performance)?;
        self.store.save_ledger(&next.ledger.to_csv()?)?;
        *session = next;
        info!(
            partner = record.partner_name(),
            total = record.total(),
            percentage = record.percentage(),
            "partner scored and recorded"
        );
        Ok(record)
    }

    pub fn ledger(&self) -> PartnerLedger {
        self.session().ledger.clone()
    }

    pub fn ledger_snapshot(&self) -> Result<String, ScorecardServiceError> {
        Ok(self.session().ledger.to_csv()?)
    }

    pub fn import_ledger(&self, snapshot: &str) -> Result<LedgerImport, ScorecardServiceError> {
        let mut session = self.session();
        let mut next = session.clone();
        let outcome = next.import_ledger(snapshot)?;
        self.store.save_ledger(&next.ledger.to_csv()?)?;
        *session = next;
        info!(
            imported = outcome.imported,
            replaced = outcome.replaced,
            partners = outcome.partners,
            "ledger snapshot merged"
        );
        Ok(outcome)
    }
}

/// Error raised by the scorecard service.
#[derive(Debug, thiserror::Error)]
pub enum ScorecardServiceError {
    #[error("define and save scoring criteria before scoring partners")]
    CriteriaNotConfigured,
    #[error("partner name must not be empty")]
    EmptyPartnerName,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScorecardServiceError {
    /// HTTP status for this error; shared by the scorecard router and `AppError`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CriteriaNotConfigured => StatusCode::CONFLICT,
            Self::EmptyPartnerName | Self::Snapshot(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
