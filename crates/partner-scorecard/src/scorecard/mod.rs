//! Partner scorecard engine: band matching, aggregation, ledger snapshots and
//! the session service that hosts them.

pub mod auth;
pub mod band;
pub mod criteria;
pub mod ledger;
pub mod metric;
pub mod record;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use auth::{Authenticator, BearerTokenAuthenticator};
pub use band::{BandRule, PerformanceValue};
pub use criteria::{BandSet, CriteriaSet};
pub use ledger::PartnerLedger;
pub use metric::{Metric, ScoreLevel, MAX_METRIC_SCORE, MAX_TOTAL_SCORE, METRIC_COUNT};
pub use record::{score_partner, MetricScoreView, ScoreTier, ScoredRecord, ScoredRecordView};
pub use repository::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore, StoreError};
pub use resolver::resolve_score;
pub use router::scorecard_router;
pub use service::{LedgerImport, ScorecardService, ScorecardServiceError, ScorecardSession};
pub use snapshot::SnapshotError;
