/// Structural failure while restoring a criteria or ledger snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("criteria snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("criteria snapshot must be a JSON object keyed by metric")]
    NotAnObject,
    #[error("criteria for '{metric}' must be an object keyed by score level")]
    MetricNotAnObject { metric: String },
    #[error("criteria snapshot names unknown metric '{0}'")]
    UnknownMetric(String),
    #[error("criteria for '{metric}' has unknown score level '{key}'")]
    UnknownLevel { metric: String, key: String },
    #[error("band '{key}' for '{metric}' must be a string")]
    BandNotAString { metric: String, key: String },
    #[error("ledger snapshot is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("ledger snapshot is missing column '{0}'")]
    MissingColumn(String),
    #[error("ledger row {row} has an empty partner name")]
    EmptyPartnerName { row: usize },
    #[error("ledger row {row} has invalid score '{value}' for '{metric}'")]
    InvalidScore {
        row: usize,
        metric: String,
        value: String,
    },
    #[error("ledger row {row} for '{partner}' has inconsistent {column}: expected {expected}, found '{found}'")]
    InconsistentDerivedValue {
        row: usize,
        partner: String,
        column: &'static str,
        expected: String,
        found: String,
    },
    #[error("ledger snapshot could not be written: {0}")]
    Write(String),
}
