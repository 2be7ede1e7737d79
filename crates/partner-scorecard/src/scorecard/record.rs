use super::criteria::CriteriaSet;
use super::metric::{Metric, MAX_METRIC_SCORE, MAX_TOTAL_SCORE};
use super::resolver::resolve_score;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Display bucket for a metric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Strong,
    Moderate,
    Weak,
}

impl ScoreTier {
    pub const fn for_score(score: u8) -> Self {
        match score {
            4..=u8::MAX => Self::Strong,
            3 => Self::Moderate,
            _ => Self::Weak,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Moderate => "Moderate",
            Self::Weak => "Weak",
        }
    }
}

/// One partner's per-metric scores. Total and percentage are derived so they
/// can never drift from the metric scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredRecord {
    partner_name: String,
    scores: BTreeMap<Metric, u8>,
}

impl ScoredRecord {
    /// Builds a record, clamping each score into `0..=5`. Metrics without a
    /// score count as 0. The trimmed partner name is the ledger key.
    pub fn new(partner_name: impl Into<String>, scores: BTreeMap<Metric, u8>) -> Self {
        let partner_name = partner_name.into();
        let scores = Metric::ordered()
            .into_iter()
            .map(|metric| {
                let score = scores.get(&metric).copied().unwrap_or(0);
                (metric, score.min(MAX_METRIC_SCORE))
            })
            .collect();
        Self {
            partner_name: partner_name.trim().to_string(),
            scores,
        }
    }

    pub fn partner_name(&self) -> &str {
        &self.partner_name
    }

    pub fn score(&self, metric: Metric) -> u8 {
        self.scores.get(&metric).copied().unwrap_or(0)
    }

    pub fn scores(&self) -> impl Iterator<Item = (Metric, u8)> + '_ {
        Metric::ordered()
            .into_iter()
            .map(move |metric| (metric, self.score(metric)))
    }

    pub fn total(&self) -> u32 {
        self.scores.values().map(|score| u32::from(*score)).sum()
    }

    /// Share of the maximum total, rounded to one decimal.
    pub fn percentage(&self) -> f64 {
        percentage_of_max(self.total())
    }

    pub fn view(&self) -> ScoredRecordView {
        ScoredRecordView {
            partner_name: self.partner_name.clone(),
            metrics: self
                .scores()
                .map(|(metric, score)| MetricScoreView {
                    metric,
                    score,
                    tier: ScoreTier::for_score(score),
                })
                .collect(),
            total: self.total(),
            max_total: MAX_TOTAL_SCORE,
            percentage: self.percentage(),
        }
    }
}

pub(crate) fn percentage_of_max(total: u32) -> f64 {
    let raw = f64::from(total) / f64::from(MAX_TOTAL_SCORE) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Scores every metric present in `performance`; metrics left out score 0.
pub fn score_partner<'a, I>(
    partner_name: &str,
    performance: I,
    criteria: &CriteriaSet,
) -> ScoredRecord
where
    I: IntoIterator<Item = (Metric, &'a str)>,
{
    let scores: BTreeMap<Metric, u8> = performance
        .into_iter()
        .map(|(metric, value)| (metric, resolve_score(value, criteria.get(metric))))
        .collect();

    let record = ScoredRecord::new(partner_name, scores);
    debug!(
        partner = record.partner_name(),
        total = record.total(),
        percentage = record.percentage(),
        "partner scored"
    );
    record
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricScoreView {
    pub metric: Metric,
    pub score: u8,
    pub tier: ScoreTier,
}

/// Serializable summary of a scored record with tier annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecordView {
    pub partner_name: String,
    pub metrics: Vec<MetricScoreView>,
    pub total: u32,
    pub max_total: u32,
    pub percentage: f64,
}
