use super::band::{BandRule, PerformanceValue};
use super::criteria::BandSet;
use super::metric::ScoreLevel;
use tracing::trace;

/// Maps a raw performance value onto the band set, returning 1..=5 for the
/// highest matching level or 0 when nothing matches.
pub fn resolve_score(performance: &str, bands: &BandSet) -> u8 {
    let value = PerformanceValue::parse(performance);
    resolve_level(&value, bands).map_or(0, ScoreLevel::value)
}

pub(crate) fn resolve_level(value: &PerformanceValue, bands: &BandSet) -> Option<ScoreLevel> {
    ScoreLevel::descending().into_iter().find(|level| {
        let rule = bands.rule(*level);
        if let BandRule::Malformed(band) = &rule {
            trace!(level = level.value(), band = %band, "skipping malformed band");
        }
        rule.matches(value)
    })
}
