use super::band::BandRule;
use super::metric::{Metric, ScoreLevel};
use super::snapshot::SnapshotError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// The five raw band definitions of one metric, indexed by score level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandSet {
    bands: [String; 5],
}

impl BandSet {
    pub fn get(&self, level: ScoreLevel) -> &str {
        &self.bands[level.index()]
    }

    pub fn set(&mut self, level: ScoreLevel, definition: impl Into<String>) {
        self.bands[level.index()] = definition.into();
    }

    pub fn rule(&self, level: ScoreLevel) -> BandRule {
        BandRule::parse(self.get(level))
    }

    /// True when at least one band carries text.
    pub fn is_configured(&self) -> bool {
        self.bands.iter().any(|band| !band.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreLevel, &str)> + '_ {
        ScoreLevel::ascending()
            .into_iter()
            .map(move |level| (level, self.get(level)))
    }
}

impl Serialize for BandSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        for (level, band) in self.iter() {
            map.serialize_entry(&level.key(), band)?;
        }
        map.end()
    }
}

// Accepts `"Score 5"` keys as written in snapshots and bare `"5"` keys from
// API callers.
impl<'de> Deserialize<'de> for BandSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, String>::deserialize(deserializer)?;
        let mut set = BandSet::default();
        for (key, band) in raw {
            let level = ScoreLevel::from_key(&key)
                .or_else(|| key.trim().parse::<u8>().ok().and_then(ScoreLevel::new))
                .ok_or_else(|| {
                    <D::Error as serde::de::Error>::custom(format!("unknown score level '{key}'"))
                })?;
            set.set(level, band);
        }
        Ok(set)
    }
}

/// Band definitions for every metric in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaSet {
    metrics: BTreeMap<Metric, BandSet>,
}

impl Default for CriteriaSet {
    fn default() -> Self {
        Self {
            metrics: Metric::ordered()
                .into_iter()
                .map(|metric| (metric, BandSet::default()))
                .collect(),
        }
    }
}

impl CriteriaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> &BandSet {
        // Every metric is seeded on construction, so the entry always exists.
        static EMPTY: BandSet = BandSet {
            bands: [
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        };
        self.metrics.get(&metric).unwrap_or(&EMPTY)
    }

    /// Stores the raw definition as-is; syntax is only interpreted when scoring.
    pub fn set(&mut self, metric: Metric, level: ScoreLevel, definition: impl Into<String>) {
        self.metrics
            .entry(metric)
            .or_default()
            .set(level, definition);
    }

    pub fn is_configured(&self) -> bool {
        self.metrics.values().any(BandSet::is_configured)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &BandSet)> + '_ {
        Metric::ordered()
            .into_iter()
            .map(move |metric| (metric, self.get(metric)))
    }

    pub fn to_json(&self) -> String {
        // Maps of strings cannot fail to serialize.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Parses a snapshot produced by [`CriteriaSet::to_json`] or written by hand.
    /// Metrics and levels left out of the snapshot come back empty.
    pub fn from_json(snapshot: &str) -> Result<Self, SnapshotError> {
        let root: Value = serde_json::from_str(snapshot)?;
        let Value::Object(entries) = root else {
            return Err(SnapshotError::NotAnObject);
        };

        let mut criteria = Self::default();
        for (label, bands) in entries {
            let metric = Metric::from_label(&label)
                .ok_or_else(|| SnapshotError::UnknownMetric(label.clone()))?;
            let Value::Object(bands) = bands else {
                return Err(SnapshotError::MetricNotAnObject { metric: label });
            };

            for (key, band) in bands {
                let level = ScoreLevel::from_key(&key).ok_or_else(|| {
                    SnapshotError::UnknownLevel {
                        metric: label.clone(),
                        key: key.clone(),
                    }
                })?;
                let definition = match band {
                    Value::String(definition) => definition,
                    Value::Null => String::new(),
                    _ => {
                        return Err(SnapshotError::BandNotAString {
                            metric: label.clone(),
                            key,
                        })
                    }
                };
                criteria.set(metric, level, definition);
            }
        }

        Ok(criteria)
    }
}

impl Serialize for CriteriaSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.metrics.len()))?;
        for (metric, bands) in self.iter() {
            map.serialize_entry(metric.label(), bands)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(value: u8) -> ScoreLevel {
        ScoreLevel::new(value).expect("valid level")
    }

    #[test]
    fn unset_bands_default_to_empty() {
        let criteria = CriteriaSet::new();
        let bands = criteria.get(Metric::RenewalRate);
        assert!(bands.iter().all(|(_, band)| band.is_empty()));
        assert!(!criteria.is_configured());
    }

    #[test]
    fn set_stores_raw_text() {
        let mut criteria = CriteriaSet::new();
        criteria.set(Metric::RenewalRate, level(5), ">>> not valid <<<");
        assert_eq!(criteria.get(Metric::RenewalRate).get(level(5)), ">>> not valid <<<");
        assert!(criteria.is_configured());
    }

    #[test]
    fn snapshot_lists_metrics_in_catalog_order() {
        let criteria = CriteriaSet::new();
        let json = criteria.to_json();
        let first = json.find("Annual revenues for vendor").expect("first metric");
        let last = json.find("Financial strength").expect("last metric");
        assert!(first < last);
        assert!(json.contains("\"Score 1\": \"\""));
    }

    #[test]
    fn snapshot_round_trips() {
        let mut criteria = CriteriaSet::new();
        criteria.set(Metric::AnnualRevenues, level(5), "> $10,000,000");
        criteria.set(Metric::AnnualRevenues, level(4), "$5,000,000 - $10,000,000");
        criteria.set(Metric::KnownLitigation, level(5), "No");
        criteria.set(Metric::KnownLitigation, level(1), "Yes");

        let restored = CriteriaSet::from_json(&criteria.to_json()).expect("snapshot restores");
        assert_eq!(restored, criteria);
    }

    #[test]
    fn partial_snapshot_fills_missing_entries() {
        let restored = CriteriaSet::from_json(r#"{"Renewal rate": {"Score 5": "> 95%"}}"#)
            .expect("partial snapshot restores");
        assert_eq!(restored.get(Metric::RenewalRate).get(level(5)), "> 95%");
        assert_eq!(restored.get(Metric::RenewalRate).get(level(1)), "");
        assert_eq!(restored.get(Metric::FinancialStrength), &BandSet::default());
    }

    #[test]
    fn rejects_structurally_invalid_snapshots() {
        assert!(matches!(
            CriteriaSet::from_json("{not json"),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            CriteriaSet::from_json("[]"),
            Err(SnapshotError::NotAnObject)
        ));
        assert!(matches!(
            CriteriaSet::from_json(r#"{"Churn": {}}"#),
            Err(SnapshotError::UnknownMetric(_))
        ));
        assert!(matches!(
            CriteriaSet::from_json(r#"{"Renewal rate": "> 95"}"#),
            Err(SnapshotError::MetricNotAnObject { .. })
        ));
        assert!(matches!(
            CriteriaSet::from_json(r#"{"Renewal rate": {"Score 6": "> 95"}}"#),
            Err(SnapshotError::UnknownLevel { .. })
        ));
        assert!(matches!(
            CriteriaSet::from_json(r#"{"Renewal rate": {"Score 5": 95}}"#),
            Err(SnapshotError::BandNotAString { .. })
        ));
    }

    #[test]
    fn band_set_accepts_bare_level_keys() {
        let bands: BandSet =
            serde_json::from_str(r#"{"5": "> 90", "Score 4": "70-90"}"#).expect("bands parse");
        assert_eq!(bands.get(level(5)), "> 90");
        assert_eq!(bands.get(level(4)), "70-90");
        assert!(serde_json::from_str::<BandSet>(r#"{"7": "x"}"#).is_err());
    }
}
