use super::metric::Metric;
use super::record::{percentage_of_max, ScoredRecord};
use super::snapshot::SnapshotError;
use csv::StringRecord;
use std::collections::BTreeMap;
use std::io::Read;

pub const PARTNER_NAME_COLUMN: &str = "Partner Name";
pub const TOTAL_SCORE_COLUMN: &str = "Total Score";
pub const PERCENTAGE_COLUMN: &str = "Percentage";

/// Scored records keyed by partner name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerLedger {
    records: Vec<ScoredRecord>,
}

impl PartnerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapses duplicate names, keeping the last record for each.
    pub fn from_records(records: impl IntoIterator<Item = ScoredRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.upsert(record);
        }
        ledger
    }

    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, partner_name: &str) -> Option<&ScoredRecord> {
        let partner_name = partner_name.trim();
        self.records
            .iter()
            .find(|record| record.partner_name() == partner_name)
    }

    /// Inserts the record, replacing any record with the same partner name.
    /// The incoming record always lands at the end.
    pub fn upsert(&mut self, record: ScoredRecord) -> Option<ScoredRecord> {
        let replaced = self
            .records
            .iter()
            .position(|existing| existing.partner_name() == record.partner_name())
            .map(|index| self.records.remove(index));
        self.records.push(record);
        replaced
    }

    /// Last-write-wins merge: `existing` followed by `incoming`, with each name
    /// kept at the position of its final occurrence.
    pub fn merge(existing: &PartnerLedger, incoming: &PartnerLedger) -> PartnerLedger {
        let mut merged = existing.clone();
        merged.absorb(incoming.records.iter().cloned());
        merged
    }

    /// In-place variant of [`PartnerLedger::merge`]. Returns how many incoming
    /// records replaced an existing partner.
    pub fn absorb(&mut self, incoming: impl IntoIterator<Item = ScoredRecord>) -> usize {
        incoming
            .into_iter()
            .filter_map(|record| self.upsert(record))
            .count()
    }

    pub fn header() -> Vec<&'static str> {
        let mut header = Vec::with_capacity(Metric::ordered().len() + 3);
        header.push(PARTNER_NAME_COLUMN);
        header.extend(Metric::ordered().iter().map(|metric| metric.label()));
        header.push(TOTAL_SCORE_COLUMN);
        header.push(PERCENTAGE_COLUMN);
        header
    }

    pub fn to_csv(&self) -> Result<String, SnapshotError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(Self::header())?;

        for record in &self.records {
            let mut row = Vec::with_capacity(Metric::ordered().len() + 3);
            row.push(record.partner_name().to_string());
            row.extend(record.scores().map(|(_, score)| score.to_string()));
            row.push(record.total().to_string());
            row.push(format!("{:.1}", record.percentage()));
            writer.write_record(&row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| SnapshotError::Write(err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| SnapshotError::Write(err.to_string()))
    }

    /// Reads a ledger snapshot. Columns are located by header name; duplicate
    /// partner names collapse to their last row.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = LedgerColumns::locate(csv_reader.headers()?)?;

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            let row = row?;
            records.push(columns.parse_row(&row, index + 1)?);
        }

        Ok(Self::from_records(records))
    }
}

struct LedgerColumns {
    partner: usize,
    metrics: Vec<(Metric, usize)>,
    total: usize,
    percentage: usize,
}

impl LedgerColumns {
    fn locate(headers: &StringRecord) -> Result<Self, SnapshotError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| SnapshotError::MissingColumn(name.to_string()))
        };

        let metrics = Metric::ordered()
            .into_iter()
            .map(|metric| find(metric.label()).map(|index| (metric, index)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            partner: find(PARTNER_NAME_COLUMN)?,
            metrics,
            total: find(TOTAL_SCORE_COLUMN)?,
            percentage: find(PERCENTAGE_COLUMN)?,
        })
    }

    fn parse_row(&self, row: &StringRecord, row_number: usize) -> Result<ScoredRecord, SnapshotError> {
        let partner = row.get(self.partner).unwrap_or_default();
        if partner.is_empty() {
            return Err(SnapshotError::EmptyPartnerName { row: row_number });
        }

        let mut scores = BTreeMap::new();
        for (metric, column) in &self.metrics {
            let raw = row.get(*column).unwrap_or_default();
            let score = parse_whole_number(raw)
                .and_then(|score| u8::try_from(score).ok())
                .filter(|score| *score <= 5)
                .ok_or_else(|| SnapshotError::InvalidScore {
                    row: row_number,
                    metric: metric.label().to_string(),
                    value: raw.to_string(),
                })?;
            scores.insert(*metric, score);
        }

        let record = ScoredRecord::new(partner, scores);

        let raw_total = row.get(self.total).unwrap_or_default();
        if parse_whole_number(raw_total) != Some(u64::from(record.total())) {
            return Err(SnapshotError::InconsistentDerivedValue {
                row: row_number,
                partner: partner.to_string(),
                column: TOTAL_SCORE_COLUMN,
                expected: record.total().to_string(),
                found: raw_total.to_string(),
            });
        }

        let raw_percentage = row.get(self.percentage).unwrap_or_default();
        let expected = percentage_of_max(record.total());
        let consistent = raw_percentage
            .parse::<f64>()
            .is_ok_and(|found| (found * 10.0).round() == (expected * 10.0).round());
        if !consistent {
            return Err(SnapshotError::InconsistentDerivedValue {
                row: row_number,
                partner: partner.to_string(),
                column: PERCENTAGE_COLUMN,
                expected: format!("{expected:.1}"),
                found: raw_percentage.to_string(),
            });
        }

        Ok(record)
    }
}

// Spreadsheet exports sometimes write integers as `5.0`.
fn parse_whole_number(raw: &str) -> Option<u64> {
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
