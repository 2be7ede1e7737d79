use clap::Args;
use partner_scorecard::error::AppError;
use partner_scorecard::scorecard::{
    CriteriaSet, FileSnapshotStore, Metric, PartnerLedger, ScoreTier, ScorecardService,
    ScorecardSession, ScoredRecord, StoreError, MAX_TOTAL_SCORE,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Criteria snapshot (JSON keyed by metric label)
    #[arg(long)]
    pub(crate) criteria: PathBuf,
    /// Performance values (JSON object of metric label to value)
    #[arg(long)]
    pub(crate) performance: PathBuf,
    /// Partner name recorded on the scorecard
    #[arg(long)]
    pub(crate) partner: String,
    /// Ledger CSV to upsert the scored partner into
    #[arg(long)]
    pub(crate) ledger: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CriteriaTemplateArgs {
    /// Write the template here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct LedgerMergeArgs {
    /// Ledger whose rows are kept unless overridden
    #[arg(long)]
    pub(crate) existing: PathBuf,
    /// Ledger whose rows win for partners present in both
    #[arg(long)]
    pub(crate) incoming: PathBuf,
    /// Write the merged ledger here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct LedgerShowArgs {
    #[arg(long)]
    pub(crate) ledger: PathBuf,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        criteria,
        performance,
        partner,
        ledger,
    } = args;

    let performance = parse_performance(&read_file(&performance)?)?;

    let record = match ledger {
        Some(ledger) => {
            let store = Arc::new(FileSnapshotStore::new(criteria, ledger));
            let service = ScorecardService::open(store)?;
            service.score_partner(&partner, &performance)?
        }
        None => {
            let mut session = ScorecardSession::default();
            session.restore_criteria(&read_file(&criteria)?)?;
            session.score(&partner, &performance)?
        }
    };

    render_record(&mut io::stdout().lock(), &record)?;
    Ok(())
}

pub(crate) fn run_criteria_template(args: CriteriaTemplateArgs) -> Result<(), AppError> {
    let template = CriteriaSet::new().to_json();
    emit(args.output.as_deref(), &template)
}

pub(crate) fn run_ledger_merge(args: LedgerMergeArgs) -> Result<(), AppError> {
    let existing = PartnerLedger::from_csv(read_file(&args.existing)?.as_bytes())?;
    let incoming = PartnerLedger::from_csv(read_file(&args.incoming)?.as_bytes())?;
    let merged = PartnerLedger::merge(&existing, &incoming);

    emit(args.output.as_deref(), &merged.to_csv()?)?;
    if let Some(output) = &args.output {
        println!(
            "Merged {} + {} rows into {} partners at {}",
            existing.len(),
            incoming.len(),
            merged.len(),
            output.display()
        );
    }
    Ok(())
}

pub(crate) fn run_ledger_show(args: LedgerShowArgs) -> Result<(), AppError> {
    let ledger = PartnerLedger::from_csv(read_file(&args.ledger)?.as_bytes())?;
    render_ledger(&mut io::stdout().lock(), &ledger)?;
    Ok(())
}

/// Reads `{"<metric label>": value}`; numbers are taken as written and `null`
/// as blank.
pub(crate) fn parse_performance(raw: &str) -> Result<BTreeMap<Metric, String>, AppError> {
    let entries: BTreeMap<Metric, Value> = serde_json::from_str(raw)
        .map_err(|err| AppError::Input(format!("performance file: {err}")))?;

    entries
        .into_iter()
        .map(|(metric, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Null => String::new(),
                other => {
                    return Err(AppError::Input(format!(
                        "performance for '{metric}' must be a string or number, got {other}"
                    )))
                }
            };
            Ok((metric, text))
        })
        .collect()
}

pub(crate) fn render_record(out: &mut impl Write, record: &ScoredRecord) -> io::Result<()> {
    let view = record.view();
    writeln!(out, "Scorecard for {}", view.partner_name)?;
    for entry in &view.metrics {
        writeln!(
            out,
            "  - {}: {} ({})",
            entry.metric,
            entry.score,
            entry.tier.label()
        )?;
    }
    writeln!(
        out,
        "Total: {}/{} ({:.1}%)",
        view.total, view.max_total, view.percentage
    )
}

pub(crate) fn render_ledger(out: &mut impl Write, ledger: &PartnerLedger) -> io::Result<()> {
    if ledger.is_empty() {
        return writeln!(out, "No partners recorded");
    }

    writeln!(out, "{} partners", ledger.len())?;
    for record in ledger.records() {
        let count = |tier: ScoreTier| {
            record
                .scores()
                .filter(|(_, score)| ScoreTier::for_score(*score) == tier)
                .count()
        };
        writeln!(
            out,
            "- {}: {}/{} ({:.1}%) | {} strong, {} moderate, {} weak",
            record.partner_name(),
            record.total(),
            MAX_TOTAL_SCORE,
            record.percentage(),
            count(ScoreTier::Strong),
            count(ScoreTier::Moderate),
            count(ScoreTier::Weak)
        )?;
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|source| {
        StoreError::Read {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

fn emit(output: Option<&Path>, contents: &str) -> Result<(), AppError> {
    match output {
        Some(path) => fs::write(path, contents).map_err(|source| {
            StoreError::Write {
                path: path.to_path_buf(),
                source,
            }
            .into()
        }),
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}
