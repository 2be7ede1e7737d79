use super::common::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scorecard::criteria::CriteriaSet;
use crate::scorecard::ledger::PartnerLedger;
use crate::scorecard::metric::Metric;
use crate::scorecard::record::ScoredRecord;
use crate::scorecard::repository::{InMemorySnapshotStore, SnapshotStore};
use crate::scorecard::snapshot::SnapshotError;
use crate::scorecard::{ScorecardService, ScorecardServiceError};

#[test]
fn open_restores_criteria_from_store() {
    let (service, _) = build_service();
    assert_eq!(service.criteria(), criteria());
    assert!(service.ledger().is_empty());
}

#[test]
fn scoring_requires_configured_criteria() {
    let service = ScorecardService::new(Arc::new(InMemorySnapshotStore::default()));

    match service.score_partner("Acme", &strong_performance()) {
        Err(ScorecardServiceError::CriteriaNotConfigured) => {}
        other => panic!("expected missing criteria, got {other:?}"),
    }
    assert!(service.ledger().is_empty());
}

#[test]
fn scoring_rejects_blank_partner_names() {
    let (service, _) = build_service();

    match service.score_partner("   ", &strong_performance()) {
        Err(ScorecardServiceError::EmptyPartnerName) => {}
        other => panic!("expected empty name rejection, got {other:?}"),
    }
}

#[test]
fn score_partner_records_and_persists_ledger() {
    let (service, store) = build_service();

    let record = service
        .score_partner("  Acme Resellers ", &strong_performance())
        .expect("partner scores");

    assert_eq!(record.partner_name(), "Acme Resellers");
    assert_eq!(record.score(Metric::AnnualRevenues), 5);
    assert_eq!(record.score(Metric::RenewalRate), 5);
    assert_eq!(record.score(Metric::KnownLitigation), 5);
    assert_eq!(record.score(Metric::FinancialStrength), 0);
    assert_eq!(record.total(), 15);
    assert_eq!(record.percentage(), 10.7);

    let saved = store
        .load_ledger()
        .expect("store readable")
        .expect("ledger saved");
    let ledger = PartnerLedger::from_csv(saved.as_bytes()).expect("saved ledger parses");
    assert_eq!(ledger.get("Acme Resellers"), Some(&record));
}

#[test]
fn rescoring_a_partner_replaces_the_earlier_record() {
    let (service, _) = build_service();

    service
        .score_partner("Acme", &strong_performance())
        .expect("first score");
    service
        .score_partner("Birch", &strong_performance())
        .expect("second partner");
    let weaker = performance(&[
        (Metric::AnnualRevenues, "$750,000"),
        (Metric::RenewalRate, "82%"),
        (Metric::KnownLitigation, "yes"),
    ]);
    let rescored = service.score_partner("Acme", &weaker).expect("rescored");

    assert_eq!(rescored.total(), 2 + 3 + 1);
    let ledger = service.ledger();
    let names: Vec<&str> = ledger.records().iter().map(|r| r.partner_name()).collect();
    assert_eq!(names, vec!["Birch", "Acme"]);
    assert_eq!(ledger.get("Acme"), Some(&rescored));
}

#[test]
fn invalid_criteria_snapshot_leaves_state_untouched() {
    let (service, store) = build_service();
    let before = store.load_criteria().expect("store readable");

    let result = service.restore_criteria(r#"{"Renewal rate": ["90%"]}"#);

    assert!(matches!(
        result,
        Err(ScorecardServiceError::Snapshot(SnapshotError::MetricNotAnObject { .. }))
    ));
    assert_eq!(service.criteria(), criteria());
    assert_eq!(store.load_criteria().expect("store readable"), before);
}

#[test]
fn restore_criteria_persists_the_normalized_snapshot() {
    let service = ScorecardService::new(Arc::new(InMemorySnapshotStore::default()));

    service
        .restore_criteria(r#"{"Renewal rate": {"Score 5": ">95%", "Score 1": null}}"#)
        .expect("partial snapshot accepted");

    let criteria = service.criteria();
    assert_eq!(criteria.get(Metric::RenewalRate).get(level(5)), ">95%");
    assert_eq!(criteria.get(Metric::RenewalRate).get(level(1)), "");
    assert!(criteria.is_configured());

    let restored = CriteriaSet::from_json(&service.criteria_snapshot()).expect("round trips");
    assert_eq!(restored, criteria);
}

#[test]
fn set_band_updates_one_definition() {
    let (service, store) = build_service();

    service
        .set_band(Metric::FinancialStrength, level(5), "Excellent")
        .expect("band saved");

    assert_eq!(
        service.criteria().get(Metric::FinancialStrength).get(level(5)),
        "Excellent"
    );
    let saved = store
        .load_criteria()
        .expect("store readable")
        .expect("criteria saved");
    let persisted = CriteriaSet::from_json(&saved).expect("snapshot parses");
    assert_eq!(persisted.get(Metric::FinancialStrength).get(level(5)), "Excellent");
    assert_eq!(persisted.get(Metric::AnnualRevenues), criteria().get(Metric::AnnualRevenues));
}

#[test]
fn failed_persistence_discards_the_change() {
    let service = ScorecardService::new(Arc::new(ReadOnlyStore));

    let result = service.set_band(Metric::RenewalRate, level(5), ">95%");

    assert!(matches!(result, Err(ScorecardServiceError::Store(_))));
    assert!(!service.criteria().is_configured());
}

#[test]
fn ledger_outage_does_not_record_the_partner() {
    let store = Arc::new(LedgerOutageStore::default());
    let service = ScorecardService::new(store);
    service
        .restore_criteria(&criteria().to_json())
        .expect("criteria saved");

    let result = service.score_partner("Acme", &strong_performance());

    assert!(matches!(result, Err(ScorecardServiceError::Store(_))));
    assert!(service.ledger().is_empty());
}

#[test]
fn import_merges_with_last_write_wins() {
    let (service, _) = build_service();
    service
        .score_partner("Acme", &strong_performance())
        .expect("scored");

    let mut low = BTreeMap::new();
    low.insert(Metric::AnnualRevenues, 1);
    let incoming = PartnerLedger::from_records(vec![
        ScoredRecord::new("Acme", low),
        ScoredRecord::new("Cedar", BTreeMap::new()),
    ]);

    let outcome = service
        .import_ledger(&incoming.to_csv().expect("csv renders"))
        .expect("import succeeds");

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.replaced, 1);
    assert_eq!(outcome.partners, 2);
    let ledger = service.ledger();
    assert_eq!(ledger.get("Acme").map(ScoredRecord::total), Some(1));
    assert_eq!(ledger.get("Cedar").map(ScoredRecord::total), Some(0));
}

#[test]
fn malformed_ledger_import_is_rejected_whole() {
    let (service, _) = build_service();
    service
        .score_partner("Acme", &strong_performance())
        .expect("scored");
    let before = service.ledger();

    let result = service.import_ledger("Partner Name,Total Score\nAcme,3\n");

    assert!(matches!(
        result,
        Err(ScorecardServiceError::Snapshot(SnapshotError::MissingColumn(_)))
    ));
    assert_eq!(service.ledger(), before);
}

#[test]
fn reopening_the_store_recovers_the_session() {
    let (service, store) = build_service();
    service
        .score_partner("Acme", &strong_performance())
        .expect("scored");
    let expected = service.snapshot();

    let reopened = ScorecardService::open(store).expect("reopens");

    assert_eq!(reopened.snapshot(), expected);
}
