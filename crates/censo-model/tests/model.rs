//! Tests for censo-model types.

use censo_model::{
    Finding, Report, RunSession, RunStatus, SheetKind, SummaryStatistics, UnitOutcome, UnitStatus,
};

fn sample_report() -> Report {
    let findings = vec![
        Finding::critical("duplicate_detector", "rfc", "RFC duplicado")
            .with_rows(SheetKind::Active, vec![2, 3]),
        Finding::success("nss_validator", "nss", "NSS válidos"),
    ];
    let statistics = SummaryStatistics::compute(&findings, 2, 0);
    Report {
        run_id: "run-json".to_string(),
        findings,
        meta_finding: Finding::info("orchestrator", "execution", "2/2 agentes ejecutados exitosamente"),
        unit_outcomes: vec![UnitOutcome {
            name: "duplicate_detector".to_string(),
            status: UnitStatus::Succeeded,
            duration_ms: 4,
            finding_count: 1,
            error: None,
        }],
        statistics,
        dataset_fingerprint: "abc".to_string(),
        generated_at: chrono::Utc::now(),
    }
}

#[test]
fn session_serializes_with_uppercase_status() {
    let mut session = RunSession::new("run-json", "owner-1");
    session.begin_processing().unwrap();
    session.complete(sample_report()).unwrap();

    let json = serde_json::to_value(&session).expect("serialize session");
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["ownerId"], "owner-1");
    assert_eq!(json["report"]["statistics"]["canProceed"], false);

    let round: RunSession = serde_json::from_value(json).expect("deserialize session");
    assert_eq!(round.status, RunStatus::Completed);
    assert_eq!(round.report.unwrap().findings.len(), 2);
}

#[test]
fn every_valid_record_is_counted_once() {
    let report = sample_report();
    assert_eq!(report.statistics.valid_records, 0);
    assert_eq!(report.statistics.critical_by_field.get("rfc"), Some(&1));
    assert!(!report.can_proceed());
}
