use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use tempfile::tempdir;

use censo_core::{
    CensoConfig, FileSessionStore, Orchestrator, OrchestratorError, SessionStore, StoreError,
};
use censo_model::{
    DatasetMetadata, Finding, MappedDataset, ProgressEvent, RawCell, RawDataset, RawSheet,
    RunSession, RunStatus, SheetKind, UnitStatus,
};
use censo_validate::{UnitContext, UnitError, ValidatorRegistry, ValidatorUnit, default_registry};

fn text(value: &str) -> RawCell {
    RawCell::Text(value.to_string())
}

fn config() -> CensoConfig {
    let mut config = CensoConfig::default();
    config.policy.valuation_date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    config
}

fn active_sheet(count: usize) -> RawSheet {
    let mut rows = vec![vec![
        text("Número de empleado"),
        text("Nombre"),
        text("Fecha de nacimiento"),
        text("Fecha de ingreso"),
        text("Salario diario"),
    ]];
    for i in 0..count {
        rows.push(vec![
            text(&format!("E-{i:03}")),
            text("Empleado"),
            text("15/04/1985"),
            text("01/02/2012"),
            RawCell::Number(400.0 + i as f64),
        ]);
    }
    RawSheet::new("Activos", rows)
}

fn terminated_sheet(hired: &str, left: &str) -> RawSheet {
    RawSheet::new(
        "Bajas",
        vec![
            vec![
                text("Número de empleado"),
                text("Fecha de ingreso"),
                text("Fecha de baja"),
                text("Causa de baja"),
            ],
            vec![text("B-1"), text(hired), text(left), text("Renuncia voluntaria")],
        ],
    )
}

fn raw(active: RawSheet, terminated: RawSheet) -> RawDataset {
    RawDataset::new(active, terminated, DatasetMetadata::new("censo.xlsx", 4096))
}

fn clean_raw() -> RawDataset {
    raw(active_sheet(100), terminated_sheet("01/01/2015", "30/06/2024"))
}

/// Counts how often it ran.
struct CountingUnit(Arc<AtomicUsize>);

impl ValidatorUnit for CountingUnit {
    fn name(&self) -> &'static str {
        "counting_unit"
    }

    fn description(&self) -> &'static str {
        "counts dispatches"
    }

    fn validate(&self, _: &MappedDataset, _: &UnitContext) -> Result<Vec<Finding>, UnitError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Finding::success(self.name(), "dataset", "ok")])
    }
}

struct FailingUnit;

impl ValidatorUnit for FailingUnit {
    fn name(&self) -> &'static str {
        "failing_unit"
    }

    fn description(&self) -> &'static str {
        "always fails"
    }

    fn validate(&self, _: &MappedDataset, _: &UnitContext) -> Result<Vec<Finding>, UnitError> {
        Err(UnitError::Failed {
            unit: self.name().to_string(),
            reason: "estructura inesperada".to_string(),
        })
    }
}

struct PanickingUnit;

impl ValidatorUnit for PanickingUnit {
    fn name(&self) -> &'static str {
        "panicking_unit"
    }

    fn description(&self) -> &'static str {
        "panics"
    }

    fn validate(&self, _: &MappedDataset, _: &UnitContext) -> Result<Vec<Finding>, UnitError> {
        panic!("unit bug");
    }
}

struct SlowUnit(Duration);

impl ValidatorUnit for SlowUnit {
    fn name(&self) -> &'static str {
        "slow_unit"
    }

    fn description(&self) -> &'static str {
        "sleeps past its timeout"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_millis(50))
    }

    fn validate(&self, _: &MappedDataset, _: &UnitContext) -> Result<Vec<Finding>, UnitError> {
        std::thread::sleep(self.0);
        Ok(vec![Finding::success(self.name(), "dataset", "late")])
    }
}

/// Cites a row that does not exist.
struct MalformedUnit;

impl ValidatorUnit for MalformedUnit {
    fn name(&self) -> &'static str {
        "malformed_unit"
    }

    fn description(&self) -> &'static str {
        "cites a missing row"
    }

    fn validate(&self, _: &MappedDataset, _: &UnitContext) -> Result<Vec<Finding>, UnitError> {
        Ok(vec![
            Finding::warning(self.name(), "dataset", "fila fantasma")
                .with_rows(SheetKind::Active, vec![99_999]),
        ])
    }
}

struct OfflineStore;

impl SessionStore for OfflineStore {
    fn save_session(&self, _: &RunSession) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("sin conexión".into()))
    }

    fn load_session(&self, _: &str) -> Result<Option<RunSession>, StoreError> {
        Err(StoreError::Unavailable("sin conexión".into()))
    }

    fn append_event(&self, _: &ProgressEvent) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("sin conexión".into()))
    }

    fn events(&self, _: &str) -> Result<Vec<ProgressEvent>, StoreError> {
        Err(StoreError::Unavailable("sin conexión".into()))
    }
}

#[tokio::test]
async fn empty_active_sheet_errors_without_dispatch() {
    let count = Arc::new(AtomicUsize::new(0));
    let registry = ValidatorRegistry::new().with(CountingUnit(Arc::clone(&count)));
    let orchestrator = Orchestrator::new(registry, config());

    let empty = raw(RawSheet::new("Activos", vec![]), terminated_sheet("01/01/2015", "30/06/2024"));
    let session = orchestrator.start_run(empty, "run-empty", "actuario").unwrap().await.unwrap();

    assert_eq!(session.status, RunStatus::Error);
    assert!(session.error_message.unwrap().contains("personal activo"));
    assert!(session.report.is_none());
    assert_eq!(count.load(Ordering::SeqCst), 0);
    let progress = orchestrator.progress("run-empty").unwrap();
    assert!(progress.iter().any(|event| event.message.contains("personal activo")));
}

#[tokio::test]
async fn header_only_active_sheet_errors() {
    let orchestrator = Orchestrator::new(default_registry().clone(), config());
    let header_only = raw(active_sheet(0), RawSheet::default());
    let session = orchestrator.start_run(header_only, "run-header", "actuario").unwrap().await.unwrap();
    assert_eq!(session.status, RunStatus::Error);
    assert!(session.error_message.unwrap().contains("personal activo"));
}

#[tokio::test]
async fn failing_unit_is_isolated() {
    let registry = default_registry().clone().with(FailingUnit);
    let total = registry.len();
    let orchestrator = Orchestrator::new(registry, config());

    let session = orchestrator.start_run(clean_raw(), "run-fail", "actuario").unwrap().await.unwrap();
    assert_eq!(session.status, RunStatus::Completed);
    let report = session.report.unwrap();

    let expected = format!("{}/{total} agentes ejecutados exitosamente", total - 1);
    assert!(report.meta_finding.message.contains(&expected), "{}", report.meta_finding.message);
    assert!(report.meta_finding.message.contains("failing_unit"));
    for name in default_registry().names() {
        assert!(report.findings_for(name).next().is_some(), "missing findings from {name}");
    }
    let failed: Vec<_> = report.failed_units().map(|outcome| outcome.name.as_str()).collect();
    assert_eq!(failed, vec!["failing_unit"]);
    assert!(!report.findings.iter().any(|finding| finding.validator == "orchestrator"));
}

#[tokio::test]
async fn panicking_and_malformed_units_are_failures() {
    let registry = ValidatorRegistry::new()
        .with(PanickingUnit)
        .with(MalformedUnit)
        .with(CountingUnit(Arc::new(AtomicUsize::new(0))));
    let orchestrator = Orchestrator::new(registry, config());

    let session = orchestrator.start_run(clean_raw(), "run-bugs", "actuario").unwrap().await.unwrap();
    let report = session.report.unwrap();
    let statuses: Vec<_> = report.unit_outcomes.iter().map(|outcome| outcome.status).collect();
    assert_eq!(
        statuses,
        vec![UnitStatus::Failed, UnitStatus::Failed, UnitStatus::Succeeded]
    );
    assert!(report.unit_outcomes[1].error.as_deref().unwrap().contains("malformada"));
    assert_eq!(report.findings.len(), 1);
    assert!(report.meta_finding.message.starts_with("1/3"));
}

#[tokio::test]
async fn slow_unit_times_out_and_run_still_completes() {
    let registry = ValidatorRegistry::new()
        .with(SlowUnit(Duration::from_millis(400)))
        .with(CountingUnit(Arc::new(AtomicUsize::new(0))));
    let orchestrator = Orchestrator::new(registry, config());

    let session = orchestrator.start_run(clean_raw(), "run-slow", "actuario").unwrap().await.unwrap();
    assert_eq!(session.status, RunStatus::Completed);
    let report = session.report.unwrap();
    assert_eq!(report.unit_outcomes[0].status, UnitStatus::TimedOut);
    assert!(report.findings_for("slow_unit").next().is_none());
    assert!(report.findings_for("counting_unit").next().is_some());
}

#[tokio::test]
async fn findings_follow_registry_order() {
    let orchestrator = Orchestrator::new(default_registry().clone(), config());
    let session = orchestrator.start_run(clean_raw(), "run-order", "actuario").unwrap().await.unwrap();
    let report = session.report.unwrap();

    let order: Vec<&str> = default_registry().names().collect();
    let positions: Vec<usize> = report
        .findings
        .iter()
        .map(|finding| order.iter().position(|name| *name == finding.validator).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(report.statistics.total_records, 101);
    assert!(!report.dataset_fingerprint.is_empty());
}

#[tokio::test]
async fn hire_after_termination_blocks_the_valuation() {
    let orchestrator = Orchestrator::new(default_registry().clone(), config());
    let dataset = raw(active_sheet(20), terminated_sheet("01/01/2024", "30/06/2020"));
    let session = orchestrator.start_run(dataset, "run-dates", "actuario").unwrap().await.unwrap();
    let report = session.report.unwrap();

    let finding = report
        .findings_for("termination_analyzer")
        .find(|finding| finding.is_critical())
        .expect("critical termination finding");
    assert_eq!(finding.sheet, Some(SheetKind::Terminated));
    assert_eq!(finding.rows, vec![2]);
    assert!(!report.can_proceed());
    assert_eq!(report.can_proceed(), report.statistics.critical_count == 0);
}

#[tokio::test]
async fn duplicate_run_ids_are_rejected() {
    let orchestrator = Orchestrator::new(default_registry().clone(), config());
    let handle = orchestrator.start_run(clean_raw(), "run-dup", "actuario").unwrap();
    let err = orchestrator.start_run(clean_raw(), "run-dup", "otro").unwrap_err();
    assert!(matches!(err, OrchestratorError::DuplicateRun(id) if id == "run-dup"));
    handle.await.unwrap();
    assert!(orchestrator.start_run(clean_raw(), "run-dup", "otro").is_err());
}

#[tokio::test]
async fn unknown_runs_are_reported() {
    let orchestrator = Orchestrator::new(ValidatorRegistry::new(), config());
    assert!(matches!(
        orchestrator.get_status("nope"),
        Err(OrchestratorError::UnknownRun(_))
    ));
    assert!(orchestrator.cancel("nope").is_err());
}

#[tokio::test]
async fn cancellation_ends_in_error() {
    let registry = ValidatorRegistry::new().with(SlowUnit(Duration::from_millis(300)));
    let mut config = config();
    config.orchestrator.unit_timeouts_ms.insert("slow_unit".into(), 5_000);
    let orchestrator = Orchestrator::new(registry, config);

    let handle = orchestrator.start_run(clean_raw(), "run-cancel", "actuario").unwrap();
    assert!(orchestrator.cancel("run-cancel").unwrap());
    let session = handle.await.unwrap();

    assert_eq!(session.status, RunStatus::Error);
    assert!(session.cancelled);
    assert_eq!(orchestrator.get_status("run-cancel").unwrap().status, RunStatus::Error);
    assert!(!orchestrator.cancel("run-cancel").unwrap());
}

#[tokio::test]
async fn zero_concurrency_still_dispatches_every_unit() {
    let count = Arc::new(AtomicUsize::new(0));
    let registry = ValidatorRegistry::new().with(CountingUnit(Arc::clone(&count)));
    let mut config = config();
    config.orchestrator.max_concurrency = 0;
    config.orchestrator.default_unit_timeout_ms = 50;
    let orchestrator = Orchestrator::new(registry, config);

    let handle = orchestrator.start_run(clean_raw(), "run-zero", "actuario").unwrap();
    let session = tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("run settles")
        .unwrap();

    assert_eq!(session.status, RunStatus::Completed);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn completed_runs_cannot_be_cancelled() {
    let orchestrator = Orchestrator::new(default_registry().clone(), config());

    let session = orchestrator
        .start_run(clean_raw(), "run-done", "actuario")
        .unwrap()
        .await
        .unwrap();

    assert_eq!(session.status, RunStatus::Completed);
    assert!(!orchestrator.cancel("run-done").unwrap());
    let status = orchestrator.get_status("run-done").unwrap();
    assert_eq!(status.status, RunStatus::Completed);
    assert!(!status.cancelled);
}

#[tokio::test]
async fn file_store_keeps_session_and_log() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileSessionStore::open(dir.path()).unwrap());
    let orchestrator = Orchestrator::with_store(
        default_registry().clone(),
        config(),
        Arc::clone(&store) as Arc<dyn SessionStore>,
    );

    orchestrator.start_run(clean_raw(), "run-disk", "actuario").unwrap().await.unwrap();

    let stored = store.load_session("run-disk").unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::Completed);
    assert!(stored.report.is_some());
    let log = store.events("run-disk").unwrap();
    assert!(log.len() > default_registry().len());
    assert!(!orchestrator.is_degraded("run-disk"));

    // A fresh orchestrator over the same directory still sees the run.
    let reopened = Orchestrator::with_store(
        default_registry().clone(),
        config(),
        Arc::new(FileSessionStore::open(dir.path()).unwrap()),
    );
    assert_eq!(reopened.get_status("run-disk").unwrap().status, RunStatus::Completed);
    assert!(reopened.start_run(clean_raw(), "run-disk", "actuario").is_err());
}

#[tokio::test]
async fn finished_runs_are_read_back_from_the_durable_store() {
    let dir = tempdir().unwrap();
    let orchestrator = Orchestrator::with_store(
        default_registry().clone(),
        config(),
        Arc::new(FileSessionStore::open(dir.path()).unwrap()),
    );

    for run_id in ["run-a", "run-b", "run-c"] {
        let session = orchestrator
            .start_run(clean_raw(), run_id, "actuario")
            .unwrap()
            .await
            .unwrap();
        assert_eq!(session.status, RunStatus::Completed);
        assert!(!orchestrator.progress(run_id).unwrap().is_empty());
    }

    for entry in std::fs::read_dir(dir.path()).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }

    for run_id in ["run-a", "run-b", "run-c"] {
        assert!(matches!(
            orchestrator.get_status(run_id),
            Err(OrchestratorError::UnknownRun(_))
        ));
    }
}

#[tokio::test]
async fn offline_store_falls_back_to_memory() {
    let orchestrator =
        Orchestrator::with_store(default_registry().clone(), config(), Arc::new(OfflineStore));

    orchestrator.start_run(clean_raw(), "run-offline", "actuario").unwrap().await.unwrap();

    let session = orchestrator.get_status("run-offline").unwrap();
    assert_eq!(session.status, RunStatus::Completed);
    assert!(orchestrator.is_degraded("run-offline"));
    assert!(!orchestrator.progress("run-offline").unwrap().is_empty());
}
