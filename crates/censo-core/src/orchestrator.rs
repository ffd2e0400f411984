//! Run orchestration: map once, fan out validator units, fan in one report.
//!
//! # Lifecycle
//!
//! A run starts `PENDING`, moves to `PROCESSING` once the column mapper has
//! produced a dataset with active personnel, and ends `COMPLETED` with a
//! [`Report`] or `ERROR` with a message. Unit failures never end a run; they
//! are recorded per unit and summarized in the report's meta-finding.
//!
//! # Graceful Degradation
//!
//! - Unit error or panic: recorded as a failed [`UnitOutcome`]
//! - Unit timeout: recorded as timed out; a late result is discarded
//! - Findings citing rows outside the dataset: unit recorded as failed
//! - Session store down: state stays readable from memory
//! - Unit waiting past its timeout for a concurrency permit: recorded as
//!   timed out

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, info, info_span, warn};

use censo_map::ColumnMapper;
use censo_model::{
    Finding, MappedDataset, ProgressEvent, ProgressLevel, RawDataset, Report, RunSession,
    SummaryStatistics, UnitOutcome, UnitStatus,
};
use censo_validate::{UnitContext, ValidatorRegistry, ValidatorUnit};

use crate::config::CensoConfig;
use crate::error::OrchestratorError;
use crate::ledger::SessionLedger;
use crate::progress::ProgressSink;
use crate::store::SessionStore;

/// Validator name carried by the run's own diagnostic finding.
pub const META_VALIDATOR: &str = "orchestrator";
pub const META_FIELD: &str = "execution";

pub const NO_ACTIVE_PERSONNEL: &str =
    "No se encontraron datos de personal activo; cargue la hoja de personal activo con al menos un registro";
pub const CANCELLED: &str = "Ejecución cancelada por el usuario";

/// Owns run sessions and dispatches the registry against each dataset.
///
/// Cheap to clone; clones share sessions and configuration.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: ValidatorRegistry,
    config: CensoConfig,
    mapper: ColumnMapper,
    ledger: Arc<SessionLedger>,
    /// Cancel switches of runs still in flight.
    running: Mutex<HashMap<String, watch::Sender<bool>>>,
}

/// One unit's settled dispatch.
struct Dispatched {
    outcome: UnitOutcome,
    findings: Vec<Finding>,
}

impl Dispatched {
    fn failed(name: &str, status: UnitStatus, elapsed: Duration, error: String) -> Self {
        Self {
            outcome: UnitOutcome {
                name: name.to_string(),
                status,
                duration_ms: elapsed.as_millis() as u64,
                finding_count: 0,
                error: Some(error),
            },
            findings: Vec::new(),
        }
    }
}

impl Orchestrator {
    /// Sessions are kept in memory only.
    pub fn new(registry: ValidatorRegistry, config: CensoConfig) -> Self {
        Self::with_ledger(registry, config, SessionLedger::in_memory())
    }

    /// Sessions are written to `store`, with memory as the fallback.
    pub fn with_store(
        registry: ValidatorRegistry,
        config: CensoConfig,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self::with_ledger(registry, config, SessionLedger::with_primary(store))
    }

    fn with_ledger(registry: ValidatorRegistry, config: CensoConfig, ledger: SessionLedger) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                config,
                mapper: ColumnMapper::default(),
                ledger: Arc::new(ledger),
                running: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &CensoConfig {
        &self.inner.config
    }

    /// Creates a `PENDING` session and runs it in the background.
    ///
    /// Must be called from within a Tokio runtime. The returned handle
    /// resolves to the terminal session; polling [`Self::get_status`] gives
    /// the same result.
    pub fn start_run(
        &self,
        raw: RawDataset,
        run_id: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Result<JoinHandle<RunSession>, OrchestratorError> {
        let run_id = run_id.into();
        let mut running = self.inner.lock_running();
        let known = running.contains_key(&run_id)
            || self.inner.ledger.exists(&run_id).unwrap_or_else(|err| {
                warn!(run_id = %run_id, error = %err, "could not check session store for run id");
                false
            });
        if known {
            return Err(OrchestratorError::DuplicateRun(run_id));
        }

        let session = RunSession::new(run_id.clone(), owner_id);
        self.inner.ledger.save_session(&session);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        running.insert(run_id, cancel_tx);
        drop(running);

        let inner = Arc::clone(&self.inner);
        Ok(tokio::spawn(inner.execute(raw, session, cancel_rx)))
    }

    /// Latest known state of a run.
    pub fn get_status(&self, run_id: &str) -> Result<RunSession, OrchestratorError> {
        self.inner
            .ledger
            .load_session(run_id)?
            .ok_or_else(|| OrchestratorError::UnknownRun(run_id.to_string()))
    }

    /// Progress lines of a run in emission order.
    pub fn progress(&self, run_id: &str) -> Result<Vec<ProgressEvent>, OrchestratorError> {
        if !self.inner.ledger.exists(run_id)? {
            return Err(OrchestratorError::UnknownRun(run_id.to_string()));
        }
        Ok(self.inner.ledger.events(run_id)?)
    }

    /// Requests cooperative cancellation. Returns `false` when the run had
    /// already finished.
    pub fn cancel(&self, run_id: &str) -> Result<bool, OrchestratorError> {
        if let Some(switch) = self.inner.lock_running().get(run_id) {
            // The receiver lives as long as the run task.
            let _ = switch.send(true);
            info!(run_id, "cancellation requested");
            return Ok(true);
        }
        if self.inner.ledger.exists(run_id)? {
            Ok(false)
        } else {
            Err(OrchestratorError::UnknownRun(run_id.to_string()))
        }
    }

    /// True when the durable store failed for this run and memory holds its state.
    pub fn is_degraded(&self, run_id: &str) -> bool {
        self.inner.ledger.is_degraded(run_id)
    }
}

impl Inner {
    fn lock_running(&self) -> std::sync::MutexGuard<'_, HashMap<String, watch::Sender<bool>>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn execute(
        self: Arc<Self>,
        raw: RawDataset,
        session: RunSession,
        cancel: watch::Receiver<bool>,
    ) -> RunSession {
        let run_id = session.id.clone();
        let span = info_span!("run", run_id = %session.id, owner_id = %session.owner_id);
        let session = self.drive(raw, session, cancel).instrument(span).await;
        self.lock_running().remove(&run_id);
        session
    }

    async fn drive(
        &self,
        raw: RawDataset,
        mut session: RunSession,
        cancel: watch::Receiver<bool>,
    ) -> RunSession {
        let started = Instant::now();
        let sink = ProgressSink::new(session.id.clone(), Arc::clone(&self.ledger));
        sink.info(format!(
            "Sesión {} creada para {}",
            session.id, raw.metadata.file_name
        ));

        if raw.active.is_blank() {
            return self.abort(session, &sink, NO_ACTIVE_PERSONNEL).await;
        }
        if *cancel.borrow() {
            return self.cancelled(session, &sink).await;
        }

        sink.info("Mapeando columnas del censo");
        let mapper = self.mapper.clone();
        let mapped =
            tokio::task::spawn_blocking(move || mapper.map(&raw.active, &raw.terminated)).await;
        let dataset = match mapped {
            Ok(Ok(dataset)) => Arc::new(dataset),
            Ok(Err(err)) => {
                return self
                    .abort(session, &sink, format!("Error al mapear columnas: {err}"))
                    .await;
            }
            Err(err) => {
                return self
                    .abort(
                        session,
                        &sink,
                        format!("El mapeo de columnas terminó inesperadamente: {err}"),
                    )
                    .await;
            }
        };
        if dataset.active.is_empty() {
            return self.abort(session, &sink, NO_ACTIVE_PERSONNEL).await;
        }
        if *cancel.borrow() {
            return self.cancelled(session, &sink).await;
        }

        if let Err(err) = session.begin_processing() {
            warn!(error = %err, "run left PENDING before dispatch");
            return session;
        }
        self.persist(&session).await;
        sink.info(format!(
            "Procesando {} registros activos y {} bajas con {} agentes",
            dataset.active_count(),
            dataset.terminated_count(),
            self.registry.len()
        ));

        let dispatched = tokio::select! {
            dispatched = self.dispatch(Arc::clone(&dataset), &sink) => dispatched,
            () = cancellation(cancel.clone()) => return self.cancelled(session, &sink).await,
        };
        if *cancel.borrow() {
            return self.cancelled(session, &sink).await;
        }

        let report = self.aggregate(&session.id, &dataset, dispatched);
        let critical = report.statistics.critical_count;
        let warnings = report.statistics.warning_count;
        let can_proceed = report.can_proceed();
        let (level, verdict) = if can_proceed {
            (ProgressLevel::Success, "el censo puede usarse para la valuación")
        } else {
            (ProgressLevel::Error, "corrija los errores críticos antes de valuar")
        };
        sink.emit(
            level,
            format!("Validación completada: {critical} críticos, {warnings} advertencias; {verdict}"),
        );
        if let Err(err) = session.complete(report) {
            warn!(error = %err, "could not complete run");
            return session;
        }
        let session = self.finish(session).await;
        info!(
            duration_ms = started.elapsed().as_millis() as u64,
            critical,
            warnings,
            can_proceed,
            "run completed"
        );
        session
    }

    /// Runs every unit under the concurrency limit and settles them in
    /// registry order.
    async fn dispatch(&self, dataset: Arc<MappedDataset>, sink: &ProgressSink) -> Vec<Dispatched> {
        let limit = self.config.orchestrator.concurrency_limit();
        if limit != self.config.orchestrator.max_concurrency {
            warn!(
                configured = self.config.orchestrator.max_concurrency,
                limit, "concurrency limit raised to the minimum"
            );
        }
        let semaphore = Arc::new(Semaphore::new(limit));
        let ctx = UnitContext::new(self.config.policy.clone()).with_reporter(Arc::new(sink.clone()));

        let handles: Vec<(&'static str, JoinHandle<Dispatched>)> = self
            .registry
            .iter()
            .map(|unit| {
                let name = unit.name();
                let timeout = self.config.orchestrator.timeout_for(unit.as_ref());
                let task = run_unit(
                    Arc::clone(unit),
                    Arc::clone(&dataset),
                    ctx.clone(),
                    Arc::clone(&semaphore),
                    timeout,
                );
                let span = info_span!("unit", unit = name);
                (name, tokio::spawn(task.instrument(span)))
            })
            .collect();

        let mut settled = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let dispatched = handle.await.unwrap_or_else(|err| {
                Dispatched::failed(name, UnitStatus::Failed, Duration::ZERO, join_message(&err))
            });
            let outcome = &dispatched.outcome;
            match outcome.status {
                UnitStatus::Succeeded => sink.success(format!(
                    "Agente {name}: {} hallazgos en {} ms",
                    outcome.finding_count, outcome.duration_ms
                )),
                UnitStatus::Failed | UnitStatus::TimedOut => sink.error(format!(
                    "Agente {name} falló: {}",
                    outcome.error.as_deref().unwrap_or("error desconocido")
                )),
            }
            settled.push(dispatched);
        }
        settled
    }

    fn aggregate(&self, run_id: &str, dataset: &MappedDataset, dispatched: Vec<Dispatched>) -> Report {
        let mut findings = Vec::new();
        let mut unit_outcomes = Vec::with_capacity(dispatched.len());
        for unit in dispatched {
            findings.extend(unit.findings);
            unit_outcomes.push(unit.outcome);
        }
        let statistics =
            SummaryStatistics::compute(&findings, dataset.active_count(), dataset.terminated_count());
        Report {
            run_id: run_id.to_string(),
            meta_finding: meta_finding(&unit_outcomes),
            findings,
            unit_outcomes,
            statistics,
            dataset_fingerprint: dataset.fingerprint.clone(),
            generated_at: Utc::now(),
        }
    }

    async fn abort(
        &self,
        mut session: RunSession,
        sink: &ProgressSink,
        message: impl Into<String>,
    ) -> RunSession {
        let message = message.into();
        warn!(reason = %message, "run aborted");
        sink.error(message.clone());
        if let Err(err) = session.fail(message) {
            warn!(error = %err, "could not mark run as failed");
            return session;
        }
        self.finish(session).await
    }

    async fn cancelled(&self, mut session: RunSession, sink: &ProgressSink) -> RunSession {
        info!("run cancelled");
        sink.error(CANCELLED);
        if let Err(err) = session.cancel(CANCELLED) {
            warn!(error = %err, "could not mark run as cancelled");
            return session;
        }
        self.finish(session).await
    }

    /// Drops the cancel switch, then writes the terminal session.
    ///
    /// Once a terminal state is visible, [`Orchestrator::cancel`] reports the
    /// run as finished.
    async fn finish(&self, session: RunSession) -> RunSession {
        self.lock_running().remove(&session.id);
        self.persist(&session).await;
        session
    }

    /// Writes a session snapshot on the blocking pool.
    async fn persist(&self, session: &RunSession) {
        let ledger = Arc::clone(&self.ledger);
        let snapshot = session.clone();
        let write = tokio::task::spawn_blocking(move || ledger.save_session(&snapshot));
        if let Err(err) = write.await {
            warn!(error = %err, "session write task failed");
        }
    }
}

/// Resolves once the cancel switch is set; never if the switch is dropped.
async fn cancellation(mut switch: watch::Receiver<bool>) {
    loop {
        if *switch.borrow_and_update() {
            return;
        }
        if switch.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn run_unit(
    unit: Arc<dyn ValidatorUnit>,
    dataset: Arc<MappedDataset>,
    ctx: UnitContext,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
) -> Dispatched {
    let name = unit.name();
    let queued = Instant::now();
    let _permit = match tokio::time::timeout(timeout, semaphore.acquire_owned()).await {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) => {
            return Dispatched::failed(
                name,
                UnitStatus::Failed,
                queued.elapsed(),
                "límite de concurrencia cerrado".to_string(),
            );
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "unit never got a permit");
            return Dispatched::failed(
                name,
                UnitStatus::TimedOut,
                queued.elapsed(),
                format!("sin turno de ejecución tras {} ms", timeout.as_millis()),
            );
        }
    };

    let started = Instant::now();
    let snapshot = Arc::clone(&dataset);
    let work = tokio::task::spawn_blocking(move || unit.validate(&snapshot, &ctx));
    let result = tokio::time::timeout(timeout, work).await;
    let elapsed = started.elapsed();

    match result {
        Ok(Ok(Ok(findings))) => {
            if let Err(reason) = check_rows(&dataset, &findings) {
                warn!(reason = %reason, "unit returned malformed output");
                return Dispatched::failed(
                    name,
                    UnitStatus::Failed,
                    elapsed,
                    format!("salida malformada: {reason}"),
                );
            }
            info!(
                duration_ms = elapsed.as_millis() as u64,
                findings = findings.len(),
                "unit completed"
            );
            Dispatched {
                outcome: UnitOutcome {
                    name: name.to_string(),
                    status: UnitStatus::Succeeded,
                    duration_ms: elapsed.as_millis() as u64,
                    finding_count: findings.len(),
                    error: None,
                },
                findings,
            }
        }
        Ok(Ok(Err(err))) => {
            warn!(error = %err, "unit failed");
            Dispatched::failed(name, UnitStatus::Failed, elapsed, err.to_string())
        }
        Ok(Err(err)) => {
            let message = join_message(&err);
            warn!(error = %message, "unit task failed");
            Dispatched::failed(name, UnitStatus::Failed, elapsed, message)
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "unit timed out");
            Dispatched::failed(
                name,
                UnitStatus::TimedOut,
                elapsed,
                format!("tiempo agotado tras {} ms", timeout.as_millis()),
            )
        }
    }
}

fn join_message(err: &JoinError) -> String {
    if err.is_panic() {
        "el agente terminó con un pánico".to_string()
    } else {
        format!("la tarea del agente fue cancelada: {err}")
    }
}

/// Every cited row must exist in the sheet the finding names.
fn check_rows(dataset: &MappedDataset, findings: &[Finding]) -> Result<(), String> {
    for finding in findings {
        if finding.rows.is_empty() {
            continue;
        }
        let Some(sheet) = finding.sheet else {
            return Err(format!("'{}' cita filas sin indicar la hoja", finding.message));
        };
        if let Some(row) = finding
            .rows
            .iter()
            .find(|row| !dataset.contains_row(sheet, **row))
        {
            return Err(format!(
                "'{}' cita la fila {row}, que no existe en {}",
                finding.message,
                sheet.label()
            ));
        }
    }
    Ok(())
}

/// The run's own diagnostic: how many units succeeded and which failed.
pub fn meta_finding(outcomes: &[UnitOutcome]) -> Finding {
    let total = outcomes.len();
    let failed: Vec<&UnitOutcome> = outcomes.iter().filter(|outcome| !outcome.succeeded()).collect();
    let succeeded = total - failed.len();
    let message = format!("{succeeded}/{total} agentes ejecutados exitosamente");
    let details: Vec<_> = failed
        .iter()
        .map(|outcome| json!({ "name": outcome.name, "status": outcome.status, "error": outcome.error }))
        .collect();

    let finding = if failed.is_empty() {
        Finding::success(META_VALIDATOR, META_FIELD, message)
    } else {
        let names = failed
            .iter()
            .map(|outcome| outcome.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Finding::warning(META_VALIDATOR, META_FIELD, format!("{message}; fallaron: {names}"))
            .with_suggestion("Revise la bitácora de ejecución y repita la validación")
    };
    finding.with_metadata(json!({
        "succeeded": succeeded,
        "total": total,
        "failed": details,
    }))
}
