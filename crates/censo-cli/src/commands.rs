use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use censo_cli::load::load_dataset;
use censo_core::{CensoConfig, ConfigError, FileSessionStore, Orchestrator};
use censo_map::FieldSynonymTable;
use censo_model::{CanonicalField, ProgressEvent, ProgressLevel, RunSession};
use censo_validate::default_registry;

use crate::cli::RunArgs;
use crate::summary::{apply_table_style, header_cell};

const POLL_INTERVAL: Duration = Duration::from_millis(150);

pub fn run_fields() -> Result<()> {
    let table_data = FieldSynonymTable::default();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Type"),
        header_cell("Sheets"),
        header_cell("Synonyms"),
    ]);
    apply_table_style(&mut table);
    for field in CanonicalField::ALL {
        table.add_row(vec![
            field.name().to_string(),
            field.label().to_string(),
            format!("{:?}", field.field_type()),
            format!("{:?}", field.applicability()),
            table_data.synonyms(field).join(", "),
        ]);
    }
    println!("Synonym table version {}", table_data.version());
    println!("{table}");
    Ok(())
}

pub fn run_validators(config_path: Option<&Path>) -> Result<()> {
    let config = CensoConfig::load_or_default(config_path).map_err(config_error)?;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Unit"),
        header_cell("Priority"),
        header_cell("Timeout (ms)"),
        header_cell("Depends on"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    for (index, unit) in default_registry().iter().enumerate() {
        let timeout = config.orchestrator.timeout_for(unit.as_ref());
        let dependencies = unit.dependencies();
        table.add_row(vec![
            (index + 1).to_string(),
            unit.name().to_string(),
            unit.priority().to_string(),
            timeout.as_millis().to_string(),
            if dependencies.is_empty() {
                "-".to_string()
            } else {
                dependencies.join(", ")
            },
            unit.description().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Runs one census through the orchestrator and returns the terminal session.
pub fn run_census(args: &RunArgs) -> Result<RunSession> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    runtime.block_on(run_census_async(args))
}

async fn run_census_async(args: &RunArgs) -> Result<RunSession> {
    let mut config = CensoConfig::load_or_default(args.config.as_deref()).map_err(config_error)?;
    if let Some(date) = args.valuation_date {
        config.policy.valuation_date = date;
    }
    config.validate().map_err(config_error)?;

    let raw = load_dataset(&args.active, args.terminated.as_deref())?;
    let registry = default_registry().clone();
    let orchestrator = match &args.store_dir {
        Some(dir) => {
            let store = FileSessionStore::open(dir)
                .with_context(|| format!("open session store {}", dir.display()))?;
            Orchestrator::with_store(registry, config, Arc::new(store))
        }
        None => Orchestrator::new(registry, config),
    };

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| format!("censo-{}", Utc::now().format("%Y%m%dT%H%M%S%3f")));
    info!(run_id = %run_id, active = %args.active.display(), "starting run");

    let mut handle = orchestrator
        .start_run(raw, run_id.clone(), args.owner.clone())
        .context("start run")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .context("progress style")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut printed = 0usize;
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    let mut interrupt = std::pin::pin!(tokio::signal::ctrl_c());
    let mut interrupted = false;
    let session = loop {
        tokio::select! {
            joined = &mut handle => break joined.context("run task")?,
            _ = interval.tick() => {
                printed = print_new_events(&orchestrator, &run_id, printed, &spinner);
            }
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                warn!(run_id = %run_id, "interrupt received, cancelling run");
                orchestrator.cancel(&run_id).context("cancel run")?;
            }
        }
    };
    print_new_events(&orchestrator, &run_id, printed, &spinner);
    spinner.finish_and_clear();

    if orchestrator.is_degraded(&run_id) {
        eprintln!("warning: the session store failed; results were kept in memory only");
    }
    if let Some(path) = &args.json {
        write_session_json(path, &session)?;
    }
    Ok(session)
}

/// Prints events past `printed` above the spinner and returns the new count.
fn print_new_events(
    orchestrator: &Orchestrator,
    run_id: &str,
    printed: usize,
    spinner: &ProgressBar,
) -> usize {
    let events = match orchestrator.progress(run_id) {
        Ok(events) => events,
        Err(error) => {
            warn!(error = %error, "could not read progress");
            return printed;
        }
    };
    for event in events.iter().skip(printed) {
        spinner.println(format_event(event));
    }
    if let Some(last) = events.last() {
        spinner.set_message(last.message.clone());
    }
    events.len().max(printed)
}

pub fn format_event(event: &ProgressEvent) -> String {
    let marker = match event.level {
        ProgressLevel::Info => "·",
        ProgressLevel::Success => "✓",
        ProgressLevel::Error => "✗",
    };
    format!(
        "{} {marker} {}",
        event.timestamp.format("%H:%M:%S"),
        event.message
    )
}

fn config_error(error: ConfigError) -> anyhow::Error {
    match error.suggestion() {
        Some(hint) => anyhow!("{} ({hint})", error.user_message()),
        None => anyhow!(error.user_message()),
    }
}

fn write_session_json(path: &Path, session: &RunSession) -> Result<()> {
    let json = serde_json::to_string_pretty(session).context("serialize run session")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote run session");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_render_with_level_marker() {
        let event = ProgressEvent::new("run-1", ProgressLevel::Success, "Análisis completado");
        let line = format_event(&event);
        assert!(line.ends_with("✓ Análisis completado"));
    }
}
