use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use censo_model::{Finding, Report, RunSession, Severity, UnitOutcome, UnitStatus};

/// Row numbers listed in the findings table before eliding the rest.
const MAX_LISTED_ROWS: usize = 8;

pub fn print_report(session: &RunSession, report: &Report) {
    println!("Run: {} ({})", session.id, session.status);
    println!("Fingerprint: {}", report.dataset_fingerprint);
    println!("{}", report.meta_finding.message);

    let stats = &report.statistics;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Active records"), Cell::new(stats.active_records)]);
    table.add_row(vec![
        Cell::new("Terminated records"),
        Cell::new(stats.terminated_records),
    ]);
    table.add_row(vec![
        Cell::new("Valid records"),
        Cell::new(stats.valid_records).fg(Color::Green),
    ]);
    table.add_row(vec![Cell::new("Findings"), Cell::new(stats.total_findings)]);
    table.add_row(vec![
        Cell::new("Critical"),
        count_cell(stats.critical_count, Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Warning"),
        count_cell(stats.warning_count, Color::Yellow),
    ]);
    table.add_row(vec![Cell::new("Info"), count_cell(stats.info_count, Color::Blue)]);
    table.add_row(vec![
        Cell::new("Can proceed")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        verdict_cell(stats.can_proceed),
    ]);
    println!("{table}");

    print_failed_units(report);
    print_findings_table(report);
}

fn print_failed_units(report: &Report) {
    let failed: Vec<&UnitOutcome> = report.failed_units().collect();
    if failed.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Unit"),
        header_cell("Status"),
        header_cell("Duration (ms)"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for outcome in failed {
        table.add_row(vec![
            Cell::new(&outcome.name).add_attribute(Attribute::Bold),
            unit_status_cell(outcome.status),
            Cell::new(outcome.duration_ms),
            Cell::new(outcome.error.as_deref().unwrap_or("-")),
        ]);
    }
    println!();
    println!("Failed units:");
    println!("{table}");
}

fn print_findings_table(report: &Report) {
    let ranked: Vec<&Finding> = report.ranked();
    if ranked.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Validator"),
        header_cell("Field"),
        header_cell("Sheet"),
        header_cell("Rows"),
        header_cell("Message"),
        header_cell("Suggestion"),
    ]);
    apply_finding_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for finding in ranked {
        table.add_row(vec![
            severity_cell(finding.severity),
            Cell::new(&finding.validator),
            Cell::new(&finding.field),
            match finding.sheet {
                Some(sheet) => Cell::new(sheet.label()),
                None => dim_cell("-"),
            },
            rows_cell(&finding.rows),
            Cell::new(&finding.message),
            match &finding.suggestion {
                Some(suggestion) => Cell::new(suggestion),
                None => dim_cell("-"),
            },
        ]);
    }
    println!();
    println!("Findings:");
    println!("{table}");
}

/// Row list shortened to the first few entries.
pub fn format_rows(rows: &[usize]) -> String {
    if rows.is_empty() {
        return "-".to_string();
    }
    let listed: Vec<String> = rows
        .iter()
        .take(MAX_LISTED_ROWS)
        .map(ToString::to_string)
        .collect();
    let mut text = listed.join(", ");
    if rows.len() > MAX_LISTED_ROWS {
        text.push_str(&format!(" (+{})", rows.len() - MAX_LISTED_ROWS));
    }
    text
}

fn rows_cell(rows: &[usize]) -> Cell {
    if rows.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(format_rows(rows))
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(60);
}

fn apply_finding_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(200);
    if table.column_count() >= 7 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(10)),
            ColumnConstraint::UpperBoundary(Width::Fixed(26)),
            ColumnConstraint::UpperBoundary(Width::Fixed(18)),
            ColumnConstraint::UpperBoundary(Width::Fixed(8)),
            ColumnConstraint::UpperBoundary(Width::Fixed(22)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Critical => Cell::new("CRITICAL")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
        Severity::Info => Cell::new("INFO").fg(Color::Blue),
    }
}

fn unit_status_cell(status: UnitStatus) -> Cell {
    match status {
        UnitStatus::Succeeded => Cell::new("ok").fg(Color::Green),
        UnitStatus::Failed => Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        UnitStatus::TimedOut => Cell::new("timed out").fg(Color::Red),
    }
}

fn verdict_cell(can_proceed: bool) -> Cell {
    if can_proceed {
        Cell::new("yes")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("no")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_row_lists_are_printed_whole() {
        assert_eq!(format_rows(&[2, 5]), "2, 5");
        assert_eq!(format_rows(&[]), "-");
    }

    #[test]
    fn long_row_lists_are_elided() {
        let rows: Vec<usize> = (2..=21).collect();
        assert_eq!(format_rows(&rows), "2, 3, 4, 5, 6, 7, 8, 9 (+12)");
    }
}
