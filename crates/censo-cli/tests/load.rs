use std::fs;
use std::path::PathBuf;

use censo_cli::load::{ACTIVE_SHEET, TERMINATED_SHEET, load_dataset, read_sheet};
use censo_map::map_dataset;
use censo_model::{CanonicalField, RawCell};

const ACTIVE_CSV: &str = "\
Número de empleado,Nombre,RFC,NSS,Fecha de ingreso,Salario diario
E-1,Juan Gómez,GOMJ800101AB1,01234567890,01/03/2005,600
E-2,Ana Pérez,PELA800101CD2,22345678902,15/06/2010,450.5
";

const TERMINATED_CSV: &str = "\
Número de empleado,Fecha de baja,Causa de baja
E-9,31/05/2024,Renuncia voluntaria
";

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn csv_rows_keep_shape_and_cell_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "activos.csv", ACTIVE_CSV);

    let sheet = read_sheet(&path, ACTIVE_SHEET).unwrap();

    assert_eq!(sheet.name, ACTIVE_SHEET);
    assert_eq!(sheet.rows.len(), 3);
    assert_eq!(sheet.rows[1][3], RawCell::Text("01234567890".to_string()));
    assert_eq!(sheet.rows[1][5], RawCell::Number(600.0));
    assert_eq!(sheet.rows[2][5], RawCell::Number(450.5));
}

#[test]
fn missing_terminations_file_gives_an_empty_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let active = write(&dir, "activos.csv", ACTIVE_CSV);

    let raw = load_dataset(&active, None).unwrap();

    assert!(raw.terminated.rows.is_empty());
    assert_eq!(raw.terminated.name, TERMINATED_SHEET);
    assert_eq!(raw.metadata.file_name, "activos.csv");
    assert_eq!(raw.metadata.file_size, ACTIVE_CSV.len() as u64);
}

#[test]
fn loaded_dataset_maps_onto_canonical_fields() {
    let dir = tempfile::tempdir().unwrap();
    let active = write(&dir, "activos.csv", ACTIVE_CSV);
    let terminated = write(&dir, "bajas.csv", TERMINATED_CSV);

    let raw = load_dataset(&active, Some(&terminated)).unwrap();
    let mapped = map_dataset(&raw).unwrap();

    assert_eq!(mapped.active_count(), 2);
    assert_eq!(mapped.terminated_count(), 1);
    assert!(mapped.active_mapping.is_mapped(CanonicalField::Rfc));
    assert!(mapped.terminated_mapping.is_mapped(CanonicalField::TerminationDate));
    let first = &mapped.active[0];
    assert_eq!(first.row, 2);
    assert_eq!(
        first.identifier(CanonicalField::Nss).as_deref(),
        Some("01234567890")
    );
}

#[test]
fn unreadable_path_reports_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-existe.csv");

    let error = load_dataset(&missing, None).unwrap_err();

    assert!(format!("{error:#}").contains("no-existe.csv"));
}
