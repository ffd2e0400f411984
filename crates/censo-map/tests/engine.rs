use censo_map::{ColumnMapper, map_dataset};
use censo_model::{
    CanonicalField, DatasetMetadata, MatchMethod, RawCell, RawDataset, RawSheet, SheetKind,
};

fn text(value: &str) -> RawCell {
    RawCell::Text(value.to_string())
}

fn active_sheet() -> RawSheet {
    RawSheet::new(
        "Personal Activo",
        vec![
            vec![text("Reporte de plantilla 2024")],
            vec![],
            vec![
                text("No. Empleado"),
                text("Nombre Completo"),
                text("R.F.C."),
                text("Fecha de Ingreso"),
                text("Salario Diario"),
                text("Salario Diario Integrado"),
                text("Turno"),
            ],
            vec![
                text("E-001"),
                text("Ana Pérez López"),
                text("PELA800101AB1"),
                RawCell::Number(43831.0),
                text("$ 500.00"),
                RawCell::Number(525.0),
                text("Matutino"),
            ],
            vec![RawCell::Empty, text("   ")],
            vec![
                text("E-002"),
                text("Luis Gómez"),
                text("GOLU750315QW2"),
                text("15/03/2010"),
                text("sin dato"),
                RawCell::Empty,
                RawCell::Empty,
            ],
        ],
    )
}

#[test]
fn detects_header_row_after_title_rows() {
    let mapper = ColumnMapper::default();
    let (mapping, records) = mapper
        .map_sheet(SheetKind::Active, &active_sheet())
        .unwrap();

    assert_eq!(mapping.header_row, Some(3));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].row, 4);
    assert_eq!(records[1].row, 6);
}

#[test]
fn binds_spanish_headers_to_fields() {
    let (mapping, records) = ColumnMapper::default()
        .map_sheet(SheetKind::Active, &active_sheet())
        .unwrap();

    let hire = mapping.binding(CanonicalField::HireDate).unwrap();
    assert_eq!(hire.column, 3);
    assert_eq!(hire.method, MatchMethod::Exact);
    assert_eq!(mapping.binding(CanonicalField::Rfc).unwrap().column, 2);
    assert_eq!(mapping.binding(CanonicalField::DailySalary).unwrap().column, 4);
    assert_eq!(
        mapping.binding(CanonicalField::IntegratedSalary).unwrap().column,
        5
    );
    assert_eq!(records[0].number(CanonicalField::DailySalary), Some(500.0));
    assert_eq!(
        records[0].identifier(CanonicalField::Rfc).as_deref(),
        Some("PELA800101AB1")
    );
}

#[test]
fn keeps_unmapped_columns_under_positional_keys() {
    let (mapping, records) = ColumnMapper::default()
        .map_sheet(SheetKind::Active, &active_sheet())
        .unwrap();

    let turno = mapping
        .unmapped
        .iter()
        .find(|column| column.column == 6)
        .unwrap();
    assert_eq!(turno.key, "unmapped_col_6");
    assert_eq!(
        records[0].unmapped.get("unmapped_col_6"),
        Some(&text("Matutino"))
    );
    assert!(records[1].unmapped.is_empty());
}

#[test]
fn records_coercion_failures_by_row() {
    let (mapping, records) = ColumnMapper::default()
        .map_sheet(SheetKind::Active, &active_sheet())
        .unwrap();

    assert!(records[1].number(CanonicalField::DailySalary).is_none());
    assert_eq!(
        mapping.coercion_failures.get(&CanonicalField::DailySalary),
        Some(&vec![6])
    );
}

#[test]
fn sniffs_identifier_columns_without_recognizable_header() {
    let sheet = RawSheet::new(
        "Activos",
        vec![
            vec![text("Nombre"), text("Clave fiscal XYZ")],
            vec![text("Ana"), text("PELA800101AB1")],
            vec![text("Luis"), text("GOLU750315QW2")],
            vec![text("Eva"), text("MAEV900220HJ3")],
        ],
    );
    let (mapping, _) = ColumnMapper::default()
        .map_sheet(SheetKind::Active, &sheet)
        .unwrap();

    let rfc = mapping.binding(CanonicalField::Rfc).unwrap();
    assert_eq!(rfc.column, 1);
    assert_eq!(rfc.method, MatchMethod::ValueSniffing);
    assert_eq!(rfc.score, 0.75);
}

#[test]
fn termination_fields_only_bind_on_terminated_sheet() {
    let rows = vec![
        vec![text("Nombre"), text("Fecha de Baja")],
        vec![text("Ana"), text("01/02/2023")],
    ];
    let active = RawSheet::new("Activos", rows.clone());
    let terminated = RawSheet::new("Bajas", rows);
    let dataset = ColumnMapper::default().map(&active, &terminated).unwrap();

    assert!(
        !dataset
            .active_mapping
            .is_mapped(CanonicalField::TerminationDate)
    );
    assert!(
        dataset
            .terminated_mapping
            .is_mapped(CanonicalField::TerminationDate)
    );
}

#[test]
fn blank_sheets_map_to_no_records() {
    let raw = RawDataset::new(
        active_sheet(),
        RawSheet::default(),
        DatasetMetadata::new("censo.xlsx", 2048),
    );
    let dataset = map_dataset(&raw).unwrap();

    assert_eq!(dataset.active_count(), 2);
    assert_eq!(dataset.terminated_count(), 0);
    assert_eq!(dataset.terminated_mapping.header_row, None);
    assert_eq!(dataset.fingerprint.len(), 64);
}

#[test]
fn mapping_is_deterministic() {
    let raw = RawDataset::new(
        active_sheet(),
        RawSheet::default(),
        DatasetMetadata::new("censo.xlsx", 2048),
    );
    let first = map_dataset(&raw).unwrap();
    let second = map_dataset(&raw).unwrap();
    assert_eq!(first, second);
}
