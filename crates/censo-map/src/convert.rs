//! Row conversion: raw cells to canonical records.

use std::collections::BTreeMap;

use censo_model::{
    CanonicalField, CanonicalRecord, ColumnBinding, FieldType, FieldValue, RawCell, SheetKind,
    UnmappedColumn,
};

/// Result of coercing one cell to its declared field type.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Value(FieldValue),
    /// Blank cell: the field is null for this record.
    Null,
    /// Non-blank cell that could not be coerced; also null, but reported.
    Invalid,
}

/// Coerces a raw cell according to the declared field type.
pub fn coerce(field_type: FieldType, cell: &RawCell) -> Coerced {
    if cell.is_blank() {
        return Coerced::Null;
    }
    match field_type {
        FieldType::Text => Coerced::Value(FieldValue::Text(cell.as_text().into_owned())),
        FieldType::Number => match cell {
            RawCell::Number(value) if value.is_finite() => {
                Coerced::Value(FieldValue::Number(*value))
            }
            RawCell::Text(text) => parse_amount(text)
                .map(|value| Coerced::Value(FieldValue::Number(value)))
                .unwrap_or(Coerced::Invalid),
            _ => Coerced::Invalid,
        },
        FieldType::Date => Coerced::Value(FieldValue::Date(trimmed(cell))),
        FieldType::Mixed => Coerced::Value(FieldValue::Mixed(trimmed(cell))),
    }
}

/// Parses a monetary amount, stripping currency marks and thousands separators.
///
/// ```
/// use censo_map::parse_amount;
///
/// assert_eq!(parse_amount("$ 12,345.50"), Some(12345.5));
/// assert_eq!(parse_amount("1,000 MXN"), Some(1000.0));
/// assert_eq!(parse_amount("n/a"), None);
/// ```
pub fn parse_amount(text: &str) -> Option<f64> {
    let upper = text.trim().to_uppercase();
    let stripped = upper
        .trim_end_matches("M.N.")
        .replace("MXN", "")
        .replace("MN", "");
    let cleaned: String = stripped
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn trimmed(cell: &RawCell) -> RawCell {
    match cell {
        RawCell::Text(text) => RawCell::Text(text.trim().to_string()),
        other => other.clone(),
    }
}

/// Converts one data row. Returns `None` for rows where every cell is blank.
pub fn convert_row(
    sheet: SheetKind,
    row_number: usize,
    cells: &[RawCell],
    bindings: &[ColumnBinding],
    unmapped: &[UnmappedColumn],
    failures: &mut BTreeMap<CanonicalField, Vec<usize>>,
) -> Option<CanonicalRecord> {
    if cells.iter().all(RawCell::is_blank) {
        return None;
    }
    let mut record = CanonicalRecord::new(row_number, sheet);
    for binding in bindings {
        let cell = cells.get(binding.column).unwrap_or(&RawCell::Empty);
        match coerce(binding.field.field_type(), cell) {
            Coerced::Value(value) => {
                record.values.insert(binding.field, value);
            }
            Coerced::Null => {}
            Coerced::Invalid => failures.entry(binding.field).or_default().push(row_number),
        }
    }
    for column in unmapped {
        if let Some(cell) = cells.get(column.column)
            && !cell.is_blank()
        {
            record.unmapped.insert(column.key.clone(), cell.clone());
        }
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use censo_model::MatchMethod;

    fn binding(field: CanonicalField, column: usize) -> ColumnBinding {
        ColumnBinding {
            field,
            column,
            header: field.label().to_string(),
            score: 1.0,
            method: MatchMethod::Exact,
            synonym: None,
        }
    }

    #[test]
    fn numbers_strip_currency() {
        assert_eq!(
            coerce(FieldType::Number, &RawCell::Text("$1,234.56".into())),
            Coerced::Value(FieldValue::Number(1234.56))
        );
        assert_eq!(
            coerce(FieldType::Number, &RawCell::Text("sin dato".into())),
            Coerced::Invalid
        );
        assert_eq!(coerce(FieldType::Number, &RawCell::Empty), Coerced::Null);
    }

    #[test]
    fn dates_and_mixed_stay_opaque() {
        assert_eq!(
            coerce(FieldType::Date, &RawCell::Number(43831.0)),
            Coerced::Value(FieldValue::Date(RawCell::Number(43831.0)))
        );
        assert_eq!(
            coerce(FieldType::Mixed, &RawCell::Text(" GOMJ800101AB1 ".into())),
            Coerced::Value(FieldValue::Mixed(RawCell::Text("GOMJ800101AB1".into())))
        );
    }

    #[test]
    fn blank_rows_are_dropped() {
        let mut failures = BTreeMap::new();
        let cells = vec![RawCell::Empty, RawCell::Text("  ".into())];
        let bindings = vec![binding(CanonicalField::FullName, 0)];
        assert!(convert_row(SheetKind::Active, 4, &cells, &bindings, &[], &mut failures).is_none());
    }

    #[test]
    fn unparseable_numbers_are_null_and_reported() {
        let mut failures = BTreeMap::new();
        let cells = vec![RawCell::Text("Ana".into()), RawCell::Text("abc".into())];
        let bindings = vec![
            binding(CanonicalField::FullName, 0),
            binding(CanonicalField::DailySalary, 1),
        ];
        let record =
            convert_row(SheetKind::Active, 7, &cells, &bindings, &[], &mut failures).unwrap();
        assert!(record.number(CanonicalField::DailySalary).is_none());
        assert_eq!(failures.get(&CanonicalField::DailySalary), Some(&vec![7]));
    }

    #[test]
    fn unmapped_cells_are_kept() {
        let mut failures = BTreeMap::new();
        let cells = vec![RawCell::Text("Ana".into()), RawCell::Text("Turno A".into())];
        let unmapped = vec![UnmappedColumn {
            column: 1,
            key: CanonicalRecord::unmapped_key(1),
            header: "Turno".into(),
            nearest: None,
            similarity: 0.2,
        }];
        let record = convert_row(
            SheetKind::Active,
            2,
            &cells,
            &[binding(CanonicalField::FullName, 0)],
            &unmapped,
            &mut failures,
        )
        .unwrap();
        assert_eq!(
            record.unmapped.get("unmapped_col_1"),
            Some(&RawCell::Text("Turno A".into()))
        );
    }
}
