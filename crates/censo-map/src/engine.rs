//! Column mapping engine.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;
use sha2::{Digest, Sha256};
use tracing::{debug, info_span};

use censo_model::{
    CanonicalField, CanonicalRecord, ColumnBinding, MappedDataset, MatchMethod, RawCell, RawSheet,
    SheetKind, SheetMapping, UnmappedColumn,
};

use crate::convert::convert_row;
use crate::error::{MapError, Result};
use crate::patterns::{SNIFFABLE_FIELDS, matches_identifier};
use crate::score::best_score;
use crate::synonyms::FieldSynonymTable;
use crate::utils::normalize_text;

/// Minimum score a header must exceed to bind to a field.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.7;
/// Leading non-blank rows inspected when looking for the header row.
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 10;
/// Share of non-blank values that must look like an identifier.
pub const DEFAULT_SNIFF_RATIO: f64 = 0.8;
/// Score recorded for bindings found by value sniffing.
pub const SNIFF_SCORE: f64 = 0.75;
/// Minimum Jaro-Winkler similarity for a nearest-field hint.
pub const HINT_MIN_SIMILARITY: f64 = 0.75;
/// Widest sheet accepted (Excel's column limit).
pub const MAX_COLUMNS: usize = 16_384;

/// Tunables for [`ColumnMapper`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperOptions {
    pub acceptance_threshold: f64,
    pub header_scan_rows: usize,
    pub sniff_ratio: f64,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            sniff_ratio: DEFAULT_SNIFF_RATIO,
        }
    }
}

/// Maps raw census sheets onto canonical employee records.
///
/// Each sheet is mapped independently: the header row is located, every
/// column is scored against the synonym table, and columns are bound to
/// fields one-to-one, best score first. Columns left over are kept as
/// `unmapped_col_<index>` entries on each record.
///
/// # Example
///
/// ```
/// use censo_map::ColumnMapper;
/// use censo_model::{CanonicalField, RawCell, RawSheet};
///
/// let active = RawSheet::new(
///     "Activos",
///     vec![
///         vec!["Nombre".into(), "Fecha de Ingreso".into()],
///         vec!["Ana Pérez".into(), RawCell::Number(43831.0)],
///     ],
/// );
/// let dataset = ColumnMapper::default()
///     .map(&active, &RawSheet::default())
///     .unwrap();
/// assert_eq!(dataset.active_count(), 1);
/// assert!(dataset.active_mapping.is_mapped(CanonicalField::HireDate));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnMapper {
    table: FieldSynonymTable,
    options: MapperOptions,
}

struct Candidate {
    field: CanonicalField,
    column: usize,
    score: f64,
    method: MatchMethod,
    synonym: String,
}

impl ColumnMapper {
    pub fn new(table: FieldSynonymTable, options: MapperOptions) -> Self {
        Self { table, options }
    }

    pub fn with_table(table: FieldSynonymTable) -> Self {
        Self::new(table, MapperOptions::default())
    }

    pub fn table(&self) -> &FieldSynonymTable {
        &self.table
    }

    pub fn options(&self) -> MapperOptions {
        self.options
    }

    /// Maps both sheets and fingerprints the result.
    pub fn map(&self, active: &RawSheet, terminated: &RawSheet) -> Result<MappedDataset> {
        let (active_mapping, active_records) = self.map_sheet(SheetKind::Active, active)?;
        let (terminated_mapping, terminated_records) =
            self.map_sheet(SheetKind::Terminated, terminated)?;
        let mut dataset = MappedDataset {
            active: active_records,
            terminated: terminated_records,
            active_mapping,
            terminated_mapping,
            fingerprint: String::new(),
        };
        dataset.fingerprint = fingerprint(&dataset)?;
        Ok(dataset)
    }

    /// Maps one sheet, returning its mapping and records in sheet order.
    pub fn map_sheet(
        &self,
        kind: SheetKind,
        sheet: &RawSheet,
    ) -> Result<(SheetMapping, Vec<CanonicalRecord>)> {
        let span = info_span!("map_sheet", sheet = %kind, name = %sheet.name);
        let _guard = span.enter();

        let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
        if width > MAX_COLUMNS {
            return Err(MapError::TooManyColumns {
                sheet: kind,
                columns: width,
                limit: MAX_COLUMNS,
            });
        }
        let Some(header_index) = self.detect_header_row(kind, &sheet.rows) else {
            debug!("sheet has no non-blank rows");
            return Ok((SheetMapping::empty(kind), Vec::new()));
        };

        let header_cells = &sheet.rows[header_index];
        let raw_headers: Vec<String> = (0..width)
            .map(|column| {
                header_cells
                    .get(column)
                    .map(|cell| cell.as_text().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        let normalized: Vec<String> = raw_headers.iter().map(|h| normalize_text(h)).collect();
        let data_rows = &sheet.rows[header_index + 1..];

        let mut bindings = self.bind_columns(kind, &raw_headers, &normalized);
        self.sniff_identifiers(kind, &raw_headers, data_rows, &mut bindings);
        bindings.sort_by_key(|binding| binding.field);

        let bound_columns: BTreeSet<usize> = bindings.iter().map(|b| b.column).collect();
        let bound_fields: BTreeSet<CanonicalField> = bindings.iter().map(|b| b.field).collect();
        let unmapped: Vec<UnmappedColumn> = (0..width)
            .filter(|column| !bound_columns.contains(column))
            .map(|column| {
                let (nearest, similarity) =
                    self.nearest_field(kind, &normalized[column], &bound_fields);
                UnmappedColumn {
                    column,
                    key: CanonicalRecord::unmapped_key(column),
                    header: raw_headers[column].clone(),
                    nearest,
                    similarity,
                }
            })
            .collect();

        let mut coercion_failures = BTreeMap::new();
        let records: Vec<CanonicalRecord> = data_rows
            .iter()
            .enumerate()
            .filter_map(|(offset, cells)| {
                let row_number = header_index + offset + 2;
                convert_row(
                    kind,
                    row_number,
                    cells,
                    &bindings,
                    &unmapped,
                    &mut coercion_failures,
                )
            })
            .collect();

        debug!(
            header_row = header_index + 1,
            bound = bindings.len(),
            unmapped = unmapped.len(),
            records = records.len(),
            "sheet mapped"
        );

        Ok((
            SheetMapping {
                sheet: kind,
                header_row: Some(header_index + 1),
                bindings,
                unmapped,
                coercion_failures,
            },
            records,
        ))
    }

    /// Index of the header row among `rows`, or `None` when every row is blank.
    ///
    /// The first non-blank rows are scanned; the one with the most cells that
    /// score above the threshold wins, the earliest on ties. With no matching
    /// cells at all the first non-blank row is used.
    pub fn detect_header_row(&self, kind: SheetKind, rows: &[Vec<RawCell>]) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        let mut first_non_blank = None;
        let scanned = rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(RawCell::is_blank))
            .take(self.options.header_scan_rows);
        for (index, cells) in scanned {
            first_non_blank.get_or_insert(index);
            let hits = cells
                .iter()
                .filter(|cell| {
                    let header = normalize_text(&cell.as_text());
                    self.best_field_score(kind, &header) > self.options.acceptance_threshold
                })
                .count();
            if hits > 0 && best.is_none_or(|(_, current)| hits > current) {
                best = Some((index, hits));
            }
        }
        best.map(|(index, _)| index).or(first_non_blank)
    }

    fn best_field_score(&self, kind: SheetKind, header: &str) -> f64 {
        if header.is_empty() {
            return 0.0;
        }
        CanonicalField::for_sheet(kind)
            .filter_map(|field| best_score(header, self.table.synonyms(field)))
            .map(|scored| scored.score)
            .fold(0.0, f64::max)
    }

    fn bind_columns(
        &self,
        kind: SheetKind,
        raw_headers: &[String],
        normalized: &[String],
    ) -> Vec<ColumnBinding> {
        let mut candidates = Vec::new();
        for field in CanonicalField::for_sheet(kind) {
            let synonyms = self.table.synonyms(field);
            for (column, header) in normalized.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                if let Some(scored) = best_score(header, synonyms)
                    && scored.score > self.options.acceptance_threshold
                {
                    candidates.push(Candidate {
                        field,
                        column,
                        score: scored.score,
                        method: scored.method,
                        synonym: scored.synonym,
                    });
                }
            }
        }

        // Stable sort: equal scores keep field catalogue order, then column order.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let mut assigned_fields = BTreeSet::new();
        let mut assigned_columns = BTreeSet::new();
        let mut bindings = Vec::new();
        for candidate in candidates {
            if assigned_fields.contains(&candidate.field)
                || assigned_columns.contains(&candidate.column)
            {
                continue;
            }
            assigned_fields.insert(candidate.field);
            assigned_columns.insert(candidate.column);
            bindings.push(ColumnBinding {
                field: candidate.field,
                column: candidate.column,
                header: raw_headers[candidate.column].clone(),
                score: candidate.score,
                method: candidate.method,
                synonym: Some(candidate.synonym),
            });
        }
        bindings
    }

    /// Binds unmatched identifier fields to columns whose values look like them.
    fn sniff_identifiers(
        &self,
        kind: SheetKind,
        raw_headers: &[String],
        data_rows: &[Vec<RawCell>],
        bindings: &mut Vec<ColumnBinding>,
    ) {
        for field in SNIFFABLE_FIELDS {
            if !field.applicability().applies_to(kind) || bindings.iter().any(|b| b.field == field)
            {
                continue;
            }
            let found = (0..raw_headers.len())
                .filter(|column| !bindings.iter().any(|b| b.column == *column))
                .find(|column| self.column_matches(field, *column, data_rows));
            if let Some(column) = found {
                debug!(field = %field, column, "identifier column found by value sniffing");
                bindings.push(ColumnBinding {
                    field,
                    column,
                    header: raw_headers[column].clone(),
                    score: SNIFF_SCORE,
                    method: MatchMethod::ValueSniffing,
                    synonym: None,
                });
            }
        }
    }

    fn column_matches(
        &self,
        field: CanonicalField,
        column: usize,
        data_rows: &[Vec<RawCell>],
    ) -> bool {
        let mut total = 0usize;
        let mut matching = 0usize;
        for cell in data_rows.iter().filter_map(|row| row.get(column)) {
            if cell.is_blank() {
                continue;
            }
            total += 1;
            if matches_identifier(field, &cell.as_text()) {
                matching += 1;
            }
        }
        total > 0 && (matching as f64 / total as f64) >= self.options.sniff_ratio
    }

    fn nearest_field(
        &self,
        kind: SheetKind,
        header: &str,
        bound: &BTreeSet<CanonicalField>,
    ) -> (Option<CanonicalField>, f64) {
        if header.is_empty() {
            return (None, 0.0);
        }
        let mut best: Option<(CanonicalField, f64)> = None;
        for field in CanonicalField::for_sheet(kind).filter(|field| !bound.contains(field)) {
            for synonym in self.table.synonyms(field) {
                let similarity = jaro_similarity(header.chars(), synonym.chars());
                if best.is_none_or(|(_, current)| similarity > current) {
                    best = Some((field, similarity));
                }
            }
        }
        match best {
            Some((field, similarity)) if similarity >= HINT_MIN_SIMILARITY => {
                (Some(field), similarity)
            }
            Some((_, similarity)) => (None, similarity),
            None => (None, 0.0),
        }
    }
}

/// SHA-256 over the serialized records and mappings, hex encoded.
pub fn fingerprint(dataset: &MappedDataset) -> Result<String> {
    let payload = serde_json::to_vec(&(
        &dataset.active,
        &dataset.terminated,
        &dataset.active_mapping,
        &dataset.terminated_mapping,
    ))
    .map_err(MapError::Fingerprint)?;
    Ok(hex::encode(Sha256::digest(&payload)))
}
