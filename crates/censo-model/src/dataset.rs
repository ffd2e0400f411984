//! The mapped dataset shared read-only by every validator unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::{CanonicalField, SheetKind};
use crate::record::CanonicalRecord;

/// How a column was bound to a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMethod {
    Exact,
    Contains,
    TokenOverlap,
    ValueSniffing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnBinding {
    pub field: CanonicalField,
    /// 0-based column index in the raw sheet.
    pub column: usize,
    pub header: String,
    pub score: f64,
    pub method: MatchMethod,
    /// The synonym that produced the score, if any.
    pub synonym: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmappedColumn {
    pub column: usize,
    /// Side-table key under which records keep the column's values.
    pub key: String,
    pub header: String,
    /// Closest canonical field by name similarity, below acceptance.
    pub nearest: Option<CanonicalField>,
    pub similarity: f64,
}

/// Resolved column mapping for one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMapping {
    pub sheet: SheetKind,
    /// 1-based row number of the detected header, `None` for an empty sheet.
    pub header_row: Option<usize>,
    pub bindings: Vec<ColumnBinding>,
    pub unmapped: Vec<UnmappedColumn>,
    /// Rows whose numeric cell could not be parsed, per field.
    pub coercion_failures: BTreeMap<CanonicalField, Vec<usize>>,
}

impl SheetMapping {
    pub fn empty(sheet: SheetKind) -> Self {
        Self {
            sheet,
            header_row: None,
            bindings: Vec::new(),
            unmapped: Vec::new(),
            coercion_failures: BTreeMap::new(),
        }
    }

    pub fn binding(&self, field: CanonicalField) -> Option<&ColumnBinding> {
        self.bindings.iter().find(|binding| binding.field == field)
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.binding(field).is_some()
    }
}

/// Canonical records for both sheets plus how they were mapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedDataset {
    pub active: Vec<CanonicalRecord>,
    pub terminated: Vec<CanonicalRecord>,
    pub active_mapping: SheetMapping,
    pub terminated_mapping: SheetMapping,
    /// Hex SHA-256 over the records; identical inputs give identical digests.
    pub fingerprint: String,
}

impl MappedDataset {
    pub fn records(&self, sheet: SheetKind) -> &[CanonicalRecord] {
        match sheet {
            SheetKind::Active => &self.active,
            SheetKind::Terminated => &self.terminated,
        }
    }

    pub fn mapping(&self, sheet: SheetKind) -> &SheetMapping {
        match sheet {
            SheetKind::Active => &self.active_mapping,
            SheetKind::Terminated => &self.terminated_mapping,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn terminated_count(&self) -> usize {
        self.terminated.len()
    }

    pub fn total_records(&self) -> usize {
        self.active.len() + self.terminated.len()
    }

    /// Records of both sheets, active first.
    pub fn all_records(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.active.iter().chain(self.terminated.iter())
    }

    /// Looks up a record by its source row. Records are kept in row order.
    pub fn record_at(&self, sheet: SheetKind, row: usize) -> Option<&CanonicalRecord> {
        let records = self.records(sheet);
        records
            .binary_search_by_key(&row, |record| record.row)
            .ok()
            .map(|idx| &records[idx])
    }

    pub fn contains_row(&self, sheet: SheetKind, row: usize) -> bool {
        self.record_at(sheet, row).is_some()
    }
}
