//! Run report and summary statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::field::SheetKind;
use crate::finding::{Finding, FindingStatus, Severity};

/// How a validator unit's dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitStatus {
    Succeeded,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOutcome {
    pub name: String,
    pub status: UnitStatus,
    pub duration_ms: u64,
    pub finding_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == UnitStatus::Succeeded
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    /// Active plus terminated records.
    pub total_records: usize,
    pub active_records: usize,
    pub terminated_records: usize,
    /// Records not referenced by any critical finding.
    pub valid_records: usize,
    pub total_findings: usize,
    pub success_count: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    /// Critical findings tallied by field label.
    pub critical_by_field: BTreeMap<String, usize>,
    /// True iff `critical_count == 0`.
    pub can_proceed: bool,
}

impl SummaryStatistics {
    pub fn compute(findings: &[Finding], active_records: usize, terminated_records: usize) -> Self {
        let mut stats = Self {
            total_records: active_records + terminated_records,
            active_records,
            terminated_records,
            total_findings: findings.len(),
            ..Self::default()
        };
        let mut invalid_rows: BTreeSet<(SheetKind, usize)> = BTreeSet::new();

        for finding in findings {
            if finding.status == FindingStatus::Success {
                stats.success_count += 1;
            }
            match finding.severity {
                Severity::Critical => {
                    stats.critical_count += 1;
                    *stats
                        .critical_by_field
                        .entry(finding.field.clone())
                        .or_insert(0) += 1;
                    if let Some(sheet) = finding.sheet {
                        invalid_rows.extend(finding.rows.iter().map(|row| (sheet, *row)));
                    }
                }
                Severity::Warning => stats.warning_count += 1,
                Severity::Info => stats.info_count += 1,
            }
        }

        stats.valid_records = stats.total_records.saturating_sub(invalid_rows.len());
        stats.can_proceed = stats.critical_count == 0;
        stats
    }
}

/// Aggregate of one run. Findings keep registry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub run_id: String,
    pub findings: Vec<Finding>,
    /// The orchestrator's own execution diagnostic; not part of the statistics.
    pub meta_finding: Finding,
    pub unit_outcomes: Vec<UnitOutcome>,
    pub statistics: SummaryStatistics,
    pub dataset_fingerprint: String,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn can_proceed(&self) -> bool {
        self.statistics.can_proceed
    }

    pub fn failed_units(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.unit_outcomes.iter().filter(|outcome| !outcome.succeeded())
    }

    pub fn findings_for<'a>(&'a self, validator: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.findings
            .iter()
            .filter(move |finding| finding.validator == validator)
    }

    /// Findings by descending severity; registry order within a severity.
    pub fn ranked(&self) -> Vec<&Finding> {
        let mut ranked: Vec<&Finding> = self.findings.iter().collect();
        ranked.sort_by_key(|finding| std::cmp::Reverse(finding.severity.rank()));
        ranked
    }
}
