//! Structured invariant findings over persisted records.
//!
//! [`inspect_records`] checks a record list against the grid invariants
//! without building a grid. Loading repairs every issue flagged
//! `repairable`; a report with unrepairable errors fails to load.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::field::{FieldId, FieldRecord};
use crate::limits::{MAX_FIELDS_PER_ROW, MAX_WIDTH, MIN_WIDTH, WIDTH_TOLERANCE};
use crate::width::is_near_full;

/// Severity for one invariant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantSeverity {
    Error,
    Warning,
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    DuplicateFieldId,
    MissingLayout,
    RowIndexGap,
    ColumnIndexGap,
    DuplicateColumn,
    WidthOutOfRange,
    RowOverCapacity,
    RowNotNormalized,
}

/// One actionable finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub severity: InvariantSeverity,
    pub repairable: bool,
    pub field_id: Option<FieldId>,
    pub row_index: Option<usize>,
    pub message: String,
}

/// Findings for one record list, ordered by code then row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvariantReport {
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Return true if any error-level finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == InvariantSeverity::Error)
    }

    /// Return true if any error-level finding cannot be repaired on load.
    #[must_use]
    pub fn has_unrepairable_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == InvariantSeverity::Error && !issue.repairable)
    }

    /// Codes present, deduplicated and sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<InvariantCode> {
        let mut codes: Vec<_> = self.issues.iter().map(|issue| issue.code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

/// Check persisted records against the grid invariants.
///
/// Records are read the way loading reads them: if none carries any layout
/// attribute each record is its own row; otherwise missing attributes
/// default to row 0, column 0, width 100.
#[must_use]
pub fn inspect_records(records: &[FieldRecord]) -> InvariantReport {
    let mut issues = Vec::new();
    let legacy = records.iter().all(FieldRecord::is_unplaced);

    let mut seen = FxHashSet::default();
    for record in records {
        if !seen.insert(&record.id) {
            push_issue(
                &mut issues,
                InvariantCode::DuplicateFieldId,
                InvariantSeverity::Error,
                false,
                Some(record.id.clone()),
                None,
                format!("field id {} appears more than once", record.id),
            );
        }
        if !legacy && record.is_unplaced() {
            push_issue(
                &mut issues,
                InvariantCode::MissingLayout,
                InvariantSeverity::Warning,
                true,
                Some(record.id.clone()),
                None,
                format!("field {} has no layout attributes", record.id),
            );
        }
    }

    let mut rows: BTreeMap<usize, Vec<&FieldRecord>> = BTreeMap::new();
    for (order, record) in records.iter().enumerate() {
        let row = if legacy {
            order
        } else {
            record.row_index.unwrap_or(0)
        };
        rows.entry(row).or_default().push(record);
    }

    for (expected, (&row_index, row)) in rows.iter().enumerate() {
        if row_index != expected {
            push_issue(
                &mut issues,
                InvariantCode::RowIndexGap,
                InvariantSeverity::Error,
                true,
                None,
                Some(row_index),
                format!("row {row_index} found where row {expected} was expected"),
            );
        }
        inspect_row(&mut issues, row_index, row, legacy);
    }

    issues.sort_by(|left, right| {
        left.code
            .cmp(&right.code)
            .then(left.row_index.cmp(&right.row_index))
            .then(left.field_id.cmp(&right.field_id))
    });
    InvariantReport { issues }
}

fn inspect_row(
    issues: &mut Vec<InvariantIssue>,
    row_index: usize,
    row: &[&FieldRecord],
    legacy: bool,
) {
    let column_of = |record: &FieldRecord| {
        if legacy {
            0
        } else {
            record.column_index.unwrap_or(0)
        }
    };
    let width_of = |record: &FieldRecord| {
        if legacy {
            MAX_WIDTH
        } else {
            record.width.unwrap_or(MAX_WIDTH)
        }
    };

    if row.len() > MAX_FIELDS_PER_ROW {
        push_issue(
            issues,
            InvariantCode::RowOverCapacity,
            InvariantSeverity::Error,
            true,
            None,
            Some(row_index),
            format!(
                "row {row_index} holds {} fields (max {MAX_FIELDS_PER_ROW})",
                row.len()
            ),
        );
    }

    let mut columns: Vec<usize> = row.iter().map(|record| column_of(*record)).collect();
    columns.sort_unstable();
    for pair in columns.windows(2) {
        if pair[0] == pair[1] {
            push_issue(
                issues,
                InvariantCode::DuplicateColumn,
                InvariantSeverity::Error,
                true,
                None,
                Some(row_index),
                format!("row {row_index} has more than one field at column {}", pair[0]),
            );
        }
    }
    let mut unique = columns.clone();
    unique.dedup();
    if unique.iter().enumerate().any(|(expected, column)| *column != expected) {
        push_issue(
            issues,
            InvariantCode::ColumnIndexGap,
            InvariantSeverity::Error,
            true,
            None,
            Some(row_index),
            format!("row {row_index} columns are not contiguous from 0: {unique:?}"),
        );
    }

    let mut total = 0.0;
    for record in row {
        let width = width_of(*record);
        total += width;
        if !width.is_finite() || !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            push_issue(
                issues,
                InvariantCode::WidthOutOfRange,
                InvariantSeverity::Error,
                true,
                Some(record.id.clone()),
                Some(row_index),
                format!("field {} has width {width}", record.id),
            );
        }
    }
    if is_near_full(total) && (total - MAX_WIDTH).abs() > WIDTH_TOLERANCE {
        push_issue(
            issues,
            InvariantCode::RowNotNormalized,
            InvariantSeverity::Error,
            true,
            None,
            Some(row_index),
            format!("row {row_index} totals {total:.3} inside the near-full band"),
        );
    }
}

fn push_issue(
    issues: &mut Vec<InvariantIssue>,
    code: InvariantCode,
    severity: InvariantSeverity,
    repairable: bool,
    field_id: Option<FieldId>,
    row_index: Option<usize>,
    message: impl Into<String>,
) {
    issues.push(InvariantIssue {
        code,
        severity,
        repairable,
        field_id,
        row_index,
        message: message.into(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Payload;

    fn placed(id: &str, row: usize, column: usize, width: f64) -> FieldRecord {
        FieldRecord::placed(id, row, column, width, Payload::new())
    }

    #[test]
    fn clean_layout_has_no_issues() {
        let report = inspect_records(&[
            placed("a", 0, 0, 40.0),
            placed("b", 0, 1, 60.0),
            placed("c", 1, 0, 30.0),
        ]);
        assert!(report.is_clean(), "{:?}", report.issues);
        assert!(!report.has_errors());
    }

    #[test]
    fn legacy_layout_is_clean() {
        let report = inspect_records(&[
            FieldRecord::unplaced("a", Payload::new()),
            FieldRecord::unplaced("b", Payload::new()),
        ]);
        assert!(report.is_clean(), "{:?}", report.issues);
    }

    #[test]
    fn flags_every_repairable_shape_problem() {
        let report = inspect_records(&[
            placed("a", 1, 0, 10.0),
            placed("b", 1, 0, 50.0),
            placed("c", 1, 3, 38.0),
            FieldRecord::unplaced("d", Payload::new()),
        ]);
        assert_eq!(
            report.codes(),
            vec![
                InvariantCode::MissingLayout,
                InvariantCode::ColumnIndexGap,
                InvariantCode::DuplicateColumn,
                InvariantCode::WidthOutOfRange,
                InvariantCode::RowNotNormalized,
            ]
        );
        assert!(report.has_errors());
        assert!(!report.has_unrepairable_errors());
    }

    #[test]
    fn row_gap_and_capacity() {
        let mut records: Vec<_> = (0..6)
            .map(|column| placed(&format!("f{column}"), 0, column, 20.0))
            .collect();
        records.push(placed("g", 2, 0, 100.0));
        let report = inspect_records(&records);
        assert_eq!(
            report.codes(),
            vec![InvariantCode::RowIndexGap, InvariantCode::RowOverCapacity]
        );
    }

    #[test]
    fn duplicate_ids_are_unrepairable() {
        let report = inspect_records(&[placed("a", 0, 0, 50.0), placed("a", 0, 1, 50.0)]);
        assert!(report.has_unrepairable_errors());
        assert_eq!(report.issues[0].field_id, Some(FieldId::new("a")));
    }
}
