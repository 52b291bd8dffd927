//! Replayable grid operations.
//!
//! Every grid mutation has a serializable [`GridOperation`] form. Applying
//! one through [`Grid::apply_operation`] yields an [`OperationOutcome`] with
//! the ids it touched and created plus layout hashes before and after, which
//! is what operation logs and [`GridTimeline`](crate::GridTimeline) replay
//! are built on.

use serde::{Deserialize, Serialize};

use crate::error::{EditOutcome, GridError, Rejection};
use crate::field::{FieldId, FieldPlacement, FieldWidth, Payload};
use crate::grid::{Grid, GridPosition, Row};

/// One grid mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GridOperation {
    AddField {
        payload: Payload,
        #[serde(default)]
        target: Option<GridPosition>,
        #[serde(default)]
        preserve_proportions: bool,
    },
    AddFieldInNewRow {
        payload: Payload,
        row_index: usize,
    },
    MoveField {
        id: FieldId,
        to_row: usize,
        to_column: usize,
    },
    MoveFieldToNewRow {
        id: FieldId,
        row_index: usize,
    },
    ResizeField {
        id: FieldId,
        width: f64,
    },
    /// Committed resize: several widths set together, rows normalized.
    SetWidths {
        widths: Vec<FieldWidth>,
    },
    NormalizeRow {
        row_index: usize,
    },
    DeleteField {
        id: FieldId,
    },
    DuplicateField {
        id: FieldId,
    },
    MoveRow {
        row_index: usize,
        to_row_index: usize,
    },
    DuplicateRow {
        row_index: usize,
    },
    DeleteRow {
        row_index: usize,
    },
}

/// Stable operation discriminant for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AddField,
    AddFieldInNewRow,
    MoveField,
    MoveFieldToNewRow,
    ResizeField,
    SetWidths,
    NormalizeRow,
    DeleteField,
    DuplicateField,
    MoveRow,
    DuplicateRow,
    DeleteRow,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddField => "add_field",
            Self::AddFieldInNewRow => "add_field_in_new_row",
            Self::MoveField => "move_field",
            Self::MoveFieldToNewRow => "move_field_to_new_row",
            Self::ResizeField => "resize_field",
            Self::SetWidths => "set_widths",
            Self::NormalizeRow => "normalize_row",
            Self::DeleteField => "delete_field",
            Self::DuplicateField => "duplicate_field",
            Self::MoveRow => "move_row",
            Self::DuplicateRow => "duplicate_row",
            Self::DeleteRow => "delete_row",
        }
    }
}

impl GridOperation {
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::AddField { .. } => OperationKind::AddField,
            Self::AddFieldInNewRow { .. } => OperationKind::AddFieldInNewRow,
            Self::MoveField { .. } => OperationKind::MoveField,
            Self::MoveFieldToNewRow { .. } => OperationKind::MoveFieldToNewRow,
            Self::ResizeField { .. } => OperationKind::ResizeField,
            Self::SetWidths { .. } => OperationKind::SetWidths,
            Self::NormalizeRow { .. } => OperationKind::NormalizeRow,
            Self::DeleteField { .. } => OperationKind::DeleteField,
            Self::DuplicateField { .. } => OperationKind::DuplicateField,
            Self::MoveRow { .. } => OperationKind::MoveRow,
            Self::DuplicateRow { .. } => OperationKind::DuplicateRow,
            Self::DeleteRow { .. } => OperationKind::DeleteRow,
        }
    }

    /// Field ids named directly by the operation.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<FieldId> {
        match self {
            Self::MoveField { id, .. }
            | Self::MoveFieldToNewRow { id, .. }
            | Self::ResizeField { id, .. }
            | Self::DeleteField { id }
            | Self::DuplicateField { id } => vec![id.clone()],
            Self::SetWidths { widths } => widths.iter().map(|entry| entry.id.clone()).collect(),
            Self::AddField { .. }
            | Self::AddFieldInNewRow { .. }
            | Self::NormalizeRow { .. }
            | Self::MoveRow { .. }
            | Self::DuplicateRow { .. }
            | Self::DeleteRow { .. } => Vec::new(),
        }
    }
}

/// Whether an operation changed the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationStatus {
    Applied,
    Rejected { rejection: Rejection },
}

/// Result of applying one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub kind: OperationKind,
    pub status: OperationStatus,
    /// Existing fields the operation read or moved.
    pub touched: Vec<FieldId>,
    /// Fields the operation created.
    pub created: Vec<FieldId>,
    pub before_hash: u64,
    pub after_hash: u64,
}

impl OperationOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.status, OperationStatus::Applied)
    }

    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self.status {
            OperationStatus::Applied => None,
            OperationStatus::Rejected { rejection } => Some(rejection),
        }
    }
}

impl Grid {
    /// Apply one operation atomically.
    ///
    /// Reference errors leave the grid untouched and are returned as `Err`;
    /// geometric rejections are reported in the outcome's status.
    pub fn apply_operation(
        &mut self,
        operation: &GridOperation,
    ) -> Result<OperationOutcome, GridError> {
        let kind = operation.kind();
        let before_hash = self.layout_hash();
        let mut touched = operation.referenced_fields();
        let mut created = Vec::new();

        let status = match operation {
            GridOperation::AddField {
                payload,
                target,
                preserve_proportions,
            } => {
                let outcome = self.add_field(payload.clone(), *target, *preserve_proportions)?;
                record_created(outcome, &mut created)
            }
            GridOperation::AddFieldInNewRow { payload, row_index } => {
                let placed = self.add_field_in_new_row(payload.clone(), *row_index)?;
                created.push(placed.id().clone());
                OperationStatus::Applied
            }
            GridOperation::MoveField {
                id,
                to_row,
                to_column,
            } => status_of(self.move_field(id, *to_row, *to_column)?),
            GridOperation::MoveFieldToNewRow { id, row_index } => {
                self.move_field_to_new_row(id, *row_index)?;
                OperationStatus::Applied
            }
            GridOperation::ResizeField { id, width } => {
                let _ = self.resize_field(id, *width)?;
                OperationStatus::Applied
            }
            GridOperation::SetWidths { widths } => {
                self.set_widths(widths)?;
                OperationStatus::Applied
            }
            GridOperation::NormalizeRow { row_index } => {
                self.normalize_row(*row_index)?;
                touched = self.row_ids(*row_index);
                OperationStatus::Applied
            }
            GridOperation::DeleteField { id } => {
                let _ = self.delete_field(id)?;
                OperationStatus::Applied
            }
            GridOperation::DuplicateField { id } => {
                let copy = self.duplicate_field(id)?;
                created.push(copy.id().clone());
                OperationStatus::Applied
            }
            GridOperation::MoveRow {
                row_index,
                to_row_index,
            } => {
                self.move_row(*row_index, *to_row_index)?;
                touched = self.row_ids(*to_row_index);
                OperationStatus::Applied
            }
            GridOperation::DuplicateRow { row_index } => {
                touched = self.row_ids(*row_index);
                let copy = self.duplicate_row(*row_index)?;
                created = copy.ids();
                OperationStatus::Applied
            }
            GridOperation::DeleteRow { row_index } => {
                let removed: Row = self.delete_row(*row_index)?;
                touched = removed.ids();
                OperationStatus::Applied
            }
        };

        let after_hash = self.layout_hash();
        formgrid_core::debug!(
            op = kind.as_str(),
            ?status,
            touched = touched.len(),
            created = created.len(),
            before_hash,
            after_hash,
            "grid operation"
        );
        Ok(OperationOutcome {
            kind,
            status,
            touched,
            created,
            before_hash,
            after_hash,
        })
    }

    fn row_ids(&self, row_index: usize) -> Vec<FieldId> {
        self.row(row_index)
            .map(|row| row.fields().iter().map(|f| f.id().clone()).collect())
            .unwrap_or_default()
    }
}

fn status_of<T>(outcome: EditOutcome<T>) -> OperationStatus {
    match outcome {
        EditOutcome::Applied(_) => OperationStatus::Applied,
        EditOutcome::Rejected(rejection) => OperationStatus::Rejected { rejection },
    }
}

fn record_created(
    outcome: EditOutcome<FieldPlacement>,
    created: &mut Vec<FieldId>,
) -> OperationStatus {
    if let EditOutcome::Applied(placed) = &outcome {
        created.push(placed.id().clone());
    }
    status_of(outcome)
}
