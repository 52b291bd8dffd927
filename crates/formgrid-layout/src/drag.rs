//! Drag-and-drop reflow: drop-target hit testing and commit.
//!
//! A [`DragReflowSession`] lives from pointer-down to release. Each `update`
//! maps the pointer onto a [`DropTarget`] using a solved
//! [`GridGeometry`]; `commit` turns the last target into exactly one grid
//! mutation.
//!
//! Field and new-item drags split each field into left/right halves. The
//! left half of column `k > 0` is reported as "after column `k - 1`" so one
//! slot between two fields has a single canonical target. A band at the top
//! and bottom of each row (see [`DropTuning`]) targets a new row instead.
//! Row drags split each row 50/50 vertically.

use formgrid_core::geometry::Point;
use serde::{Deserialize, Serialize};

use crate::error::{EditOutcome, GridError, Rejection, TuningError};
use crate::field::{FieldId, Payload};
use crate::geometry::{GridGeometry, RowBox};
use crate::grid::{Grid, GridPosition};
use crate::limits::MAX_FIELDS_PER_ROW;
use crate::operation::{GridOperation, OperationStatus};

/// Host-specific drop-target tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropTuning {
    /// Fraction of a row's height, at its top and bottom, that targets a new
    /// row above/below instead of a slot in the row.
    pub new_row_band: f64,
}

impl DropTuning {
    pub const DEFAULT_NEW_ROW_BAND: f64 = 0.25;
    pub const MAX_NEW_ROW_BAND: f64 = 0.5;

    pub fn new(new_row_band: f64) -> Result<Self, TuningError> {
        let tuning = Self { new_row_band };
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(self) -> Result<(), TuningError> {
        TuningError::check(
            "new_row_band",
            self.new_row_band,
            0.0,
            Self::MAX_NEW_ROW_BAND,
        )
    }
}

impl Default for DropTuning {
    fn default() -> Self {
        Self {
            new_row_band: Self::DEFAULT_NEW_ROW_BAND,
        }
    }
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragSubject {
    Field { id: FieldId },
    Row { row_index: usize },
    /// A field not yet in the grid, e.g. from a palette.
    NewField { payload: Payload },
}

/// Side of a field an insert lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropSide {
    Before,
    After,
}

/// Where a release would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    InsertInRow {
        row_index: usize,
        column_index: usize,
        side: DropSide,
    },
    NewRowAbove {
        row_index: usize,
    },
    NewRowBelow {
        row_index: usize,
    },
}

impl DropTarget {
    /// Row index of a new row this target would create, read against the
    /// grid before the drop.
    #[must_use]
    pub const fn new_row_index(self) -> Option<usize> {
        match self {
            Self::NewRowAbove { row_index } => Some(row_index),
            Self::NewRowBelow { row_index } => Some(row_index + 1),
            Self::InsertInRow { .. } => None,
        }
    }

    /// Column a field inserted at this target would occupy, read against the
    /// row before the drop.
    #[must_use]
    pub const fn insert_column(self) -> Option<usize> {
        match self {
            Self::InsertInRow {
                column_index,
                side: DropSide::Before,
                ..
            } => Some(column_index),
            Self::InsertInRow {
                column_index,
                side: DropSide::After,
                ..
            } => Some(column_index + 1),
            Self::NewRowAbove { .. } | Self::NewRowBelow { .. } => None,
        }
    }
}

/// What a successful commit did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropApplied {
    pub target: DropTarget,
    /// Identity of the field a new-item drop created.
    pub created: Option<FieldId>,
}

/// Active drag from pointer-down to release.
#[derive(Debug, Clone, PartialEq)]
pub struct DragReflowSession {
    subject: DragSubject,
    source: Option<GridPosition>,
    tuning: DropTuning,
    preserve_proportions: bool,
    target: Option<DropTarget>,
}

impl DragReflowSession {
    /// Start dragging `subject`. Fields and rows must exist in `grid`.
    pub fn begin(grid: &Grid, subject: DragSubject, tuning: DropTuning) -> Result<Self, GridError> {
        let source = match &subject {
            DragSubject::Field { id } => Some(grid.locate(id)?),
            DragSubject::Row { row_index } => {
                if *row_index >= grid.row_count() {
                    return Err(GridError::UnknownRow {
                        row_index: *row_index,
                        row_count: grid.row_count(),
                    });
                }
                Some(GridPosition::new(*row_index, 0))
            }
            DragSubject::NewField { .. } => None,
        };
        formgrid_core::debug!(session = "drag", subject = ?subject_kind(&subject), ?source, "drag began");
        Ok(Self {
            subject,
            source,
            tuning,
            preserve_proportions: false,
            target: None,
        })
    }

    /// Scale existing widths instead of re-spreading evenly when a new item
    /// is dropped into a near-full row.
    #[must_use]
    pub fn with_preserve_proportions(mut self, preserve: bool) -> Self {
        self.preserve_proportions = preserve;
        self
    }

    #[must_use]
    pub fn subject(&self) -> &DragSubject {
        &self.subject
    }

    /// Target from the latest update.
    #[must_use]
    pub const fn target(&self) -> Option<DropTarget> {
        self.target
    }

    /// Recompute the drop target for `pointer`.
    pub fn update(&mut self, geometry: &GridGeometry, pointer: Point) -> Option<DropTarget> {
        let target = match self.subject {
            DragSubject::Row { .. } => row_drop_target(geometry, pointer),
            DragSubject::Field { .. } | DragSubject::NewField { .. } => self
                .field_drop_target(geometry, pointer)
                .filter(|target| self.fits(geometry, *target)),
        };
        if target != self.target {
            formgrid_core::trace!(session = "drag", ?target, x = pointer.x, y = pointer.y, "drop target changed");
        }
        self.target = target;
        target
    }

    /// The release expressed as a replayable grid operation.
    pub fn operation(&self) -> Result<GridOperation, Rejection> {
        self.resolve().map(|(_, operation)| operation)
    }

    /// Release over the current target.
    pub fn commit(self, grid: &mut Grid) -> Result<EditOutcome<DropApplied>, GridError> {
        let (target, operation) = match self.resolve() {
            Ok(resolved) => resolved,
            Err(rejection) => {
                formgrid_core::debug!(session = "drag", %rejection, "drag released without effect");
                return Ok(EditOutcome::Rejected(rejection));
            }
        };
        let outcome = grid.apply_operation(&operation)?;
        formgrid_core::debug!(session = "drag", ?target, applied = outcome.is_applied(), "drag committed");
        Ok(match outcome.status {
            OperationStatus::Applied => EditOutcome::Applied(DropApplied {
                target,
                created: outcome.created.into_iter().next(),
            }),
            OperationStatus::Rejected { rejection } => EditOutcome::Rejected(rejection),
        })
    }

    /// Abandon the drag. The grid was never touched.
    pub fn cancel(self) {
        formgrid_core::debug!(session = "drag", subject = ?subject_kind(&self.subject), "drag cancelled");
    }

    fn resolve(&self) -> Result<(DropTarget, GridOperation), Rejection> {
        let target = self.target.ok_or(Rejection::NoDropTarget)?;
        let operation = match &self.subject {
            DragSubject::Field { id } => {
                let id = id.clone();
                match target {
                    DropTarget::InsertInRow { row_index, .. } => {
                        let mut to_column = target.insert_column().unwrap_or(0);
                        if let Some(source) = self.source
                            && source.row_index == row_index
                            && source.column_index < to_column
                        {
                            to_column -= 1;
                        }
                        GridOperation::MoveField {
                            id,
                            to_row: row_index,
                            to_column,
                        }
                    }
                    DropTarget::NewRowAbove { .. } | DropTarget::NewRowBelow { .. } => {
                        GridOperation::MoveFieldToNewRow {
                            id,
                            row_index: target.new_row_index().unwrap_or(0),
                        }
                    }
                }
            }
            DragSubject::Row { row_index: from } => {
                let from = *from;
                let to_row_index = match target {
                    DropTarget::NewRowAbove { row_index } if from < row_index => row_index - 1,
                    DropTarget::NewRowAbove { row_index } => row_index,
                    DropTarget::NewRowBelow { row_index } if from <= row_index => row_index,
                    DropTarget::NewRowBelow { row_index } => row_index + 1,
                    DropTarget::InsertInRow { .. } => return Err(Rejection::IncompatibleTarget),
                };
                GridOperation::MoveRow {
                    row_index: from,
                    to_row_index,
                }
            }
            DragSubject::NewField { payload } => match target {
                DropTarget::InsertInRow { row_index, .. } => GridOperation::AddField {
                    payload: payload.clone(),
                    target: Some(GridPosition::new(
                        row_index,
                        target.insert_column().unwrap_or(0),
                    )),
                    preserve_proportions: self.preserve_proportions,
                },
                DropTarget::NewRowAbove { .. } | DropTarget::NewRowBelow { .. } => {
                    GridOperation::AddFieldInNewRow {
                        payload: payload.clone(),
                        row_index: target.new_row_index().unwrap_or(0),
                    }
                }
            },
        };
        Ok((target, operation))
    }

    fn field_drop_target(&self, geometry: &GridGeometry, pointer: Point) -> Option<DropTarget> {
        let (Some(first), Some(last)) = (geometry.rows.first(), geometry.rows.last()) else {
            return Some(DropTarget::NewRowAbove { row_index: 0 });
        };
        if pointer.y < first.bounds.top() {
            return Some(DropTarget::NewRowAbove { row_index: 0 });
        }
        if pointer.y >= last.bounds.bottom() {
            return Some(DropTarget::NewRowBelow {
                row_index: last.index,
            });
        }
        let Some(row) = geometry.row_at(pointer.y) else {
            return row_above_gap(geometry, pointer.y)
                .map(|row_index| DropTarget::NewRowBelow { row_index });
        };

        let band = self.tuning.new_row_band;
        let fy = row.bounds.fraction_y(pointer);
        if fy < band {
            return Some(DropTarget::NewRowAbove {
                row_index: row.index,
            });
        }
        if fy > 1.0 - band {
            return Some(DropTarget::NewRowBelow {
                row_index: row.index,
            });
        }
        Some(slot_in_row(row, pointer))
    }

    /// A net-new field cannot be dropped into a full row.
    fn fits(&self, geometry: &GridGeometry, target: DropTarget) -> bool {
        let DropTarget::InsertInRow { row_index, .. } = target else {
            return true;
        };
        let len = geometry
            .rows
            .get(row_index)
            .map_or(0, |row| row.fields.len());
        let same_row = self
            .source
            .is_some_and(|source| source.row_index == row_index);
        same_row || len < MAX_FIELDS_PER_ROW
    }
}

/// Insert slot for a pointer inside a row's vertical extent.
fn slot_in_row(row: &RowBox, pointer: Point) -> DropTarget {
    let insert = |column_index, side| DropTarget::InsertInRow {
        row_index: row.index,
        column_index,
        side,
    };
    match row.field_at_x(pointer.x) {
        Some(field) if field.bounds.fraction_x(pointer) < 0.5 => {
            match field.position.column_index.checked_sub(1) {
                Some(previous) => insert(previous, DropSide::After),
                None => insert(0, DropSide::Before),
            }
        }
        Some(field) => insert(field.position.column_index, DropSide::After),
        None if pointer.x < row.bounds.left() => insert(0, DropSide::Before),
        None => insert(row.fields.len().saturating_sub(1), DropSide::After),
    }
}

fn row_drop_target(geometry: &GridGeometry, pointer: Point) -> Option<DropTarget> {
    let first = geometry.rows.first()?;
    let last = geometry.rows.last()?;
    if pointer.y < first.bounds.top() {
        return Some(DropTarget::NewRowAbove { row_index: 0 });
    }
    if pointer.y >= last.bounds.bottom() {
        return Some(DropTarget::NewRowBelow {
            row_index: last.index,
        });
    }
    match geometry.row_at(pointer.y) {
        Some(row) if row.bounds.fraction_y(pointer) < 0.5 => Some(DropTarget::NewRowAbove {
            row_index: row.index,
        }),
        Some(row) => Some(DropTarget::NewRowBelow {
            row_index: row.index,
        }),
        None => {
            row_above_gap(geometry, pointer.y).map(|row_index| DropTarget::NewRowBelow { row_index })
        }
    }
}

/// Last row ending at or above `y`.
fn row_above_gap(geometry: &GridGeometry, y: f64) -> Option<usize> {
    geometry
        .rows
        .iter()
        .rev()
        .find(|row| row.bounds.bottom() <= y)
        .map(|row| row.index)
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn subject_kind(subject: &DragSubject) -> &'static str {
    match subject {
        DragSubject::Field { .. } => "field",
        DragSubject::Row { .. } => "row",
        DragSubject::NewField { .. } => "new_field",
    }
}
