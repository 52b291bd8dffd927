//! The editing context for one form.
//!
//! A [`LayoutEditor`] owns the [`Grid`], its [`GridTimeline`], and at most
//! one active gesture. Direct grid edits, undo and redo are refused while a
//! gesture is active; gesture commits are recorded in the timeline like any
//! other operation.

use std::fmt;

use formgrid_core::geometry::{Bounds, Point};
use serde::{Deserialize, Serialize};

use crate::drag::{DragReflowSession, DragSubject, DropApplied, DropTarget, DropTuning};
use crate::error::{EditOutcome, ErrorKind, GridError, Rejection};
use crate::field::{FieldId, FieldRecord};
use crate::geometry::{GridGeometry, RowMetrics};
use crate::grid::Grid;
use crate::operation::{GridOperation, OperationOutcome, OperationStatus};
use crate::resize::{ResizeEdge, ResizePreview, ResizeSession};
use crate::timeline::{GridTimeline, TimelineError};

/// Kind of gesture a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Resize,
    Drag,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resize => "resize",
            Self::Drag => "drag",
        })
    }
}

/// Failure of an editor call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("a {active} gesture is already active")]
    AlreadyActive { active: GestureKind },
    #[error("no {expected} gesture is active")]
    NotActive { expected: GestureKind },
    #[error("grid edits are blocked while a {active} gesture is active")]
    Busy { active: GestureKind },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

impl SessionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyActive { .. } | Self::NotActive { .. } | Self::Busy { .. } => {
                ErrorKind::PreconditionViolation
            }
            Self::Grid(err) => err.kind(),
            Self::Timeline(TimelineError::ReplayFailed { source, .. }) => source.kind(),
            Self::Timeline(_) => ErrorKind::InvalidInput,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ActiveGesture {
    Resize(ResizeSession),
    Drag(DragReflowSession),
}

impl ActiveGesture {
    const fn kind(&self) -> GestureKind {
        match self {
            Self::Resize(_) => GestureKind::Resize,
            Self::Drag(_) => GestureKind::Drag,
        }
    }
}

/// Single-writer editing context.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEditor {
    grid: Grid,
    timeline: GridTimeline,
    gesture: Option<ActiveGesture>,
    drop_tuning: DropTuning,
    row_metrics: RowMetrics,
}

impl LayoutEditor {
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            timeline: GridTimeline::with_baseline(&grid),
            grid,
            gesture: None,
            drop_tuning: DropTuning::default(),
            row_metrics: RowMetrics::default(),
        }
    }

    pub fn from_records(records: Vec<FieldRecord>) -> Result<Self, GridError> {
        Grid::from_records(records).map(Self::new)
    }

    #[must_use]
    pub fn with_drop_tuning(mut self, tuning: DropTuning) -> Self {
        self.drop_tuning = tuning;
        self
    }

    #[must_use]
    pub fn with_row_metrics(mut self, metrics: RowMetrics) -> Self {
        self.row_metrics = metrics;
        self
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn into_grid(self) -> Grid {
        self.grid
    }

    #[must_use]
    pub fn timeline(&self) -> &GridTimeline {
        &self.timeline
    }

    #[must_use]
    pub fn to_records(&self) -> Vec<FieldRecord> {
        self.grid.to_records()
    }

    /// Kind of the active gesture, if any.
    #[must_use]
    pub fn active_gesture(&self) -> Option<GestureKind> {
        self.gesture.as_ref().map(ActiveGesture::kind)
    }

    /// Boxes for the current grid inside `area`.
    #[must_use]
    pub fn geometry(&self, area: Bounds) -> GridGeometry {
        self.grid.solve_geometry(area, self.row_metrics)
    }

    /// Apply a direct edit and record it for undo.
    pub fn apply(&mut self, operation: GridOperation) -> Result<OperationOutcome, SessionError> {
        self.ensure_idle_for_edit()?;
        Ok(self.timeline.apply_and_record(&mut self.grid, operation)?)
    }

    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.ensure_idle_for_edit()?;
        Ok(self.timeline.undo(&mut self.grid)?)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.ensure_idle_for_edit()?;
        Ok(self.timeline.redo(&mut self.grid)?)
    }

    pub fn begin_resize(
        &mut self,
        id: &FieldId,
        edge: ResizeEdge,
    ) -> Result<ResizePreview, SessionError> {
        self.ensure_no_gesture()?;
        let session = ResizeSession::begin(&self.grid, id, edge)?;
        let preview = session.preview();
        self.gesture = Some(ActiveGesture::Resize(session));
        Ok(preview)
    }

    pub fn update_resize(&mut self, delta: f64) -> Result<ResizePreview, SessionError> {
        match &mut self.gesture {
            Some(ActiveGesture::Resize(session)) => Ok(session.update(&mut self.grid, delta)),
            _ => Err(SessionError::NotActive {
                expected: GestureKind::Resize,
            }),
        }
    }

    /// Commit the resize. The row is rolled back to its snapshot and the
    /// committed widths are applied as one recorded operation.
    pub fn end_resize(&mut self) -> Result<OperationOutcome, SessionError> {
        let session = self.take_resize()?;
        let _span = formgrid_core::debug_span!("editor.end_resize", id = %session.field_id()).entered();
        let operation = session.operation();
        session.cancel(&mut self.grid);
        Ok(self.timeline.apply_and_record(&mut self.grid, operation)?)
    }

    pub fn cancel_resize(&mut self) -> Result<(), SessionError> {
        let session = self.take_resize()?;
        session.cancel(&mut self.grid);
        Ok(())
    }

    pub fn begin_drag(&mut self, subject: DragSubject) -> Result<(), SessionError> {
        self.ensure_no_gesture()?;
        let session = DragReflowSession::begin(&self.grid, subject, self.drop_tuning)?;
        self.gesture = Some(ActiveGesture::Drag(session));
        Ok(())
    }

    /// Start dragging a new item that scales near-full rows proportionally.
    pub fn begin_drag_preserving_proportions(
        &mut self,
        subject: DragSubject,
    ) -> Result<(), SessionError> {
        self.ensure_no_gesture()?;
        let session = DragReflowSession::begin(&self.grid, subject, self.drop_tuning)?
            .with_preserve_proportions(true);
        self.gesture = Some(ActiveGesture::Drag(session));
        Ok(())
    }

    /// Hit-test `pointer` against `geometry`, typically from
    /// [`geometry`](Self::geometry).
    pub fn update_drag(
        &mut self,
        geometry: &GridGeometry,
        pointer: Point,
    ) -> Result<Option<DropTarget>, SessionError> {
        match &mut self.gesture {
            Some(ActiveGesture::Drag(session)) => Ok(session.update(geometry, pointer)),
            _ => Err(SessionError::NotActive {
                expected: GestureKind::Drag,
            }),
        }
    }

    /// Release the drag over its current target.
    pub fn end_drag(&mut self) -> Result<EditOutcome<DropApplied>, SessionError> {
        let session = self.take_drag()?;
        let _span = formgrid_core::debug_span!("editor.end_drag", target = ?session.target()).entered();
        let (target, operation) = match (session.target(), session.operation()) {
            (Some(target), Ok(operation)) => (target, operation),
            (_, Err(rejection)) => return Ok(EditOutcome::Rejected(rejection)),
            (None, Ok(_)) => return Ok(EditOutcome::Rejected(Rejection::NoDropTarget)),
        };
        let outcome = self.timeline.apply_and_record(&mut self.grid, operation)?;
        Ok(match outcome.status {
            OperationStatus::Applied => EditOutcome::Applied(DropApplied {
                target,
                created: outcome.created.into_iter().next(),
            }),
            OperationStatus::Rejected { rejection } => EditOutcome::Rejected(rejection),
        })
    }

    pub fn cancel_drag(&mut self) -> Result<(), SessionError> {
        self.take_drag()?.cancel();
        Ok(())
    }

    /// Cancel whatever gesture is active. Returns its kind, or `None` when
    /// idle.
    pub fn force_cancel(&mut self) -> Option<GestureKind> {
        let gesture = self.gesture.take()?;
        let kind = gesture.kind();
        match gesture {
            ActiveGesture::Resize(session) => session.cancel(&mut self.grid),
            ActiveGesture::Drag(session) => session.cancel(),
        }
        Some(kind)
    }

    fn ensure_no_gesture(&self) -> Result<(), SessionError> {
        match self.active_gesture() {
            Some(active) => {
                formgrid_core::warn!(%active, "gesture refused: another gesture is active");
                Err(SessionError::AlreadyActive { active })
            }
            None => Ok(()),
        }
    }

    fn ensure_idle_for_edit(&self) -> Result<(), SessionError> {
        match self.active_gesture() {
            Some(active) => Err(SessionError::Busy { active }),
            None => Ok(()),
        }
    }

    fn take_resize(&mut self) -> Result<ResizeSession, SessionError> {
        match self.gesture.take() {
            Some(ActiveGesture::Resize(session)) => Ok(session),
            other => {
                self.gesture = other;
                Err(SessionError::NotActive {
                    expected: GestureKind::Resize,
                })
            }
        }
    }

    fn take_drag(&mut self) -> Result<DragReflowSession, SessionError> {
        match self.gesture.take() {
            Some(ActiveGesture::Drag(session)) => Ok(session),
            other => {
                self.gesture = other;
                Err(SessionError::NotActive {
                    expected: GestureKind::Drag,
                })
            }
        }
    }
}
