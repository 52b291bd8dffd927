#![forbid(unsafe_code)]

//! Row/column form layout engine.
//!
//! A form is a vertical list of rows. Each row holds one to
//! [`MAX_FIELDS_PER_ROW`] fields whose widths are percentages of the row and
//! sum to 100 once the row is normalized. [`Grid`] owns the rows and applies
//! atomic edits; [`ResizeSession`] and [`DragReflowSession`] drive pointer
//! gestures on top of it; [`LayoutEditor`] ties a grid, its undo timeline
//! and at most one active gesture together.
//!
//! Persisted layouts are flat lists of [`FieldRecord`]s with optional
//! `rowIndex`, `columnIndex` and `width` attributes. Loading tolerates
//! legacy and malformed input; saving always writes a dense layout.

pub mod drag;
pub mod editor;
pub mod error;
pub mod field;
pub mod geometry;
pub mod grid;
pub mod limits;
pub mod operation;
pub mod report;
pub mod resize;
pub mod timeline;
pub mod width;

pub use formgrid_core::geometry::{Bounds, Point};

pub use drag::{DragReflowSession, DragSubject, DropApplied, DropSide, DropTarget, DropTuning};
pub use editor::{GestureKind, LayoutEditor, SessionError};
pub use error::{EditOutcome, ErrorKind, GridError, Rejection, TuningError};
pub use field::{FieldId, FieldIdAllocator, FieldPlacement, FieldRecord, FieldWidth, Payload};
pub use geometry::{FieldBox, GridGeometry, RowBox, RowMetrics, solve_geometry};
pub use grid::{Grid, GridPosition, Row, RowView};
pub use limits::{MAX_FIELDS_PER_ROW, MAX_WIDTH, MIN_WIDTH};
pub use operation::{GridOperation, OperationKind, OperationOutcome, OperationStatus};
pub use report::{InvariantCode, InvariantIssue, InvariantReport, InvariantSeverity, inspect_records};
pub use resize::{ResizeEdge, ResizeHoldReason, ResizePreview, ResizeSession};
pub use timeline::{GridTimeline, TimelineEntry, TimelineError};
