//! Bounded resize transaction for one field edge.
//!
//! A [`ResizeSession`] exists only while a resize is in progress: `begin`
//! snapshots the row, every `update` recomputes the preview from that
//! snapshot and writes it into the grid, and the session is consumed by
//! either `end` (normalize the row) or `cancel` (restore the snapshot).

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::field::{FieldId, FieldWidth};
use crate::grid::{Grid, GridPosition};
use crate::limits::{MAX_WIDTH, MIN_WIDTH};
use crate::operation::GridOperation;
use crate::width::{room_for, round_width};

/// Float slack for bound checks on rounded widths.
const EPSILON: f64 = 1e-9;

/// Which edge of the field is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeEdge {
    Left,
    Right,
}

impl ResizeEdge {
    /// Width change of the resized field for a horizontal pointer delta.
    #[must_use]
    pub fn growth(self, delta: f64) -> f64 {
        match self {
            Self::Left => -delta,
            Self::Right => delta,
        }
    }
}

/// Why an update left the previous preview in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeHoldReason {
    NeighborBelowMinimum,
    NeighborAboveMaximum,
    NonFiniteDelta,
}

/// Widths currently shown for the resized field and its neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizePreview {
    pub width: f64,
    pub neighbor_width: Option<f64>,
    /// Set when the latest update was not applied.
    pub held: Option<ResizeHoldReason>,
}

#[derive(Debug, Clone, PartialEq)]
struct Neighbor {
    id: FieldId,
    position: GridPosition,
    start_width: f64,
}

/// Active resize of one field edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    field_id: FieldId,
    position: GridPosition,
    edge: ResizeEdge,
    start_width: f64,
    neighbor: Option<Neighbor>,
    others_total: f64,
    snapshot: Vec<FieldWidth>,
    preview: ResizePreview,
}

impl ResizeSession {
    /// Start resizing `id` by its `edge`.
    ///
    /// The neighbor is the adjacent field on that edge, if the row has one.
    pub fn begin(grid: &Grid, id: &FieldId, edge: ResizeEdge) -> Result<Self, GridError> {
        let position = grid.locate(id)?;
        let Some(row) = grid.row(position.row_index) else {
            return Err(GridError::UnknownField { id: id.clone() });
        };
        let fields = row.fields();
        let start_width = fields[position.column_index].width();
        let neighbor_column = match edge {
            ResizeEdge::Left => position.column_index.checked_sub(1),
            ResizeEdge::Right => Some(position.column_index + 1),
        };
        let neighbor = neighbor_column
            .and_then(|column| fields.get(column))
            .map(|field| Neighbor {
                id: field.id().clone(),
                position: GridPosition::new(field.row_index(), field.column_index()),
                start_width: field.width(),
            });
        let others_total = row.total_width() - start_width;
        let snapshot = fields
            .iter()
            .map(|field| FieldWidth::new(field.id().clone(), field.width()))
            .collect();

        formgrid_core::debug!(
            session = "resize",
            id = %id,
            row = position.row_index,
            column = position.column_index,
            ?edge,
            has_neighbor = neighbor.is_some(),
            "resize began"
        );
        Ok(Self {
            field_id: id.clone(),
            position,
            edge,
            start_width,
            preview: ResizePreview {
                width: start_width,
                neighbor_width: neighbor.as_ref().map(|n| n.start_width),
                held: None,
            },
            neighbor,
            others_total,
            snapshot,
        })
    }

    #[must_use]
    pub fn field_id(&self) -> &FieldId {
        &self.field_id
    }

    #[must_use]
    pub const fn edge(&self) -> ResizeEdge {
        self.edge
    }

    /// Latest preview.
    #[must_use]
    pub const fn preview(&self) -> ResizePreview {
        self.preview
    }

    /// Apply a pointer delta, in width percentage points, measured from where
    /// the resize began.
    ///
    /// With a neighbor the pair keeps its combined width; the update is held
    /// if the neighbor would leave `[MIN_WIDTH, MAX_WIDTH]`, and a held update
    /// shows the starting widths. Without a neighbor the field takes whatever
    /// room the row has left. The result depends only on `delta`, never on
    /// earlier updates.
    pub fn update(&mut self, grid: &mut Grid, delta: f64) -> ResizePreview {
        if !delta.is_finite() {
            return self.hold(grid, ResizeHoldReason::NonFiniteDelta);
        }
        let growth = self.edge.growth(delta);
        let requested = self.start_width + growth;

        let Some(neighbor) = &self.neighbor else {
            let width = round_width(requested.clamp(MIN_WIDTH, room_for(self.others_total)));
            grid.set_width_unchecked(self.position, width);
            return self.apply(width, None);
        };

        let pair_total = self.start_width + neighbor.start_width;
        let width = round_width(requested.clamp(MIN_WIDTH, MAX_WIDTH));
        let neighbor_width = round_width(pair_total - width);
        let unclamped_neighbor = neighbor.start_width - growth;
        if neighbor_width < MIN_WIDTH - EPSILON {
            return self.hold(grid, ResizeHoldReason::NeighborBelowMinimum);
        }
        if unclamped_neighbor > MAX_WIDTH + EPSILON || neighbor_width > MAX_WIDTH + EPSILON {
            return self.hold(grid, ResizeHoldReason::NeighborAboveMaximum);
        }
        let neighbor_position = neighbor.position;
        grid.set_width_unchecked(self.position, width);
        grid.set_width_unchecked(neighbor_position, neighbor_width);
        self.apply(width, Some(neighbor_width))
    }

    /// Widths the resize commits: the field's preview width, plus the
    /// neighbor's when there is one.
    #[must_use]
    pub fn committed_widths(&self) -> Vec<FieldWidth> {
        let mut widths = vec![FieldWidth::new(self.field_id.clone(), self.preview.width)];
        if let (Some(neighbor), Some(width)) = (&self.neighbor, self.preview.neighbor_width) {
            widths.push(FieldWidth::new(neighbor.id.clone(), width));
        }
        widths
    }

    /// The commit expressed as a replayable grid operation.
    #[must_use]
    pub fn operation(&self) -> GridOperation {
        GridOperation::SetWidths {
            widths: self.committed_widths(),
        }
    }

    /// Finish the resize and normalize the row. Returns the field's final
    /// width.
    pub fn end(self, grid: &mut Grid) -> Result<f64, GridError> {
        grid.set_widths(&self.committed_widths())?;
        let width = grid
            .field(&self.field_id)
            .map_or(self.preview.width, |field| field.width());
        formgrid_core::debug!(session = "resize", id = %self.field_id, width, "resize ended");
        Ok(width)
    }

    /// Abandon the resize, restoring every width in the row exactly.
    pub fn cancel(self, grid: &mut Grid) {
        grid.restore_widths(&self.snapshot);
        formgrid_core::debug!(session = "resize", id = %self.field_id, "resize cancelled");
    }

    fn apply(&mut self, width: f64, neighbor_width: Option<f64>) -> ResizePreview {
        self.preview = ResizePreview {
            width,
            neighbor_width,
            held: None,
        };
        formgrid_core::trace!(
            session = "resize",
            id = %self.field_id,
            width,
            ?neighbor_width,
            "resize preview"
        );
        self.preview
    }

    /// Put the pair back at its starting widths and report why.
    fn hold(&mut self, grid: &mut Grid, reason: ResizeHoldReason) -> ResizePreview {
        grid.set_width_unchecked(self.position, self.start_width);
        if let Some(neighbor) = &self.neighbor {
            grid.set_width_unchecked(neighbor.position, neighbor.start_width);
        }
        self.preview = ResizePreview {
            width: self.start_width,
            neighbor_width: self.neighbor.as_ref().map(|n| n.start_width),
            held: Some(reason),
        };
        formgrid_core::trace!(session = "resize", id = %self.field_id, ?reason, "resize update held");
        self.preview
    }
}
