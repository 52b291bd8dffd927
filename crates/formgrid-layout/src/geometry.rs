//! Row and field boxes for a grid laid out inside a host area.
//!
//! Rows stack top to bottom at a fixed height with a fixed gap; each field
//! spans its width percentage of the area's width. Rows whose widths do not
//! fill 100% leave empty space on the right, which drag hit-testing treats
//! as part of the row.

use formgrid_core::geometry::{Bounds, Point};
use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::field::FieldId;
use crate::grid::{Grid, GridPosition};
use crate::limits::MAX_WIDTH;

/// Vertical metrics used to stack rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowMetrics {
    pub row_height: f64,
    pub row_gap: f64,
}

impl RowMetrics {
    pub const DEFAULT_ROW_HEIGHT: f64 = 56.0;
    pub const DEFAULT_ROW_GAP: f64 = 8.0;

    pub fn new(row_height: f64, row_gap: f64) -> Result<Self, TuningError> {
        let metrics = Self {
            row_height,
            row_gap,
        };
        metrics.validate()?;
        Ok(metrics)
    }

    pub fn validate(self) -> Result<(), TuningError> {
        TuningError::check("row_height", self.row_height, f64::MIN_POSITIVE, f64::MAX)?;
        TuningError::check("row_gap", self.row_gap, 0.0, f64::MAX)
    }

    /// Distance from one row's top edge to the next.
    #[must_use]
    pub fn pitch(self) -> f64 {
        self.row_height + self.row_gap
    }
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            row_height: Self::DEFAULT_ROW_HEIGHT,
            row_gap: Self::DEFAULT_ROW_GAP,
        }
    }
}

/// Box of one placed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBox {
    pub id: FieldId,
    pub position: GridPosition,
    pub bounds: Bounds,
}

/// Box of one row, spanning the full area width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowBox {
    pub index: usize,
    pub bounds: Bounds,
    pub fields: Vec<FieldBox>,
}

impl RowBox {
    /// Field under `x`, if any.
    #[must_use]
    pub fn field_at_x(&self, x: f64) -> Option<&FieldBox> {
        self.fields
            .iter()
            .find(|field| x >= field.bounds.left() && x < field.bounds.right())
    }

    /// Right edge of the last field.
    #[must_use]
    pub fn content_right(&self) -> f64 {
        self.fields
            .last()
            .map_or(self.bounds.left(), |field| field.bounds.right())
    }
}

/// Solved boxes for a whole grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridGeometry {
    pub area: Bounds,
    pub rows: Vec<RowBox>,
}

impl GridGeometry {
    /// Row whose vertical extent contains `y`.
    #[must_use]
    pub fn row_at(&self, y: f64) -> Option<&RowBox> {
        self.rows.iter().find(|row| row.bounds.contains_y(y))
    }

    /// Row and field under `point`.
    #[must_use]
    pub fn hit(&self, point: Point) -> Option<(&RowBox, Option<&FieldBox>)> {
        let row = self.row_at(point.y)?;
        Some((row, row.field_at_x(point.x)))
    }

    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&FieldBox> {
        self.rows
            .iter()
            .flat_map(|row| row.fields.iter())
            .find(|field| &field.id == id)
    }

    /// Box covering every row, or `None` for an empty grid.
    #[must_use]
    pub fn content_bounds(&self) -> Option<Bounds> {
        let first = self.rows.first()?;
        Some(
            self.rows
                .iter()
                .skip(1)
                .fold(first.bounds, |acc, row| acc.union(&row.bounds)),
        )
    }
}

/// Lay out `grid` inside `area`.
#[must_use]
pub fn solve_geometry(grid: &Grid, area: Bounds, metrics: RowMetrics) -> GridGeometry {
    let rows = grid
        .rows()
        .map(|row| {
            let top = area.top() + row.index() as f64 * metrics.pitch();
            let mut left = area.left();
            let fields = row
                .fields()
                .iter()
                .map(|field| {
                    let width = area.width * field.width() / MAX_WIDTH;
                    let bounds = Bounds::new(left, top, width, metrics.row_height);
                    left += width;
                    FieldBox {
                        id: field.id().clone(),
                        position: GridPosition::new(field.row_index(), field.column_index()),
                        bounds,
                    }
                })
                .collect();
            RowBox {
                index: row.index(),
                bounds: Bounds::new(area.left(), top, area.width, metrics.row_height),
                fields,
            }
        })
        .collect();
    GridGeometry { area, rows }
}
