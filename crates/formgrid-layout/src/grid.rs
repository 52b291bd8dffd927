//! The authoritative row/column model of one form.
//!
//! A [`Grid`] stores its fields as rows of placements. Every public mutation
//! validates its references up front, mutates, then re-derives row and column
//! indexes, so after any call that returns the grid satisfies:
//!
//! - row indexes are exactly `0..row_count`;
//! - column indexes within a row are exactly `0..len`;
//! - every width is within `[MIN_WIDTH, MAX_WIDTH]`;
//! - no row holds more than [`MAX_FIELDS_PER_ROW`] fields.
//!
//! Calls that fail (with a [`GridError`]) or are declined (with an
//! [`EditOutcome::Rejected`]) leave the grid untouched.

use std::collections::{BTreeMap, BTreeSet};

use formgrid_core::geometry::Bounds;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{EditOutcome, GridError, Rejection};
use crate::field::{FieldId, FieldIdAllocator, FieldPlacement, FieldRecord, FieldWidth, Payload};
use crate::geometry::{GridGeometry, RowMetrics, solve_geometry};
use crate::limits::{MAX_FIELDS_PER_ROW, MAX_WIDTH, MIN_WIDTH};
use crate::report::{InvariantReport, inspect_records};
use crate::width::{
    auto_width, clamp_width, distribute_evenly, distribute_proportionally, is_near_full, room_for,
    round_width, row_total, settle_row,
};

/// Row and column of a slot in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub row_index: usize,
    pub column_index: usize,
}

impl GridPosition {
    #[must_use]
    pub const fn new(row_index: usize, column_index: usize) -> Self {
        Self {
            row_index,
            column_index,
        }
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowView<'a> {
    index: usize,
    fields: &'a [FieldPlacement],
}

impl<'a> RowView<'a> {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Fields in column order.
    #[must_use]
    pub const fn fields(&self) -> &'a [FieldPlacement] {
        self.fields
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    /// Rows in a grid are never empty; provided for API symmetry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.fields.len() >= MAX_FIELDS_PER_ROW
    }

    #[must_use]
    pub fn widths(&self) -> Vec<f64> {
        widths_of(self.fields)
    }

    #[must_use]
    pub fn total_width(&self) -> f64 {
        self.fields.iter().map(FieldPlacement::width).sum()
    }

    /// Owned copy of the row.
    #[must_use]
    pub fn to_row(&self) -> Row {
        Row {
            index: self.index,
            fields: self.fields.to_vec(),
        }
    }
}

/// Owned copy of one row, as returned by row-level operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: usize,
    pub fields: Vec<FieldPlacement>,
}

impl Row {
    #[must_use]
    pub fn widths(&self) -> Vec<f64> {
        widths_of(&self.fields)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<FieldId> {
        self.fields.iter().map(|f| f.id.clone()).collect()
    }
}

/// Validated grid model for one form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "Vec<FieldRecord>", try_from = "Vec<FieldRecord>")]
pub struct Grid {
    rows: Vec<Vec<FieldPlacement>>,
    index: FxHashMap<FieldId, (usize, usize)>,
    ids: FieldIdAllocator,
}

impl Grid {
    /// Empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the allocator used for new field identities.
    #[must_use]
    pub fn with_id_allocator(mut self, ids: FieldIdAllocator) -> Self {
        self.ids = ids;
        self
    }

    /// Build a grid from persisted records.
    ///
    /// If no record carries any layout attribute, every record gets its own
    /// full-width row in input order. Otherwise missing attributes default to
    /// row 0, column 0, width 100. The result is then brought into shape:
    /// row and column gaps are compacted (ties broken by input order), widths
    /// are clamped into bounds, overfull rows spill into new rows directly
    /// below, and every row is normalized.
    pub fn from_records(records: Vec<FieldRecord>) -> Result<Self, GridError> {
        let legacy = records.iter().all(FieldRecord::is_unplaced);
        let report = inspect_records(&records);
        if !report.is_clean() {
            formgrid_core::debug!(
                issues = report.issues.len(),
                codes = ?report.codes(),
                "repairing persisted layout"
            );
        }
        let mut seen = FxHashSet::default();
        let mut buckets: BTreeMap<usize, Vec<(usize, usize, FieldPlacement)>> = BTreeMap::new();

        for (order, record) in records.into_iter().enumerate() {
            if !seen.insert(record.id.clone()) {
                return Err(GridError::DuplicateFieldId { id: record.id });
            }
            let (row_index, column_index, width) = if legacy {
                (order, 0, MAX_WIDTH)
            } else {
                (
                    record.row_index.unwrap_or(0),
                    record.column_index.unwrap_or(0),
                    record.width.unwrap_or(MAX_WIDTH),
                )
            };
            buckets.entry(row_index).or_default().push((
                column_index,
                order,
                FieldPlacement::new(record.id, width, record.payload),
            ));
        }

        let mut rows = Vec::with_capacity(buckets.len());
        for (_, mut bucket) in buckets {
            bucket.sort_by_key(|(column, order, _)| (*column, *order));
            let mut fields = bucket.into_iter().map(|(_, _, field)| field).peekable();
            let mut first = true;
            while fields.peek().is_some() {
                let mut chunk: Vec<FieldPlacement> =
                    fields.by_ref().take(MAX_FIELDS_PER_ROW).collect();
                if first {
                    settle(&mut chunk);
                } else {
                    even(&mut chunk);
                    formgrid_core::debug!(
                        row = rows.len(),
                        fields = chunk.len(),
                        "overfull row spilled into a new row"
                    );
                }
                first = false;
                rows.push(chunk);
            }
        }

        let mut grid = Self {
            rows,
            index: FxHashMap::default(),
            ids: FieldIdAllocator::default(),
        };
        grid.reindex();
        formgrid_core::debug!(
            fields = grid.len(),
            rows = grid.row_count(),
            legacy,
            "grid loaded from records"
        );
        Ok(grid)
    }

    /// Persisted form of the grid, in row-major order.
    #[must_use]
    pub fn to_records(&self) -> Vec<FieldRecord> {
        self.fields().map(FieldPlacement::to_record).collect()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn row(&self, row_index: usize) -> Option<RowView<'_>> {
        self.rows.get(row_index).map(|fields| RowView {
            index: row_index,
            fields,
        })
    }

    /// Rows in order.
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, fields)| RowView { index, fields })
    }

    /// All fields in row-major order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldPlacement> + '_ {
        self.rows.iter().flatten()
    }

    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&FieldPlacement> {
        let (row, column) = self.index.get(id)?;
        self.rows.get(*row)?.get(*column)
    }

    #[must_use]
    pub fn contains(&self, id: &FieldId) -> bool {
        self.index.contains_key(id)
    }

    /// Current position of a field.
    pub fn locate(&self, id: &FieldId) -> Result<GridPosition, GridError> {
        self.index
            .get(id)
            .map(|(row, column)| GridPosition::new(*row, *column))
            .ok_or_else(|| GridError::UnknownField { id: id.clone() })
    }

    /// Mutable access to a field's payload. Layout attributes stay owned by
    /// the grid.
    pub fn payload_mut(&mut self, id: &FieldId) -> Result<&mut Payload, GridError> {
        let position = self.locate(id)?;
        Ok(&mut self.rows[position.row_index][position.column_index].payload)
    }

    /// Structured invariant findings for the current state. Empty for any
    /// grid produced by this type's operations.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        inspect_records(&self.to_records())
    }

    /// Boxes for every row and field inside `area`.
    #[must_use]
    pub fn solve_geometry(&self, area: Bounds, metrics: RowMetrics) -> GridGeometry {
        solve_geometry(self, area, metrics)
    }

    /// Deterministic hash of the layout (identities, positions, widths).
    ///
    /// Payloads are not hashed. Intended for operation logs and replay
    /// diagnostics.
    #[must_use]
    pub fn layout_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix(hash: &mut u64, byte: u8) {
            *hash ^= u64::from(byte);
            *hash = hash.wrapping_mul(PRIME);
        }

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                mix(hash, *byte);
            }
        }

        fn mix_u64(hash: &mut u64, value: u64) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        let mut hash = OFFSET_BASIS;
        mix_u64(&mut hash, self.rows.len() as u64);
        for row in &self.rows {
            mix_u64(&mut hash, row.len() as u64);
            for field in row {
                mix_u64(&mut hash, field.id.as_str().len() as u64);
                mix_bytes(&mut hash, field.id.as_str().as_bytes());
                mix_u64(&mut hash, field.width.to_bits());
            }
        }
        hash
    }

    /// Add a new field.
    ///
    /// Without a target the field joins the last row when it has room (the
    /// row is re-spread evenly), else it opens a full-width row at the end.
    /// With a target the field is inserted at that column (clamped to the
    /// row length), shifting later columns right; a target row equal to
    /// `row_count` opens a new row at the end. The row is re-spread evenly,
    /// or proportionally when `preserve_proportions` is set and the row was
    /// already near-full.
    pub fn add_field(
        &mut self,
        payload: Payload,
        target: Option<GridPosition>,
        preserve_proportions: bool,
    ) -> Result<EditOutcome<FieldPlacement>, GridError> {
        let Some(target) = target else {
            return Ok(EditOutcome::Applied(self.append_field(payload)));
        };
        let row_count = self.rows.len();
        if target.row_index > row_count {
            return Err(GridError::UnknownRow {
                row_index: target.row_index,
                row_count,
            });
        }
        if target.row_index == row_count {
            return self
                .add_field_in_new_row(payload, row_count)
                .map(EditOutcome::Applied);
        }
        if let Some(rejection) = self.capacity_rejection(target.row_index) {
            return Ok(EditOutcome::Rejected(rejection));
        }

        let id = self.allocate_id();
        let row = &mut self.rows[target.row_index];
        let existing = widths_of(row);
        let column = target.column_index.min(row.len());
        let incoming_width = auto_width(row.len() + 1);
        row.insert(
            column,
            FieldPlacement::new(id.clone(), incoming_width, payload),
        );
        if preserve_proportions && is_near_full(row_total(&existing)) {
            let mut widths = distribute_proportionally(&existing, 1);
            widths.insert(column, incoming_width);
            apply_widths(row, &settle_row(&widths));
        } else {
            even(row);
        }
        self.reindex();
        formgrid_core::debug!(
            op = "add_field",
            id = %id,
            row = target.row_index,
            column,
            preserve_proportions,
            "field added"
        );
        Ok(EditOutcome::Applied(self.placed(&id)))
    }

    /// Add a new field alone, full width, in a new row inserted at
    /// `row_index` (`0..=row_count`); lower rows shift down.
    pub fn add_field_in_new_row(
        &mut self,
        payload: Payload,
        row_index: usize,
    ) -> Result<FieldPlacement, GridError> {
        self.check_insert_row(row_index)?;
        let id = self.allocate_id();
        self.rows.insert(
            row_index,
            vec![FieldPlacement::new(id.clone(), MAX_WIDTH, payload)],
        );
        self.reindex();
        formgrid_core::debug!(op = "add_field_in_new_row", id = %id, row = row_index, "field added");
        Ok(self.placed(&id))
    }

    /// Move a field to `to_row` / `to_column`, both read against the grid as
    /// it is before the move.
    ///
    /// Within one row this only reorders columns and keeps every width.
    /// Across rows, the source row is compacted and re-spread evenly (or
    /// removed if it empties), and the destination row is re-spread evenly.
    /// `to_row == row_count` moves the field into a new last row. Moving into
    /// a full row is rejected.
    pub fn move_field(
        &mut self,
        id: &FieldId,
        to_row: usize,
        to_column: usize,
    ) -> Result<EditOutcome<()>, GridError> {
        let source = self.locate(id)?;
        let row_count = self.rows.len();
        if to_row > row_count {
            return Err(GridError::UnknownRow {
                row_index: to_row,
                row_count,
            });
        }

        if to_row == source.row_index {
            let row = &mut self.rows[source.row_index];
            let to = to_column.min(row.len() - 1);
            if to != source.column_index {
                let field = row.remove(source.column_index);
                row.insert(to, field);
                self.reindex();
            }
            formgrid_core::debug!(op = "move_field", id = %id, row = to_row, column = to, "field reordered");
            return Ok(EditOutcome::Applied(()));
        }
        if to_row == row_count {
            self.move_field_to_new_row(id, row_count)?;
            return Ok(EditOutcome::Applied(()));
        }
        if let Some(rejection) = self.capacity_rejection(to_row) {
            return Ok(EditOutcome::Rejected(rejection));
        }

        let (field, destination) = self.detach(source, to_row);
        let row = &mut self.rows[destination];
        let column = to_column.min(row.len());
        row.insert(column, field);
        even(row);
        self.reindex();
        formgrid_core::debug!(
            op = "move_field",
            id = %id,
            from_row = source.row_index,
            row = destination,
            column,
            "field moved"
        );
        Ok(EditOutcome::Applied(()))
    }

    /// Move a field into a new row of its own, inserted at `row_index`
    /// (read against the grid before the move, `0..=row_count`). The field
    /// takes the full width; its old row is compacted and re-spread evenly,
    /// or removed if it empties.
    pub fn move_field_to_new_row(
        &mut self,
        id: &FieldId,
        row_index: usize,
    ) -> Result<(), GridError> {
        let source = self.locate(id)?;
        self.check_insert_row(row_index)?;
        let (mut field, at) = self.detach(source, row_index);
        field.width = MAX_WIDTH;
        self.rows.insert(at, vec![field]);
        self.reindex();
        formgrid_core::debug!(
            op = "move_field_to_new_row",
            id = %id,
            from_row = source.row_index,
            row = at,
            "field moved to new row"
        );
        Ok(())
    }

    /// Set a field's width, clamped to `[MIN_WIDTH, 100 - others]`, then
    /// normalize its row. Returns the width the field ends up with.
    pub fn resize_field(&mut self, id: &FieldId, new_width: f64) -> Result<f64, GridError> {
        let position = self.locate(id)?;
        let row = &mut self.rows[position.row_index];
        let current = row[position.column_index].width;
        let others: f64 = row
            .iter()
            .enumerate()
            .filter(|(column, _)| *column != position.column_index)
            .map(|(_, field)| field.width)
            .sum();
        let requested = if new_width.is_finite() {
            new_width
        } else {
            current
        };
        row[position.column_index].width = round_width(requested.clamp(MIN_WIDTH, room_for(others)));
        settle(row);
        let width = row[position.column_index].width;
        formgrid_core::debug!(op = "resize_field", id = %id, requested, width, "field resized");
        Ok(width)
    }

    /// Set several widths at once, each clamped into bounds, then normalize
    /// every row touched. Fails without mutating if any id is unknown.
    pub fn set_widths(&mut self, widths: &[FieldWidth]) -> Result<(), GridError> {
        let positions = widths
            .iter()
            .map(|entry| self.locate(&entry.id))
            .collect::<Result<Vec<_>, _>>()?;
        let mut rows = BTreeSet::new();
        for (position, entry) in positions.iter().zip(widths) {
            self.rows[position.row_index][position.column_index].width =
                round_width(clamp_width(entry.width));
            let _ = rows.insert(position.row_index);
        }
        for row_index in rows {
            settle(&mut self.rows[row_index]);
        }
        formgrid_core::debug!(op = "set_widths", fields = widths.len(), "widths set");
        Ok(())
    }

    /// Normalize one row's widths (see [`crate::width::normalize_row`]).
    pub fn normalize_row(&mut self, row_index: usize) -> Result<(), GridError> {
        self.check_row(row_index)?;
        settle(&mut self.rows[row_index]);
        Ok(())
    }

    /// Remove a field. Its row is compacted and re-spread evenly, or removed
    /// if it empties. Returns the removed placement as it was.
    pub fn delete_field(&mut self, id: &FieldId) -> Result<FieldPlacement, GridError> {
        let position = self.locate(id)?;
        let removed = self.rows[position.row_index].remove(position.column_index);
        if self.rows[position.row_index].is_empty() {
            self.rows.remove(position.row_index);
        } else {
            even(&mut self.rows[position.row_index]);
        }
        self.reindex();
        formgrid_core::debug!(op = "delete_field", id = %id, row = position.row_index, "field deleted");
        Ok(removed)
    }

    /// Duplicate a field under a new identity with a copy of its payload.
    ///
    /// A source alone in its row, or in a full row, gets its copy in a new
    /// full-width row directly below. Otherwise the copy lands right after
    /// the source and the row is re-spread evenly.
    pub fn duplicate_field(&mut self, id: &FieldId) -> Result<FieldPlacement, GridError> {
        let position = self.locate(id)?;
        let new_id = self.allocate_id();
        let row = &mut self.rows[position.row_index];
        let payload = row[position.column_index].payload.clone();
        let len = row.len();
        if len == 1 || len >= MAX_FIELDS_PER_ROW {
            self.rows.insert(
                position.row_index + 1,
                vec![FieldPlacement::new(new_id.clone(), MAX_WIDTH, payload)],
            );
        } else {
            row.insert(
                position.column_index + 1,
                FieldPlacement::new(new_id.clone(), auto_width(len + 1), payload),
            );
            even(row);
        }
        self.reindex();
        formgrid_core::debug!(op = "duplicate_field", source = %id, id = %new_id, "field duplicated");
        Ok(self.placed(&new_id))
    }

    /// Move a whole row so it ends up at index `to_row_index`. Intervening
    /// rows shift by one; columns and widths are untouched.
    pub fn move_row(&mut self, row_index: usize, to_row_index: usize) -> Result<(), GridError> {
        self.check_row(row_index)?;
        self.check_row(to_row_index)?;
        if row_index != to_row_index {
            let row = self.rows.remove(row_index);
            self.rows.insert(to_row_index, row);
            self.reindex();
        }
        formgrid_core::debug!(op = "move_row", from = row_index, to = to_row_index, "row moved");
        Ok(())
    }

    /// Copy a row directly below itself. Every copy gets a new identity and
    /// keeps its column and width. Returns the new row.
    pub fn duplicate_row(&mut self, row_index: usize) -> Result<Row, GridError> {
        self.check_row(row_index)?;
        let mut copy = Vec::with_capacity(self.rows[row_index].len());
        for column in 0..self.rows[row_index].len() {
            let id = self.allocate_id();
            let source = &self.rows[row_index][column];
            copy.push(FieldPlacement::new(
                id,
                source.width,
                source.payload.clone(),
            ));
        }
        self.rows.insert(row_index + 1, copy);
        self.reindex();
        formgrid_core::debug!(op = "duplicate_row", row = row_index, "row duplicated");
        Ok(Row {
            index: row_index + 1,
            fields: self.rows[row_index + 1].clone(),
        })
    }

    /// Remove a row and every field in it. Returns the removed row.
    pub fn delete_row(&mut self, row_index: usize) -> Result<Row, GridError> {
        self.check_row(row_index)?;
        let fields = self.rows.remove(row_index);
        self.reindex();
        formgrid_core::debug!(op = "delete_row", row = row_index, fields = fields.len(), "row deleted");
        Ok(Row {
            index: row_index,
            fields,
        })
    }

    /// Overwrite one width without normalizing. Used by resize previews.
    pub(crate) fn set_width_unchecked(&mut self, position: GridPosition, width: f64) {
        if let Some(field) = self
            .rows
            .get_mut(position.row_index)
            .and_then(|row| row.get_mut(position.column_index))
        {
            field.width = width;
        }
    }

    /// Write back widths by identity. Unknown ids are skipped.
    pub(crate) fn restore_widths(&mut self, widths: &[FieldWidth]) {
        for entry in widths {
            if let Some(&(row, column)) = self.index.get(&entry.id) {
                self.rows[row][column].width = entry.width;
            }
        }
    }

    fn append_field(&mut self, payload: Payload) -> FieldPlacement {
        let id = self.allocate_id();
        match self.rows.last_mut() {
            Some(row) if row.len() < MAX_FIELDS_PER_ROW => {
                let width = auto_width(row.len() + 1);
                row.push(FieldPlacement::new(id.clone(), width, payload));
                even(row);
            }
            _ => self
                .rows
                .push(vec![FieldPlacement::new(id.clone(), MAX_WIDTH, payload)]),
        }
        self.reindex();
        formgrid_core::debug!(op = "add_field", id = %id, row = self.rows.len() - 1, "field appended");
        self.placed(&id)
    }

    /// Take a field out of its row, fixing up the row it leaves. Returns the
    /// field and `target_row` adjusted for a removed source row.
    fn detach(&mut self, source: GridPosition, target_row: usize) -> (FieldPlacement, usize) {
        let field = self.rows[source.row_index].remove(source.column_index);
        let mut target = target_row;
        if self.rows[source.row_index].is_empty() {
            self.rows.remove(source.row_index);
            if source.row_index < target {
                target -= 1;
            }
        } else {
            even(&mut self.rows[source.row_index]);
        }
        (field, target)
    }

    fn capacity_rejection(&self, row_index: usize) -> Option<Rejection> {
        let len = self.rows.get(row_index).map_or(0, Vec::len);
        if len < MAX_FIELDS_PER_ROW {
            return None;
        }
        formgrid_core::debug!(row = row_index, len, "row at capacity, edit rejected");
        Some(Rejection::CapacityExceeded {
            row_index,
            capacity: MAX_FIELDS_PER_ROW,
        })
    }

    fn check_row(&self, row_index: usize) -> Result<(), GridError> {
        if row_index < self.rows.len() {
            Ok(())
        } else {
            Err(GridError::UnknownRow {
                row_index,
                row_count: self.rows.len(),
            })
        }
    }

    fn check_insert_row(&self, row_index: usize) -> Result<(), GridError> {
        if row_index <= self.rows.len() {
            Ok(())
        } else {
            Err(GridError::UnknownRow {
                row_index,
                row_count: self.rows.len(),
            })
        }
    }

    fn allocate_id(&mut self) -> FieldId {
        let Self { ids, index, .. } = self;
        ids.allocate(|candidate| index.contains_key(candidate))
    }

    /// Clone of a placement known to exist.
    fn placed(&self, id: &FieldId) -> FieldPlacement {
        let (row, column) = self.index[id];
        self.rows[row][column].clone()
    }

    /// Re-derive row/column indexes and the id index from row order.
    fn reindex(&mut self) {
        self.rows.retain(|row| !row.is_empty());
        self.index.clear();
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            for (column_index, field) in row.iter_mut().enumerate() {
                field.row_index = row_index;
                field.column_index = column_index;
                let _ = self
                    .index
                    .insert(field.id.clone(), (row_index, column_index));
            }
        }
    }
}

impl From<Grid> for Vec<FieldRecord> {
    fn from(grid: Grid) -> Self {
        grid.to_records()
    }
}

impl TryFrom<Vec<FieldRecord>> for Grid {
    type Error = GridError;

    fn try_from(records: Vec<FieldRecord>) -> Result<Self, Self::Error> {
        Self::from_records(records)
    }
}

fn widths_of(fields: &[FieldPlacement]) -> Vec<f64> {
    fields.iter().map(FieldPlacement::width).collect()
}

fn apply_widths(row: &mut [FieldPlacement], widths: &[f64]) {
    for (field, width) in row.iter_mut().zip(widths) {
        field.width = *width;
    }
}

/// Clamp and normalize a row in place.
fn settle(row: &mut [FieldPlacement]) {
    let widths = settle_row(&widths_of(row));
    apply_widths(row, &widths);
}

/// Re-spread a row evenly and normalize it in place.
fn even(row: &mut [FieldPlacement]) {
    let widths = settle_row(&distribute_evenly(&widths_of(row)));
    apply_widths(row, &widths);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(kind: &str) -> Payload {
        let mut map = Payload::new();
        let _ = map.insert("type".to_string(), json!(kind));
        map
    }

    fn id(raw: &str) -> FieldId {
        FieldId::new(raw)
    }

    /// Build a grid from `(id, row, column, width)` tuples.
    fn grid_of(layout: &[(&str, usize, usize, f64)]) -> Grid {
        let records = layout
            .iter()
            .map(|(raw, row, column, width)| {
                FieldRecord::placed(*raw, *row, *column, *width, payload("text"))
            })
            .collect();
        Grid::from_records(records).expect("valid layout")
    }

    fn widths(grid: &Grid, row: usize) -> Vec<f64> {
        grid.row(row).expect("row exists").widths()
    }

    fn ids(grid: &Grid, row: usize) -> Vec<String> {
        grid.row(row)
            .expect("row exists")
            .fields()
            .iter()
            .map(|f| f.id().to_string())
            .collect()
    }

    fn assert_clean(grid: &Grid) {
        let report = grid.invariant_report();
        assert!(report.is_clean(), "invariant issues: {:?}", report.issues);
    }

    #[test]
    fn legacy_records_get_one_row_each() {
        let records = vec![
            FieldRecord::unplaced("a", payload("text")),
            FieldRecord::unplaced("b", payload("email")),
        ];
        let grid = Grid::from_records(records).expect("legacy load");
        assert_eq!(grid.row_count(), 2);
        assert_eq!(ids(&grid, 1), vec!["b"]);
        assert_eq!(widths(&grid, 0), vec![100.0]);
        assert_clean(&grid);
    }

    #[test]
    fn partial_layout_defaults_missing_attributes() {
        let mut b = FieldRecord::unplaced("b", payload("text"));
        b.row_index = Some(1);
        let records = vec![FieldRecord::unplaced("a", payload("text")), b];
        let grid = Grid::from_records(records).expect("load");
        assert_eq!(grid.row_count(), 2);
        assert_eq!(ids(&grid, 0), vec!["a"]);
        assert_eq!(ids(&grid, 1), vec!["b"]);
    }

    #[test]
    fn load_compacts_gaps_and_spills_overfull_rows() {
        let grid = grid_of(&[
            ("a", 3, 4, 20.0),
            ("b", 3, 9, 20.0),
            ("c", 7, 0, 20.0),
            ("d", 7, 1, 20.0),
            ("e", 7, 2, 20.0),
            ("f", 7, 3, 20.0),
            ("g", 7, 4, 20.0),
            ("h", 7, 5, 20.0),
        ]);
        assert_eq!(grid.row_count(), 3);
        assert_eq!(ids(&grid, 0), vec!["a", "b"]);
        assert_eq!(ids(&grid, 1), vec!["c", "d", "e", "f", "g"]);
        assert_eq!(ids(&grid, 2), vec!["h"]);
        assert_eq!(widths(&grid, 2), vec![100.0]);
        assert_clean(&grid);
    }

    #[test]
    fn duplicate_ids_are_rejected_on_load() {
        let err = Grid::from_records(vec![
            FieldRecord::unplaced("a", Payload::new()),
            FieldRecord::unplaced("a", Payload::new()),
        ])
        .expect_err("duplicate id");
        assert_eq!(err, GridError::DuplicateFieldId { id: id("a") });
    }

    #[test]
    fn add_without_target_fills_last_row_then_wraps() {
        let mut grid = Grid::new();
        for _ in 0..5 {
            assert!(grid.add_field(payload("text"), None, false).expect("add").is_applied());
        }
        assert_eq!(grid.row_count(), 1);
        assert_eq!(widths(&grid, 0), vec![20.0; 5]);
        let sixth = grid
            .add_field(payload("text"), None, false)
            .expect("add")
            .applied()
            .expect("applied");
        assert_eq!(sixth.row_index(), 1);
        assert_eq!(sixth.width(), 100.0);
        assert_clean(&grid);
    }

    #[test]
    fn targeted_add_into_full_row_is_rejected() {
        let mut grid = grid_of(&[
            ("a", 0, 0, 20.0),
            ("b", 0, 1, 20.0),
            ("c", 0, 2, 20.0),
            ("d", 0, 3, 20.0),
            ("e", 0, 4, 20.0),
        ]);
        let before = grid.clone();
        let outcome = grid
            .add_field(payload("text"), Some(GridPosition::new(0, 2)), false)
            .expect("valid reference");
        assert_eq!(
            outcome.rejection(),
            Some(Rejection::CapacityExceeded {
                row_index: 0,
                capacity: MAX_FIELDS_PER_ROW
            })
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn targeted_add_shifts_columns_and_respreads() {
        let mut grid = grid_of(&[("a", 0, 0, 50.0), ("b", 0, 1, 50.0)]);
        let added = grid
            .add_field(payload("text"), Some(GridPosition::new(0, 1)), false)
            .expect("add")
            .applied()
            .expect("applied");
        assert_eq!(added.column_index(), 1);
        assert_eq!(ids(&grid, 0), vec!["a", added.id().as_str(), "b"]);
        assert_eq!(widths(&grid, 0), vec![33.3, 33.3, 33.4]);
    }

    #[test]
    fn targeted_add_can_preserve_proportions() {
        let mut grid = grid_of(&[("a", 0, 0, 70.0), ("b", 0, 1, 30.0)]);
        let _ = grid
            .add_field(payload("text"), Some(GridPosition::new(0, 2)), true)
            .expect("add");
        let w = widths(&grid, 0);
        assert!(w[0] > w[1], "{w:?}");
        assert!((w.iter().sum::<f64>() - 100.0).abs() < 0.01, "{w:?}");
        assert!(w.iter().all(|x| *x >= MIN_WIDTH), "{w:?}");
    }

    #[test]
    fn add_to_unknown_row_is_an_invalid_reference() {
        let mut grid = grid_of(&[("a", 0, 0, 100.0)]);
        let err = grid
            .add_field(payload("text"), Some(GridPosition::new(5, 0)), false)
            .expect_err("row 5 missing");
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidReference);
    }

    #[test]
    fn same_row_move_keeps_custom_widths() {
        let mut grid = grid_of(&[("a", 0, 0, 30.0), ("b", 0, 1, 70.0)]);
        let _ = grid.move_field(&id("a"), 0, 1).expect("move");
        assert_eq!(ids(&grid, 0), vec!["b", "a"]);
        assert_eq!(widths(&grid, 0), vec![70.0, 30.0]);
    }

    #[test]
    fn cross_row_move_respreads_both_rows() {
        let mut grid = grid_of(&[
            ("a", 0, 0, 30.0),
            ("b", 0, 1, 30.0),
            ("c", 0, 2, 40.0),
            ("d", 1, 0, 100.0),
        ]);
        let _ = grid.move_field(&id("b"), 1, 0).expect("move");
        assert_eq!(ids(&grid, 0), vec!["a", "c"]);
        assert_eq!(widths(&grid, 0), vec![50.0, 50.0]);
        assert_eq!(ids(&grid, 1), vec!["b", "d"]);
        assert_eq!(widths(&grid, 1), vec![50.0, 50.0]);
        assert_clean(&grid);
    }

    #[test]
    fn moving_last_field_out_compacts_rows() {
        let mut grid = grid_of(&[("a", 0, 0, 100.0), ("b", 1, 0, 100.0), ("c", 2, 0, 100.0)]);
        let _ = grid.move_field(&id("a"), 2, 1).expect("move");
        assert_eq!(grid.row_count(), 2);
        assert_eq!(ids(&grid, 1), vec!["c", "a"]);
        assert_clean(&grid);
    }

    #[test]
    fn move_into_full_row_is_rejected() {
        let mut grid = grid_of(&[
            ("a", 0, 0, 20.0),
            ("b", 0, 1, 20.0),
            ("c", 0, 2, 20.0),
            ("d", 0, 3, 20.0),
            ("e", 0, 4, 20.0),
            ("f", 1, 0, 100.0),
        ]);
        let before = grid.clone();
        let outcome = grid.move_field(&id("f"), 0, 0).expect("valid reference");
        assert!(outcome.is_rejected());
        assert_eq!(grid, before);
    }

    #[test]
    fn move_to_new_row_below_everything() {
        let mut grid = grid_of(&[("a", 0, 0, 50.0), ("b", 0, 1, 50.0)]);
        grid.move_field_to_new_row(&id("a"), 1).expect("move");
        assert_eq!(ids(&grid, 0), vec!["b"]);
        assert_eq!(widths(&grid, 0), vec![100.0]);
        assert_eq!(ids(&grid, 1), vec!["a"]);
        assert_eq!(widths(&grid, 1), vec![100.0]);
    }

    #[test]
    fn resize_clamps_to_room_left_in_row() {
        let mut grid = grid_of(&[("a", 0, 0, 40.0), ("b", 0, 1, 30.0)]);
        let width = grid.resize_field(&id("a"), 95.0).expect("resize");
        assert_eq!(width, 70.0);
        let width = grid.resize_field(&id("a"), 3.0).expect("resize");
        assert_eq!(width, MIN_WIDTH);
        assert_eq!(widths(&grid, 0), vec![20.0, 30.0]);
    }

    #[test]
    fn delete_respreads_remaining_fields() {
        let mut grid = grid_of(&[("a", 0, 0, 33.3), ("b", 0, 1, 33.3), ("c", 0, 2, 33.4)]);
        let removed = grid.delete_field(&id("b")).expect("delete");
        assert_eq!(removed.id(), &id("b"));
        assert_eq!(widths(&grid, 0), vec![50.0, 50.0]);
        assert_eq!(ids(&grid, 0), vec!["a", "c"]);
    }

    #[test]
    fn deleting_sole_field_removes_row() {
        let mut grid = grid_of(&[("a", 0, 0, 100.0), ("b", 1, 0, 100.0), ("c", 2, 0, 100.0)]);
        let _ = grid.delete_field(&id("b")).expect("delete");
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.field(&id("c")).map(FieldPlacement::row_index), Some(1));
        assert!(grid.delete_field(&id("b")).is_err());
    }

    #[test]
    fn duplicate_sole_field_opens_row_below() {
        let mut grid = grid_of(&[("a", 0, 0, 100.0), ("b", 1, 0, 100.0)]);
        let copy = grid.duplicate_field(&id("a")).expect("duplicate");
        assert_eq!(copy.row_index(), 1);
        assert_eq!(copy.width(), 100.0);
        assert_ne!(copy.id(), &id("a"));
        assert_eq!(copy.payload(), grid.field(&id("a")).expect("a").payload());
        assert_eq!(widths(&grid, 0), vec![100.0]);
        assert_eq!(ids(&grid, 2), vec!["b"]);
    }

    #[test]
    fn duplicate_in_partial_row_lands_after_source() {
        let mut grid = grid_of(&[("a", 0, 0, 50.0), ("b", 0, 1, 50.0)]);
        let copy = grid.duplicate_field(&id("a")).expect("duplicate");
        assert_eq!(copy.column_index(), 1);
        assert_eq!(ids(&grid, 0), vec!["a", copy.id().as_str(), "b"]);
        assert_eq!(widths(&grid, 0), vec![33.3, 33.3, 33.4]);
    }

    #[test]
    fn duplicate_in_full_row_opens_row_below() {
        let mut grid = grid_of(&[
            ("a", 0, 0, 20.0),
            ("b", 0, 1, 20.0),
            ("c", 0, 2, 20.0),
            ("d", 0, 3, 20.0),
            ("e", 0, 4, 20.0),
        ]);
        let copy = grid.duplicate_field(&id("c")).expect("duplicate");
        assert_eq!(copy.row_index(), 1);
        assert_eq!(grid.row(0).expect("row 0").len(), 5);
    }

    #[test]
    fn row_operations_keep_widths() {
        let mut grid = grid_of(&[
            ("a", 0, 0, 30.0),
            ("b", 0, 1, 70.0),
            ("c", 1, 0, 100.0),
            ("d", 2, 0, 100.0),
        ]);
        grid.move_row(0, 2).expect("move row");
        assert_eq!(ids(&grid, 2), vec!["a", "b"]);
        assert_eq!(widths(&grid, 2), vec![30.0, 70.0]);

        let copy = grid.duplicate_row(2).expect("duplicate row");
        assert_eq!(copy.index, 3);
        assert_eq!(copy.widths(), vec![30.0, 70.0]);
        assert!(copy.ids().iter().all(|new| new != &id("a") && new != &id("b")));

        let removed = grid.delete_row(0).expect("delete row");
        assert_eq!(removed.ids(), vec![id("c")]);
        assert_eq!(grid.row_count(), 3);
        assert_clean(&grid);
    }

    #[test]
    fn row_reference_errors_leave_grid_untouched() {
        let mut grid = grid_of(&[("a", 0, 0, 100.0)]);
        let before = grid.clone();
        assert!(grid.move_row(0, 1).is_err());
        assert!(grid.duplicate_row(1).is_err());
        assert!(grid.delete_row(3).is_err());
        assert!(grid.normalize_row(1).is_err());
        assert_eq!(grid, before);
    }

    #[test]
    fn set_widths_clamps_and_normalizes_touched_rows() {
        let mut grid = grid_of(&[("a", 0, 0, 50.0), ("b", 0, 1, 50.0), ("c", 1, 0, 60.0)]);
        grid.set_widths(&[FieldWidth::new("a", 70.0), FieldWidth::new("b", 33.0)])
            .expect("set");
        let w = widths(&grid, 0);
        assert!((w.iter().sum::<f64>() - 100.0).abs() < 1e-9, "{w:?}");
        grid.set_widths(&[FieldWidth::new("c", 5.0)]).expect("set");
        assert_eq!(widths(&grid, 1), vec![MIN_WIDTH]);

        let before = grid.clone();
        assert!(grid
            .set_widths(&[FieldWidth::new("a", 40.0), FieldWidth::new("zz", 40.0)])
            .is_err());
        assert_eq!(grid, before);
    }

    #[test]
    fn layout_hash_tracks_widths_not_payloads() {
        let mut grid = grid_of(&[("a", 0, 0, 50.0), ("b", 0, 1, 50.0)]);
        let before = grid.layout_hash();
        let _ = grid
            .payload_mut(&id("a"))
            .expect("a")
            .insert("label".to_string(), json!("Name"));
        assert_eq!(grid.layout_hash(), before);
        let _ = grid.resize_field(&id("a"), 30.0).expect("resize");
        assert_ne!(grid.layout_hash(), before);
    }

    #[test]
    fn grid_serializes_as_records() {
        let grid = grid_of(&[("a", 0, 0, 40.0), ("b", 0, 1, 60.0)]);
        let json = serde_json::to_value(&grid).expect("serialize");
        assert_eq!(json[1]["id"], json!("b"));
        assert_eq!(json[1]["columnIndex"], json!(1));
        let back: Grid = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.to_records(), grid.to_records());
    }

    #[test]
    fn prefixed_allocator_skips_taken_ids() {
        let mut grid = grid_of(&[("form_1", 0, 0, 100.0)])
            .with_id_allocator(FieldIdAllocator::with_prefix("form_"));
        let added = grid
            .add_field_in_new_row(Payload::new(), 1)
            .expect("append row");
        assert_eq!(added.id(), &id("form_2"));
        let next = grid
            .add_field_in_new_row(Payload::new(), 0)
            .expect("prepend row");
        assert_eq!(next.id(), &id("form_3"));
        assert_eq!(ids(&grid, 0), vec!["form_3"]);
    }
}
