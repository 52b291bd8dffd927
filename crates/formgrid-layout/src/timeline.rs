//! Undo/redo by deterministic replay.
//!
//! The timeline keeps a baseline grid and the applied operations in order.
//! Undo and redo move a cursor and rebuild the grid by replaying the baseline
//! plus the entries before the cursor.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::grid::Grid;
use crate::operation::{GridOperation, OperationOutcome};

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub sequence: u64,
    pub operation: GridOperation,
    pub before_hash: u64,
    pub after_hash: u64,
}

/// Replay failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("timeline baseline is not set")]
    MissingBaseline,
    #[error("replay of entry {sequence} failed: {source}")]
    ReplayFailed {
        sequence: u64,
        #[source]
        source: GridError,
    },
    #[error("replay of entry {sequence} diverged (expected hash {expected:#x}, got {actual:#x})")]
    Diverged {
        sequence: u64,
        expected: u64,
        actual: u64,
    },
}

/// Operation history for one grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridTimeline {
    baseline: Option<Grid>,
    entries: Vec<TimelineEntry>,
    cursor: usize,
    next_sequence: u64,
}

impl GridTimeline {
    /// Timeline starting from `grid`.
    #[must_use]
    pub fn with_baseline(grid: &Grid) -> Self {
        Self {
            baseline: Some(grid.clone()),
            ..Self::default()
        }
    }

    /// Number of currently applied entries.
    #[must_use]
    pub const fn applied_len(&self) -> usize {
        self.cursor
    }

    /// Recorded entries, including undone ones not yet overwritten.
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Apply `operation` to `grid` and record it if it was applied.
    ///
    /// After an undo, recording a new entry drops the redo branch. Rejected
    /// operations are not recorded.
    pub fn apply_and_record(
        &mut self,
        grid: &mut Grid,
        operation: GridOperation,
    ) -> Result<OperationOutcome, GridError> {
        if self.baseline.is_none() {
            self.baseline = Some(grid.clone());
        }
        let outcome = grid.apply_operation(&operation)?;
        if !outcome.is_applied() {
            return Ok(outcome);
        }
        self.entries.truncate(self.cursor);
        self.entries.push(TimelineEntry {
            sequence: self.next_sequence,
            operation,
            before_hash: outcome.before_hash,
            after_hash: outcome.after_hash,
        });
        self.next_sequence += 1;
        self.cursor = self.entries.len();
        Ok(outcome)
    }

    /// Undo the last applied entry. Returns `false` if there is none.
    pub fn undo(&mut self, grid: &mut Grid) -> Result<bool, TimelineError> {
        if self.cursor == 0 {
            return Ok(false);
        }
        *grid = self.replay_to(self.cursor - 1)?;
        self.cursor -= 1;
        formgrid_core::debug!(applied = self.cursor, "timeline undo");
        Ok(true)
    }

    /// Redo the next undone entry. Returns `false` if there is none.
    pub fn redo(&mut self, grid: &mut Grid) -> Result<bool, TimelineError> {
        if self.cursor >= self.entries.len() {
            return Ok(false);
        }
        *grid = self.replay_to(self.cursor + 1)?;
        self.cursor += 1;
        formgrid_core::debug!(applied = self.cursor, "timeline redo");
        Ok(true)
    }

    /// Rebuild the grid from the baseline and the applied entries, checking
    /// each step against its recorded hash.
    pub fn replay(&self) -> Result<Grid, TimelineError> {
        self.replay_to(self.cursor)
    }

    /// Replay the first `applied` entries.
    fn replay_to(&self, applied: usize) -> Result<Grid, TimelineError> {
        let mut grid = self
            .baseline
            .clone()
            .ok_or(TimelineError::MissingBaseline)?;
        for entry in self.entries.iter().take(applied) {
            let outcome =
                grid.apply_operation(&entry.operation)
                    .map_err(|source| TimelineError::ReplayFailed {
                        sequence: entry.sequence,
                        source,
                    })?;
            if outcome.after_hash != entry.after_hash {
                return Err(TimelineError::Diverged {
                    sequence: entry.sequence,
                    expected: entry.after_hash,
                    actual: outcome.after_hash,
                });
            }
        }
        Ok(grid)
    }
}
