//! Errors and rejections.
//!
//! Two outcomes exist for a call that does not apply:
//!
//! - [`GridError`]: the caller referenced something that is not in the grid
//!   (or handed over malformed records). Nothing was mutated.
//! - [`Rejection`]: the request was well-formed but the geometry does not
//!   allow it (e.g. a sixth field in a row). Returned inside
//!   [`EditOutcome::Rejected`]; nothing was mutated.

use serde::{Deserialize, Serialize};

use crate::field::FieldId;

/// Coarse error classification surfaced to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A field id or row index that does not exist in the grid.
    InvalidReference,
    /// Records that cannot form a grid.
    InvalidInput,
    /// A call made in the wrong session state, e.g. a second gesture while
    /// one is active.
    PreconditionViolation,
}

/// Failure of a grid call. The grid is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("field {id} does not exist in the grid")]
    UnknownField { id: FieldId },
    #[error("row {row_index} does not exist (grid has {row_count} rows)")]
    UnknownRow { row_index: usize, row_count: usize },
    #[error("field id {id} appears more than once")]
    DuplicateFieldId { id: FieldId },
}

impl GridError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownField { .. } | Self::UnknownRow { .. } => ErrorKind::InvalidReference,
            Self::DuplicateFieldId { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// Invalid interaction tuning.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TuningError {
    #[error("{field} must be finite and within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl TuningError {
    /// Check `value` against an inclusive range.
    pub(crate) fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }
}

/// Why a well-formed request was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The target row already holds the maximum number of fields.
    #[error("row {row_index} already holds {capacity} fields")]
    CapacityExceeded { row_index: usize, capacity: usize },
    /// A drop target that does not apply to the dragged subject.
    #[error("drop target does not apply to the dragged subject")]
    IncompatibleTarget,
    /// Release without any drop target under the pointer.
    #[error("no drop target under the pointer")]
    NoDropTarget,
}

/// Result of a grid edit that may be declined without it being an error.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome<T> {
    Applied(T),
    Rejected(Rejection),
}

impl<T> EditOutcome<T> {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The applied value, if any.
    #[must_use]
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection, if any.
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Applied(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EditOutcome<U> {
        match self {
            Self::Applied(value) => EditOutcome::Applied(f(value)),
            Self::Rejected(reason) => EditOutcome::Rejected(reason),
        }
    }
}
