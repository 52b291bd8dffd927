//! Fixed geometric limits of the form grid.
//!
//! These are not runtime-configurable: persisted forms from every host must
//! agree on them.

/// Smallest width (percent of the row) a placed field may have.
pub const MIN_WIDTH: f64 = 20.0;

/// Largest width (percent of the row) a placed field may have.
pub const MAX_WIDTH: f64 = 100.0;

/// Maximum number of fields sharing one row.
pub const MAX_FIELDS_PER_ROW: usize = 5;

/// Lower edge of the near-full band, inclusive.
pub const NORMALIZE_BAND_LOW: f64 = 95.0;

/// Upper edge of the near-full band, inclusive.
pub const NORMALIZE_BAND_HIGH: f64 = 105.0;

/// Number of decimals widths are rounded to.
pub const WIDTH_DECIMALS: i32 = 1;

/// Floor used by proportional redistribution before final normalization.
pub const PROPORTIONAL_MIN_WIDTH: f64 = 10.0;

/// Tolerance when comparing a normalized row total against 100.
pub const WIDTH_TOLERANCE: f64 = 0.01;
