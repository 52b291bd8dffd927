//! Width arithmetic for one row.
//!
//! Every function here is pure and works on a row's widths in column order.
//! Rounding is to [`WIDTH_DECIMALS`] decimals; when a row is normalized, the
//! last column absorbs whatever rounding residue is left so the row sums to
//! exactly 100.

use crate::limits::{
    MAX_FIELDS_PER_ROW, MAX_WIDTH, MIN_WIDTH, NORMALIZE_BAND_HIGH, NORMALIZE_BAND_LOW,
    PROPORTIONAL_MIN_WIDTH, WIDTH_DECIMALS,
};

/// Full row total.
const FULL_ROW: f64 = 100.0;

/// Float slack for exact comparisons against band edges and the full total.
const EPSILON: f64 = 1e-9;

/// Round a width to the fixed number of decimals.
#[must_use]
pub fn round_width(width: f64) -> f64 {
    let scale = 10f64.powi(WIDTH_DECIMALS);
    (width * scale).round() / scale
}

/// Default width for each of `count` fields sharing a row.
#[must_use]
pub fn auto_width(count: usize) -> f64 {
    match count {
        0 | 1 => MAX_WIDTH,
        n if n >= MAX_FIELDS_PER_ROW => MIN_WIDTH,
        n => round_width(FULL_ROW / n as f64),
    }
}

/// Give every field the same [`auto_width`].
///
/// The result is not normalized: three fields come back as `33.3` each.
#[must_use]
pub fn distribute_evenly(widths: &[f64]) -> Vec<f64> {
    vec![auto_width(widths.len()); widths.len()]
}

/// Scale existing widths to leave room for `incoming` new fields.
///
/// Each new field is meant to get `auto_width(existing + incoming)`; the
/// existing fields share what remains in proportion to their current widths.
/// Results are clamped to `[PROPORTIONAL_MIN_WIDTH, MAX_WIDTH]`, a looser
/// floor than [`MIN_WIDTH`] because callers settle the row afterwards.
#[must_use]
pub fn distribute_proportionally(existing: &[f64], incoming: usize) -> Vec<f64> {
    let new_width = auto_width(existing.len() + incoming);
    let remaining = (FULL_ROW - new_width * incoming as f64).max(0.0);
    let existing_total: f64 = existing.iter().sum();
    if existing_total <= EPSILON {
        let share = remaining / existing.len().max(1) as f64;
        return vec![share.clamp(PROPORTIONAL_MIN_WIDTH, MAX_WIDTH); existing.len()];
    }
    let factor = remaining / existing_total;
    existing
        .iter()
        .map(|width| (width * factor).clamp(PROPORTIONAL_MIN_WIDTH, MAX_WIDTH))
        .collect()
}

/// True if `total` lies in the near-full band (inclusive on both edges).
#[must_use]
pub fn is_near_full(total: f64) -> bool {
    total >= NORMALIZE_BAND_LOW - EPSILON && total <= NORMALIZE_BAND_HIGH + EPSILON
}

/// Normalize one row.
///
/// Near-full rows are brought to exactly 100: scaled down when over, padded
/// on the last column when under, then rounded with the residue folded into
/// the last column. Rows outside the band keep their intentional empty space
/// and are only rounded.
///
/// A row whose rounded total lands in the band counts as near-full too, so
/// normalizing twice gives the same result as normalizing once.
#[must_use]
pub fn normalize_row(widths: &[f64]) -> Vec<f64> {
    let total: f64 = widths.iter().sum();
    let rounded: Vec<f64> = widths.iter().copied().map(round_width).collect();
    if widths.is_empty() || !(is_near_full(total) || is_near_full(row_total(&rounded))) {
        return rounded;
    }
    fill_row(widths)
}

/// Clamp a row into `[MIN_WIDTH, MAX_WIDTH]` per field and normalize it.
///
/// Whether the row counts as near-full is decided on the widths as given, so
/// a near-full row whose clamping pushed it past the band is still brought
/// back to 100 instead of being left overflowing.
#[must_use]
pub fn settle_row(widths: &[f64]) -> Vec<f64> {
    let total: f64 = widths.iter().sum();
    let clamped: Vec<f64> = widths.iter().map(|w| clamp_width(*w)).collect();
    if widths.is_empty() {
        return clamped;
    }
    if is_near_full(total) {
        fill_row(&clamped)
    } else {
        normalize_row(&clamped)
    }
}

/// Clamp one width into `[MIN_WIDTH, MAX_WIDTH]`. Non-finite input maps to
/// [`MAX_WIDTH`].
#[must_use]
pub fn clamp_width(width: f64) -> f64 {
    if !width.is_finite() {
        return MAX_WIDTH;
    }
    width.clamp(MIN_WIDTH, MAX_WIDTH)
}

/// Largest width a field may take given the widths of the other fields in
/// its row.
#[must_use]
pub fn room_for(others_total: f64) -> f64 {
    (MAX_WIDTH - others_total).clamp(MIN_WIDTH, MAX_WIDTH)
}

/// Bring a row to exactly 100.
fn fill_row(widths: &[f64]) -> Vec<f64> {
    let total: f64 = widths.iter().sum();
    let mut out = if total > FULL_ROW + EPSILON {
        scale_down(widths, total)
    } else {
        widths.to_vec()
    };
    for width in &mut out {
        *width = round_width(*width);
    }
    absorb_residual(&mut out);
    out
}

/// Proportional shrink to 100.
///
/// Plain scaling is used unless it would drag a field that currently
/// satisfies the floor below [`MIN_WIDTH`]; then only the share above the
/// floor is scaled.
fn scale_down(widths: &[f64], total: f64) -> Vec<f64> {
    let factor = FULL_ROW / total;
    let scaled: Vec<f64> = widths.iter().map(|w| w * factor).collect();
    let any_below_floor = widths.iter().any(|w| *w < MIN_WIDTH);
    if any_below_floor || scaled.iter().all(|w| round_width(*w) >= MIN_WIDTH) {
        return scaled;
    }
    let floor_total = MIN_WIDTH * widths.len() as f64;
    let slack_total = total - floor_total;
    let target_slack = (FULL_ROW - floor_total).max(0.0);
    if slack_total <= EPSILON {
        return scaled;
    }
    widths
        .iter()
        .map(|w| MIN_WIDTH + (w - MIN_WIDTH) * target_slack / slack_total)
        .collect()
}

/// Fold rounding residue into the last column that can take it without
/// leaving `[MIN_WIDTH, MAX_WIDTH]`; falls back to the last column.
fn absorb_residual(widths: &mut [f64]) {
    let total: f64 = widths.iter().sum();
    let residual = FULL_ROW - total;
    if residual.abs() <= EPSILON {
        return;
    }
    let Some(last) = widths.len().checked_sub(1) else {
        return;
    };
    let target = (0..widths.len())
        .rev()
        .find(|&i| {
            let candidate = round_width(widths[i] + residual);
            (MIN_WIDTH..=MAX_WIDTH).contains(&candidate)
        })
        .unwrap_or(last);
    widths[target] = round_width(widths[target] + residual);
}

/// Sum of a row's widths.
#[must_use]
pub fn row_total(widths: &[f64]) -> f64 {
    widths.iter().sum()
}
