#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A pointer position in host coordinates (pixels, points, cells...).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box used for layout bounds and hit testing.
///
/// Origin at top-left; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Create a new box.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a box at the origin with the given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if the box has no area (or a non-finite extent).
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Check if a point is inside the box (right/bottom edges exclusive).
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Check if `y` falls within the vertical extent of the box.
    #[inline]
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.y && y < self.bottom()
    }

    /// Horizontal position of `point` relative to the box, clamped to `0..=1`.
    ///
    /// Degenerate boxes report the midpoint.
    pub fn fraction_x(&self, point: Point) -> f64 {
        if !(self.width.is_finite() && self.width > 0.0) {
            return 0.5;
        }
        ((point.x - self.x) / self.width).clamp(0.0, 1.0)
    }

    /// Vertical position of `point` relative to the box, clamped to `0..=1`.
    pub fn fraction_y(&self, point: Point) -> f64 {
        if !(self.height.is_finite() && self.height > 0.0) {
            return 0.5;
        }
        ((point.y - self.y) / self.height).clamp(0.0, 1.0)
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Bounds::new(x, y, right - x, bottom - y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contains_is_half_open() {
        let b = Bounds::new(10.0, 10.0, 20.0, 5.0);
        assert!(b.contains(Point::new(10.0, 10.0)));
        assert!(b.contains(Point::new(29.9, 14.9)));
        assert!(!b.contains(Point::new(30.0, 12.0)));
        assert!(!b.contains(Point::new(15.0, 15.0)));
    }

    #[test]
    fn fraction_of_degenerate_box_is_midpoint() {
        let b = Bounds::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(b.fraction_x(Point::new(3.0, 3.0)), 0.5);
        assert_eq!(b.fraction_y(Point::new(3.0, 3.0)), 0.5);
        assert!(b.is_empty());
    }

    #[test]
    fn union_covers_both() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, 20.0, 10.0, 5.0);
        assert_eq!(a.union(&b), Bounds::new(0.0, 0.0, 15.0, 25.0));
    }

    #[test]
    fn bounds_serde_round_trip() {
        let b = Bounds::new(1.5, 2.0, 30.0, 4.0);
        let json = serde_json::to_string(&b).expect("serialize");
        let back: Bounds = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, b);
    }

    proptest! {
        #[test]
        fn fraction_x_is_clamped(x in -1000.0f64..1000.0, width in 0.1f64..500.0) {
            let b = Bounds::new(0.0, 0.0, width, 10.0);
            let f = b.fraction_x(Point::new(x, 5.0));
            prop_assert!((0.0..=1.0).contains(&f));
        }
    }
}
