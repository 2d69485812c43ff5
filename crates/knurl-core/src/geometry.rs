#![forbid(unsafe_code)]

//! Geometric primitives for hit testing and drag-delta math.

/// A rectangle in screen cells (0-indexed, origin at top-left).
///
/// Widget bounds and hit-test regions use this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Center point of the rectangle.
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(
            self.x as i32 + self.width as i32 / 2,
            self.y as i32 + self.height as i32 / 2,
        )
    }
}

/// A signed screen position or delta.
///
/// Mouse positions arrive as `u16` cells but drag math needs signed
/// differences, so everything downstream of the event layer works in `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert from unsigned cell coordinates.
    #[inline]
    #[must_use]
    pub const fn from_cells(x: u16, y: u16) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }

    /// Component-wise difference `self - other`.
    #[inline]
    #[must_use]
    pub const fn delta(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise sum.
    #[inline]
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to another point.
    #[must_use]
    pub const fn manhattan_distance(&self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance (max of per-axis distances) to another point.
    ///
    /// Drag-lock thresholds use this so diagonal motion trips the lock at
    /// the same travel as axis-aligned motion.
    #[must_use]
    pub const fn chebyshev_distance(&self, other: Point) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Euclidean length of this point treated as a vector.
    #[must_use]
    pub fn length(&self) -> f32 {
        let x = self.x as f32;
        let y = self.y as f32;
        (x * x + y * y).sqrt()
    }
}

/// Fraction of a delta's length that lies along the vertical axis.
///
/// Equivalent to the dot product of the normalized delta with the unit
/// vertical axis. Returns 0.0 for a zero delta. A value ≥ 0.75 means the
/// motion is within roughly 41° of straight up/down.
#[must_use]
pub fn vertical_dominance(delta: Point) -> f32 {
    let len = delta.length();
    if len == 0.0 {
        return 0.0;
    }
    delta.y.abs() as f32 / len
}
