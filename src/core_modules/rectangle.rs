// THEORY:
// `Rectangle` is the engine's geometric vocabulary: scan regions, exclusion
// zones, growing candidates and finished results are all axis-aligned boxes in
// screen pixel coordinates, half-open on the right and bottom edges.
//
// The 16:9 constraint lives here too. Width is always derived from height as
// `round(height * 16 / 9)` using integer arithmetic, so every rectangle the
// growth engine produces satisfies the ratio to within half a pixel of width,
// and the inverse (`height_for_width`) answers "how tall may a rectangle be if
// its width must fit in N pixels".

use serde::Serialize;

pub const ASPECT_WIDTH: u32 = 16;
pub const ASPECT_HEIGHT: u32 = 9;

/// A point in screen pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// An axis-aligned rectangle covering `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge, pinned at `u32::MAX` for boxes reaching past it.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn contains(&self, other: &Rectangle) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// The overlapping area of two rectangles. Touching edges overlap by zero.
    pub fn intersection_area(&self, other: &Rectangle) -> u64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return 0;
        }
        (right - left) as u64 * (bottom - top) as u64
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.intersection_area(other) > 0
    }

    /// The overlapping rectangle, if the overlap has non-zero area.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rectangle::new(left, top, right - left, bottom - top))
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2,
            y: self.y + self.height / 2,
        }
    }
}

/// Width of a 16:9 rectangle of the given height, rounded to the nearest pixel.
#[inline]
pub fn width_for_height(height: u32) -> u32 {
    ((height as u64 * ASPECT_WIDTH as u64 + ASPECT_HEIGHT as u64 / 2) / ASPECT_HEIGHT as u64) as u32
}

/// Largest height whose 16:9 width still fits in `width`.
#[inline]
pub fn height_for_width(width: u32) -> u32 {
    ((width as u64 * ASPECT_HEIGHT as u64 + ASPECT_HEIGHT as u64 / 2) / ASPECT_WIDTH as u64) as u32
}
