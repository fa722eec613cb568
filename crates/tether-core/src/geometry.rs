use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with a top-left origin (screen coordinates, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on `center`.
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    /// Square of side `2 * half_extent` centred on `center`.
    pub fn square(center: Vec2, half_extent: f32) -> Self {
        Self::from_center(center, half_extent * 2.0, half_extent * 2.0)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap test: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Play-field bounds; positions are clamped inside them with an inset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamp `pos` so a body with the given half extent stays fully on screen.
    pub fn clamp_inset(&self, pos: Vec2, inset: f32) -> Vec2 {
        // Degenerate fields (inset larger than half the screen) pin to the centre.
        let max_x = (self.width - inset).max(inset);
        let max_y = (self.height - inset).max(inset);
        Vec2::new(pos.x.clamp(inset, max_x), pos.y.clamp(inset, max_y))
    }
}
