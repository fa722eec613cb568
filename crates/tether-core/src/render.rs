//! Render boundary.
//!
//! The simulation never draws. It exposes a rectangle and a discrete visual
//! state per entity; the platform layer owns sprites, fonts and pixels.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::player::PlayerSlot;

/// Animation track a character is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    Idle,
    Walk,
}

/// Discrete visual state handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VisualState {
    /// Living character with its current animation frame.
    Alive {
        facing_left: bool,
        animation: AnimationKind,
        frame: usize,
    },
    /// Dead character body; `shake` is a cosmetic pixel offset.
    Dead { shake: (f32, f32) },
    /// Hazard that kills on contact right now.
    Dangerous,
    /// Hazard that is currently harmless.
    Safe,
    /// Present but not drawn (e.g. walls under the invisibility effect).
    Hidden,
    /// Briefly visible again inside a hidden period.
    Flashing,
    /// Goal occupied, fruit available, warning counting down.
    Active { progress: f32 },
    Inactive,
}

/// Anything the renderer can place on screen.
pub trait Drawable {
    fn bounds(&self) -> Rect;
    fn visual_state(&self) -> VisualState;
}

/// External collaborator: the loaded frame set for a character.
///
/// Only frame counts cross the boundary; the images themselves stay with the
/// loader.
pub trait FrameSource {
    fn frame_count(&self, slot: PlayerSlot, animation: AnimationKind) -> usize;
}

/// Frame counts of the stock character sheets (knight for P1, witch for P2).
#[derive(Debug, Clone, Copy, Default)]
pub struct StockFrames;

impl FrameSource for StockFrames {
    fn frame_count(&self, slot: PlayerSlot, animation: AnimationKind) -> usize {
        match (slot, animation) {
            (PlayerSlot::One, AnimationKind::Walk) => 8,
            (PlayerSlot::One, AnimationKind::Idle) => 7,
            (PlayerSlot::Two, AnimationKind::Walk) => 8,
            (PlayerSlot::Two, AnimationKind::Idle) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_frames_are_non_empty() {
        for slot in PlayerSlot::ALL {
            for anim in [AnimationKind::Idle, AnimationKind::Walk] {
                assert!(StockFrames.frame_count(slot, anim) > 0);
            }
        }
    }
}
