use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::player::PlayerSlot;

/// Keys the simulation cares about. Window-level key codes are mapped onto
/// these by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InputKey {
    W,
    A,
    S,
    D,
    F,
    R,
    Up,
    Down,
    Left,
    Right,
    Period,
}

/// Keys held down during one frame.
///
/// Sampled once per frame; every reader (both characters, box pushing,
/// revival) consults the same snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pressed: BTreeSet<InputKey>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = InputKey>) -> Self {
        Self {
            pressed: keys.into_iter().collect(),
        }
    }

    pub fn press(&mut self, key: InputKey) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: InputKey) {
        self.pressed.remove(&key);
    }

    pub fn is_pressed(&self, key: InputKey) -> bool {
        self.pressed.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}

/// Directional and revive keys bound to one character for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlBindings {
    pub up: InputKey,
    pub down: InputKey,
    pub left: InputKey,
    pub right: InputKey,
    pub revive: InputKey,
}

impl ControlBindings {
    /// WASD + F.
    pub const PLAYER_ONE: ControlBindings = ControlBindings {
        up: InputKey::W,
        down: InputKey::S,
        left: InputKey::A,
        right: InputKey::D,
        revive: InputKey::F,
    };

    /// Arrow keys + period.
    pub const PLAYER_TWO: ControlBindings = ControlBindings {
        up: InputKey::Up,
        down: InputKey::Down,
        left: InputKey::Left,
        right: InputKey::Right,
        revive: InputKey::Period,
    };

    pub fn for_slot(slot: PlayerSlot) -> Self {
        match slot {
            PlayerSlot::One => Self::PLAYER_ONE,
            PlayerSlot::Two => Self::PLAYER_TWO,
        }
    }

    /// Bindings with up/down and left/right swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            up: self.down,
            down: self.up,
            left: self.right,
            right: self.left,
            revive: self.revive,
        }
    }

    /// Raw direction from the held keys (y grows downward). Opposing keys
    /// cancel; the result is not normalized.
    pub fn direction(&self, input: &InputSnapshot) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if input.is_pressed(self.up) {
            dir.y -= 1.0;
        }
        if input.is_pressed(self.down) {
            dir.y += 1.0;
        }
        if input.is_pressed(self.left) {
            dir.x -= 1.0;
        }
        if input.is_pressed(self.right) {
            dir.x += 1.0;
        }
        dir
    }
}
