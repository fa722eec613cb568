use serde::{Deserialize, Serialize};

use tether_core::input::InputSnapshot;
use tether_core::player::PlayerSlot;

use crate::character::Character;

/// Hold-to-revive progress for whichever character is down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevivalState {
    /// Seconds the revive key has been held under valid conditions.
    pub hold_progress: f32,
    /// The dead character currently being revived, if any.
    pub target: Option<PlayerSlot>,
}

impl RevivalState {
    pub fn reset(&mut self) {
        self.hold_progress = 0.0;
        self.target = None;
    }

    /// Fraction of the hold completed, for the progress bar.
    pub fn fraction(&self, hold_time: f32) -> f32 {
        if hold_time <= 0.0 {
            return 0.0;
        }
        (self.hold_progress / hold_time).clamp(0.0, 1.0)
    }

    /// Advance one frame. Returns the slot that came back to life.
    ///
    /// Progress accumulates only while exactly one character is alive, it is
    /// within `radius` of the body, and it holds its revive key. Any frame
    /// where that fails drops progress to zero.
    pub fn update(
        &mut self,
        characters: &mut [Character; 2],
        input: &InputSnapshot,
        dt: f32,
        radius: f32,
        hold_time: f32,
    ) -> Option<PlayerSlot> {
        let Some((reviver, dead)) = Self::candidate(characters, input, radius) else {
            self.reset();
            return None;
        };

        let dead_slot = characters[dead].slot;
        if self.target != Some(dead_slot) {
            self.hold_progress = 0.0;
            self.target = Some(dead_slot);
        }
        self.hold_progress += dt;
        if self.hold_progress < hold_time {
            return None;
        }

        self.reset();
        if characters[dead].revive() {
            tracing::debug!(
                revived = %dead_slot,
                by = %characters[reviver].slot,
                "character revived"
            );
            Some(dead_slot)
        } else {
            None
        }
    }

    /// Indices of (reviver, dead) when every precondition holds this frame.
    fn candidate(
        characters: &[Character; 2],
        input: &InputSnapshot,
        radius: f32,
    ) -> Option<(usize, usize)> {
        let (reviver, dead) = match (characters[0].is_alive, characters[1].is_alive) {
            (true, false) => (0, 1),
            (false, true) => (1, 0),
            _ => return None,
        };
        let body = characters[dead].death_position?;
        let living = &characters[reviver];
        if !input.is_pressed(living.bindings.revive) {
            return None;
        }
        if living.position.distance(body) > radius {
            return None;
        }
        Some((reviver, dead))
    }
}
