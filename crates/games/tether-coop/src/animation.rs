//! Sprite cadence and death shake.
//!
//! Nothing in here feeds back into physics: the shake is an offset the
//! renderer adds to the drawn body, never to `Character::position`.

use serde::{Deserialize, Serialize};

use tether_core::render::AnimationKind;

use crate::config::{AnimationConfig, HazardConfig};

/// Frame counts of one character's two animation tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounts {
    pub walk: usize,
    pub idle: usize,
}

impl FrameCounts {
    pub fn get(&self, kind: AnimationKind) -> usize {
        match kind {
            AnimationKind::Walk => self.walk,
            AnimationKind::Idle => self.idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub kind: AnimationKind,
    pub frame: usize,
    frame_timer: f32,
    shake_elapsed: f32,
    shake_duration: f32,
    shake_magnitude: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            kind: AnimationKind::Idle,
            frame: 0,
            frame_timer: 0.0,
            shake_elapsed: 0.0,
            shake_duration: 0.0,
            shake_magnitude: 0.0,
        }
    }
}

impl AnimationState {
    /// Advance the walk/idle cadence. Switching tracks restarts at frame 0.
    pub fn tick_alive(
        &mut self,
        dt: f32,
        moving: bool,
        frames: FrameCounts,
        config: &AnimationConfig,
    ) {
        let kind = if moving {
            AnimationKind::Walk
        } else {
            AnimationKind::Idle
        };
        if kind != self.kind {
            self.kind = kind;
            self.frame = 0;
            self.frame_timer = 0.0;
        }

        let frame_time = match kind {
            AnimationKind::Walk => config.walk_frame_time,
            AnimationKind::Idle => config.idle_frame_time,
        };
        let count = frames.get(kind).max(1);
        if frame_time <= 0.0 {
            return;
        }
        self.frame_timer += dt;
        while self.frame_timer >= frame_time {
            self.frame_timer -= frame_time;
            self.frame = (self.frame + 1) % count;
        }
    }

    pub fn start_shake(&mut self, config: &HazardConfig) {
        self.shake_elapsed = 0.0;
        self.shake_duration = config.death_shake_duration.max(0.0);
        self.shake_magnitude = config.death_shake_magnitude;
    }

    pub fn tick_dead(&mut self, dt: f32) {
        if self.shake_elapsed < self.shake_duration {
            self.shake_elapsed = (self.shake_elapsed + dt).min(self.shake_duration);
        }
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_elapsed < self.shake_duration
    }

    /// Current cosmetic offset; decays to exactly zero when the shake ends.
    pub fn shake_offset(&self) -> (f32, f32) {
        if !self.is_shaking() {
            return (0.0, 0.0);
        }
        let decay = 1.0 - self.shake_elapsed / self.shake_duration;
        let amplitude = self.shake_magnitude * decay;
        let t = self.shake_elapsed * 60.0;
        (amplitude * t.sin(), amplitude * (t * 1.3).cos())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
