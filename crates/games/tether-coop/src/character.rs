use glam::Vec2;
use serde::{Deserialize, Serialize};

use tether_core::geometry::Rect;
use tether_core::input::{ControlBindings, InputSnapshot};
use tether_core::player::PlayerSlot;
use tether_core::render::{AnimationKind, Drawable, FrameSource, VisualState};

use crate::animation::{AnimationState, FrameCounts};
use crate::config::{CoopConfig, HazardConfig};
use crate::effects::EffectManager;
use crate::entities::CoopBox;
use crate::hazards::HazardView;

/// What killed a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    LaserWall,
    Spike,
    Meteor { id: u32 },
}

/// One of the two tethered characters.
///
/// `death_position` is `Some` exactly while the character is dead, and the
/// position is pinned to it for the whole time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub slot: PlayerSlot,
    pub position: Vec2,
    pub start_position: Vec2,
    pub death_position: Option<Vec2>,
    pub is_alive: bool,
    /// Sprite mirroring only.
    pub facing_left: bool,
    pub bindings: ControlBindings,
    pub half_extent: f32,
    pub animation: AnimationState,
    pub frames: FrameCounts,
}

impl Character {
    pub fn new(
        slot: PlayerSlot,
        start: Vec2,
        half_extent: f32,
        frames: &dyn FrameSource,
    ) -> Self {
        Self {
            slot,
            position: start,
            start_position: start,
            death_position: None,
            is_alive: true,
            facing_left: false,
            bindings: ControlBindings::for_slot(slot),
            half_extent,
            animation: AnimationState::default(),
            frames: FrameCounts {
                walk: frames.frame_count(slot, AnimationKind::Walk),
                idle: frames.frame_count(slot, AnimationKind::Idle),
            },
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::square(self.position, self.half_extent)
    }

    /// Chain anchor: live position, or the frozen body when dead.
    pub fn anchor(&self) -> Vec2 {
        self.death_position.unwrap_or(self.position)
    }

    /// Latch death at the current position.
    pub fn kill(&mut self, hazards: &HazardConfig) {
        if !self.is_alive {
            return;
        }
        self.is_alive = false;
        self.death_position = Some(self.position);
        self.animation.start_shake(hazards);
    }

    /// Bring the character back at its body. Returns false if it was alive.
    pub fn revive(&mut self) -> bool {
        if self.is_alive {
            return false;
        }
        if let Some(at) = self.death_position.take() {
            self.position = at;
        }
        self.is_alive = true;
        self.animation.reset();
        true
    }

    /// Level start: back to `start`, alive, no body.
    pub fn reset_to(&mut self, start: Vec2) {
        self.start_position = start;
        self.position = start;
        self.death_position = None;
        self.is_alive = true;
        self.facing_left = false;
        self.animation.reset();
    }

    /// Unit (or zero) movement direction after any active mirror remap.
    pub fn effective_direction(&self, input: &InputSnapshot, effects: &EffectManager) -> Vec2 {
        let bindings = if effects.is_mirror_active(self.slot) {
            self.bindings.mirrored()
        } else {
            self.bindings
        };
        bindings.direction(input).normalize_or_zero()
    }

    /// Resolve one frame of movement.
    ///
    /// Walls are checked per axis, boxes block per axis, then spikes and
    /// meteors are checked against the final rectangle. Any lethal overlap
    /// kills the character where it stood before the move. Returns the
    /// cause when this call killed it.
    pub fn update_movement(
        &mut self,
        hazards: &HazardView<'_>,
        effects: &EffectManager,
        input: &InputSnapshot,
        config: &CoopConfig,
        dt: f32,
    ) -> Option<DeathCause> {
        if !self.is_alive {
            if let Some(at) = self.death_position {
                self.position = at;
            }
            self.animation.tick_dead(dt);
            return None;
        }

        let raw = self.bindings.direction(input);
        if raw.x < 0.0 {
            self.facing_left = true;
        } else if raw.x > 0.0 {
            self.facing_left = false;
        }

        let mut step = self.effective_direction(input, effects) * config.physics.move_speed * dt;
        if !step.is_finite() {
            step = Vec2::ZERO;
        }
        let here = self.rect();

        if !effects.are_walls_invisible() {
            let moved_x = here.translated(Vec2::new(step.x, 0.0));
            let moved_y = here.translated(Vec2::new(0.0, step.y));
            let hit = hazards
                .walls
                .iter()
                .any(|w| moved_x.overlaps(&w.rect) || moved_y.overlaps(&w.rect));
            if hit {
                self.kill(&config.hazards);
                return Some(DeathCause::LaserWall);
            }
        }

        let moved_x = here.translated(Vec2::new(step.x, 0.0));
        if hazards
            .boxes
            .iter()
            .any(|b| blocks(b, &here, &moved_x, step.x, self.position.x - b.position.x))
        {
            step.x = 0.0;
        }
        let moved_y = here.translated(Vec2::new(0.0, step.y));
        if hazards
            .boxes
            .iter()
            .any(|b| blocks(b, &here, &moved_y, step.y, self.position.y - b.position.y))
        {
            step.y = 0.0;
        }

        let landed = here.translated(step);
        if hazards
            .spikes
            .iter()
            .any(|s| s.is_dangerous() && landed.overlaps(&s.rect))
        {
            self.kill(&config.hazards);
            return Some(DeathCause::Spike);
        }
        if let Some(meteor) = hazards.meteors.iter().find(|m| landed.overlaps(&m.rect())) {
            self.kill(&config.hazards);
            return Some(DeathCause::Meteor { id: meteor.id });
        }

        self.position = config
            .physics
            .bounds()
            .clamp_inset(self.position + step, self.half_extent);
        self.animation
            .tick_alive(dt, step != Vec2::ZERO, self.frames, &config.animation);
        None
    }
}

/// Whether `crate_box` stops a one-axis move from `here` to `moved`.
///
/// A character already inside the box (the chain can pull it there) may
/// still move away from the box centre along the axis, so it never sticks.
fn blocks(crate_box: &CoopBox, here: &Rect, moved: &Rect, step: f32, offset: f32) -> bool {
    let rect = crate_box.rect();
    if !moved.overlaps(&rect) {
        return false;
    }
    let escaping = here.overlaps(&rect) && step * offset > 0.0;
    !escaping
}

impl Drawable for Character {
    fn bounds(&self) -> Rect {
        self.rect()
    }

    fn visual_state(&self) -> VisualState {
        if self.is_alive {
            VisualState::Alive {
                facing_left: self.facing_left,
                animation: self.animation.kind,
                frame: self.animation.frame,
            }
        } else {
            VisualState::Dead {
                shake: self.animation.shake_offset(),
            }
        }
    }
}
