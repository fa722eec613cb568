use glam::Vec2;
use serde::{Deserialize, Serialize};

use tether_core::geometry::Rect;
use tether_core::render::{Drawable, VisualState};

use crate::config::HazardConfig;
use crate::entities::CoopBox;

/// Static laser wall. Kills characters on contact unless the walls are
/// currently invisible; boxes always treat it as solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserWall {
    pub rect: Rect,
}

impl LaserWall {
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }
}

/// How walls look this frame, derived from the invisibility effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallVisibility {
    Visible,
    Hidden,
    Flashing,
}

/// A wall paired with this frame's visibility, for drawing.
pub struct WallView<'a> {
    pub wall: &'a LaserWall,
    pub visibility: WallVisibility,
}

impl Drawable for WallView<'_> {
    fn bounds(&self) -> Rect {
        self.wall.rect
    }

    fn visual_state(&self) -> VisualState {
        match self.visibility {
            WallVisibility::Visible => VisualState::Dangerous,
            WallVisibility::Hidden => VisualState::Hidden,
            WallVisibility::Flashing => VisualState::Flashing,
        }
    }
}

/// Retractable spike trap on a fixed out/in cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeTrap {
    pub rect: Rect,
    /// Seconds the spikes stay out (dangerous) per cycle.
    pub out_time: f32,
    /// Seconds the spikes stay retracted per cycle.
    pub in_time: f32,
    /// Initial displacement into the cycle.
    pub phase_offset: f32,
    elapsed: f32,
}

impl SpikeTrap {
    pub fn new(rect: Rect, out_time: f32, in_time: f32, phase_offset: f32) -> Self {
        Self {
            rect,
            out_time,
            in_time,
            phase_offset,
            elapsed: 0.0,
        }
    }

    pub fn cycle_time(&self) -> f32 {
        self.out_time + self.in_time
    }

    /// Danger state at an arbitrary accumulated time.
    pub fn is_dangerous_at(&self, elapsed: f32) -> bool {
        let cycle = self.cycle_time();
        if cycle <= 0.0 {
            return false;
        }
        (elapsed + self.phase_offset).rem_euclid(cycle) < self.out_time
    }

    pub fn is_dangerous(&self) -> bool {
        self.is_dangerous_at(self.elapsed)
    }

    pub fn tick(&mut self, dt: f32) {
        let cycle = self.cycle_time();
        self.elapsed += dt;
        // Wrap to keep precision over long sessions; the phase is unchanged.
        if cycle > 0.0 && self.elapsed >= cycle {
            self.elapsed = self.elapsed.rem_euclid(cycle);
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

impl Drawable for SpikeTrap {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn visual_state(&self) -> VisualState {
        if self.is_dangerous() {
            VisualState::Dangerous
        } else {
            VisualState::Safe
        }
    }
}

/// Marker for an incoming meteor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub id: u32,
    pub center: Vec2,
    pub size: f32,
    pub duration: f32,
    pub remaining: f32,
}

impl Drawable for Warning {
    fn bounds(&self) -> Rect {
        Rect::from_center(self.center, self.size, self.size)
    }

    fn visual_state(&self) -> VisualState {
        let progress = if self.duration > 0.0 {
            (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        VisualState::Active { progress }
    }
}

/// A landed meteor. Kills any character it overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meteor {
    pub id: u32,
    pub center: Vec2,
    pub size: f32,
    pub remaining: f32,
}

impl Meteor {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.center, self.size, self.size)
    }
}

impl Drawable for Meteor {
    fn bounds(&self) -> Rect {
        self.rect()
    }

    fn visual_state(&self) -> VisualState {
        VisualState::Dangerous
    }
}

/// Lifecycle changes reported by [`TransientHazards::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardEvent {
    /// A warning ran out and became a meteor with the same id and location.
    MeteorLanded { id: u32, center: Vec2 },
    /// A meteor reached the end of its lifetime.
    MeteorFaded { id: u32 },
}

/// Warnings and meteors spawned by the volcano effect.
///
/// Each spawn walks `Warning -> Meteor -> removed`; instances are never
/// reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransientHazards {
    pub warnings: Vec<Warning>,
    pub meteors: Vec<Meteor>,
    next_id: u32,
}

impl TransientHazards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
        self.meteors.clear();
    }

    /// Place a warning at `center`; returns its id.
    pub fn spawn_warning(&mut self, center: Vec2, config: &HazardConfig) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.warnings.push(Warning {
            id,
            center,
            size: config.meteor_size,
            duration: config.warning_duration,
            remaining: config.warning_duration,
        });
        id
    }

    /// Remove a meteor that struck a character.
    pub fn remove_meteor(&mut self, id: u32) -> bool {
        let before = self.meteors.len();
        self.meteors.retain(|m| m.id != id);
        self.meteors.len() != before
    }

    /// Advance lifetimes: expired meteors fade, expired warnings land.
    pub fn tick(&mut self, dt: f32, config: &HazardConfig) -> Vec<HazardEvent> {
        let mut events = Vec::new();

        self.meteors.retain_mut(|m| {
            if !m.center.is_finite() {
                tracing::warn!(id = m.id, "dropping meteor with non-finite position");
                return false;
            }
            m.remaining -= dt;
            if m.remaining <= 0.0 {
                events.push(HazardEvent::MeteorFaded { id: m.id });
                false
            } else {
                true
            }
        });

        let mut landed = Vec::new();
        self.warnings.retain_mut(|w| {
            if !w.center.is_finite() {
                tracing::warn!(id = w.id, "dropping warning with non-finite position");
                return false;
            }
            w.remaining -= dt;
            if w.remaining <= 0.0 {
                landed.push(Meteor {
                    id: w.id,
                    center: w.center,
                    size: w.size,
                    remaining: config.meteor_lifetime,
                });
                false
            } else {
                true
            }
        });
        for meteor in landed {
            events.push(HazardEvent::MeteorLanded {
                id: meteor.id,
                center: meteor.center,
            });
            self.meteors.push(meteor);
        }

        events
    }
}

/// Everything a character's movement is resolved against in one frame.
#[derive(Debug, Clone, Copy)]
pub struct HazardView<'a> {
    pub walls: &'a [LaserWall],
    pub boxes: &'a [CoopBox],
    pub spikes: &'a [SpikeTrap],
    pub meteors: &'a [Meteor],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike(out_time: f32, in_time: f32, phase_offset: f32) -> SpikeTrap {
        SpikeTrap::new(
            Rect::new(0.0, 0.0, 40.0, 40.0),
            out_time,
            in_time,
            phase_offset,
        )
    }

    #[test]
    fn spike_cycle_scenario() {
        let mut trap = spike(1.0, 2.0, 0.0);
        trap.tick(0.5);
        assert!(trap.is_dangerous(), "out at t=0.5");
        trap.tick(1.0);
        assert!(!trap.is_dangerous(), "retracted at t=1.5");
        trap.tick(1.5);
        assert!(trap.is_dangerous(), "out again one cycle later at t=3.0");
    }

    #[test]
    fn spike_phase_offset_staggers_cycle() {
        let trap = spike(1.0, 2.0, 1.0);
        assert!(!trap.is_dangerous_at(0.5));
        assert!(trap.is_dangerous_at(2.5));
    }

    #[test]
    fn spike_is_pure_function_of_time() {
        let mut stepped = spike(0.7, 1.3, 0.4);
        for _ in 0..137 {
            stepped.tick(0.05);
        }
        let direct = spike(0.7, 1.3, 0.4);
        assert_eq!(stepped.is_dangerous(), direct.is_dangerous_at(137.0 * 0.05));
    }

    #[test]
    fn degenerate_spike_is_never_dangerous() {
        let trap = spike(0.0, 0.0, 0.0);
        assert!(!trap.is_dangerous_at(1.0));
    }

    #[test]
    fn spike_visual_state_follows_danger() {
        let mut trap = spike(1.0, 1.0, 0.0);
        assert_eq!(trap.visual_state(), VisualState::Dangerous);
        trap.tick(1.5);
        assert_eq!(trap.visual_state(), VisualState::Safe);
    }

    #[test]
    fn warning_turns_into_meteor_at_same_spot() {
        let config = HazardConfig::default();
        let mut hazards = TransientHazards::new();
        let id = hazards.spawn_warning(Vec2::new(200.0, 150.0), &config);

        let events = hazards.tick(config.warning_duration - 0.1, &config);
        assert!(events.is_empty());
        assert_eq!(hazards.warnings.len(), 1);

        let events = hazards.tick(0.2, &config);
        assert_eq!(
            events,
            vec![HazardEvent::MeteorLanded {
                id,
                center: Vec2::new(200.0, 150.0)
            }]
        );
        assert!(hazards.warnings.is_empty());
        assert_eq!(hazards.meteors.len(), 1);
        assert_eq!(hazards.meteors[0].center, Vec2::new(200.0, 150.0));
    }

    #[test]
    fn meteor_fades_after_lifetime() {
        let config = HazardConfig::default();
        let mut hazards = TransientHazards::new();
        let id = hazards.spawn_warning(Vec2::new(10.0, 10.0), &config);
        hazards.tick(config.warning_duration, &config);
        assert_eq!(hazards.meteors.len(), 1);

        let events = hazards.tick(config.meteor_lifetime, &config);
        assert_eq!(events, vec![HazardEvent::MeteorFaded { id }]);
        assert!(hazards.meteors.is_empty());
    }

    #[test]
    fn struck_meteor_is_removed() {
        let config = HazardConfig::default();
        let mut hazards = TransientHazards::new();
        let id = hazards.spawn_warning(Vec2::new(10.0, 10.0), &config);
        hazards.tick(config.warning_duration, &config);
        assert!(hazards.remove_meteor(id));
        assert!(!hazards.remove_meteor(id));
    }

    #[test]
    fn non_finite_hazards_are_dropped() {
        let config = HazardConfig::default();
        let mut hazards = TransientHazards::new();
        hazards.spawn_warning(Vec2::new(f32::NAN, 0.0), &config);
        hazards.spawn_warning(Vec2::new(5.0, 5.0), &config);
        hazards.tick(0.01, &config);
        assert_eq!(hazards.warnings.len(), 1);
    }

    #[test]
    fn wall_view_reports_visibility() {
        let wall = LaserWall::new(Rect::new(0.0, 0.0, 10.0, 100.0));
        let view = WallView {
            wall: &wall,
            visibility: WallVisibility::Hidden,
        };
        assert_eq!(view.visual_state(), VisualState::Hidden);
        assert_eq!(view.bounds(), wall.rect);
    }
}
