//! Timed fruit effects.
//!
//! Three families run independently: per-player control mirroring, global
//! wall invisibility (with a recurring visible flash), and the volcano, which
//! schedules meteor warnings at random intervals.

use rand::Rng;
use serde::{Deserialize, Serialize};

use tether_core::effect::{self, ActiveEffect};
use tether_core::player::PlayerSlot;

use crate::config::EffectsConfig;

/// Effect granted by a fruit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    /// Inverts the collecting player's directional input on both axes.
    Mirror,
    /// Laser walls vanish and stop killing characters, except during flashes.
    InvisibleWall,
    /// Meteor warnings rain down at random locations.
    Volcano,
}

impl effect::EffectKind for EffectType {}

/// Countdown for an applied fruit effect.
pub type TimedEffect = ActiveEffect<EffectType>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InvisibleWallState {
    timer: TimedEffect,
    /// Time since the effect was first applied; drives the hidden/flash cycle.
    phase_elapsed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VolcanoState {
    timer: TimedEffect,
    /// Seconds until the next warning is due.
    spawn_cooldown: f32,
}

/// An effect that ran out during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiredEffect {
    pub effect: EffectType,
    /// Set for per-player effects.
    pub target: Option<PlayerSlot>,
}

/// Tracks every active fruit effect for the current level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectManager {
    config: EffectsConfig,
    mirror: [Option<TimedEffect>; 2],
    invisible_wall: Option<InvisibleWallState>,
    volcano: Option<VolcanoState>,
    meteor_pending: bool,
}

impl EffectManager {
    pub fn new(config: EffectsConfig) -> Self {
        Self {
            config,
            mirror: [None, None],
            invisible_wall: None,
            volcano: None,
            meteor_pending: false,
        }
    }

    /// Drop every effect (level load / restart).
    pub fn reset(&mut self) {
        self.mirror = [None, None];
        self.invisible_wall = None;
        self.volcano = None;
        self.meteor_pending = false;
    }

    /// Apply `effect`. Mirror targets `target`; the others are global.
    /// Re-applying an active effect restarts its duration instead of stacking.
    pub fn apply(&mut self, effect: EffectType, target: PlayerSlot, rng: &mut impl Rng) {
        let duration = self.config.duration;
        match effect {
            EffectType::Mirror => {
                let entry = &mut self.mirror[target.index()];
                if let Some(timer) = entry.as_mut() {
                    timer.refresh(duration);
                } else {
                    *entry = Some(TimedEffect::new(effect, duration));
                }
            },
            EffectType::InvisibleWall => {
                if let Some(state) = self.invisible_wall.as_mut() {
                    state.timer.refresh(duration);
                } else {
                    self.invisible_wall = Some(InvisibleWallState {
                        timer: TimedEffect::new(effect, duration),
                        phase_elapsed: 0.0,
                    });
                }
            },
            EffectType::Volcano => {
                if let Some(state) = self.volcano.as_mut() {
                    state.timer.refresh(duration);
                } else {
                    let spawn_cooldown = self.draw_interval(rng);
                    self.volcano = Some(VolcanoState {
                        timer: TimedEffect::new(effect, duration),
                        spawn_cooldown,
                    });
                }
            },
        }
    }

    /// Advance all timers by `dt`, returning the effects that ran out.
    pub fn tick(&mut self, dt: f32, rng: &mut impl Rng) -> Vec<ExpiredEffect> {
        let mut expired = Vec::new();

        for slot in PlayerSlot::ALL {
            let entry = &mut self.mirror[slot.index()];
            let ran_out = entry.as_mut().is_some_and(|timer| {
                timer.tick(dt);
                timer.is_expired()
            });
            if ran_out {
                *entry = None;
                expired.push(ExpiredEffect {
                    effect: EffectType::Mirror,
                    target: Some(slot),
                });
            }
        }

        let walls_ran_out = self.invisible_wall.as_mut().is_some_and(|state| {
            state.timer.tick(dt);
            state.phase_elapsed += dt;
            state.timer.is_expired()
        });
        if walls_ran_out {
            self.invisible_wall = None;
            expired.push(ExpiredEffect {
                effect: EffectType::InvisibleWall,
                target: None,
            });
        }

        let mut volcano_ran_out = false;
        let mut spawn_due = false;
        if let Some(state) = self.volcano.as_mut() {
            state.timer.tick(dt);
            if state.timer.is_expired() {
                volcano_ran_out = true;
            } else {
                state.spawn_cooldown -= dt;
                spawn_due = state.spawn_cooldown <= 0.0;
            }
        }
        if volcano_ran_out {
            self.volcano = None;
            self.meteor_pending = false;
            expired.push(ExpiredEffect {
                effect: EffectType::Volcano,
                target: None,
            });
        } else if spawn_due {
            // Next interval counts from this spawn, not from the schedule.
            let next = self.draw_interval(rng);
            if let Some(state) = self.volcano.as_mut() {
                state.spawn_cooldown = next;
            }
            self.meteor_pending = true;
        }

        expired
    }

    pub fn is_mirror_active(&self, slot: PlayerSlot) -> bool {
        self.mirror[slot.index()].is_some()
    }

    pub fn is_active(&self, effect: EffectType) -> bool {
        match effect {
            EffectType::Mirror => self.mirror.iter().any(Option::is_some),
            EffectType::InvisibleWall => self.invisible_wall.is_some(),
            EffectType::Volcano => self.volcano.is_some(),
        }
    }

    /// Whether laser walls are currently hidden and passable for characters.
    /// False while the effect is in a flash window.
    pub fn are_walls_invisible(&self) -> bool {
        self.invisible_wall
            .as_ref()
            .is_some_and(|state| self.in_hidden_phase(state.phase_elapsed))
    }

    /// Whether the invisibility effect is running but currently flashing.
    pub fn are_walls_flashing(&self) -> bool {
        self.invisible_wall
            .as_ref()
            .is_some_and(|state| !self.in_hidden_phase(state.phase_elapsed))
    }

    /// Whether the volcano has a meteor warning due.
    pub fn should_spawn_meteor(&self) -> bool {
        self.meteor_pending
    }

    /// Consume the pending meteor spawn, if any.
    pub fn take_meteor_spawn(&mut self) -> bool {
        std::mem::take(&mut self.meteor_pending)
    }

    /// Remaining seconds of an effect, if it is active.
    pub fn remaining(&self, effect: EffectType, target: PlayerSlot) -> Option<f32> {
        match effect {
            EffectType::Mirror => self.mirror[target.index()].as_ref().map(|t| t.remaining),
            EffectType::InvisibleWall => self.invisible_wall.as_ref().map(|s| s.timer.remaining),
            EffectType::Volcano => self.volcano.as_ref().map(|s| s.timer.remaining),
        }
    }

    fn in_hidden_phase(&self, phase_elapsed: f32) -> bool {
        let hidden = self.config.wall_hidden_time;
        let cycle = hidden + self.config.wall_flash_time;
        if cycle <= 0.0 {
            return true;
        }
        phase_elapsed.rem_euclid(cycle) < hidden
    }

    fn draw_interval(&self, rng: &mut impl Rng) -> f32 {
        let (lo, hi) = (
            self.config.meteor_interval_min,
            self.config.meteor_interval_max,
        );
        if hi > lo { rng.random_range(lo..=hi) } else { lo }
    }
}

impl Default for EffectManager {
    fn default() -> Self {
        Self::new(EffectsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EFFECT_DURATION;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn mirror_is_per_player() {
        let mut effects = EffectManager::default();
        effects.apply(EffectType::Mirror, PlayerSlot::Two, &mut rng());
        assert!(effects.is_mirror_active(PlayerSlot::Two));
        assert!(!effects.is_mirror_active(PlayerSlot::One));
    }

    #[test]
    fn effect_expires_on_the_crossing_tick() {
        let mut r = rng();
        let mut effects = EffectManager::default();
        effects.apply(EffectType::Mirror, PlayerSlot::One, &mut r);

        let expired = effects.tick(29.5, &mut r);
        assert!(expired.is_empty());
        assert!(effects.is_mirror_active(PlayerSlot::One));

        let expired = effects.tick(0.5, &mut r);
        assert_eq!(
            expired,
            vec![ExpiredEffect {
                effect: EffectType::Mirror,
                target: Some(PlayerSlot::One),
            }]
        );
        assert!(!effects.is_mirror_active(PlayerSlot::One));
    }

    #[test]
    fn configured_duration_is_used_for_every_effect() {
        let mut r = rng();
        let mut effects = EffectManager::new(EffectsConfig {
            duration: 5.0,
            ..EffectsConfig::default()
        });
        effects.apply(EffectType::Mirror, PlayerSlot::One, &mut r);
        effects.apply(EffectType::InvisibleWall, PlayerSlot::One, &mut r);
        effects.apply(EffectType::Volcano, PlayerSlot::Two, &mut r);
        for effect in [EffectType::Mirror, EffectType::InvisibleWall, EffectType::Volcano] {
            assert_eq!(effects.remaining(effect, PlayerSlot::One), Some(5.0));
        }
        let expired = effects.tick(5.0, &mut r);
        assert_eq!(expired.len(), 3);
    }

    #[test]
    fn reapplying_mirror_resets_without_toggling() {
        let mut r = rng();
        let mut effects = EffectManager::default();
        effects.apply(EffectType::Mirror, PlayerSlot::One, &mut r);
        effects.tick(20.0, &mut r);
        effects.apply(EffectType::Mirror, PlayerSlot::One, &mut r);

        assert!(effects.is_mirror_active(PlayerSlot::One));
        assert_eq!(
            effects.remaining(EffectType::Mirror, PlayerSlot::One),
            Some(EFFECT_DURATION)
        );
    }

    #[test]
    fn invisible_wall_alternates_hidden_and_flash() {
        let mut r = rng();
        let mut effects = EffectManager::default();
        effects.apply(EffectType::InvisibleWall, PlayerSlot::One, &mut r);
        assert!(effects.are_walls_invisible());

        effects.tick(4.5, &mut r);
        assert!(!effects.are_walls_invisible());
        assert!(effects.are_walls_flashing());

        effects.tick(1.0, &mut r);
        assert!(effects.are_walls_invisible());
    }

    #[test]
    fn walls_solid_after_invisibility_expires() {
        let mut r = rng();
        let mut effects = EffectManager::default();
        effects.apply(EffectType::InvisibleWall, PlayerSlot::Two, &mut r);
        effects.tick(30.0, &mut r);
        assert!(!effects.are_walls_invisible());
        assert!(!effects.are_walls_flashing());
        assert!(!effects.is_active(EffectType::InvisibleWall));
    }

    #[test]
    fn volcano_schedules_spawns_within_bounds() {
        let mut r = rng();
        let mut effects = EffectManager::default();
        effects.apply(EffectType::Volcano, PlayerSlot::One, &mut r);

        // Nothing can be due before the lower bound.
        effects.tick(0.9, &mut r);
        assert!(!effects.should_spawn_meteor());

        // Something must be due by the upper bound.
        effects.tick(2.2, &mut r);
        assert!(effects.should_spawn_meteor());
        assert!(effects.take_meteor_spawn());
        assert!(!effects.should_spawn_meteor());
    }

    #[test]
    fn volcano_spawns_repeatedly_until_expiry() {
        let mut r = rng();
        let mut effects = EffectManager::default();
        effects.apply(EffectType::Volcano, PlayerSlot::One, &mut r);

        let mut spawns = 0;
        for _ in 0..(30 * 60) {
            effects.tick(1.0 / 60.0, &mut r);
            if effects.take_meteor_spawn() {
                spawns += 1;
            }
        }
        // 30s with 1..=3s gaps.
        assert!((9..=30).contains(&spawns), "got {spawns} spawns");

        effects.tick(1.0, &mut r);
        assert!(!effects.is_active(EffectType::Volcano));
        assert!(!effects.should_spawn_meteor());
    }

    #[test]
    fn reset_clears_everything() {
        let mut r = rng();
        let mut effects = EffectManager::default();
        effects.apply(EffectType::Mirror, PlayerSlot::One, &mut r);
        effects.apply(EffectType::InvisibleWall, PlayerSlot::One, &mut r);
        effects.apply(EffectType::Volcano, PlayerSlot::One, &mut r);
        effects.reset();
        assert!(!effects.is_mirror_active(PlayerSlot::One));
        assert!(!effects.are_walls_invisible());
        assert!(!effects.is_active(EffectType::Volcano));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_expires_before_duration(
                steps in proptest::collection::vec(0.001f32..0.5, 1..200)
            ) {
                let mut r = rng();
                let mut effects = EffectManager::default();
                effects.apply(EffectType::Mirror, PlayerSlot::One, &mut r);
                let mut elapsed = 0.0f32;
                for dt in steps {
                    effects.tick(dt, &mut r);
                    elapsed += dt;
                    if elapsed < EFFECT_DURATION - 1e-3 {
                        prop_assert!(effects.is_mirror_active(PlayerSlot::One));
                    }
                    if elapsed > EFFECT_DURATION + 1e-3 {
                        prop_assert!(!effects.is_mirror_active(PlayerSlot::One));
                    }
                }
            }
        }
    }
}
