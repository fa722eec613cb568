use serde::{Deserialize, Serialize};
use tether_core::geometry::Bounds;

/// Screen width in world units.
pub const SCREEN_WIDTH: f32 = 800.0;
/// Screen height in world units.
pub const SCREEN_HEIGHT: f32 = 600.0;
/// Half the character's render extent; also the collision half size.
pub const CHARACTER_HALF_EXTENT: f32 = 15.0;
/// Character speed (units/s).
pub const MOVE_SPEED: f32 = 180.0;
/// Maximum chain length between the two anchors.
pub const CHAIN_MAX_LENGTH: f32 = 400.0;
/// Relaxation passes per frame.
pub const CHAIN_ITERATIONS: u32 = 5;
/// Seconds the revive key must be held.
pub const REVIVE_HOLD_TIME: f32 = 1.5;
/// Lifetime of every fruit effect (seconds).
pub const EFFECT_DURATION: f32 = 30.0;

/// Physics and layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoopPhysicsConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub character_half_extent: f32,
    pub move_speed: f32,
    pub chain_max_length: f32,
    pub chain_iterations: u32,
    /// Collision size of a box (square).
    pub box_size: f32,
    /// Drawn size of a box (square); larger than the collision size.
    pub box_display_size: f32,
    /// Both characters must be within this distance of a box to push it.
    pub push_radius: f32,
    pub box_push_speed: f32,
    pub goal_size: f32,
    pub fruit_size: f32,
}

impl Default for CoopPhysicsConfig {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            character_half_extent: CHARACTER_HALF_EXTENT,
            move_speed: MOVE_SPEED,
            chain_max_length: CHAIN_MAX_LENGTH,
            chain_iterations: CHAIN_ITERATIONS,
            box_size: 40.0,
            box_display_size: 60.0,
            push_radius: 80.0,
            box_push_speed: 120.0,
            goal_size: CHARACTER_HALF_EXTENT * 2.5,
            fruit_size: 24.0,
        }
    }
}

impl CoopPhysicsConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.screen_width, self.screen_height)
    }
}

/// Revival protocol parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevivalConfig {
    pub hold_time: f32,
    /// Defaults to the chain length when absent.
    pub radius: Option<f32>,
}

impl Default for RevivalConfig {
    fn default() -> Self {
        Self {
            hold_time: REVIVE_HOLD_TIME,
            radius: None,
        }
    }
}

/// Fruit effect timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub duration: f32,
    /// Length of the hidden part of the invisible-wall cycle.
    pub wall_hidden_time: f32,
    /// Length of the visible flash that follows each hidden stretch.
    pub wall_flash_time: f32,
    pub meteor_interval_min: f32,
    pub meteor_interval_max: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            duration: EFFECT_DURATION,
            wall_hidden_time: 4.0,
            wall_flash_time: 1.0,
            meteor_interval_min: 1.0,
            meteor_interval_max: 3.0,
        }
    }
}

/// Transient hazard timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub warning_duration: f32,
    pub meteor_lifetime: f32,
    pub meteor_size: f32,
    pub death_shake_duration: f32,
    pub death_shake_magnitude: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            warning_duration: 1.5,
            meteor_lifetime: 1.0,
            meteor_size: 48.0,
            death_shake_duration: 0.35,
            death_shake_magnitude: 4.0,
        }
    }
}

/// Sprite cadence (cosmetic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub walk_frame_time: f32,
    pub idle_frame_time: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            walk_frame_time: 0.08,
            idle_frame_time: 0.15,
        }
    }
}

/// Top-level game configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoopConfig {
    pub physics: CoopPhysicsConfig,
    pub revival: RevivalConfig,
    pub effects: EffectsConfig,
    pub hazards: HazardConfig,
    pub animation: AnimationConfig,
    /// Seed for meteor placement and spawn intervals.
    pub seed: u64,
}

impl CoopConfig {
    /// Load config from `TETHER_COOP_CONFIG` or `config/coop.toml`. Falls back
    /// to defaults if the file is missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("TETHER_COOP_CONFIG")
            .unwrap_or_else(|_| "config/coop.toml".to_string());
        let config = match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                CoopConfig::default()
            }),
            Err(_) => CoopConfig::default(),
        };
        config.validated()
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<CoopConfig>(content)
    }

    /// Revival radius: explicit value, or the chain length.
    pub fn revival_radius(&self) -> f32 {
        self.revival.radius.unwrap_or(self.physics.chain_max_length)
    }

    /// Clamp values that would break the simulation, logging each fix.
    ///
    /// TOML accepts `nan` and `inf`, so every float is checked for finiteness
    /// as well as range.
    pub fn validated(mut self) -> Self {
        let defaults = CoopConfig::default();

        let p = &mut self.physics;
        let d = &defaults.physics;
        if !(positive(p.screen_width) && positive(p.screen_height)) {
            tracing::warn!(
                width = p.screen_width,
                height = p.screen_height,
                "screen size must be positive and finite, using defaults"
            );
            p.screen_width = d.screen_width;
            p.screen_height = d.screen_height;
        }
        require_positive(
            "physics.character_half_extent",
            &mut p.character_half_extent,
            d.character_half_extent,
        );
        require_non_negative("physics.move_speed", &mut p.move_speed, d.move_speed);
        require_positive("physics.chain_max_length", &mut p.chain_max_length, d.chain_max_length);
        if p.chain_iterations == 0 {
            tracing::warn!("chain_iterations must be >= 1, using 1");
            p.chain_iterations = 1;
        }
        require_positive("physics.box_size", &mut p.box_size, d.box_size);
        require_positive("physics.box_display_size", &mut p.box_display_size, d.box_display_size);
        require_non_negative("physics.push_radius", &mut p.push_radius, d.push_radius);
        require_non_negative("physics.box_push_speed", &mut p.box_push_speed, d.box_push_speed);
        require_positive("physics.goal_size", &mut p.goal_size, d.goal_size);
        require_positive("physics.fruit_size", &mut p.fruit_size, d.fruit_size);

        let r = &mut self.revival;
        require_positive("revival.hold_time", &mut r.hold_time, defaults.revival.hold_time);
        if r.radius.is_some_and(|radius| !non_negative(radius)) {
            tracing::warn!(
                radius = r.radius,
                "revival.radius must be finite and >= 0, using chain length"
            );
            r.radius = None;
        }

        let e = &mut self.effects;
        let d = &defaults.effects;
        require_positive("effects.duration", &mut e.duration, d.duration);
        if !(positive(e.wall_hidden_time) && non_negative(e.wall_flash_time)) {
            tracing::warn!("invisible wall phases invalid, using defaults");
            e.wall_hidden_time = d.wall_hidden_time;
            e.wall_flash_time = d.wall_flash_time;
        }
        if !(positive(e.meteor_interval_min)
            && e.meteor_interval_max.is_finite()
            && e.meteor_interval_max >= e.meteor_interval_min)
        {
            tracing::warn!("meteor interval bounds invalid, using defaults");
            e.meteor_interval_min = d.meteor_interval_min;
            e.meteor_interval_max = d.meteor_interval_max;
        }

        let h = &mut self.hazards;
        let d = &defaults.hazards;
        require_positive("hazards.warning_duration", &mut h.warning_duration, d.warning_duration);
        require_positive("hazards.meteor_lifetime", &mut h.meteor_lifetime, d.meteor_lifetime);
        require_positive("hazards.meteor_size", &mut h.meteor_size, d.meteor_size);
        require_non_negative(
            "hazards.death_shake_duration",
            &mut h.death_shake_duration,
            d.death_shake_duration,
        );
        require_non_negative(
            "hazards.death_shake_magnitude",
            &mut h.death_shake_magnitude,
            d.death_shake_magnitude,
        );

        let a = &mut self.animation;
        let d = &defaults.animation;
        require_positive("animation.walk_frame_time", &mut a.walk_frame_time, d.walk_frame_time);
        require_positive("animation.idle_frame_time", &mut a.idle_frame_time, d.idle_frame_time);
        self
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn require_positive(field: &str, value: &mut f32, default: f32) {
    if !positive(*value) {
        tracing::warn!(field, value = *value, "must be positive and finite, using default");
        *value = default;
    }
}

fn require_non_negative(field: &str, value: &mut f32, default: f32) {
    if !non_negative(*value) {
        tracing::warn!(field, value = *value, "must be finite and >= 0, using default");
        *value = default;
    }
}
