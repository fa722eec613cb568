pub mod animation;
pub mod chain;
pub mod character;
pub mod config;
pub mod effects;
pub mod entities;
pub mod hazards;
pub mod level;
pub mod revival;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use tether_core::geometry::Rect;
use tether_core::input::{InputKey, InputSnapshot};
use tether_core::player::PlayerSlot;
use tether_core::render::{Drawable, FrameSource, StockFrames, VisualState};
use tether_core::sim_trait::FrameSimulation;

use character::{Character, DeathCause};
use config::CoopConfig;
use effects::{EffectManager, EffectType};
use entities::{CoopBox, Fruit, Goal, collect_fruits, push_boxes};
use hazards::{HazardEvent, HazardView, LaserWall, SpikeTrap, TransientHazards, WallView, WallVisibility};
use level::{LevelError, LevelSet, builtin_levels, load_levels};
use revival::RevivalState;

/// Key that accepts a restart on the game-over and campaign-complete screens.
pub const RESTART_KEY: InputKey = InputKey::R;

/// Where the campaign stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    /// Both characters are dead; waiting for a level restart.
    GameOver,
    /// The last level was cleared; waiting for a campaign restart.
    AllLevelsComplete,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("restart is only accepted on a terminal screen (current phase: {0:?})")]
    NotTerminal(SessionPhase),
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Things that happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CharacterDied { slot: PlayerSlot, cause: DeathCause },
    CharacterRevived { slot: PlayerSlot },
    FruitCollected { slot: PlayerSlot, effect: EffectType },
    EffectExpired {
        effect: EffectType,
        target: Option<PlayerSlot>,
    },
    MeteorIncoming { id: u32, position: Vec2 },
    MeteorLanded { id: u32, position: Vec2 },
    MeteorImpact { id: u32, slot: PlayerSlot },
    /// Level `index` was cleared; the next level (if any) is already loaded.
    LevelComplete { index: usize },
    CampaignComplete,
    GameOver,
}

/// What a draw item depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Wall,
    Goal { player: PlayerSlot },
    Spike,
    Box,
    Fruit { effect: EffectType },
    Warning,
    Meteor,
    Character { player: PlayerSlot },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawItem {
    pub kind: EntityKind,
    pub bounds: Rect,
    pub state: VisualState,
}

impl DrawItem {
    fn of(kind: EntityKind, entity: &impl Drawable) -> Self {
        Self {
            kind,
            bounds: entity.bounds(),
            state: entity.visual_state(),
        }
    }
}

/// Read-only view of one frame for the draw phase, back to front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub phase: SessionPhase,
    pub level_index: usize,
    pub level_name: String,
    pub items: Vec<DrawItem>,
    /// Chain endpoints; the dead end sits on the body.
    pub chain: Option<(Vec2, Vec2)>,
    pub revive_progress: f32,
    pub revive_hint: bool,
}

/// The whole game: both characters, the current level's entities, effects,
/// revival progress and the campaign position.
///
/// Created once; level loads and restarts reset it in place.
pub struct GameSession {
    config: CoopConfig,
    levels: LevelSet,
    level_index: usize,
    phase: SessionPhase,
    characters: [Character; 2],
    walls: Vec<LaserWall>,
    spikes: Vec<SpikeTrap>,
    boxes: Vec<CoopBox>,
    goals: Vec<Goal>,
    fruits: Vec<Fruit>,
    hazards: TransientHazards,
    effects: EffectManager,
    revival: RevivalState,
    rng: StdRng,
}

impl GameSession {
    /// Validate `levels` and start at the first one.
    pub fn new(
        config: CoopConfig,
        mut levels: LevelSet,
        frames: &dyn FrameSource,
    ) -> Result<Self, SessionError> {
        levels.validate()?;
        Ok(Self::build(config.validated(), levels, frames))
    }

    /// Built-in campaign with stock sprite frame counts.
    pub fn with_builtin_levels(config: CoopConfig) -> Self {
        Self::build(config.validated(), builtin_levels(), &StockFrames)
    }

    /// Config and levels from their files (or defaults).
    pub fn load() -> Self {
        Self::build(CoopConfig::load(), load_levels(), &StockFrames)
    }

    fn build(config: CoopConfig, levels: LevelSet, frames: &dyn FrameSource) -> Self {
        let half = config.physics.character_half_extent;
        let starts = levels
            .get(0)
            .map(|l| l.starts)
            .unwrap_or([Vec2::ZERO; 2]);
        let characters = [
            Character::new(PlayerSlot::One, starts[0], half, frames),
            Character::new(PlayerSlot::Two, starts[1], half, frames),
        ];
        let mut session = Self {
            effects: EffectManager::new(config.effects.clone()),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            levels,
            level_index: 0,
            phase: SessionPhase::Playing,
            characters,
            walls: Vec::new(),
            spikes: Vec::new(),
            boxes: Vec::new(),
            goals: Vec::new(),
            fruits: Vec::new(),
            hazards: TransientHazards::new(),
            revival: RevivalState::default(),
        };
        session.load_level(0);
        session
    }

    /// Reset every entity to the layout of level `index` and clear all
    /// effects and transient hazards. An index past the end completes the
    /// campaign.
    pub fn load_level(&mut self, index: usize) {
        let Some(level) = self.levels.get(index).cloned() else {
            tracing::info!(index, "no level at index, campaign complete");
            self.phase = SessionPhase::AllLevelsComplete;
            return;
        };
        let physics = &self.config.physics;

        for character in &mut self.characters {
            character.reset_to(level.starts[character.slot.index()]);
        }
        self.walls = level.walls.iter().copied().map(LaserWall::new).collect();
        self.spikes = level
            .spikes
            .iter()
            .map(|s| SpikeTrap::new(s.rect, s.out_time, s.in_time, s.phase_offset))
            .collect();
        self.boxes = level
            .boxes
            .iter()
            .map(|&p| CoopBox::new(p, physics.box_size, physics.box_display_size))
            .collect();
        self.goals = level
            .goals
            .iter()
            .map(|g| Goal::new(g.position, physics.goal_size, g.player))
            .collect();
        self.fruits = level
            .fruits
            .iter()
            .map(|f| Fruit {
                position: f.position,
                size: physics.fruit_size,
                effect: f.effect,
            })
            .collect();
        self.hazards.clear();
        self.effects.reset();
        self.revival.reset();
        self.level_index = index;
        self.phase = SessionPhase::Playing;

        tracing::info!(index, name = %level.name, "level loaded");
    }

    /// Reload the current level. Only accepted after a game over.
    pub fn restart_level(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::GameOver {
            return Err(SessionError::NotTerminal(self.phase));
        }
        self.load_level(self.level_index);
        Ok(())
    }

    /// Start over from the first level. Only accepted once every level is done.
    pub fn restart_campaign(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::AllLevelsComplete {
            return Err(SessionError::NotTerminal(self.phase));
        }
        self.load_level(0);
        Ok(())
    }

    /// The restart action appropriate to the current terminal phase.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::GameOver => self.restart_level(),
            SessionPhase::AllLevelsComplete => self.restart_campaign(),
            SessionPhase::Playing => Err(SessionError::NotTerminal(self.phase)),
        }
    }

    /// Restart if [`RESTART_KEY`] is held on a terminal screen.
    pub fn handle_restart_input(&mut self, input: &InputSnapshot) -> bool {
        input.is_pressed(RESTART_KEY) && self.restart().is_ok()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn config(&self) -> &CoopConfig {
        &self.config
    }

    pub fn character(&self, slot: PlayerSlot) -> &Character {
        &self.characters[slot.index()]
    }

    pub fn effects(&self) -> &EffectManager {
        &self.effects
    }

    pub fn hazards(&self) -> &TransientHazards {
        &self.hazards
    }

    pub fn fruits(&self) -> &[Fruit] {
        &self.fruits
    }

    /// Revival progress in `0.0..=1.0`.
    pub fn revive_progress_fraction(&self) -> f32 {
        self.revival.fraction(self.config.revival.hold_time)
    }

    /// Whether the "go revive your teammate" hint applies: exactly one
    /// character is down during play.
    pub fn revive_hint_visible(&self) -> bool {
        self.phase == SessionPhase::Playing
            && self.characters[0].is_alive != self.characters[1].is_alive
    }

    /// Chain endpoints, or `None` when both characters are dead.
    pub fn chain_segment(&self) -> Option<(Vec2, Vec2)> {
        let [a, b] = &self.characters;
        match (a.is_alive, b.is_alive) {
            (false, false) => None,
            _ => Some((a.anchor(), b.anchor())),
        }
    }

    pub fn wall_visibility(&self) -> WallVisibility {
        if self.effects.are_walls_invisible() {
            WallVisibility::Hidden
        } else if self.effects.are_walls_flashing() {
            WallVisibility::Flashing
        } else {
            WallVisibility::Visible
        }
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        let visibility = self.wall_visibility();
        let mut items = Vec::new();
        items.extend(self.walls.iter().map(|wall| {
            DrawItem::of(
                EntityKind::Wall,
                &WallView {
                    wall,
                    visibility,
                },
            )
        }));
        items.extend(
            self.goals
                .iter()
                .map(|g| DrawItem::of(EntityKind::Goal { player: g.target }, g)),
        );
        items.extend(self.spikes.iter().map(|s| DrawItem::of(EntityKind::Spike, s)));
        items.extend(self.boxes.iter().map(|b| DrawItem::of(EntityKind::Box, b)));
        items.extend(
            self.fruits
                .iter()
                .map(|f| DrawItem::of(EntityKind::Fruit { effect: f.effect }, f)),
        );
        items.extend(
            self.hazards
                .warnings
                .iter()
                .map(|w| DrawItem::of(EntityKind::Warning, w)),
        );
        items.extend(
            self.hazards
                .meteors
                .iter()
                .map(|m| DrawItem::of(EntityKind::Meteor, m)),
        );
        items.extend(
            self.characters
                .iter()
                .map(|c| DrawItem::of(EntityKind::Character { player: c.slot }, c)),
        );

        RenderSnapshot {
            phase: self.phase,
            level_index: self.level_index,
            level_name: self
                .levels
                .get(self.level_index)
                .map(|l| l.name.clone())
                .unwrap_or_default(),
            items,
            chain: self.chain_segment(),
            revive_progress: self.revive_progress_fraction(),
            revive_hint: self.revive_hint_visible(),
        }
    }

    fn move_characters(&mut self, input: &InputSnapshot, dt: f32, events: &mut Vec<SessionEvent>) {
        for i in 0..self.characters.len() {
            let view = HazardView {
                walls: &self.walls,
                boxes: &self.boxes,
                spikes: &self.spikes,
                meteors: &self.hazards.meteors,
            };
            let character = &mut self.characters[i];
            let Some(cause) =
                character.update_movement(&view, &self.effects, input, &self.config, dt)
            else {
                continue;
            };
            let slot = character.slot;
            tracing::debug!(%slot, ?cause, "character died");
            events.push(SessionEvent::CharacterDied { slot, cause });
            if let DeathCause::Meteor { id } = cause {
                self.hazards.remove_meteor(id);
                events.push(SessionEvent::MeteorImpact { id, slot });
            }
        }
    }

    fn collect_pickups(&mut self, events: &mut Vec<SessionEvent>) {
        for (slot, effect) in collect_fruits(&mut self.fruits, &self.characters) {
            tracing::debug!(%slot, ?effect, "fruit collected");
            self.effects.apply(effect, slot, &mut self.rng);
            events.push(SessionEvent::FruitCollected { slot, effect });
        }
    }

    fn tick_effects(&mut self, dt: f32, events: &mut Vec<SessionEvent>) {
        for expired in self.effects.tick(dt, &mut self.rng) {
            tracing::debug!(effect = ?expired.effect, "effect expired");
            events.push(SessionEvent::EffectExpired {
                effect: expired.effect,
                target: expired.target,
            });
        }
        if self.effects.take_meteor_spawn() {
            let position = self.random_meteor_position();
            let id = self.hazards.spawn_warning(position, &self.config.hazards);
            tracing::debug!(id, x = position.x, y = position.y, "meteor warning spawned");
            events.push(SessionEvent::MeteorIncoming { id, position });
        }
    }

    fn tick_hazards(&mut self, dt: f32, events: &mut Vec<SessionEvent>) {
        for spike in &mut self.spikes {
            spike.tick(dt);
        }
        for event in self.hazards.tick(dt, &self.config.hazards) {
            if let HazardEvent::MeteorLanded { id, center } = event {
                events.push(SessionEvent::MeteorLanded {
                    id,
                    position: center,
                });
            }
        }
    }

    fn random_meteor_position(&mut self) -> Vec2 {
        let bounds = self.config.physics.bounds();
        let inset = self.config.hazards.meteor_size / 2.0;
        let x = if bounds.width - inset > inset {
            self.rng.random_range(inset..=bounds.width - inset)
        } else {
            bounds.width / 2.0
        };
        let y = if bounds.height - inset > inset {
            self.rng.random_range(inset..=bounds.height - inset)
        } else {
            bounds.height / 2.0
        };
        Vec2::new(x, y)
    }

    /// Level clear needs both goals lit by living characters; game over
    /// needs both characters down.
    fn evaluate_outcome(&mut self, events: &mut Vec<SessionEvent>) {
        let alive = self.characters.iter().filter(|c| c.is_alive).count();
        let goals_met = !self.goals.is_empty() && self.goals.iter().all(|g| g.is_active);

        if alive == 2 && goals_met {
            let cleared = self.level_index;
            tracing::info!(index = cleared, "level complete");
            events.push(SessionEvent::LevelComplete { index: cleared });
            self.load_level(cleared + 1);
            if self.phase == SessionPhase::AllLevelsComplete {
                tracing::info!("campaign complete");
                events.push(SessionEvent::CampaignComplete);
            }
        } else if alive == 0 {
            tracing::info!(index = self.level_index, "game over");
            self.phase = SessionPhase::GameOver;
            events.push(SessionEvent::GameOver);
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::with_builtin_levels(CoopConfig::default())
    }
}

impl FrameSimulation for GameSession {
    type Event = SessionEvent;

    /// One frame: movement, chain, box pushing, goals and pickups, effect
    /// timers, hazard timers, revival, then the win/lose check.
    fn update(&mut self, dt: f32, input: &InputSnapshot) -> Vec<SessionEvent> {
        if self.phase != SessionPhase::Playing {
            return Vec::new();
        }
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!(dt, "ignoring frame with invalid dt");
            return Vec::new();
        }
        let mut events = Vec::new();

        self.move_characters(input, dt, &mut events);

        let physics = &self.config.physics;
        let [a, b] = &mut self.characters;
        chain::resolve_chain(
            a,
            b,
            physics.chain_max_length,
            physics.chain_iterations,
            physics.bounds(),
        );

        push_boxes(
            &mut self.boxes,
            &self.characters,
            &self.walls,
            &self.effects,
            input,
            &self.config,
            dt,
        );

        for goal in &mut self.goals {
            goal.update_status(&self.characters[goal.target.index()]);
        }
        self.collect_pickups(&mut events);

        self.tick_effects(dt, &mut events);
        self.tick_hazards(dt, &mut events);

        if let Some(slot) = self.revival.update(
            &mut self.characters,
            input,
            dt,
            self.config.revival_radius(),
            self.config.revival.hold_time,
        ) {
            events.push(SessionEvent::CharacterRevived { slot });
        }

        self.evaluate_outcome(&mut events);
        events
    }

    fn serialize_state(&self) -> Vec<u8> {
        match rmp_serde::to_vec(&self.render_snapshot()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to encode render snapshot: {e}");
                Vec::new()
            },
        }
    }

    fn is_terminal(&self) -> bool {
        self.phase != SessionPhase::Playing
    }
}
