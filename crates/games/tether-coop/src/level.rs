//! Level descriptors, the built-in campaign, and JSON loading.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use tether_core::geometry::Rect;
use tether_core::player::PlayerSlot;

use crate::effects::EffectType;

/// Shortest out phase a spike trap may have after load-time clamping.
pub const MIN_SPIKE_OUT_TIME: f32 = 0.05;

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level set contains no levels")]
    Empty,
    #[error("level {level}: non-finite value in {field}")]
    NonFinite { level: usize, field: &'static str },
    #[error("level {level}: no goal for {player}")]
    MissingGoal { level: usize, player: PlayerSlot },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub position: Vec2,
    pub player: PlayerSlot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeSpec {
    pub rect: Rect,
    pub out_time: f32,
    pub in_time: f32,
    #[serde(default)]
    pub phase_offset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FruitSpec {
    pub position: Vec2,
    pub effect: EffectType,
}

/// One level: starts, goals, and static layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    /// Start positions, indexed by player slot.
    pub starts: [Vec2; 2],
    pub goals: Vec<GoalSpec>,
    #[serde(default)]
    pub walls: Vec<Rect>,
    #[serde(default)]
    pub spikes: Vec<SpikeSpec>,
    /// Box centres.
    #[serde(default)]
    pub boxes: Vec<Vec2>,
    #[serde(default)]
    pub fruits: Vec<FruitSpec>,
}

impl LevelData {
    pub fn goal_for(&self, player: PlayerSlot) -> Option<&GoalSpec> {
        self.goals.iter().find(|g| g.player == player)
    }
}

/// Ordered campaign of levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub levels: Vec<LevelData>,
}

impl LevelSet {
    pub fn new(levels: Vec<LevelData>) -> Self {
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }

    /// Parse and validate a JSON level set.
    pub fn from_json(content: &str) -> Result<Self, LevelError> {
        let mut set: LevelSet = serde_json::from_str(content)?;
        set.validate()?;
        Ok(set)
    }

    /// Reject unusable data and clamp the rest.
    ///
    /// Non-finite numbers and missing goals are errors. Degenerate spike
    /// cycles are clamped and non-positive walls are dropped, with a warning
    /// each.
    pub fn validate(&mut self) -> Result<(), LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::Empty);
        }
        for (index, level) in self.levels.iter_mut().enumerate() {
            validate_level(index, level)?;
        }
        Ok(())
    }
}

fn validate_level(index: usize, level: &mut LevelData) -> Result<(), LevelError> {
    let non_finite = |field| LevelError::NonFinite {
        level: index,
        field,
    };

    if !level.starts.iter().all(|s| s.is_finite()) {
        return Err(non_finite("starts"));
    }
    if !level.goals.iter().all(|g| g.position.is_finite()) {
        return Err(non_finite("goals"));
    }
    if !level.walls.iter().all(Rect::is_finite) {
        return Err(non_finite("walls"));
    }
    if !level.spikes.iter().all(|s| {
        s.rect.is_finite()
            && s.out_time.is_finite()
            && s.in_time.is_finite()
            && s.phase_offset.is_finite()
    }) {
        return Err(non_finite("spikes"));
    }
    if !level.boxes.iter().all(|b| b.is_finite()) {
        return Err(non_finite("boxes"));
    }
    if !level.fruits.iter().all(|f| f.position.is_finite()) {
        return Err(non_finite("fruits"));
    }

    for player in PlayerSlot::ALL {
        if level.goal_for(player).is_none() {
            return Err(LevelError::MissingGoal {
                level: index,
                player,
            });
        }
    }

    let before = level.walls.len();
    level.walls.retain(|w| w.width > 0.0 && w.height > 0.0);
    if level.walls.len() != before {
        tracing::warn!(
            level = index,
            dropped = before - level.walls.len(),
            "dropping walls with non-positive size"
        );
    }

    for (i, spike) in level.spikes.iter_mut().enumerate() {
        if spike.out_time <= 0.0 {
            tracing::warn!(
                level = index,
                spike = i,
                out_time = spike.out_time,
                "spike out_time must be positive, clamping"
            );
            spike.out_time = MIN_SPIKE_OUT_TIME;
        }
        if spike.in_time < 0.0 {
            tracing::warn!(
                level = index,
                spike = i,
                in_time = spike.in_time,
                "spike in_time must not be negative, clamping"
            );
            spike.in_time = 0.0;
        }
    }
    Ok(())
}

/// Read a level set from a JSON file.
pub fn load_levels_from_file(path: &str) -> Result<LevelSet, LevelError> {
    let content = std::fs::read_to_string(path)?;
    LevelSet::from_json(&content)
}

/// Load the campaign from `TETHER_LEVELS` (default `config/levels.json`),
/// falling back to [`builtin_levels`] if the file is missing or invalid.
pub fn load_levels() -> LevelSet {
    let path =
        std::env::var("TETHER_LEVELS").unwrap_or_else(|_| "config/levels.json".to_string());
    match load_levels_from_file(&path) {
        Ok(set) => {
            tracing::info!(levels = set.len(), "loaded levels from {path}");
            set
        },
        Err(LevelError::Io(e)) => {
            tracing::debug!("No level file at {path} ({e}), using built-in levels");
            builtin_levels()
        },
        Err(e) => {
            tracing::warn!("Failed to load {path}: {e}, using built-in levels");
            builtin_levels()
        },
    }
}

fn wall(x: f32, y: f32, width: f32, height: f32) -> Rect {
    Rect::new(x, y, width, height)
}

fn goals(one: Vec2, two: Vec2) -> Vec<GoalSpec> {
    vec![
        GoalSpec {
            position: one,
            player: PlayerSlot::One,
        },
        GoalSpec {
            position: two,
            player: PlayerSlot::Two,
        },
    ]
}

fn spike(rect: Rect, out_time: f32, in_time: f32, phase_offset: f32) -> SpikeSpec {
    SpikeSpec {
        rect,
        out_time,
        in_time,
        phase_offset,
    }
}

/// The built-in four-level campaign.
pub fn builtin_levels() -> LevelSet {
    LevelSet::new(vec![
        LevelData {
            name: "Split Corridor".to_string(),
            starts: [Vec2::new(100.0, 300.0), Vec2::new(150.0, 300.0)],
            goals: goals(Vec2::new(750.0, 100.0), Vec2::new(750.0, 500.0)),
            walls: vec![
                wall(390.0, 150.0, 20.0, 300.0),
                wall(200.0, 290.0, 190.0, 10.0),
                wall(410.0, 290.0, 370.0, 10.0),
            ],
            spikes: Vec::new(),
            boxes: Vec::new(),
            fruits: Vec::new(),
        },
        LevelData {
            name: "Laser Maze".to_string(),
            starts: [Vec2::new(50.0, 50.0), Vec2::new(100.0, 50.0)],
            goals: goals(Vec2::new(750.0, 550.0), Vec2::new(700.0, 550.0)),
            walls: vec![
                wall(0.0, 0.0, 800.0, 20.0),
                wall(0.0, 580.0, 800.0, 20.0),
                wall(0.0, 0.0, 20.0, 600.0),
                wall(780.0, 0.0, 20.0, 600.0),
                wall(150.0, 20.0, 20.0, 300.0),
                wall(150.0, 350.0, 20.0, 230.0),
                wall(650.0, 20.0, 20.0, 250.0),
                wall(650.0, 300.0, 20.0, 280.0),
                wall(150.0, 200.0, 500.0, 20.0),
                wall(150.0, 400.0, 500.0, 20.0),
            ],
            spikes: Vec::new(),
            boxes: Vec::new(),
            fruits: Vec::new(),
        },
        LevelData {
            name: "Spike Gate".to_string(),
            starts: [Vec2::new(60.0, 300.0), Vec2::new(110.0, 300.0)],
            goals: goals(Vec2::new(740.0, 250.0), Vec2::new(740.0, 350.0)),
            walls: vec![
                wall(250.0, 0.0, 20.0, 220.0),
                wall(250.0, 380.0, 20.0, 220.0),
                wall(480.0, 0.0, 20.0, 250.0),
                wall(480.0, 350.0, 20.0, 250.0),
            ],
            spikes: vec![spike(wall(250.0, 220.0, 20.0, 160.0), 1.0, 2.0, 0.0)],
            boxes: vec![Vec2::new(490.0, 300.0)],
            fruits: vec![FruitSpec {
                position: Vec2::new(400.0, 100.0),
                effect: EffectType::Mirror,
            }],
        },
        LevelData {
            name: "Ash and Glass".to_string(),
            starts: [Vec2::new(60.0, 60.0), Vec2::new(110.0, 60.0)],
            goals: goals(Vec2::new(740.0, 540.0), Vec2::new(690.0, 540.0)),
            walls: vec![
                wall(0.0, 200.0, 320.0, 20.0),
                wall(480.0, 200.0, 320.0, 20.0),
                wall(0.0, 400.0, 320.0, 20.0),
                wall(480.0, 400.0, 320.0, 20.0),
            ],
            spikes: vec![
                spike(wall(320.0, 200.0, 53.0, 20.0), 1.0, 1.0, 0.0),
                spike(wall(373.0, 200.0, 54.0, 20.0), 1.0, 1.0, 0.66),
                spike(wall(427.0, 200.0, 53.0, 20.0), 1.0, 1.0, 1.33),
                spike(wall(320.0, 400.0, 160.0, 20.0), 0.8, 1.6, 0.0),
            ],
            boxes: Vec::new(),
            fruits: vec![
                FruitSpec {
                    position: Vec2::new(150.0, 300.0),
                    effect: EffectType::InvisibleWall,
                },
                FruitSpec {
                    position: Vec2::new(650.0, 100.0),
                    effect: EffectType::Volcano,
                },
            ],
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_campaign_is_valid() {
        let mut set = builtin_levels();
        assert_eq!(set.len(), 4);
        set.validate().unwrap();
        assert_eq!(set, builtin_levels(), "built-in data needs no clamping");
    }

    #[test]
    fn builtin_starts_are_clear_of_hazards() {
        let set = builtin_levels();
        for level in &set.levels {
            for start in level.starts {
                let body = Rect::square(start, 15.0);
                assert!(
                    !level.walls.iter().any(|w| body.overlaps(w)),
                    "{}: start inside a wall",
                    level.name
                );
                assert!(
                    !level.spikes.iter().any(|s| body.overlaps(&s.rect)),
                    "{}: start inside a spike",
                    level.name
                );
            }
        }
    }

    #[test]
    fn json_round_trip_through_from_json() {
        let json = serde_json::to_string(&builtin_levels()).unwrap();
        let set = LevelSet::from_json(&json).unwrap();
        assert_eq!(set, builtin_levels());
    }

    #[test]
    fn minimal_json_level_uses_defaults() {
        let json = r#"{
            "levels": [{
                "starts": [[100.0, 100.0], [150.0, 100.0]],
                "goals": [
                    {"position": [700.0, 100.0], "player": "one"},
                    {"position": [700.0, 500.0], "player": "two"}
                ],
                "spikes": [
                    {"rect": {"x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0},
                     "out_time": 1.0, "in_time": 2.0}
                ],
                "fruits": [{"position": [300.0, 300.0], "effect": "invisible_wall"}]
            }]
        }"#;
        let set = LevelSet::from_json(json).unwrap();
        let level = &set.levels[0];
        assert!(level.walls.is_empty());
        assert_eq!(level.spikes[0].phase_offset, 0.0);
        assert_eq!(level.fruits[0].effect, EffectType::InvisibleWall);
    }

    #[test]
    fn degenerate_spikes_and_walls_are_clamped() {
        let mut set = builtin_levels();
        set.levels[0].spikes.push(spike(wall(0.0, 0.0, 10.0, 10.0), 0.0, -1.0, 0.0));
        set.levels[0].walls.push(wall(0.0, 0.0, 0.0, 10.0));
        set.validate().unwrap();
        let trap = set.levels[0].spikes.last().unwrap();
        assert_eq!(trap.out_time, MIN_SPIKE_OUT_TIME);
        assert_eq!(trap.in_time, 0.0);
        assert_eq!(set.levels[0].walls.len(), 3);
    }

    #[test]
    fn non_finite_data_is_rejected() {
        let mut set = builtin_levels();
        set.levels[1].boxes.push(Vec2::new(f32::NAN, 0.0));
        assert!(matches!(
            set.validate(),
            Err(LevelError::NonFinite {
                level: 1,
                field: "boxes"
            })
        ));
    }

    #[test]
    fn missing_goal_is_rejected() {
        let mut set = builtin_levels();
        set.levels[0].goals.retain(|g| g.player == PlayerSlot::One);
        assert!(matches!(
            set.validate(),
            Err(LevelError::MissingGoal {
                level: 0,
                player: PlayerSlot::Two
            })
        ));
    }

    #[test]
    fn empty_set_is_rejected() {
        assert!(matches!(
            LevelSet::from_json(r#"{"levels": []}"#),
            Err(LevelError::Empty)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_levels_from_file("/nonexistent/levels.json"),
            Err(LevelError::Io(_))
        ));
    }
}
