use glam::Vec2;
use serde::{Deserialize, Serialize};

use tether_core::geometry::Rect;
use tether_core::input::InputSnapshot;
use tether_core::player::PlayerSlot;
use tether_core::render::{Drawable, VisualState};

use crate::character::Character;
use crate::config::CoopConfig;
use crate::effects::{EffectManager, EffectType};
use crate::hazards::LaserWall;

/// Pushable crate. Collides with a small square; draws a larger one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoopBox {
    pub position: Vec2,
    pub size: f32,
    pub display_size: f32,
}

impl CoopBox {
    pub fn new(position: Vec2, size: f32, display_size: f32) -> Self {
        Self {
            position,
            size,
            display_size,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.size, self.size)
    }

    pub fn display_rect(&self) -> Rect {
        Rect::from_center(self.position, self.display_size, self.display_size)
    }
}

impl Drawable for CoopBox {
    fn bounds(&self) -> Rect {
        self.display_rect()
    }

    fn visual_state(&self) -> VisualState {
        VisualState::Inactive
    }
}

/// Goal tile bound to one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub rect: Rect,
    pub target: PlayerSlot,
    pub is_active: bool,
}

impl Goal {
    pub fn new(center: Vec2, size: f32, target: PlayerSlot) -> Self {
        Self {
            rect: Rect::from_center(center, size, size),
            target,
            is_active: false,
        }
    }

    /// Recompute occupancy from this goal's own character.
    pub fn update_status(&mut self, character: &Character) {
        self.is_active = character.slot == self.target
            && character.is_alive
            && character.rect().overlaps(&self.rect);
    }
}

impl Drawable for Goal {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn visual_state(&self) -> VisualState {
        if self.is_active {
            VisualState::Active { progress: 1.0 }
        } else {
            VisualState::Inactive
        }
    }
}

/// Single-use pickup granting an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fruit {
    pub position: Vec2,
    pub size: f32,
    pub effect: EffectType,
}

impl Fruit {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.size, self.size)
    }
}

impl Drawable for Fruit {
    fn bounds(&self) -> Rect {
        self.rect()
    }

    fn visual_state(&self) -> VisualState {
        VisualState::Active { progress: 0.0 }
    }
}

/// Remove every fruit touched by a living character, returning what was
/// collected and by whom. P1 is checked first when both touch the same fruit.
pub fn collect_fruits(
    fruits: &mut Vec<Fruit>,
    characters: &[Character; 2],
) -> Vec<(PlayerSlot, EffectType)> {
    let mut collected = Vec::new();
    fruits.retain(|fruit| {
        let rect = fruit.rect();
        match characters
            .iter()
            .find(|c| c.is_alive && c.rect().overlaps(&rect))
        {
            Some(collector) => {
                collected.push((collector.slot, fruit.effect));
                false
            },
            None => true,
        }
    });
    collected
}

/// Move boxes that both characters are pushing together.
///
/// A box moves only when both characters are alive and within the push
/// radius of it; it travels along the average of their (mirror-applied)
/// input directions. Laser walls stay solid for boxes even while they are
/// invisible to characters. Returns the number of boxes that moved.
pub fn push_boxes(
    boxes: &mut [CoopBox],
    characters: &[Character; 2],
    walls: &[LaserWall],
    effects: &EffectManager,
    input: &InputSnapshot,
    config: &CoopConfig,
    dt: f32,
) -> usize {
    if !characters.iter().all(|c| c.is_alive) {
        return 0;
    }
    let push = (characters[0].effective_direction(input, effects)
        + characters[1].effective_direction(input, effects))
        / 2.0;
    let step = push * config.physics.box_push_speed * dt;
    if step == Vec2::ZERO || !step.is_finite() {
        return 0;
    }

    let radius = config.physics.push_radius;
    let bounds = config.physics.bounds();
    let mut moved = 0;
    for i in 0..boxes.len() {
        let center = boxes[i].position;
        if !characters
            .iter()
            .all(|c| c.position.distance(center) <= radius)
        {
            continue;
        }

        let here = boxes[i].rect();
        let blocked = |candidate: Rect| {
            walls.iter().any(|w| candidate.overlaps(&w.rect))
                || characters.iter().any(|c| candidate.overlaps(&c.rect()))
                || boxes
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != i && candidate.overlaps(&other.rect()))
        };
        let mut box_step = step;
        if blocked(here.translated(Vec2::new(box_step.x, 0.0))) {
            box_step.x = 0.0;
        }
        if blocked(here.translated(Vec2::new(0.0, box_step.y))) {
            box_step.y = 0.0;
        }
        if box_step == Vec2::ZERO {
            continue;
        }

        let half = boxes[i].size / 2.0;
        boxes[i].position = bounds.clamp_inset(center + box_step, half);
        moved += 1;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tether_core::input::InputKey;
    use tether_core::render::StockFrames;
    use tether_core::test_helpers::hold;

    fn pair(a: Vec2, b: Vec2) -> [Character; 2] {
        [
            Character::new(PlayerSlot::One, a, 15.0, &StockFrames),
            Character::new(PlayerSlot::Two, b, 15.0, &StockFrames),
        ]
    }

    #[test]
    fn goal_only_counts_its_own_living_character() {
        let config = CoopConfig::default();
        let mut goal = Goal::new(Vec2::new(100.0, 100.0), 37.5, PlayerSlot::Two);
        let [mut one, mut two] = pair(Vec2::new(100.0, 100.0), Vec2::new(100.0, 100.0));

        goal.update_status(&one);
        assert!(!goal.is_active);
        goal.update_status(&two);
        assert!(goal.is_active);

        two.kill(&config.hazards);
        goal.update_status(&two);
        assert!(!goal.is_active);

        one.position = Vec2::new(500.0, 500.0);
        goal.update_status(&one);
        assert!(!goal.is_active);
    }

    #[test]
    fn fruit_is_consumed_by_first_living_toucher() {
        let config = CoopConfig::default();
        let mut fruits = vec![
            Fruit {
                position: Vec2::new(100.0, 100.0),
                size: 24.0,
                effect: EffectType::Mirror,
            },
            Fruit {
                position: Vec2::new(700.0, 500.0),
                size: 24.0,
                effect: EffectType::Volcano,
            },
        ];
        let mut characters = pair(Vec2::new(100.0, 100.0), Vec2::new(105.0, 100.0));
        characters[0].kill(&config.hazards);

        let collected = collect_fruits(&mut fruits, &characters);
        assert_eq!(collected, vec![(PlayerSlot::Two, EffectType::Mirror)]);
        assert_eq!(fruits.len(), 1);
        assert_eq!(fruits[0].effect, EffectType::Volcano);
    }

    #[test]
    fn box_moves_only_when_both_push() {
        let config = CoopConfig::default();
        let effects = EffectManager::default();
        let mut boxes = vec![CoopBox::new(Vec2::new(400.0, 300.0), 40.0, 60.0)];
        let characters = pair(Vec2::new(350.0, 280.0), Vec2::new(350.0, 320.0));
        let both_right = hold(&[InputKey::D, InputKey::Right]);

        let moved = push_boxes(&mut boxes, &characters, &[], &effects, &both_right, &config, 0.1);
        assert_eq!(moved, 1);
        assert!((boxes[0].position.x - 412.0).abs() < 1e-3);

        let one_right = hold(&[InputKey::D]);
        let before = boxes[0].position;
        push_boxes(&mut boxes, &characters, &[], &effects, &one_right, &config, 0.1);
        assert!(boxes[0].position.x > before.x, "half-speed when only one pushes");
        assert!((boxes[0].position.x - before.x - 6.0).abs() < 1e-3);
    }

    #[test]
    fn box_ignores_characters_out_of_range() {
        let config = CoopConfig::default();
        let effects = EffectManager::default();
        let mut boxes = vec![CoopBox::new(Vec2::new(400.0, 300.0), 40.0, 60.0)];
        let characters = pair(Vec2::new(350.0, 300.0), Vec2::new(100.0, 300.0));
        let moved = push_boxes(
            &mut boxes,
            &characters,
            &[],
            &effects,
            &hold(&[InputKey::D, InputKey::Right]),
            &config,
            0.1,
        );
        assert_eq!(moved, 0);
        assert_eq!(boxes[0].position, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn box_is_stopped_by_invisible_walls() {
        let config = CoopConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut effects = EffectManager::default();
        effects.apply(EffectType::InvisibleWall, PlayerSlot::One, &mut rng);
        assert!(effects.are_walls_invisible());

        let walls = [LaserWall::new(Rect::new(421.0, 0.0, 10.0, 600.0))];
        let mut boxes = vec![CoopBox::new(Vec2::new(400.0, 300.0), 40.0, 60.0)];
        let characters = pair(Vec2::new(350.0, 280.0), Vec2::new(350.0, 320.0));
        let moved = push_boxes(
            &mut boxes,
            &characters,
            &walls,
            &effects,
            &hold(&[InputKey::D, InputKey::Right]),
            &config,
            0.1,
        );
        assert_eq!(moved, 0);
    }

    #[test]
    fn dead_partner_cannot_push() {
        let config = CoopConfig::default();
        let effects = EffectManager::default();
        let mut boxes = vec![CoopBox::new(Vec2::new(400.0, 300.0), 40.0, 60.0)];
        let mut characters = pair(Vec2::new(350.0, 280.0), Vec2::new(350.0, 320.0));
        characters[1].kill(&config.hazards);
        let moved = push_boxes(
            &mut boxes,
            &characters,
            &[],
            &effects,
            &hold(&[InputKey::D, InputKey::Right]),
            &config,
            0.1,
        );
        assert_eq!(moved, 0);
    }
}
