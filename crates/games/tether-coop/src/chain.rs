//! Elastic tether between the two characters.
//!
//! Bounded relaxation, not a solve to convergence: each pass pulls the
//! anchors back to the maximum length, then clamps to the play field.
//! Walls are not re-checked here, so a strong pull can drag a living
//! character across a wall without killing it. Boxes are not checked
//! either; a character pulled into one can only walk back out of it (see
//! `Character::update_movement`).

use glam::Vec2;
use tether_core::geometry::Bounds;

use crate::character::Character;

/// Run `iterations` correction passes between `a` and `b`.
///
/// Both alive: each moves half the excess toward the other. One dead: only
/// the living one moves, by the full excess, toward the body. Both dead:
/// nothing to do.
pub fn resolve_chain(
    a: &mut Character,
    b: &mut Character,
    max_length: f32,
    iterations: u32,
    bounds: Bounds,
) {
    for _ in 0..iterations {
        match (a.is_alive, b.is_alive) {
            (true, true) => {
                let delta = b.position - a.position;
                let Some(correction) = excess_along(delta, max_length) else {
                    continue;
                };
                a.position = bounds.clamp_inset(a.position + correction * 0.5, a.half_extent);
                b.position = bounds.clamp_inset(b.position - correction * 0.5, b.half_extent);
            },
            (true, false) => pull_toward(a, b.anchor(), max_length, bounds),
            (false, true) => pull_toward(b, a.anchor(), max_length, bounds),
            (false, false) => return,
        }
    }
}

fn pull_toward(living: &mut Character, anchor: Vec2, max_length: f32, bounds: Bounds) {
    if let Some(correction) = excess_along(anchor - living.position, max_length) {
        living.position = bounds.clamp_inset(living.position + correction, living.half_extent);
    }
}

/// Vector of length `|delta| - max_length` along `delta`, or `None` when the
/// tether is slack or the direction is undefined.
fn excess_along(delta: Vec2, max_length: f32) -> Option<Vec2> {
    let distance = delta.length();
    if !distance.is_finite() || distance == 0.0 || distance <= max_length {
        return None;
    }
    Some(delta * ((distance - max_length) / distance))
}
