use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Marker for game-specific timed effect kinds. Durations come from the
/// game's configuration, not the kind.
pub trait EffectKind: Clone + Copy + PartialEq + Serialize + DeserializeOwned {}

/// Countdown for one applied effect, generic over the kind enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ActiveEffect<K: EffectKind> {
    pub kind: K,
    pub remaining: f32,
}

impl<K: EffectKind> ActiveEffect<K> {
    pub fn new(kind: K, duration: f32) -> Self {
        Self {
            kind,
            remaining: duration,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.remaining.is_finite() {
            self.remaining -= dt;
        }
    }

    /// Restart the countdown at `duration`. Re-applying never stacks.
    pub fn refresh(&mut self, duration: f32) {
        self.remaining = duration;
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}
