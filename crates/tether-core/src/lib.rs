pub mod effect;
pub mod geometry;
pub mod input;
pub mod player;
pub mod render;
pub mod sim_trait;

pub use glam::Vec2;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::input::{InputKey, InputSnapshot};
    use crate::sim_trait::FrameSimulation;

    /// Snapshot with the given keys held.
    pub fn hold(keys: &[InputKey]) -> InputSnapshot {
        InputSnapshot::from_keys(keys.iter().copied())
    }

    /// Run `n` frames with the same input, returning all accumulated events.
    pub fn run_frames<S: FrameSimulation + ?Sized>(
        sim: &mut S,
        n: usize,
        dt: f32,
        input: &InputSnapshot,
    ) -> Vec<S::Event> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(sim.update(dt, input));
        }
        all_events
    }

    // ================================================================
    // Simulation contract tests
    // ================================================================
    // Every FrameSimulation implementation must pass these. Game crates
    // call them from their own #[cfg(test)] modules with a concrete
    // simulation and an input that moves something.

    /// serialize_state() must return non-empty bytes.
    pub fn contract_serialize_non_empty<S: FrameSimulation + ?Sized>(sim: &S) {
        assert!(
            !sim.serialize_state().is_empty(),
            "serialize_state() must return non-empty bytes"
        );
    }

    /// An update with a moving input must change the serialized state.
    pub fn contract_input_changes_state<S: FrameSimulation + ?Sized>(
        sim: &mut S,
        moving_input: &InputSnapshot,
    ) {
        let dt = sim.frame_dt();
        let before = sim.serialize_state();
        sim.update(dt, moving_input);
        let after = sim.serialize_state();
        assert_ne!(before, after, "State must change after a moving update");
    }

    /// A zero-length frame with no input must not change anything.
    pub fn contract_zero_dt_is_stable<S: FrameSimulation + ?Sized>(sim: &mut S) {
        let before = sim.serialize_state();
        sim.update(0.0, &InputSnapshot::new());
        let after = sim.serialize_state();
        assert_eq!(before, after, "update(0.0) with no input must be a no-op");
    }

    /// Once terminal, updates must leave the state untouched.
    pub fn contract_terminal_is_frozen<S: FrameSimulation + ?Sized>(
        sim: &mut S,
        moving_input: &InputSnapshot,
    ) {
        assert!(sim.is_terminal(), "contract requires a terminal simulation");
        let dt = sim.frame_dt();
        let before = sim.serialize_state();
        sim.update(dt, moving_input);
        let after = sim.serialize_state();
        assert_eq!(before, after, "Terminal simulation must not advance");
    }
}
