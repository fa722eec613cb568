use crate::input::InputSnapshot;

/// Default frame length for a 60 Hz clock-limited loop.
pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;

/// Core trait for a frame-driven simulation.
///
/// The platform layer samples input once per frame, calls `update`, then
/// reads state for drawing. Update and draw never interleave.
pub trait FrameSimulation {
    /// Notable things that happened during one update.
    type Event;

    /// Advance by `dt` seconds using this frame's input snapshot.
    fn update(&mut self, dt: f32, input: &InputSnapshot) -> Vec<Self::Event>;

    /// Encode the read-only view the draw phase consumes.
    fn serialize_state(&self) -> Vec<u8>;

    /// Whether the simulation is waiting for a restart action.
    fn is_terminal(&self) -> bool;

    /// Frame length the simulation was tuned for.
    fn frame_dt(&self) -> f32 {
        DEFAULT_FRAME_DT
    }
}
