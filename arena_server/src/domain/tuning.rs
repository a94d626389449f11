/// Gameplay tuning for a room's simulation.
///
/// Keep this separate from runtime/server configuration (tick timeouts, queue sizes, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimTuning {
    /// Cells each snake occupies when a match starts.
    pub initial_length: usize,
    /// Doodahs kept on the grid; eaten ones are replaced at the end of the tick.
    pub doodah_count: usize,
    /// Score added per doodah eaten.
    pub doodah_reward: u32,
}

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            initial_length: 1,
            doodah_count: 1,
            doodah_reward: 1,
        }
    }
}
