/// Knobs for the Monte-Carlo search, fixed at engine startup.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Number of playout workers fanned out per iteration. Each worker runs
    /// one playout per iteration on its own copy of the selected node.
    pub workers: usize,
    /// The exploration constant `C` in the UCB1 rule.
    pub exploration: f64,
    /// Playouts that reach this many plies without a result are scored as
    /// draws.
    pub playout_ply_cap: u32,
    /// Base seed for the per-worker generators. Worker `i` is seeded with
    /// `seed + i`. When absent, a seed is derived from the wall clock.
    pub seed: Option<u64>,
}

pub const DEFAULT_WORKERS: usize = 12;
pub const DEFAULT_EXPLORATION: f64 = 0.5;
pub const DEFAULT_PLAYOUT_PLY_CAP: u32 = 200;

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            exploration: DEFAULT_EXPLORATION,
            playout_ply_cap: DEFAULT_PLAYOUT_PLY_CAP,
            seed: None,
        }
    }
}
