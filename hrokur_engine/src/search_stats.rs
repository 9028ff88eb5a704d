use std::time::Duration;

/// Counters describing one search run.
#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    /// Completed select → simulate → backpropagate rounds.
    pub iterations: u64,
    /// Total playouts simulated, summed over all workers.
    pub playouts: u64,
    pub elapsed: Duration,
}

impl SearchStats {
    pub fn playouts_per_second(&self) -> f64 {
        if self.elapsed.is_zero() {
            0.0
        } else {
            self.playouts as f64 / self.elapsed.as_secs_f64()
        }
    }
}
