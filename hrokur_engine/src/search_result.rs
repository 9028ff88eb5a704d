use hrokur_core::board::{Move, State};

use crate::search_stats::SearchStats;

/// What a finished (or stopped) search hands back to its caller.
#[derive(Debug)]
pub struct SearchResult {
    /// The searched copy of the root, statistics and expanded tree
    /// included. The caller typically adopts this as its new current state.
    pub root: State,
    /// The most-simulated root move, if the tree grew at all.
    pub best_move: Option<Move>,
    pub stats: SearchStats,
}
