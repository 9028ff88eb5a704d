use hrokur_core::board::{Color, GameState, State};
use rand::Rng;

/// Win/loss/draw counts produced by playouts, kept separate from the tree
/// node they will eventually be credited to so that workers never touch
/// shared state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlayoutTally {
    pub wins_white: u64,
    pub wins_black: u64,
    pub draws: u64,
}

impl PlayoutTally {
    pub const fn win(color: Color) -> Self {
        match color {
            Color::White => Self {
                wins_white: 1,
                wins_black: 0,
                draws: 0,
            },
            Color::Black => Self {
                wins_white: 0,
                wins_black: 1,
                draws: 0,
            },
        }
    }

    pub const fn draw() -> Self {
        Self {
            wins_white: 0,
            wins_black: 0,
            draws: 1,
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.wins_white += other.wins_white;
        self.wins_black += other.wins_black;
        self.draws += other.draws;
    }

    pub const fn total(&self) -> u64 {
        self.wins_white + self.wins_black + self.draws
    }
}

/// Plays one random game from `state`.
///
/// At each ply the legal successors are enumerated and one is chosen
/// uniformly. A side with no legal moves has lost if it is in check,
/// otherwise the game is a stalemate; a game still running after `ply_cap`
/// plies counts as a draw.
///
/// The walk owns `state` outright: advancing frees each abandoned sibling
/// subtree, so nothing the playout allocates outlives it.
pub fn playout(mut state: State, rng: &mut impl Rng, ply_cap: u32) -> PlayoutTally {
    for _ in 0..ply_cap {
        match state.game_state() {
            GameState::InPlay { .. } => {
                let index = rng.gen_range(0..state.children().len());
                state = state.advance(index);
            }
            GameState::Win(winner) => return PlayoutTally::win(winner),
            GameState::Stalemate => return PlayoutTally::draw(),
        }
    }
    PlayoutTally::draw()
}
