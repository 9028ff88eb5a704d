//! Legal-move generation over the 0x88 board.
//!
//! Generation runs in three phases, all driven from
//! [`State::expand`](crate::board::State::expand):
//!
//! 1. pseudo-legal moves for every piece except castling,
//! 2. castling, with its own legality probes,
//! 3. a filter pass that discards successors leaving the mover's king
//!    capturable.
//!
//! Check detection ([`is_attacked`]) never goes through castling, so the
//! probe in phase 2 cannot re-enter it.

use arrayvec::ArrayVec;

use crate::board::{
    Board, Cell, CellFlags, Color, Move, PieceType, Square, State, DOWN, DOWN_LEFT, DOWN_RIGHT,
    LEFT, RIGHT, UP, UP_LEFT, UP_RIGHT,
};

mod pseudo_legal;

use pseudo_legal::ChildGenerator;

/// Maximum number of moves that could occur in a legal position, used for
/// stack-allocating a vector to hold moves.
///
/// The actual number appears to be 218 in this position:
///
/// R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNN1KB1 w - - 0 1
///
/// But 256 is a nice number and a good buffer in case there could be more.
pub const MAX_MOVES: usize = 256;

pub type MoveVec = ArrayVec<Move, MAX_MOVES>;

/// Promotion targets, in the order their children are emitted.
pub const POSSIBLE_PROMOTIONS: &[PieceType] = &[
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
];

pub(crate) const ROOK_DIRECTIONS: [i8; 4] = [LEFT, RIGHT, UP, DOWN];
pub(crate) const BISHOP_DIRECTIONS: [i8; 4] = [UP_LEFT, UP_RIGHT, DOWN_LEFT, DOWN_RIGHT];
pub(crate) const QUEEN_DIRECTIONS: [i8; 8] = [
    LEFT, RIGHT, UP, DOWN, UP_LEFT, UP_RIGHT, DOWN_LEFT, DOWN_RIGHT,
];

/// The eight knight jumps, as sums of cardinal steps.
pub(crate) const KNIGHT_JUMPS: [i8; 8] = [
    2 * UP + LEFT,
    2 * UP + RIGHT,
    2 * DOWN + LEFT,
    2 * DOWN + RIGHT,
    2 * LEFT + UP,
    2 * LEFT + DOWN,
    2 * RIGHT + UP,
    2 * RIGHT + DOWN,
];

/// Populates `state`'s children with every legal successor and sets its
/// check flag. Called exactly once per state, through the expansion latch.
pub(crate) fn expand_state(state: &mut State) {
    let to_move = state.to_move();
    let child_ply = state.ply() + 1;

    // En-passant eligibility expires exactly one ply after the double step:
    // any two-step marker still on the mover's own pawns is stale by now.
    expire_two_step_markers(state.board_mut(), to_move);

    let in_check = is_in_check(state.board(), to_move);

    let mut generator = ChildGenerator::new(*state.board(), to_move, child_ply);
    generator.generate();
    generate_castles(&mut generator, in_check);

    // Filter pass: a successor in which the mover's own king can be captured
    // was never legal in the first place.
    for child in generator.into_children() {
        if !is_in_check(child.board(), to_move) {
            state.push_child(child);
        }
    }

    state.set_check(in_check);
}

fn expire_two_step_markers(board: &mut Board, color: Color) {
    for square in Square::all() {
        let cell = board[square.index()];
        if cell.is_color(color) {
            board[square.index()] = cell.without_flags(CellFlags::PAWN_TWO_STEP);
        }
    }
}

/// Castling generation. Never invoked from check detection.
fn generate_castles(generator: &mut ChildGenerator, in_check: bool) {
    // No castling out of check
    if in_check {
        return;
    }

    let color = generator.to_move();
    let king = PieceType::King.with_color(color);
    let rook = PieceType::Rook.with_color(color);

    let king_squares: Vec<Square> = Square::all()
        .filter(|&square| {
            let cell = generator.board()[square.index()];
            cell.piece() == Some(king) && !cell.has_moved()
        })
        .collect();

    for from in king_squares {
        // Queenside: rook four files to the left. Kingside: three to the
        // right.
        for (rook_offset, dir) in [(4 * LEFT, LEFT), (3 * RIGHT, RIGHT)] {
            let Some(rook_square) = from.offset(rook_offset) else {
                continue;
            };
            let rook_cell = generator.board()[rook_square.index()];
            if rook_cell.piece() != Some(rook) || rook_cell.has_moved() {
                continue;
            }

            // Every square strictly between king and rook must be empty
            let mut clear = true;
            let mut square = from;
            loop {
                square = square.offset(dir).expect("walk from king to rook left the board");
                if square == rook_square {
                    break;
                }
                if !generator.board()[square.index()].is_empty() {
                    clear = false;
                    break;
                }
            }
            if !clear {
                continue;
            }

            // No castling through check: probe the square the king crosses
            // by walking it there on a scratch board.
            let transit = from.offset(dir).unwrap();
            let mut scratch = *generator.board();
            scratch[transit.index()] = scratch[from.index()];
            scratch[from.index()] = Cell::EMPTY;
            if is_in_check(&scratch, color) {
                continue;
            }

            // The king lands two squares towards the rook; the rook lands on
            // the square the king crossed. Castling into check is caught by
            // the filter pass.
            let king_to = transit.offset(dir).unwrap();
            generator.emit_castle(from, king_to, rook_square, transit);
        }
    }
}

/// Returns true iff `color`'s king is attacked. Total on any position: a
/// board without a `color` king is simply never in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    let king = PieceType::King.with_color(color);
    Square::all()
        .find(|&square| board[square.index()].piece() == Some(king))
        .is_some_and(|square| is_attacked(board, square, color.flip()))
}

/// Returns true iff a piece of `attacker` colour has a pseudo-legal capture
/// onto `target`. Castling never attacks anything and pawn pushes cannot
/// capture, so neither is considered.
pub fn is_attacked(board: &Board, target: Square, attacker: Color) -> bool {
    // Pawns: a white pawn attacks up-diagonally, so look down-diagonally
    // from the target square.
    let pawn = PieceType::Pawn.with_color(attacker);
    let pawn_steps = match attacker {
        Color::White => [DOWN_LEFT, DOWN_RIGHT],
        Color::Black => [UP_LEFT, UP_RIGHT],
    };
    for step in pawn_steps {
        if let Some(square) = target.offset(step) {
            if board[square.index()].piece() == Some(pawn) {
                return true;
            }
        }
    }

    // Knights
    let knight = PieceType::Knight.with_color(attacker);
    for jump in KNIGHT_JUMPS {
        if let Some(square) = target.offset(jump) {
            if board[square.index()].piece() == Some(knight) {
                return true;
            }
        }
    }

    // The enemy king
    let king = PieceType::King.with_color(attacker);
    for step in QUEEN_DIRECTIONS {
        if let Some(square) = target.offset(step) {
            if board[square.index()].piece() == Some(king) {
                return true;
            }
        }
    }

    // Sliders: walk each ray outwards until the first piece
    slider_on_ray(board, target, attacker, &ROOK_DIRECTIONS, PieceType::Rook)
        || slider_on_ray(board, target, attacker, &BISHOP_DIRECTIONS, PieceType::Bishop)
}

fn slider_on_ray(
    board: &Board,
    target: Square,
    attacker: Color,
    directions: &[i8],
    role: PieceType,
) -> bool {
    let slider = role.with_color(attacker);
    let queen = PieceType::Queen.with_color(attacker);

    for &dir in directions {
        let mut square = target;
        while let Some(next) = square.offset(dir) {
            square = next;
            let cell = board[square.index()];
            if cell.is_empty() {
                continue;
            }
            if cell.piece() == Some(slider) || cell.piece() == Some(queen) {
                return true;
            }
            break;
        }
    }
    false
}
