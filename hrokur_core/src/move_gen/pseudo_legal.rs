use crate::board::{
    Board, Cell, CellFlags, Color, Move, PieceType, Square, State, DOWN, LEFT, RIGHT, UP,
};

use super::{BISHOP_DIRECTIONS, KNIGHT_JUMPS, POSSIBLE_PROMOTIONS, QUEEN_DIRECTIONS, ROOK_DIRECTIONS};

/// Builds pseudo-legal successor states for one side of one position.
///
/// "Pseudo-legal" means movement rules only: successors that expose their
/// own king are still present and are removed by the caller's filter pass.
/// Castling is not generated here; the check probes it needs would otherwise
/// make generation re-entrant.
pub(super) struct ChildGenerator {
    board: Board,
    to_move: Color,
    child_ply: u32,
    out: Vec<State>,
}

impl ChildGenerator {
    pub(super) fn new(board: Board, to_move: Color, child_ply: u32) -> Self {
        Self {
            board,
            to_move,
            child_ply,
            out: Vec::new(),
        }
    }

    pub(super) const fn board(&self) -> &Board {
        &self.board
    }

    pub(super) const fn to_move(&self) -> Color {
        self.to_move
    }

    pub(super) fn into_children(self) -> Vec<State> {
        self.out
    }

    /// Phase A: every move except castling, in board scan order.
    pub(super) fn generate(&mut self) {
        for from in Square::all() {
            let cell = self.board[from.index()];
            if !cell.is_color(self.to_move) {
                continue;
            }

            match cell.role().unwrap() {
                PieceType::Pawn => self.pawn_moves(from),
                PieceType::Rook => self.slider_moves(from, &ROOK_DIRECTIONS),
                PieceType::Bishop => self.slider_moves(from, &BISHOP_DIRECTIONS),
                PieceType::Queen => self.slider_moves(from, &QUEEN_DIRECTIONS),
                PieceType::King => self.step_moves(from, &QUEEN_DIRECTIONS),
                PieceType::Knight => self.step_moves(from, &KNIGHT_JUMPS),
            }
        }
    }

    fn slider_moves(&mut self, from: Square, directions: &[i8]) {
        for &dir in directions {
            let mut square = from;
            while let Some(next) = square.offset(dir) {
                square = next;
                let target = self.board[square.index()];
                if target.is_empty() {
                    self.emit_simple(from, square, false);
                } else {
                    if target.is_color(self.to_move.flip()) {
                        self.emit_simple(from, square, true);
                    }
                    break;
                }
            }
        }
    }

    fn step_moves(&mut self, from: Square, offsets: &[i8]) {
        for &offset in offsets {
            let Some(to) = from.offset(offset) else {
                continue;
            };
            let target = self.board[to.index()];
            if target.is_empty() {
                self.emit_simple(from, to, false);
            } else if target.is_color(self.to_move.flip()) {
                self.emit_simple(from, to, true);
            }
        }
    }

    fn pawn_moves(&mut self, from: Square) {
        let (forward, start_rank, en_passant_rank, promotion_rank) = match self.to_move {
            Color::White => (UP, 1, 4, 7),
            Color::Black => (DOWN, 6, 3, 0),
        };

        // Pushes
        if let Some(to) = from.offset(forward) {
            if self.board[to.index()].is_empty() {
                if to.rank() == promotion_rank {
                    self.emit_promotions(from, to, false);
                } else {
                    self.emit_simple(from, to, false);
                }

                if from.rank() == start_rank {
                    if let Some(landing) = to.offset(forward) {
                        if self.board[landing.index()].is_empty() {
                            self.emit_double_push(from, landing);
                        }
                    }
                }
            }
        }

        // Captures, including en passant
        for side in [LEFT, RIGHT] {
            let Some(to) = from.offset(forward + side) else {
                continue;
            };
            let target = self.board[to.index()];

            if target.is_color(self.to_move.flip()) {
                if to.rank() == promotion_rank {
                    self.emit_promotions(from, to, true);
                } else {
                    self.emit_simple(from, to, true);
                }
            } else if target.is_empty() && from.rank() == en_passant_rank {
                // The victim stands beside the mover, one step in the
                // diagonal's file direction, and must have double-stepped on
                // the previous ply.
                let Some(beside) = from.offset(side) else {
                    continue;
                };
                let victim = self.board[beside.index()];
                if victim.is_color(self.to_move.flip()) && victim.just_double_stepped() {
                    self.emit_en_passant(from, to, beside);
                }
            }
        }
    }

    /// A move that relocates one piece, capturing whatever stood on `to`.
    fn emit_simple(&mut self, from: Square, to: Square, captures: bool) {
        let piece = self.board[from.index()].piece().unwrap();

        let mut builder = Move::builder(from, to, piece);
        if captures {
            builder = builder.captures();
        }

        let mut board = self.board;
        board[from.index()] = Cell::EMPTY;
        board[to.index()] = Cell::from_piece(piece).with_flags(CellFlags::PIECE_MOVED);
        self.push(board, builder.build());
    }

    fn emit_double_push(&mut self, from: Square, to: Square) {
        let piece = self.board[from.index()].piece().unwrap();

        let mut board = self.board;
        board[from.index()] = Cell::EMPTY;
        board[to.index()] = Cell::from_piece(piece)
            .with_flags(CellFlags::PIECE_MOVED.union(CellFlags::PAWN_TWO_STEP));
        self.push(
            board,
            Move::builder(from, to, piece).is_double_pawn_push().build(),
        );
    }

    fn emit_en_passant(&mut self, from: Square, to: Square, victim: Square) {
        let piece = self.board[from.index()].piece().unwrap();

        let mut board = self.board;
        board[from.index()] = Cell::EMPTY;
        board[victim.index()] = Cell::EMPTY;
        board[to.index()] = Cell::from_piece(piece).with_flags(CellFlags::PIECE_MOVED);
        self.push(
            board,
            Move::builder(from, to, piece).is_en_passant().build(),
        );
    }

    /// One child per promotion target. The destination keeps the pawn's
    /// colour and is marked moved; only its role bits are rewritten.
    fn emit_promotions(&mut self, from: Square, to: Square, captures: bool) {
        let piece = self.board[from.index()].piece().unwrap();

        for &role in POSSIBLE_PROMOTIONS {
            let mut builder = Move::builder(from, to, piece).promotes_to(role);
            if captures {
                builder = builder.captures();
            }

            let mut board = self.board;
            board[from.index()] = Cell::EMPTY;
            board[to.index()] = Cell::from_piece(role.with_color(self.to_move))
                .with_flags(CellFlags::PIECE_MOVED);
            self.push(board, builder.build());
        }
    }

    /// Phase B hands finished castle positions in through here so that all
    /// children flow through one place.
    pub(super) fn emit_castle(
        &mut self,
        king_from: Square,
        king_to: Square,
        rook_from: Square,
        rook_to: Square,
    ) {
        let king = self.board[king_from.index()].piece().unwrap();
        let rook = self.board[rook_from.index()].piece().unwrap();

        let mut board = self.board;
        board[king_from.index()] = Cell::EMPTY;
        board[rook_from.index()] = Cell::EMPTY;
        board[king_to.index()] = Cell::from_piece(king).with_flags(CellFlags::PIECE_MOVED);
        board[rook_to.index()] = Cell::from_piece(rook).with_flags(CellFlags::PIECE_MOVED);
        self.push(
            board,
            Move::builder(king_from, king_to, king).is_castle().build(),
        );
    }

    fn push(&mut self, board: Board, last_move: Move) {
        self.out.push(State::from_parts(board, self.child_ply, last_move));
    }
}
