use thiserror::Error;

use super::{Board, Cell, CellFlags, Color, Move, Piece, PieceType, Square, State, DOWN, UP};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenParseError {
    #[error("expected 6 fields, found {0}")]
    WrongFieldCount(usize),
    #[error("invalid piece placement field")]
    InvalidPlacement,
    #[error("invalid side to move `{0}`")]
    InvalidSideToMove(String),
    #[error("invalid castling field `{0}`")]
    InvalidCastling(String),
    #[error("invalid en passant field `{0}`")]
    InvalidEnPassant(String),
    #[error("invalid move counter `{0}`")]
    InvalidCounter(String),
}

pub(super) fn try_parse_fen(fen: &str) -> Result<State, FenParseError> {
    let fields: Vec<_> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(FenParseError::WrongFieldCount(fields.len()));
    }
    let placement = fields[0];
    let to_move = fields[1];
    let castling = fields[2];
    let en_passant = fields[3];
    let fullmoves = fields[5];
    // fields[4] is the halfmove clock; the fifty-move rule is out of scope
    // so the value is accepted and dropped.

    let mut board = super::EMPTY_BOARD;

    let ranks: Vec<_> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenParseError::InvalidPlacement);
    }

    for (rank_index, rank_pieces) in ranks.into_iter().enumerate() {
        let rank = 7 - rank_index as u8;
        let mut file = 0;
        for char in rank_pieces.chars() {
            if file >= 8 {
                return Err(FenParseError::InvalidPlacement);
            }

            if let Some(digit) = char.to_digit(10) {
                file += digit as u8;
            } else {
                let piece =
                    Piece::try_from_fen_char(char).ok_or(FenParseError::InvalidPlacement)?;
                board[Square::new_unchecked(rank, file).index()] = Cell::from_piece(piece);
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenParseError::InvalidPlacement);
        }
    }

    let to_move = match to_move {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenParseError::InvalidSideToMove(other.to_owned())),
    };

    apply_castling_rights(&mut board, castling)?;

    if en_passant != "-" {
        let square: Square = en_passant
            .parse()
            .map_err(|_| FenParseError::InvalidEnPassant(en_passant.to_owned()))?;
        // The en-passant square sits behind the pawn that just
        // double-stepped: rank 2 after a white push, rank 5 after a black
        // one.
        let pawn_square = match square.rank() {
            2 => square.offset(UP),
            5 => square.offset(DOWN),
            _ => None,
        }
        .ok_or_else(|| FenParseError::InvalidEnPassant(en_passant.to_owned()))?;

        let cell = board[pawn_square.index()];
        if cell.role() == Some(PieceType::Pawn) {
            board[pawn_square.index()] = cell
                .with_flags(CellFlags::PAWN_TWO_STEP)
                .with_flags(CellFlags::PIECE_MOVED);
        }
    }

    let fullmoves: u32 = fullmoves
        .parse()
        .map_err(|_| FenParseError::InvalidCounter(fullmoves.to_owned()))?;

    let ply = fullmoves.max(1).saturating_sub(1) * 2 + to_move.index() as u32;

    Ok(State::from_parts(board, ply, Move::NULL))
}

/// Marks every king and rook as already moved, then clears the flag back off
/// the pairs that a castling right vouches for.
fn apply_castling_rights(board: &mut Board, castling: &str) -> Result<(), FenParseError> {
    for square in Square::all() {
        let cell = board[square.index()];
        if matches!(cell.role(), Some(PieceType::King) | Some(PieceType::Rook)) {
            board[square.index()] = cell.with_flags(CellFlags::PIECE_MOVED);
        }
    }

    if castling == "-" {
        return Ok(());
    }

    for c in castling.chars() {
        let (king_square, rook_square, color) = match c {
            'K' => (Square::E1, Square::H1, Color::White),
            'Q' => (Square::E1, Square::A1, Color::White),
            'k' => (Square::E8, Square::H8, Color::Black),
            'q' => (Square::E8, Square::A8, Color::Black),
            _ => return Err(FenParseError::InvalidCastling(castling.to_owned())),
        };

        let king = board[king_square.index()];
        let rook = board[rook_square.index()];
        if king.piece() == Some(PieceType::King.with_color(color))
            && rook.piece() == Some(PieceType::Rook.with_color(color))
        {
            board[king_square.index()] = king.without_flags(CellFlags::PIECE_MOVED);
            board[rook_square.index()] = rook.without_flags(CellFlags::PIECE_MOVED);
        }
    }

    Ok(())
}

pub(super) fn state_to_fen(state: &State) -> String {
    let mut result = String::new();

    for rank in (0..8).rev() {
        let mut empty_squares = 0;
        for file in 0..8 {
            let square = Square::new_unchecked(rank, file);
            match state.cell(square).piece() {
                None => empty_squares += 1,
                Some(piece) => {
                    if empty_squares > 0 {
                        result.push((empty_squares + b'0') as _);
                    }
                    result.push(piece.as_fen_char());
                    empty_squares = 0;
                }
            }
        }
        if empty_squares > 0 {
            result.push((empty_squares + b'0') as _);
        }
        if rank > 0 {
            result.push('/');
        }
    }

    result.push(' ');
    result.push(if state.to_move().is_white() { 'w' } else { 'b' });
    result.push(' ');
    result.push_str(&castling_field(state));
    result.push(' ');
    match en_passant_square(state) {
        Some(square) => result.push_str(&square.to_string()),
        None => result.push('-'),
    }

    // The halfmove clock is not tracked; render it as zero.
    result.push_str(" 0 ");
    result.push_str(&(state.ply() / 2 + 1).to_string());

    result
}

fn castling_field(state: &State) -> String {
    let mut result = String::new();

    let pairs = [
        ('K', Square::E1, Square::H1, Color::White),
        ('Q', Square::E1, Square::A1, Color::White),
        ('k', Square::E8, Square::H8, Color::Black),
        ('q', Square::E8, Square::A8, Color::Black),
    ];

    for (symbol, king_square, rook_square, color) in pairs {
        let king = state.cell(king_square);
        let rook = state.cell(rook_square);
        if king.piece() == Some(PieceType::King.with_color(color))
            && !king.has_moved()
            && rook.piece() == Some(PieceType::Rook.with_color(color))
            && !rook.has_moved()
        {
            result.push(symbol);
        }
    }

    if result.is_empty() {
        result.push('-');
    }
    result
}

/// The square a capturing pawn would land on, if the opponent's previous
/// move was a double pawn push.
fn en_passant_square(state: &State) -> Option<Square> {
    let opponent = state.to_move().flip();
    for square in Square::all() {
        let cell = state.cell(square);
        if cell.just_double_stepped() && cell.is_color(opponent) {
            let behind = if opponent.is_white() { DOWN } else { UP };
            return square.offset(behind);
        }
    }
    None
}
