use std::fmt::{Debug, Display, Write};

use bitflags::bitflags;
use num_traits::FromPrimitive as _;

use super::{Piece, PieceType, Square};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MoveFlags: u32 {
        const CAPTURE          = 0b00001 << 27;
        const DOUBLE_PAWN_PUSH = 0b00010 << 27;
        const CASTLE           = 0b00100 << 27;
        const EN_PASSANT       = 0b01000 << 27;
        const VALID            = 0b10000 << 27;
    }
}

/// Move data, encoded as a 32-bit integer.
///
/// ```text
/// FFFFF_PPP CCCCCCCC 0TTTTTTT 0VVVVVVV
/// ^^^^^ ^^^ ^^^^^^^^  ^^^^^^^  ^^^^^^^
///     |   |        |        |        |
///     |   |        |        |        +-- from square (0x88 index)
///     |   |        |        +----------- to square (0x88 index)
///     |   |        +-------------------- moved piece byte
///     |   +----------------------------- promotion role (0 if none)
///     +--------------------------------- move flags
/// ```
///
/// The all-zero value is the null move, used as the `last_move` of a root
/// state; its [`MoveFlags::VALID`] bit is clear.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u32);

impl Move {
    /// The null move recorded on a root state.
    pub const NULL: Move = Move(0);

    /// Starts building a move from its three mandatory parts.
    pub const fn builder(from: Square, to: Square, piece: Piece) -> MoveBuilder {
        MoveBuilder {
            from,
            to,
            piece,
            promotion: None,
            flags: MoveFlags::VALID,
        }
    }

    pub const fn from_square(self) -> Square {
        // The masked byte always passes the 0x88 test for a move built by
        // MoveBuilder
        match Square::from_index((self.0 & 0x7F) as u8) {
            Some(square) => square,
            None => Square::A1,
        }
    }

    pub const fn to_square(self) -> Square {
        match Square::from_index(((self.0 >> 8) & 0x7F) as u8) {
            Some(square) => square,
            None => Square::A1,
        }
    }

    /// The piece that made this move (as it stood on the origin square).
    pub fn piece(self) -> Piece {
        Piece::try_from_u8(((self.0 >> 16) & 0xFF) as u8)
            .expect("invalid move representation encountered")
    }

    /// The role the moving pawn promoted to, if this was a promotion.
    pub fn promotion(self) -> Option<PieceType> {
        PieceType::from_u32((self.0 >> 24) & 0x07)
    }

    pub const fn flags(self) -> MoveFlags {
        MoveFlags::from_bits_truncate(self.0)
    }

    pub const fn is_valid(self) -> bool {
        MoveFlags::from_bits_retain(self.0).contains(MoveFlags::VALID)
    }

    pub const fn is_capture(self) -> bool {
        MoveFlags::from_bits_retain(self.0).contains(MoveFlags::CAPTURE)
    }

    pub const fn is_double_pawn_push(self) -> bool {
        MoveFlags::from_bits_retain(self.0).contains(MoveFlags::DOUBLE_PAWN_PUSH)
    }

    pub const fn is_castle(self) -> bool {
        MoveFlags::from_bits_retain(self.0).contains(MoveFlags::CASTLE)
    }

    pub const fn is_en_passant(self) -> bool {
        MoveFlags::from_bits_retain(self.0).contains(MoveFlags::EN_PASSANT)
    }

    /// The raw encoded form, as stored in saved games.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Reconstitutes a move from its raw encoded form.
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    /// Returns true if `text` names this move, ignoring ASCII case.
    ///
    /// The canonical renders are `e2e4` for a pawn move, `e7e8Q` for a
    /// promotion, and `Ng1f3` for anything else; this accepts any casing of
    /// those.
    pub fn matches_text(self, text: &str) -> bool {
        self.is_valid() && self.to_string().eq_ignore_ascii_case(text.trim())
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_valid() {
            return f.write_str("0000");
        }

        let role = self.piece().piece_type();
        if role != PieceType::Pawn {
            f.write_char(role.as_uppercase_char())?;
        }
        write!(f, "{}{}", self.from_square(), self.to_square())?;
        if let Some(promotion) = self.promotion() {
            f.write_char(promotion.as_uppercase_char())?;
        }
        Ok(())
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Move({self}")?;
        if self.is_capture() {
            f.write_str(" x")?;
        }
        if self.is_en_passant() {
            f.write_str(" ep")?;
        }
        if self.is_castle() {
            f.write_str(" castle")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MoveBuilder {
    from: Square,
    to: Square,
    piece: Piece,
    promotion: Option<PieceType>,
    flags: MoveFlags,
}

impl MoveBuilder {
    pub const fn captures(mut self) -> Self {
        self.flags = self.flags.union(MoveFlags::CAPTURE);
        self
    }

    pub const fn promotes_to(mut self, role: PieceType) -> Self {
        self.promotion = Some(role);
        self
    }

    pub const fn is_double_pawn_push(mut self) -> Self {
        self.flags = self.flags.union(MoveFlags::DOUBLE_PAWN_PUSH);
        self
    }

    pub const fn is_castle(mut self) -> Self {
        self.flags = self.flags.union(MoveFlags::CASTLE);
        self
    }

    pub const fn is_en_passant(mut self) -> Self {
        // An en passant capture is still a capture
        self.flags = self.flags.union(MoveFlags::EN_PASSANT.union(MoveFlags::CAPTURE));
        self
    }

    pub const fn build(self) -> Move {
        let from = self.from.get() as u32;
        let to = (self.to.get() as u32) << 8;
        let piece = (self.piece.get() as u32) << 16;
        let promotion = (match self.promotion {
            Some(role) => role as u32,
            None => 0,
        }) << 24;
        let flags = self.flags.bits();

        Move(flags | promotion | piece | to | from)
    }
}
