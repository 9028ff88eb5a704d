use std::{
    fmt::{Debug, Display, Write},
    num::NonZeroU8,
    str::FromStr,
};

use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

/// Represents the role of a piece, but not its colour.
///
/// Roles are assigned integers 1-6, so that they fit in the low 3 bits of a
/// board cell, and also that 0 is left free to mean an empty cell -- this
/// doubles as letting Rust optimise [`Option<PieceType>`] to use the value 0
/// for [`None`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum PieceType {
    Pawn = 1,
    Rook = 2,
    Knight = 3,
    Bishop = 4,
    Queen = 5,
    King = 6,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        Self::Pawn,
        Self::Rook,
        Self::Knight,
        Self::Bishop,
        Self::Queen,
        Self::King,
    ];

    /// Convenience method for constructing a white [`Piece`].
    pub const fn white(self) -> Piece {
        Piece::white(self)
    }

    /// Convenience method for constructing a black [`Piece`].
    pub const fn black(self) -> Piece {
        Piece::black(self)
    }

    /// Convenience method for constructing a [`Piece`] with the supplied
    /// [`Color`].
    pub const fn with_color(self, color: Color) -> Piece {
        Piece::new(color, self)
    }

    /// Get the FEN representation of the white version of this piece.
    pub const fn as_uppercase_char(self) -> char {
        match self {
            PieceType::Pawn => 'P',
            PieceType::Rook => 'R',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }

    /// Get the FEN representation of the black version of this piece.
    pub const fn as_lowercase_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Rook => 'r',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    pub const fn index(self) -> usize {
        self as usize - 1
    }
}

/// Convenience aliases.
impl PieceType {
    pub const P: Self = Self::Pawn;
    pub const R: Self = Self::Rook;
    pub const N: Self = Self::Knight;
    pub const B: Self = Self::Bishop;
    pub const Q: Self = Self::Queen;
    pub const K: Self = Self::King;
}

impl From<Piece> for PieceType {
    fn from(value: Piece) -> Self {
        value.piece_type()
    }
}

/// Represents a player in a chess game (either white or black).
///
/// Uses 0 for white and 0x80 for black, matching the colour bit of the board
/// cell encoding, such that a [`Piece`] is simply a bitwise or of the
/// [`Color`] and [`PieceType`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    White = 0,
    Black = 0x80,
}

impl Color {
    /// Returns true if this is [`Color::White`].
    pub const fn is_white(self) -> bool {
        match self {
            Color::White => true,
            Color::Black => false,
        }
    }

    /// Returns true if this is [`Color::Black`].
    pub const fn is_black(self) -> bool {
        !self.is_white()
    }

    /// Inverts the color, i.e. maps [`Color::White`] to [`Color::Black`] and
    /// vice versa.
    pub const fn flip(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

bitflags! {
    /// Per-cell status bits stored alongside the piece in a board cell.
    ///
    /// Bits 3-4 of the cell are reserved and always zero.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        /// Set on a pawn immediately after it has made its two-square
        /// advance. Consumed by en-passant generation on the opponent's next
        /// ply and cleared again right after.
        const PAWN_TWO_STEP = 1 << 5;
        /// Set once a piece has moved off its starting square. Denies
        /// castling rights when set on a king or rook.
        const PIECE_MOVED = 1 << 6;
        /// Set for black pieces. Meaningless on an empty cell.
        const BLACK = 1 << 7;
    }
}

/// Represents a piece in a chess game: a role plus a colour.
///
/// Internal representation is a bitwise-or of the [`Color`] bit and the
/// [`PieceType`] role bits. Since [`PieceType`] can never be 0, Rust can
/// optimise the [`None`] of an [`Option<Piece>`] to be represented by 0.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Piece(NonZeroU8);

impl Piece {
    /// Constructs a [`Piece`] from a [`Color`] and a [`PieceType`].
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        // Safety: piece_type as u8 can never be 0
        unsafe { Self(NonZeroU8::new_unchecked(color as u8 | piece_type as u8)) }
    }

    /// Convenience method for constructing a white [`Piece`] from a
    /// [`PieceType`].
    pub const fn white(piece_type: PieceType) -> Self {
        Self::new(Color::White, piece_type)
    }

    /// Convenience method for constructing a black [`Piece`] from a
    /// [`PieceType`].
    pub const fn black(piece_type: PieceType) -> Self {
        Self::new(Color::Black, piece_type)
    }

    /// Constructs a [`Piece`] from its byte representation, ignoring the
    /// per-cell status bits.
    ///
    /// Returns [`None`] if the role bits do not name a piece (0 or 7), so
    /// this can also be used to construct an [`Option<Piece>`] from a raw
    /// board cell.
    pub const fn try_from_u8(value: u8) -> Option<Self> {
        let value = value & 0x87;
        if value & 0x07 == 0 || value & 0x07 == 7 {
            None
        } else {
            // Safety: if value was 0, then value & 0x07 == 0, so we wouldn't
            // get to this branch
            unsafe { Some(Self(NonZeroU8::new_unchecked(value))) }
        }
    }

    /// Returns the [`Color`] of this piece.
    pub const fn color(self) -> Color {
        if self.0.get() & 0x80 > 0 {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Returns if this piece is white.
    pub const fn is_white(self) -> bool {
        self.color().is_white()
    }

    /// Returns if this piece is black.
    pub const fn is_black(self) -> bool {
        self.color().is_black()
    }

    /// Returns the [`PieceType`] of this piece.
    pub const fn piece_type(self) -> PieceType {
        match self.0.get() & 0x07 {
            1 => PieceType::Pawn,
            2 => PieceType::Rook,
            3 => PieceType::Knight,
            4 => PieceType::Bishop,
            5 => PieceType::Queen,
            6 => PieceType::King,
            // self.0 is an OR of Color (0 or 0x80) and PieceType (1-6), so
            // the masked value is always a role
            _ => unreachable!(),
        }
    }

    /// Returns the internal byte representation of this piece.
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    pub const fn as_fen_char(self) -> char {
        if self.color().is_white() {
            self.piece_type().as_uppercase_char()
        } else {
            self.piece_type().as_lowercase_char()
        }
    }

    pub fn as_unicode_char(self) -> char {
        let base = match self.color() {
            Color::White => 0x2654,
            Color::Black => 0x265a,
        };
        let offset = match self.piece_type() {
            PieceType::Pawn => 5,
            PieceType::Knight => 4,
            PieceType::Bishop => 3,
            PieceType::Rook => 2,
            PieceType::Queen => 1,
            PieceType::King => 0,
        };
        char::from_u32(base + offset).unwrap()
    }

    pub const fn try_from_fen_char(c: char) -> Option<Self> {
        let piece_type = match c.to_ascii_uppercase() {
            'P' => PieceType::Pawn,
            'R' => PieceType::Rook,
            'N' => PieceType::Knight,
            'B' => PieceType::Bishop,
            'Q' => PieceType::Queen,
            'K' => PieceType::King,
            _ => return None,
        };

        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };

        Some(Self::new(color, piece_type))
    }
}

/// Convenient constants for specifying specific pieces.
impl Piece {
    pub const WHITE_PAWN: Piece = Piece::new(Color::White, PieceType::Pawn);
    pub const WHITE_ROOK: Piece = Piece::new(Color::White, PieceType::Rook);
    pub const WHITE_KNIGHT: Piece = Piece::new(Color::White, PieceType::Knight);
    pub const WHITE_BISHOP: Piece = Piece::new(Color::White, PieceType::Bishop);
    pub const WHITE_QUEEN: Piece = Piece::new(Color::White, PieceType::Queen);
    pub const WHITE_KING: Piece = Piece::new(Color::White, PieceType::King);
    pub const BLACK_PAWN: Piece = Piece::new(Color::Black, PieceType::Pawn);
    pub const BLACK_ROOK: Piece = Piece::new(Color::Black, PieceType::Rook);
    pub const BLACK_KNIGHT: Piece = Piece::new(Color::Black, PieceType::Knight);
    pub const BLACK_BISHOP: Piece = Piece::new(Color::Black, PieceType::Bishop);
    pub const BLACK_QUEEN: Piece = Piece::new(Color::Black, PieceType::Queen);
    pub const BLACK_KING: Piece = Piece::new(Color::Black, PieceType::King);
}

impl Debug for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Piece")
            .field("color", &self.color())
            .field("piece_type", &self.piece_type())
            .finish()
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char(self.as_fen_char())
    }
}

impl FromStr for Piece {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 1 {
            s.chars()
                .next()
                .and_then(Piece::try_from_fen_char)
                .ok_or(())
        } else {
            Err(())
        }
    }
}

impl From<(Color, PieceType)> for Piece {
    fn from((color, piece_type): (Color, PieceType)) -> Self {
        Self::new(color, piece_type)
    }
}

/// A single cell of the 0x88 board.
///
/// The byte layout is:
///
/// ```text
/// bit  7        6            5              4 3   2 1 0
///      BLACK    PIECE_MOVED  PAWN_TWO_STEP  (0)   role
/// ```
///
/// Role 0 means the cell is empty; the flag bits are only meaningful when a
/// piece is present. The empty cell is exactly the zero byte, which is what
/// makes the full 128-byte board array well-defined for off-board reads.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cell(u8);

impl Cell {
    pub const EMPTY: Cell = Cell(0);

    /// Constructs an occupied cell with no status flags set.
    pub const fn from_piece(piece: Piece) -> Self {
        Self(piece.get())
    }

    /// Reconstitutes a cell from its raw byte, e.g. from a saved game.
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Returns the raw byte of this cell.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns true if no piece stands on this cell.
    pub const fn is_empty(self) -> bool {
        self.0 & 0x07 == 0
    }

    /// Returns the piece on this cell, if any, without its status flags.
    pub const fn piece(self) -> Option<Piece> {
        Piece::try_from_u8(self.0)
    }

    /// Returns the role of the piece on this cell, if any.
    pub fn role(self) -> Option<PieceType> {
        PieceType::from_u8(self.0 & 0x07)
    }

    /// Returns the colour of the piece on this cell. An empty cell is
    /// neither white nor black.
    pub const fn color(self) -> Option<Color> {
        match self.piece() {
            Some(piece) => Some(piece.color()),
            None => None,
        }
    }

    /// Returns true if this cell holds a piece of the given colour. Empty
    /// cells answer false for both colours.
    pub fn is_color(self, color: Color) -> bool {
        self.color() == Some(color)
    }

    /// Returns the status flags of this cell.
    pub const fn flags(self) -> CellFlags {
        CellFlags::from_bits_truncate(self.0)
    }

    /// Returns this cell with the given flags added.
    pub const fn with_flags(self, flags: CellFlags) -> Self {
        Self(self.0 | flags.bits())
    }

    /// Returns this cell with the given flags removed.
    pub const fn without_flags(self, flags: CellFlags) -> Self {
        Self(self.0 & !flags.bits())
    }

    /// Returns true if the piece on this cell has left its starting square.
    pub const fn has_moved(self) -> bool {
        self.0 & CellFlags::PIECE_MOVED.bits() != 0
    }

    /// Returns true if this cell holds a pawn that advanced two squares on
    /// the immediately preceding ply.
    pub fn just_double_stepped(self) -> bool {
        self.role() == Some(PieceType::Pawn) && self.0 & CellFlags::PAWN_TWO_STEP.bits() != 0
    }
}

impl From<Piece> for Cell {
    fn from(piece: Piece) -> Self {
        Self::from_piece(piece)
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.piece() {
            Some(piece) => f
                .debug_struct("Cell")
                .field("piece", &piece)
                .field("flags", &self.flags())
                .finish(),
            None => f.write_str("Cell(empty)"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL_PIECE_TYPES: &[PieceType] = &[
        PieceType::Pawn,
        PieceType::Rook,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Queen,
        PieceType::King,
    ];

    const ALL_COLORS: &[Color] = &[Color::White, Color::Black];

    #[test]
    fn piece_type_role_bits() {
        // The role encoding is load-bearing for the cell layout: 1-6 with 0
        // reserved for the empty cell.
        assert_eq!(PieceType::Pawn as u8, 1);
        assert_eq!(PieceType::Rook as u8, 2);
        assert_eq!(PieceType::Knight as u8, 3);
        assert_eq!(PieceType::Bishop as u8, 4);
        assert_eq!(PieceType::Queen as u8, 5);
        assert_eq!(PieceType::King as u8, 6);
    }

    #[test]
    fn piece_type_convenience_constructors() {
        for piece_type in ALL_PIECE_TYPES {
            assert!(piece_type.white().is_white());
        }

        for piece_type in ALL_PIECE_TYPES {
            assert!(piece_type.black().is_black());
        }

        for piece_type in ALL_PIECE_TYPES {
            for &color in ALL_COLORS {
                assert_eq!(piece_type.with_color(color).color(), color);
            }
        }
    }

    #[test]
    fn color_flip() {
        assert_eq!(Color::White.flip(), Color::Black);
        assert_eq!(Color::Black.flip(), Color::White);
    }

    #[test]
    fn piece_create_and_unpack() {
        for &color in ALL_COLORS {
            for &piece_type in ALL_PIECE_TYPES {
                let piece = Piece::new(color, piece_type);
                assert_eq!(piece.color(), color);
                assert_eq!(piece.piece_type(), piece_type);
            }
        }
    }

    #[test]
    fn piece_try_from_u8_ignores_status_bits() {
        let byte = Piece::WHITE_ROOK.get()
            | CellFlags::PIECE_MOVED.bits()
            | CellFlags::PAWN_TWO_STEP.bits();
        assert_eq!(Piece::try_from_u8(byte), Some(Piece::WHITE_ROOK));

        assert_eq!(Piece::try_from_u8(0), None);
        assert_eq!(Piece::try_from_u8(7), None);
        assert_eq!(Piece::try_from_u8(CellFlags::BLACK.bits()), None);
    }

    #[test]
    fn piece_fen_chars() {
        let cases = [
            (Piece::WHITE_PAWN, 'P'),
            (Piece::WHITE_BISHOP, 'B'),
            (Piece::WHITE_KING, 'K'),
            (Piece::BLACK_KNIGHT, 'n'),
            (Piece::BLACK_ROOK, 'r'),
            (Piece::BLACK_QUEEN, 'q'),
        ];
        for (piece, expected) in cases {
            assert_eq!(piece.as_fen_char(), expected);
            assert_eq!(Piece::try_from_fen_char(expected), Some(piece));
        }

        assert_eq!(Piece::try_from_fen_char('X'), None);
        assert_eq!(Piece::try_from_fen_char('a'), None);
    }

    #[test]
    fn piece_as_unicode_char() {
        let cases = [
            (Piece::WHITE_PAWN, '♙'),
            (Piece::WHITE_BISHOP, '♗'),
            (Piece::WHITE_KING, '♔'),
            (Piece::BLACK_KNIGHT, '♞'),
            (Piece::BLACK_ROOK, '♜'),
            (Piece::BLACK_QUEEN, '♛'),
        ];
        for (piece, expected) in cases {
            assert_eq!(piece.as_unicode_char(), expected);
        }
    }

    #[test]
    fn cell_empty_is_zero_byte() {
        assert_eq!(Cell::EMPTY.get(), 0);
        assert!(Cell::EMPTY.is_empty());
        assert_eq!(Cell::EMPTY.piece(), None);
        assert_eq!(Cell::EMPTY.role(), None);
        assert_eq!(Cell::EMPTY.color(), None);
        assert_eq!(Cell::default(), Cell::EMPTY);
    }

    #[test]
    fn cell_color_predicates_on_empty() {
        assert!(!Cell::EMPTY.is_color(Color::White));
        assert!(!Cell::EMPTY.is_color(Color::Black));
    }

    #[test]
    fn cell_piece_round_trip() {
        for &color in ALL_COLORS {
            for &piece_type in ALL_PIECE_TYPES {
                let piece = Piece::new(color, piece_type);
                let cell = Cell::from_piece(piece);
                assert_eq!(cell.piece(), Some(piece));
                assert_eq!(cell.role(), Some(piece_type));
                assert_eq!(cell.color(), Some(color));
                assert!(!cell.has_moved());
            }
        }
    }

    #[test]
    fn cell_flags() {
        let cell = Cell::from_piece(Piece::BLACK_PAWN).with_flags(CellFlags::PAWN_TWO_STEP);
        assert!(cell.just_double_stepped());
        assert!(!cell.has_moved());
        assert_eq!(cell.piece(), Some(Piece::BLACK_PAWN));

        let cell = cell.without_flags(CellFlags::PAWN_TWO_STEP);
        assert!(!cell.just_double_stepped());
        assert_eq!(cell.piece(), Some(Piece::BLACK_PAWN));

        let cell = Cell::from_piece(Piece::WHITE_KING).with_flags(CellFlags::PIECE_MOVED);
        assert!(cell.has_moved());
        assert!(!cell.just_double_stepped());
    }

    #[test]
    fn cell_two_step_predicate_requires_pawn() {
        // A non-pawn carrying the bit (which the generator never produces)
        // must still answer false.
        let cell = Cell::from_piece(Piece::WHITE_ROOK).with_flags(CellFlags::PAWN_TWO_STEP);
        assert!(!cell.just_double_stepped());
    }
}
