use std::{
    fmt::{Debug, Display, Write},
    str::FromStr,
};

use paste::paste;
use seq_macro::seq;
use thiserror::Error;

/// One file to the left (towards the A file).
pub const LEFT: i8 = -1;
/// One file to the right (towards the H file).
pub const RIGHT: i8 = 1;
/// One rank up (towards rank 8, white's forward direction).
pub const UP: i8 = 16;
/// One rank down (towards rank 1, black's forward direction).
pub const DOWN: i8 = -16;

/// Diagonal steps, as sums of the cardinal steps.
pub const UP_LEFT: i8 = UP + LEFT;
pub const UP_RIGHT: i8 = UP + RIGHT;
pub const DOWN_LEFT: i8 = DOWN + LEFT;
pub const DOWN_RIGHT: i8 = DOWN + RIGHT;

/// Represents a square on the chessboard.
///
/// Internally, represents a square as a 0x88 index: bits 4-6 hold the rank
/// (0-7) and bits 0-2 hold the file (0-7). Bits 3 and 7 are always zero for
/// a valid square, which gives the cheap off-board test
/// `index & 0x88 != 0` -- stepping off either edge of the board in any
/// direction always sets one of those two bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Returns true if `index` refers to one of the 64 real squares.
    ///
    /// This is the 0x88 trick: the whole point of the board layout. Any
    /// index produced by adding direction offsets to a valid square is
    /// either on the board or has bit 3 or bit 7 set.
    pub const fn on_board(index: u8) -> bool {
        index & 0x88 == 0
    }

    /// Construct a [`Square`] from the provided rank and file.
    ///
    /// Ranks are numbered 0-7 with 0 being rank 1 and 7 being rank 8.
    ///
    /// Files are numbered 0-7 with 0 being file A and 7 being file H.
    ///
    /// Returns [`None`] if either `rank` or `file` are greater than 7.
    pub const fn new(rank: u8, file: u8) -> Option<Self> {
        if rank >= 8 || file >= 8 {
            None
        } else {
            Some(Self(rank << 4 | file))
        }
    }

    /// Construct a [`Square`] from the provided rank and file, without
    /// checking that they are in range. The rank and file are truncated to 3
    /// bits each, so the result is always a valid square -- though likely not
    /// the one you wanted if the inputs were out of range.
    pub const fn new_unchecked(rank: u8, file: u8) -> Self {
        Self((rank & 0x07) << 4 | (file & 0x07))
    }

    /// Construct a [`Square`] from a raw 0x88 index.
    ///
    /// Returns [`None`] if the index is off the board, i.e. has bit 3 or
    /// bit 7 set.
    pub const fn from_index(index: u8) -> Option<Self> {
        if Self::on_board(index) {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Returns the raw 0x88 index of this square.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the raw 0x88 index of this square as a [`usize`], for
    /// indexing into the 128-cell board array.
    pub const fn index(self) -> usize {
        self.0 as _
    }

    /// Returns the rank of this square.
    ///
    /// Ranks are numbered 0-7 with 0 being rank 1 and 7 being rank 8.
    pub const fn rank(self) -> u8 {
        self.0 >> 4
    }

    /// Returns the file of this square.
    ///
    /// Files are numbered 0-7 with 0 being file A and 7 being file H.
    pub const fn file(self) -> u8 {
        self.0 & 0x07
    }

    /// Returns an iterator over every real square, in increasing index
    /// order (a1, b1, ... h1, a2, ...).
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..128).filter(|&i| Self::on_board(i)).map(Square)
    }

    /// Steps this square by a signed direction offset.
    ///
    /// Returns [`None`] if the step leaves the board. This is the only
    /// off-board test used anywhere: sliding, knight and pawn generation all
    /// funnel through here.
    pub const fn offset(self, offset: i8) -> Option<Self> {
        Self::from_index((self.0 as i8).wrapping_add(offset) as u8)
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char((self.file() + b'a') as _)?;
        f.write_char((self.rank() + b'1') as _)
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("invalid square")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut char_iter = s.chars();
        let file = char_iter.next().ok_or(ParseSquareError)?;
        let rank = char_iter.next().ok_or(ParseSquareError)?;
        if char_iter.next().is_some() {
            return Err(ParseSquareError);
        }

        let rank = (rank.to_ascii_lowercase() as i32) - ('1' as i32);
        let file = (file.to_ascii_lowercase() as i32) - ('a' as i32);
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Ok(Square::new_unchecked(rank as _, file as _))
        } else {
            Err(ParseSquareError)
        }
    }
}

/// Board square aliases
#[allow(clippy::eq_op, clippy::char_lit_as_u8)]
impl Square {
    seq!(RANK in 1..=8 {
        seq!(FILE in 'A'..='H' {
            paste! {
                pub const [<FILE RANK>]: Square = Square::new_unchecked(RANK - 1, FILE as u8 - b'A');
            }
        });
    });
}

impl Debug for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{}{}",
            (self.file() + b'A') as char,
            (self.rank() + b'1') as char
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn square_new() {
        assert_eq!(Square::new(0, 0), Some(Square(0x00)));
        assert_eq!(Square::new(2, 3), Some(Square(0x23)));
        assert_eq!(Square::new(5, 7), Some(Square(0x57)));
        assert_eq!(Square::new(7, 1), Some(Square(0x71)));

        assert_eq!(Square::new(3, 9), None);
        assert_eq!(Square::new(8, 0), None);
        assert_eq!(Square::new(20, 1), None);
        assert_eq!(Square::new(37, 128), None);
    }

    #[test]
    fn square_on_board() {
        let mut on_board_count = 0;
        for i in 0u8..=255 {
            if Square::on_board(i) {
                on_board_count += 1;
                assert!(i < 128);
                assert_eq!(i & 0x88, 0);
            }
        }
        assert_eq!(on_board_count, 64);
    }

    #[test]
    fn square_from_index() {
        assert_eq!(Square::from_index(0x34), Some(Square(0x34)));
        assert_eq!(Square::from_index(0x77), Some(Square(0x77)));

        // bit 3 set: off the right edge
        assert_eq!(Square::from_index(0x08), None);
        assert_eq!(Square::from_index(0x3f), None);
        // bit 7 set: off the top or bottom
        assert_eq!(Square::from_index(0x80), None);
        assert_eq!(Square::from_index(0xf4), None);
    }

    #[test]
    fn square_aliases() {
        assert_eq!(Square::new_unchecked(5, 7), Square::H6);
        assert_eq!(Square::new_unchecked(2, 3), Square::D3);
        assert_eq!(Square::new_unchecked(7, 1), Square::B8);
        assert_eq!(Square::new_unchecked(6, 0), Square::A7);
    }

    #[test]
    fn square_rank_and_file() {
        for rank in 0..8 {
            for file in 0..8 {
                let square = Square::new(rank, file).unwrap();
                assert_eq!(square.rank(), rank);
                assert_eq!(square.file(), file);
            }
        }
    }

    #[test]
    fn square_display() {
        let cases = [
            (Square::B3, "b3"),
            (Square::H8, "h8"),
            (Square::D1, "d1"),
            (Square::G6, "g6"),
        ];

        for (square, expected) in cases {
            assert_eq!(format!("{square}"), expected);
        }
    }

    #[test]
    fn square_from_str() {
        assert_eq!("a7".parse::<Square>(), Ok(Square::A7));
        assert_eq!("f2".parse::<Square>(), Ok(Square::F2));
        assert_eq!("E4".parse::<Square>(), Ok(Square::E4));

        assert_eq!("".parse::<Square>(), Err(ParseSquareError));
        assert_eq!("x".parse::<Square>(), Err(ParseSquareError));
        assert_eq!("f23".parse::<Square>(), Err(ParseSquareError));
        assert_eq!("a1 ".parse::<Square>(), Err(ParseSquareError));
        assert_eq!("i5".parse::<Square>(), Err(ParseSquareError));
        assert_eq!("a9".parse::<Square>(), Err(ParseSquareError));
    }

    #[test]
    fn square_coord_round_trip() {
        for square in Square::all() {
            assert_eq!(format!("{square}").parse(), Ok(square));
        }
    }

    #[test]
    fn square_all() {
        let mut expected = Vec::new();
        for rank in 0..8 {
            for file in 0..8 {
                expected.push(Square::new(rank, file).unwrap());
            }
        }

        let all = Square::all().collect::<Vec<_>>();

        assert_eq!(all, expected);
    }

    #[test]
    fn square_offset() {
        assert_eq!(Square::E4.offset(UP), Some(Square::E5));
        assert_eq!(Square::A1.offset(UP_RIGHT), Some(Square::B2));
        assert_eq!(Square::H3.offset(LEFT), Some(Square::G3));
        assert_eq!(Square::F6.offset(DOWN_RIGHT), Some(Square::G5));

        assert_eq!(Square::E4.offset(2 * UP), Some(Square::E6));
        assert_eq!(Square::E4.offset(2 * DOWN), Some(Square::E2));
    }

    #[test]
    fn square_offset_off_board() {
        assert_eq!(Square::A1.offset(DOWN), None);
        assert_eq!(Square::A1.offset(LEFT), None);
        assert_eq!(Square::H8.offset(UP), None);
        assert_eq!(Square::H8.offset(RIGHT), None);
        assert_eq!(Square::H4.offset(UP_RIGHT), None);
        assert_eq!(Square::A5.offset(DOWN_LEFT), None);
    }
}
