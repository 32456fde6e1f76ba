use std::{
    fmt::{Debug, Display},
    mem::size_of,
    ops::{Index, IndexMut, Not},
};

use crate::chess::types::Rank;

/// Compile-time side selection, used to monomorphise pawn-direction logic.
pub trait Col {
    type Opposite: Col;
    const WHITE: bool;
    const COLOUR: Colour;

    const PAWN_FWD_OFFSET: i8;
    const PAWN_DOUBLE_OFFSET: i8;
    const PAWN_START_RANK: Rank;
    const PAWN_DOUBLE_RANK: Rank;
    const EP_CAPTURE_RANK: Rank;
    const BACK_RANK: Rank;
    const PROMOTION_RANK: Rank;
}

pub struct White;
pub struct Black;

impl Col for White {
    type Opposite = Black;
    const WHITE: bool = true;
    const COLOUR: Colour = Colour::White;

    const PAWN_FWD_OFFSET: i8 = 8;
    const PAWN_DOUBLE_OFFSET: i8 = 16;
    const PAWN_START_RANK: Rank = Rank::Two;
    const PAWN_DOUBLE_RANK: Rank = Rank::Four;
    const EP_CAPTURE_RANK: Rank = Rank::Five;
    const BACK_RANK: Rank = Rank::One;
    const PROMOTION_RANK: Rank = Rank::Eight;
}

impl Col for Black {
    type Opposite = White;
    const WHITE: bool = false;
    const COLOUR: Colour = Colour::Black;

    const PAWN_FWD_OFFSET: i8 = -8;
    const PAWN_DOUBLE_OFFSET: i8 = -16;
    const PAWN_START_RANK: Rank = Rank::Seven;
    const PAWN_DOUBLE_RANK: Rank = Rank::Five;
    const EP_CAPTURE_RANK: Rank = Rank::Four;
    const BACK_RANK: Rank = Rank::Eight;
    const PROMOTION_RANK: Rank = Rank::One;
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Colour {
    White,
    Black,
}

const _COLOUR_ASSERT: () = assert!(size_of::<Colour>() == size_of::<Option<Colour>>());

impl Display for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

const _PIECE_TYPE_ASSERT: () = assert!(size_of::<PieceType>() == size_of::<Option<PieceType>>());

impl Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[rustfmt::skip]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Piece {
    #[default]
    WP, BP,
    WN, BN,
    WB, BB,
    WR, BR,
    WQ, BQ,
    WK, BK,
}

const _PIECE_ASSERT: () = assert!(size_of::<Piece>() == size_of::<Option<Piece>>());

/// Renders the FEN letter of the piece.
impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl Colour {
    pub const fn new(v: bool) -> Self {
        if v { Self::Black } else { Self::White }
    }

    pub const fn flip(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn inner(self) -> u8 {
        self as u8
    }

    /// The `w`/`b` side-to-move token used in FEN.
    pub const fn fen_char(self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Self> {
        [Self::White, Self::Black].into_iter()
    }
}

impl Not for Colour {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.flip()
    }
}

impl PieceType {
    pub const fn new(v: u8) -> Option<Self> {
        if v < 6 {
            // SAFETY: inner is less than 6, so it corresponds to a valid enum variant.
            Some(unsafe { std::mem::transmute::<u8, Self>(v) })
        } else {
            None
        }
    }

    /// SAFETY: you may only call this function with value of `inner` less than 6.
    pub const unsafe fn from_index_unchecked(v: u8) -> Self {
        debug_assert!(v < 6);
        // Safety: caller's precondition.
        unsafe { std::mem::transmute(v) }
    }

    pub const fn inner(self) -> u8 {
        self as u8
    }

    pub const fn legal_promo(self) -> bool {
        matches!(self, Self::Queen | Self::Knight | Self::Bishop | Self::Rook)
    }

    /// Promotion targets in the order they are generated.
    pub const PROMOTIONS: [Self; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    /// Lowercase letter, as used in UCI promotions and EPD.
    pub const fn symbol(self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Self> {
        // SAFETY: all values are within `0..6`.
        (0..6u8).map(|i| unsafe { std::mem::transmute(i) })
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Case-insensitive lookup of a piece letter.
    pub const fn from_symbol(c: u8) -> Option<Self> {
        match c.to_ascii_lowercase() {
            b'p' => Some(Self::Pawn),
            b'n' => Some(Self::Knight),
            b'b' => Some(Self::Bishop),
            b'r' => Some(Self::Rook),
            b'q' => Some(Self::Queen),
            b'k' => Some(Self::King),
            _ => None,
        }
    }
}

impl Piece {
    pub const fn new(colour: Colour, piece_type: PieceType) -> Self {
        let index = colour as u8 | (piece_type as u8) << 1;
        // SAFETY: Colour is {0, 1}, piece_type is {0, 1, 2, 3, 4, 5}.
        // colour | piece_type << 1 is therefore at most 11, which corresponds
        // to a valid enum variant.
        unsafe { std::mem::transmute(index) }
    }

    pub const fn from_index(v: u8) -> Option<Self> {
        if v < 12 {
            // SAFETY: inner is less than 12, so it corresponds to a valid enum variant.
            Some(unsafe { std::mem::transmute::<u8, Self>(v) })
        } else {
            None
        }
    }

    /// Parses a FEN piece letter: uppercase is white, lowercase is black.
    pub const fn from_symbol(c: u8) -> Option<Self> {
        let Some(piece_type) = PieceType::from_symbol(c) else {
            return None;
        };
        Some(Self::new(Colour::new(c.is_ascii_lowercase()), piece_type))
    }

    pub const fn colour(self) -> Colour {
        if (self as u8) & 1 == 0 {
            Colour::White
        } else {
            Colour::Black
        }
    }

    pub const fn piece_type(self) -> PieceType {
        let pt_index = self as u8 >> 1;
        // SAFETY: pt_index is always within the bounds of the type.
        unsafe { PieceType::from_index_unchecked(pt_index) }
    }

    pub const fn char(self) -> char {
        let c = self.piece_type().symbol();
        match self.colour() {
            Colour::White => c.to_ascii_uppercase(),
            Colour::Black => c,
        }
    }

    pub const fn unicode_symbol(self) -> char {
        match self {
            Self::WP => '♙',
            Self::WN => '♘',
            Self::WB => '♗',
            Self::WR => '♖',
            Self::WQ => '♕',
            Self::WK => '♔',
            Self::BP => '♟',
            Self::BN => '♞',
            Self::BB => '♝',
            Self::BR => '♜',
            Self::BQ => '♛',
            Self::BK => '♚',
        }
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Self> {
        // SAFETY: all values are within `0..12`.
        (0..12u8).map(|i| unsafe { std::mem::transmute(i) })
    }

    pub const fn inner(self) -> u8 {
        self as u8
    }
}

impl<T> Index<Colour> for [T; 2] {
    type Output = T;

    fn index(&self, index: Colour) -> &Self::Output {
        // SAFETY: the legal values for this type are all in bounds.
        unsafe { self.get_unchecked(index as usize) }
    }
}

impl<T> IndexMut<Colour> for [T; 2] {
    fn index_mut(&mut self, index: Colour) -> &mut Self::Output {
        // SAFETY: the legal values for this type are all in bounds.
        unsafe { self.get_unchecked_mut(index as usize) }
    }
}

impl<T> Index<PieceType> for [T; 6] {
    type Output = T;

    fn index(&self, index: PieceType) -> &Self::Output {
        // SAFETY: the legal values for this type are all in bounds.
        unsafe { self.get_unchecked(index as usize) }
    }
}

impl<T> IndexMut<PieceType> for [T; 6] {
    fn index_mut(&mut self, index: PieceType) -> &mut Self::Output {
        // SAFETY: the legal values for this type are all in bounds.
        unsafe { self.get_unchecked_mut(index as usize) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_construction_and_decomposition() {
        for colour in Colour::all() {
            for piece_type in PieceType::all() {
                let piece = Piece::new(colour, piece_type);
                assert_eq!(piece.colour(), colour);
                assert_eq!(piece.piece_type(), piece_type);
                assert_eq!(Piece::from_index(piece.inner()), Some(piece));
            }
        }
        assert!(Piece::from_index(12).is_none());
    }

    #[test]
    fn symbols() {
        for piece in Piece::all() {
            let c = piece.char();
            assert_eq!(c.is_ascii_uppercase(), piece.colour() == Colour::White);
            assert_eq!(Piece::from_symbol(c as u8), Some(piece));
        }
        assert_eq!(Piece::from_symbol(b'x'), None);
        assert_eq!(PieceType::from_symbol(b'Q'), Some(PieceType::Queen));
        assert_eq!(Piece::WN.unicode_symbol(), '♘');
        assert_eq!(Piece::BK.to_string(), "k");
        assert_eq!(PieceType::Bishop.to_string(), "bishop");
    }

    #[test]
    fn promotion_order() {
        assert!(PieceType::PROMOTIONS.iter().all(|pt| pt.legal_promo()));
        assert!(!PieceType::King.legal_promo());
        assert!(!PieceType::Pawn.legal_promo());
    }
}
