use std::{
    iter::FusedIterator,
    ops::{
        BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Shl, Shr, Sub,
        SubAssign,
    },
};

use crate::chess::{attacks, piece::Colour, types::Square};

/// A set of squares, with support for very fast set operations and in-order iteration.
/// Most chess engines call this type `Bitboard`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SquareSet {
    inner: u64,
}

impl SquareSet {
    pub const EMPTY: Self = Self { inner: 0 };
    pub const FULL: Self = Self { inner: !0 };

    pub const RANK_1: Self = Self {
        inner: 0x0000_0000_0000_00FF,
    };
    pub const RANK_2: Self = Self {
        inner: 0x0000_0000_0000_FF00,
    };
    pub const RANK_3: Self = Self {
        inner: 0x0000_0000_00FF_0000,
    };
    pub const RANK_4: Self = Self {
        inner: 0x0000_0000_FF00_0000,
    };
    pub const RANK_5: Self = Self {
        inner: 0x0000_00FF_0000_0000,
    };
    pub const RANK_6: Self = Self {
        inner: 0x0000_FF00_0000_0000,
    };
    pub const RANK_7: Self = Self {
        inner: 0x00FF_0000_0000_0000,
    };
    pub const RANK_8: Self = Self {
        inner: 0xFF00_0000_0000_0000,
    };
    pub const FILE_A: Self = Self {
        inner: 0x0101_0101_0101_0101,
    };
    pub const FILE_B: Self = Self {
        inner: 0x0202_0202_0202_0202,
    };
    pub const FILE_C: Self = Self {
        inner: 0x0404_0404_0404_0404,
    };
    pub const FILE_D: Self = Self {
        inner: 0x0808_0808_0808_0808,
    };
    pub const FILE_E: Self = Self {
        inner: 0x1010_1010_1010_1010,
    };
    pub const FILE_F: Self = Self {
        inner: 0x2020_2020_2020_2020,
    };
    pub const FILE_G: Self = Self {
        inner: 0x4040_4040_4040_4040,
    };
    pub const FILE_H: Self = Self {
        inner: 0x8080_8080_8080_8080,
    };
    pub const LIGHT_SQUARES: Self = Self {
        inner: 0x55AA_55AA_55AA_55AA,
    };
    pub const DARK_SQUARES: Self = Self {
        inner: 0xAA55_AA55_AA55_AA55,
    };
    pub const CORNERS: Self = Self {
        inner: 0x8100_0000_0000_0081,
    };
    pub const CENTER: Self = Self {
        inner: 0x0000_0018_1800_0000,
    };

    pub const RANKS: [Self; 8] = [
        Self::RANK_1,
        Self::RANK_2,
        Self::RANK_3,
        Self::RANK_4,
        Self::RANK_5,
        Self::RANK_6,
        Self::RANK_7,
        Self::RANK_8,
    ];

    pub const FILES: [Self; 8] = [
        Self::FILE_A,
        Self::FILE_B,
        Self::FILE_C,
        Self::FILE_D,
        Self::FILE_E,
        Self::FILE_F,
        Self::FILE_G,
        Self::FILE_H,
    ];

    pub const BACK_RANKS: Self = Self::union(Self::RANK_1, Self::RANK_8);

    pub const fn from_inner(inner: u64) -> Self {
        Self { inner }
    }

    pub const fn inner(self) -> u64 {
        self.inner
    }

    pub const fn from_square(square: Square) -> Self {
        Self {
            inner: 1 << square.index(),
        }
    }

    /// The full line through two aligned squares, or the empty set.
    pub fn ray(a: Square, b: Square) -> Self {
        attacks::ray(a, b)
    }

    /// The squares strictly between two aligned squares, or the empty set.
    pub fn between(a: Square, b: Square) -> Self {
        attacks::between(a, b)
    }

    pub const fn count(self) -> u32 {
        self.inner.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.inner == 0
    }

    pub const fn non_empty(self) -> bool {
        self.inner != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self {
            inner: self.inner | other.inner,
        }
    }

    pub const fn difference(self, other: Self) -> Self {
        Self {
            inner: self.inner & !other.inner,
        }
    }

    pub const fn symmetric_difference(self, other: Self) -> Self {
        Self {
            inner: self.inner ^ other.inner,
        }
    }

    pub const fn contains(self, other: Self) -> bool {
        (self.inner & other.inner) == other.inner
    }

    pub const fn contains_square(self, square: Square) -> bool {
        (self.inner & (1 << square.index())) != 0
    }

    pub const fn is_subset(self, other: Self) -> bool {
        other.contains(self)
    }

    pub const fn is_superset(self, other: Self) -> bool {
        self.contains(other)
    }

    pub const fn is_disjoint(self, other: Self) -> bool {
        self.inner & other.inner == 0
    }

    pub const fn add_square(self, square: Square) -> Self {
        Self {
            inner: self.inner | (1 << square.index()),
        }
    }

    pub const fn remove_square(self, square: Square) -> Self {
        Self {
            inner: self.inner & !(1 << square.index()),
        }
    }

    pub fn insert(&mut self, square: Square) {
        *self = self.add_square(square);
    }

    /// Removes `square` if present.
    pub fn discard(&mut self, square: Square) {
        *self = self.remove_square(square);
    }

    /// Removes `square`, reporting whether it was present.
    pub fn remove(&mut self, square: Square) -> bool {
        let present = self.contains_square(square);
        self.discard(square);
        present
    }

    /// Removes and returns the lowest square.
    pub fn pop(&mut self) -> Option<Square> {
        let sq = self.lsb()?;
        self.inner &= self.inner - 1;
        Some(sq)
    }

    pub fn clear(&mut self) {
        self.inner = 0;
    }

    #[allow(clippy::missing_const_for_fn)]
    pub fn iter(self) -> SquareIter {
        SquareIter::new(self.inner)
    }

    /// Squares from h8 down to a1.
    pub fn iter_reversed(self) -> std::iter::Rev<SquareIter> {
        self.iter().rev()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn lsb(self) -> Option<Square> {
        Square::new(self.inner.trailing_zeros() as u8)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn msb(self) -> Option<Square> {
        if self.inner == 0 {
            None
        } else {
            Square::new(63 - self.inner.leading_zeros() as u8)
        }
    }

    pub fn east_one(self) -> Self {
        (self << 1) & !Self::FILE_A
    }
    pub fn east_two(self) -> Self {
        (self << 2) & !(Self::FILE_A | Self::FILE_B)
    }
    pub fn west_one(self) -> Self {
        (self >> 1) & !Self::FILE_H
    }
    pub fn west_two(self) -> Self {
        (self >> 2) & !(Self::FILE_G | Self::FILE_H)
    }
    pub fn north_one(self) -> Self {
        self << 8
    }
    pub fn north_two(self) -> Self {
        self << 16
    }
    pub fn south_one(self) -> Self {
        self >> 8
    }
    pub fn south_two(self) -> Self {
        self >> 16
    }

    /// Mirrors the set top-to-bottom.
    pub const fn flip_vertical(self) -> Self {
        Self {
            inner: self.inner.swap_bytes(),
        }
    }

    /// Mirrors the set left-to-right.
    pub const fn flip_horizontal(self) -> Self {
        let mut bb = self.inner;
        bb = ((bb >> 1) & 0x5555_5555_5555_5555) | ((bb & 0x5555_5555_5555_5555) << 1);
        bb = ((bb >> 2) & 0x3333_3333_3333_3333) | ((bb & 0x3333_3333_3333_3333) << 2);
        bb = ((bb >> 4) & 0x0F0F_0F0F_0F0F_0F0F) | ((bb & 0x0F0F_0F0F_0F0F_0F0F) << 4);
        Self { inner: bb }
    }

    /// Mirrors the set along the a1-h8 diagonal.
    pub const fn flip_diagonal(self) -> Self {
        let mut bb = self.inner;
        let mut t = (bb ^ (bb << 28)) & 0x0F0F_0F0F_0000_0000;
        bb = bb ^ t ^ (t >> 28);
        t = (bb ^ (bb << 14)) & 0x3333_0000_3333_0000;
        bb = bb ^ t ^ (t >> 14);
        t = (bb ^ (bb << 7)) & 0x5500_5500_5500_5500;
        bb = bb ^ t ^ (t >> 7);
        Self { inner: bb }
    }

    /// Mirrors the set along the h1-a8 diagonal.
    pub const fn flip_anti_diagonal(self) -> Self {
        let mut bb = self.inner;
        let mut t = bb ^ (bb << 36);
        bb ^= (t ^ (bb >> 36)) & 0xF0F0_F0F0_0F0F_0F0F;
        t = (bb ^ (bb << 18)) & 0xCCCC_0000_CCCC_0000;
        bb = bb ^ t ^ (t >> 18);
        t = (bb ^ (bb << 9)) & 0xAA00_AA00_AA00_AA00;
        bb = bb ^ t ^ (t >> 9);
        Self { inner: bb }
    }

    pub fn without_lsb(self) -> Self {
        self & (Self::from_inner(self.inner().wrapping_sub(1)))
    }

    pub fn one(self) -> bool {
        self != Self::EMPTY && self.without_lsb() == Self::EMPTY
    }

    pub fn many(self) -> bool {
        self.without_lsb() != Self::EMPTY
    }

    pub fn relative_to(self, colour: Colour) -> Self {
        if colour == Colour::White {
            self
        } else {
            self.flip_vertical()
        }
    }

    /// Every subset of this set, starting with the empty set.
    pub const fn carry_rippler(self) -> CarryRippler {
        CarryRippler {
            mask: self.inner,
            subset: 0,
            done: false,
        }
    }

    /// An 8x8 grid of `1` and `.`, rank 8 first.
    pub fn to_display_string(self) -> String {
        let mut out = String::with_capacity(128);
        for (i, sq) in crate::chess::types::SQUARES_180.iter().enumerate() {
            out.push(if self.contains_square(*sq) { '1' } else { '.' });
            if i % 8 == 7 {
                if i != 63 {
                    out.push('\n');
                }
            } else {
                out.push(' ');
            }
        }
        out
    }

    /// `SquareSet(0x...)`, the form used when logging.
    pub fn to_debug_string(self) -> String {
        format!("SquareSet({:#018x})", self.inner)
    }
}

/// Iterator over the squares of a square-set.
/// The squares are returned in increasing order, or decreasing order via `rev()`.
pub struct SquareIter {
    value: u64,
}

impl SquareIter {
    pub const fn new(value: u64) -> Self {
        Self { value }
    }
}

impl Iterator for SquareIter {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.value == 0 {
            None
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let lsb: u8 = self.value.trailing_zeros() as u8;
            self.value &= self.value - 1;
            // SAFETY: u64::trailing_zeros can only return values within `0..64`,
            // all of which correspond to valid enum variants of Square.
            Some(unsafe { Square::new_unchecked(lsb) })
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.value.count_ones() as usize;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for SquareIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.value == 0 {
            None
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let msb: u8 = 63 - self.value.leading_zeros() as u8;
            self.value ^= 1 << msb;
            // SAFETY: 63 - leading_zeros of a non-zero u64 is within `0..64`.
            Some(unsafe { Square::new_unchecked(msb) })
        }
    }
}

impl ExactSizeIterator for SquareIter {}
impl FusedIterator for SquareIter {}

/// Subset enumeration via `subset = (subset - mask) & mask`.
pub struct CarryRippler {
    mask: u64,
    subset: u64,
    done: bool,
}

impl Iterator for CarryRippler {
    type Item = SquareSet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.subset;
        self.subset = self.subset.wrapping_sub(self.mask) & self.mask;
        if self.subset == 0 {
            self.done = true;
        }
        Some(SquareSet::from_inner(current))
    }
}

impl IntoIterator for SquareSet {
    type Item = Square;
    type IntoIter = SquareIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::add_square)
    }
}

impl Extend<Square> for SquareSet {
    fn extend<T: IntoIterator<Item = Square>>(&mut self, iter: T) {
        for sq in iter {
            self.insert(sq);
        }
    }
}

impl From<Square> for SquareSet {
    fn from(square: Square) -> Self {
        Self::from_square(square)
    }
}

impl From<u64> for SquareSet {
    fn from(inner: u64) -> Self {
        Self { inner }
    }
}

impl BitOr for SquareSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner | rhs.inner,
        }
    }
}

impl BitOrAssign for SquareSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.inner |= rhs.inner;
    }
}

impl BitAnd for SquareSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner & rhs.inner,
        }
    }
}

impl BitAndAssign for SquareSet {
    fn bitand_assign(&mut self, rhs: Self) {
        self.inner &= rhs.inner;
    }
}

impl BitXor for SquareSet {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner ^ rhs.inner,
        }
    }
}

impl BitXorAssign for SquareSet {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.inner ^= rhs.inner;
    }
}

impl Sub for SquareSet {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner & !rhs.inner,
        }
    }
}

impl SubAssign for SquareSet {
    fn sub_assign(&mut self, rhs: Self) {
        self.inner &= !rhs.inner;
    }
}

impl Not for SquareSet {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self { inner: !self.inner }
    }
}

impl Shr<u8> for SquareSet {
    type Output = Self;

    fn shr(self, rhs: u8) -> Self::Output {
        Self {
            inner: self.inner >> rhs,
        }
    }
}

impl Shl<u8> for SquareSet {
    type Output = Self;

    fn shl(self, rhs: u8) -> Self::Output {
        Self {
            inner: self.inner << rhs,
        }
    }
}
