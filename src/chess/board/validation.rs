use std::{
    fmt::{self, Debug, Formatter},
    ops::{BitOr, BitOrAssign},
};

use crate::chess::{
    attacks,
    board::Board,
    piece::{Colour, PieceType},
    squareset::SquareSet,
    types::{Rank, Square},
};

#[cfg(debug_assertions)]
use crate::errors::PositionValidityError;

/// A set of reasons a position could not occur in a game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(u32);

impl Status {
    pub const VALID: Self = Self(0);
    pub const NO_WHITE_KING: Self = Self(1 << 0);
    pub const NO_BLACK_KING: Self = Self(1 << 1);
    pub const TOO_MANY_KINGS: Self = Self(1 << 2);
    pub const TOO_MANY_WHITE_PAWNS: Self = Self(1 << 3);
    pub const TOO_MANY_BLACK_PAWNS: Self = Self(1 << 4);
    pub const PAWNS_ON_BACKRANK: Self = Self(1 << 5);
    pub const TOO_MANY_WHITE_PIECES: Self = Self(1 << 6);
    pub const TOO_MANY_BLACK_PIECES: Self = Self(1 << 7);
    pub const BAD_CASTLING_RIGHTS: Self = Self(1 << 8);
    pub const INVALID_EP_SQUARE: Self = Self(1 << 9);
    pub const OPPOSITE_CHECK: Self = Self(1 << 10);
    pub const EMPTY: Self = Self(1 << 11);
    pub const TOO_MANY_CHECKERS: Self = Self(1 << 15);
    pub const IMPOSSIBLE_CHECK: Self = Self(1 << 16);

    const NAMES: [(Self, &'static str); 14] = [
        (Self::NO_WHITE_KING, "NO_WHITE_KING"),
        (Self::NO_BLACK_KING, "NO_BLACK_KING"),
        (Self::TOO_MANY_KINGS, "TOO_MANY_KINGS"),
        (Self::TOO_MANY_WHITE_PAWNS, "TOO_MANY_WHITE_PAWNS"),
        (Self::TOO_MANY_BLACK_PAWNS, "TOO_MANY_BLACK_PAWNS"),
        (Self::PAWNS_ON_BACKRANK, "PAWNS_ON_BACKRANK"),
        (Self::TOO_MANY_WHITE_PIECES, "TOO_MANY_WHITE_PIECES"),
        (Self::TOO_MANY_BLACK_PIECES, "TOO_MANY_BLACK_PIECES"),
        (Self::BAD_CASTLING_RIGHTS, "BAD_CASTLING_RIGHTS"),
        (Self::INVALID_EP_SQUARE, "INVALID_EP_SQUARE"),
        (Self::OPPOSITE_CHECK, "OPPOSITE_CHECK"),
        (Self::EMPTY, "EMPTY"),
        (Self::TOO_MANY_CHECKERS, "TOO_MANY_CHECKERS"),
        (Self::IMPOSSIBLE_CHECK, "IMPOSSIBLE_CHECK"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn is_valid(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The names of the set flags.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |&(flag, _)| self.contains(flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for Status {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Debug for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("Status(VALID)");
        }
        let names = self.names().collect::<Vec<_>>();
        write!(f, "Status({})", names.join(" | "))
    }
}

impl Board {
    /// Everything that is wrong with this position.
    pub fn status(&self) -> Status {
        let layout = self.layout();
        let occupied = self.occupied();
        let kings = layout.pieces[PieceType::King];
        let pawns = layout.pieces[PieceType::Pawn];
        let white = layout.colours[Colour::White];
        let black = layout.colours[Colour::Black];

        let mut errors = Status::VALID;
        if occupied.is_empty() {
            errors |= Status::EMPTY;
        }
        if (white & kings).is_empty() {
            errors |= Status::NO_WHITE_KING;
        }
        if (black & kings).is_empty() {
            errors |= Status::NO_BLACK_KING;
        }
        if self.rules().config().one_king && (occupied & kings).count() > 2 {
            errors |= Status::TOO_MANY_KINGS;
        }
        if white.count() > 16 {
            errors |= Status::TOO_MANY_WHITE_PIECES;
        }
        if black.count() > 16 {
            errors |= Status::TOO_MANY_BLACK_PIECES;
        }
        if (white & pawns).count() > 8 {
            errors |= Status::TOO_MANY_WHITE_PAWNS;
        }
        if (black & pawns).count() > 8 {
            errors |= Status::TOO_MANY_BLACK_PAWNS;
        }
        if (pawns & SquareSet::BACK_RANKS).non_empty() {
            errors |= Status::PAWNS_ON_BACKRANK;
        }
        if self.castling_rights() != self.clean_castling_rights() {
            errors |= Status::BAD_CASTLING_RIGHTS;
        }

        let valid_ep_square = self.valid_ep_square();
        if self.ep_square() != valid_ep_square {
            errors |= Status::INVALID_EP_SQUARE;
        }

        if self.was_into_check() {
            errors |= Status::OPPOSITE_CHECK;
        }

        let checkers = self.checkers_mask();
        let our_kings = kings & layout.colours[self.turn()] & !layout.promoted;
        if checkers.non_empty() {
            if checkers.count() > 2 {
                errors |= Status::TOO_MANY_CHECKERS;
            }

            if let Some(ep_square) = valid_ep_square {
                // the double push that just happened must explain the check
                let pushed_to = Square::new(ep_square.inner() ^ 8);
                let pushed_from = Square::new(ep_square.inner() ^ 24);
                if let (Some(pushed_to), Some(pushed_from)) = (pushed_to, pushed_from) {
                    let occupied_before = (occupied & !pushed_to.as_set()) | pushed_from.as_set();
                    if checkers.many()
                        || (checkers.msb() != Some(pushed_to)
                            && self.attacked_for_king(our_kings, occupied_before))
                    {
                        errors |= Status::IMPOSSIBLE_CHECK;
                    }
                }
            } else if let (Some(first), Some(last)) = (checkers.lsb(), checkers.msb()) {
                // two checkers on one line cannot both have been uncovered
                if checkers.count() > 2
                    || (checkers.count() == 2
                        && (attacks::ray(first, last) & our_kings).non_empty())
                {
                    errors |= Status::IMPOSSIBLE_CHECK;
                }
            }
        }

        errors
    }

    /// The en passant square, if a pawn could really have just double-pushed
    /// past it.
    pub fn valid_ep_square(&self) -> Option<Square> {
        let ep_square = self.ep_square()?;
        let turn = self.turn();
        if ep_square.rank() != Rank::Six.relative_to(turn) {
            return None;
        }
        let pushed_to = ep_square.pawn_push(!turn)?;
        let pushed_from = ep_square.pawn_push(turn)?;
        let occupied = self.occupied();

        if !self.pieces_mask(PieceType::Pawn, !turn).contains_square(pushed_to)
            || occupied.contains_square(ep_square)
            || occupied.contains_square(pushed_from)
        {
            return None;
        }
        Some(ep_square)
    }

    /// Whether the position could occur in a standard game. Castling rights
    /// and en passant squares must be exact.
    pub fn is_valid(&self) -> bool {
        self.status().is_valid()
    }

    /// Checks the internal consistency of the board representation.
    #[cfg(debug_assertions)]
    pub fn check_validity(&self) -> Result<(), PositionValidityError> {
        let layout = self.layout();

        // check square-set coherency
        let mut union = SquareSet::EMPTY;
        for piece_type in PieceType::all() {
            let bb = layout.pieces[piece_type];
            if (union & bb).non_empty() {
                return Err(format!(
                    "piece square-sets overlap: {piece_type:?} shares squares {:?}",
                    union & bb
                ));
            }
            union |= bb;
        }
        let white = layout.colours[Colour::White];
        let black = layout.colours[Colour::Black];
        if (white & black).non_empty() {
            return Err(format!("colour square-sets overlap on {:?}", white & black));
        }
        if union != (white | black) {
            return Err(format!(
                "piece and colour square-sets disagree: pieces {union:?}, colours {:?}",
                white | black
            ));
        }
        if (layout.promoted & !union).non_empty() {
            return Err(format!(
                "promoted marker on empty squares: {:?}",
                layout.promoted & !union
            ));
        }

        if (self.castling_rights() & !SquareSet::BACK_RANKS).non_empty() {
            return Err(format!(
                "castling rights off the back ranks: {:?}",
                self.castling_rights()
            ));
        }

        if let Some(ep_square) = self.ep_square() {
            if ep_square.rank() != Rank::Three && ep_square.rank() != Rank::Six {
                return Err(format!(
                    "en passant square is corrupt: expected rank 3 or 6, got {ep_square}"
                ));
            }
        }

        if self.fullmove_number() == 0 {
            return Err("fullmove number is zero".to_string());
        }

        if self.history.len() != self.move_stack().len() {
            return Err(format!(
                "history is corrupt: {} snapshots for {} moves",
                self.history.len(),
                self.move_stack().len()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(fen: &str) -> Status {
        Board::from_fen(fen).unwrap().status()
    }

    #[test]
    fn starting_position_is_valid() {
        let b = Board::starting();
        assert!(b.is_valid());
        assert_eq!(b.status(), Status::VALID);
        #[cfg(debug_assertions)]
        b.check_validity().unwrap();
    }

    #[test]
    fn empty_board() {
        assert_eq!(
            Board::empty().status(),
            Status::EMPTY | Status::NO_WHITE_KING | Status::NO_BLACK_KING
        );
    }

    #[test]
    fn king_count_follows_the_rules() {
        use crate::chess::variant::{Rules, VariantConfig};

        #[derive(Debug)]
        struct ManyKings;

        static MANY_KINGS: VariantConfig = VariantConfig {
            name: "Many Kings",
            aliases: &["Many Kings"],
            uci_variant: "manykings",
            xboard_variant: "manykings",
            starting_fen: Board::STARTING_FEN,
            one_king: false,
        };

        impl Rules for ManyKings {
            fn config(&self) -> &VariantConfig {
                &MANY_KINGS
            }
        }

        let fen = "4k2K/8/8/8/8/8/8/4K3 w - - 0 1";
        assert!(status(fen).contains(Status::TOO_MANY_KINGS));
        let board = Board::from_fen(fen).unwrap().with_rules(&ManyKings);
        assert!(!board.status().contains(Status::TOO_MANY_KINGS));
    }

    #[test]
    fn material_errors() {
        let s = status("4k3/8/8/8/8/8/PPPPPPPP/P3K3 w - - 0 1");
        assert!(s.contains(Status::TOO_MANY_WHITE_PAWNS));
        assert!(s.contains(Status::PAWNS_ON_BACKRANK));
        assert!(!s.contains(Status::TOO_MANY_WHITE_PIECES));

        let s = status("4k2K/8/8/8/8/8/8/4K3 w - - 0 1");
        assert!(s.contains(Status::TOO_MANY_KINGS));

        let s = status("4k3/8/8/8/8/8/8/8 w - - 0 1");
        assert_eq!(s, Status::NO_WHITE_KING);
    }

    #[test]
    fn castling_rights_must_be_clean() {
        let s = status("4k3/8/8/8/8/8/8/4K2R w KQ - 0 1");
        assert_eq!(s, Status::BAD_CASTLING_RIGHTS);
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap().is_valid());
    }

    #[test]
    fn en_passant_square_must_follow_a_double_push() {
        assert!(status("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").is_valid());
        let s = status("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq e3 0 1");
        assert_eq!(s, Status::INVALID_EP_SQUARE);
        let s = status("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1");
        assert_eq!(s, Status::INVALID_EP_SQUARE);
    }

    #[test]
    fn checks() {
        let s = status("4k3/8/8/8/8/8/8/4KR2 b - - 0 1");
        assert!(s.is_valid());
        let s = status("4k3/8/8/8/8/8/8/4RK2 w - - 0 1");
        assert_eq!(s, Status::OPPOSITE_CHECK);

        // rooks on both sides of the king along one file
        let s = status("4r3/8/8/8/4K3/8/8/4r2k w - - 0 1");
        assert!(s.contains(Status::IMPOSSIBLE_CHECK));

        let s = status("4r3/8/8/8/4K3/8/5n2/1b2r2k w - - 0 1");
        assert!(s.contains(Status::TOO_MANY_CHECKERS));
    }

    #[test]
    fn check_explained_by_double_push() {
        // d7-d5 checks the king on e4 directly
        let s = status("4k3/8/8/3p4/4K3/8/8/8 w - d6 0 1");
        assert!(s.is_valid());
        // the check comes from a rook that the double push could not uncover
        let s = status("4k3/8/8/3p4/8/8/8/r3K3 w - d6 0 1");
        assert!(s.contains(Status::IMPOSSIBLE_CHECK));
    }

    #[test]
    fn debug_lists_flags() {
        assert_eq!(format!("{:?}", Status::VALID), "Status(VALID)");
        assert_eq!(
            format!("{:?}", Status::NO_WHITE_KING | Status::EMPTY),
            "Status(NO_WHITE_KING | EMPTY)"
        );
    }
}
