use std::fmt::{Debug, Display, Formatter};

use crate::{
    chess::{piece::PieceType, types::{File, Rank, Square}},
    errors::MoveParseError,
};

/// A move from one square to another, optionally promoting or dropping a piece.
///
/// The null move is `a1a1` with neither a promotion nor a drop; it passes
/// the turn. Castling is stored however the move was produced: as a two-square
/// king hop in standard chess, or as the king taking its own rook in Chess960.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<PieceType>,
    drop: Option<PieceType>,
}

impl Move {
    pub const NULL: Self = Self {
        from: Square::A1,
        to: Square::A1,
        promotion: None,
        drop: None,
    };

    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            drop: None,
        }
    }

    pub const fn new_with_promo(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
            drop: None,
        }
    }

    pub const fn new_drop(piece_type: PieceType, square: Square) -> Self {
        Self {
            from: square,
            to: square,
            promotion: None,
            drop: Some(piece_type),
        }
    }

    pub const fn from(self) -> Square {
        self.from
    }

    pub const fn to(self) -> Square {
        self.to
    }

    pub const fn promotion(self) -> Option<PieceType> {
        self.promotion
    }

    pub const fn drop(self) -> Option<PieceType> {
        self.drop
    }

    pub const fn is_promo(self) -> bool {
        self.promotion.is_some()
    }

    pub const fn is_drop(self) -> bool {
        self.drop.is_some()
    }

    pub const fn is_null(self) -> bool {
        matches!(self.from, Square::A1)
            && matches!(self.to, Square::A1)
            && self.promotion.is_none()
            && self.drop.is_none()
    }

    /// The same move with the promotion replaced.
    pub const fn with_promotion(self, promotion: Option<PieceType>) -> Self {
        Self { promotion, ..self }
    }

    /// Origin and destination as a set.
    pub const fn squares(self) -> crate::chess::squareset::SquareSet {
        self.from.as_set().union(self.to.as_set())
    }

    /// UCI notation: `e2e4`, `e7e8q`, `P@e4`, or `0000`.
    pub fn uci(self) -> String {
        if let Some(drop) = self.drop {
            format!("{}@{}", drop.symbol().to_ascii_uppercase(), self.to)
        } else if let Some(promotion) = self.promotion {
            format!("{}{}{}", self.from, self.to, promotion.symbol())
        } else if self.is_null() {
            "0000".to_string()
        } else {
            format!("{}{}", self.from, self.to)
        }
    }

    /// XBoard notation: as UCI, but the null move is `@@@@`.
    pub fn xboard(self) -> String {
        if self.is_null() {
            "@@@@".to_string()
        } else {
            self.uci()
        }
    }

    /// Parses UCI notation.
    pub fn from_uci(uci: &str) -> Result<Self, MoveParseError> {
        let bytes = uci.as_bytes();
        if uci == "0000" {
            return Ok(Self::NULL);
        }
        if bytes.len() == 4 && bytes[1] == b'@' {
            let drop = PieceType::from_symbol(bytes[0])
                .ok_or(MoveParseError::InvalidPiece(char::from(bytes[0])))?;
            let square = parse_square(&bytes[2..4], uci)?;
            return Ok(Self::new_drop(drop, square));
        }
        if !(4..=5).contains(&bytes.len()) {
            return Err(MoveParseError::InvalidLength(uci.chars().count()));
        }
        let from = parse_square(&bytes[0..2], uci)?;
        let to = parse_square(&bytes[2..4], uci)?;
        let promotion = match bytes.get(4) {
            // promotion letters are lowercase in UCI
            Some(&c) if c.is_ascii_lowercase() => Some(
                PieceType::from_symbol(c).ok_or(MoveParseError::InvalidPiece(char::from(c)))?,
            ),
            Some(&c) => return Err(MoveParseError::InvalidPiece(char::from(c))),
            None => None,
        };
        if from == to {
            return Err(MoveParseError::SameSquare(uci.to_string()));
        }
        Ok(Self {
            from,
            to,
            promotion,
            drop: None,
        })
    }
}

fn parse_square(bytes: &[u8], uci: &str) -> Result<Square, MoveParseError> {
    let invalid = || MoveParseError::InvalidSquare(uci.to_string());
    let file = File::from_char(bytes[0]).ok_or_else(invalid)?;
    let rank = Rank::from_char(bytes[1]).ok_or_else(invalid)?;
    Ok(Square::from_rank_file(rank, file))
}

impl Default for Move {
    fn default() -> Self {
        Self::NULL
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.uci())
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "Move.from_uci({:?})", self.uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_move() {
        let m = Move::from_uci("e2e4").unwrap();
        assert_eq!(m.from(), Square::E2);
        assert_eq!(m.to(), Square::E4);
        assert!(!m.is_promo());
        assert!(!m.is_null());
        assert_eq!(m.to_string(), "e2e4");
        assert_eq!(format!("{m:?}"), "Move.from_uci(\"e2e4\")");
    }

    #[test]
    fn promotion() {
        let m = Move::from_uci("a7a8q").unwrap();
        assert_eq!(m.promotion(), Some(PieceType::Queen));
        assert_eq!(m.uci(), "a7a8q");
        assert_eq!(Move::from_uci("b2a1n").unwrap().promotion(), Some(PieceType::Knight));
        assert!(Move::from_uci("a7a8Q").is_err());
        assert!(Move::from_uci("a7a8x").is_err());
    }

    #[test]
    fn null_move() {
        let m = Move::from_uci("0000").unwrap();
        assert!(m.is_null());
        assert_eq!(m, Move::NULL);
        assert_eq!(m.uci(), "0000");
        assert_eq!(m.xboard(), "@@@@");
        assert_eq!(Move::default(), Move::NULL);
    }

    #[test]
    fn drops() {
        let m = Move::from_uci("N@f3").unwrap();
        assert_eq!(m.drop(), Some(PieceType::Knight));
        assert_eq!(m.from(), Square::F3);
        assert_eq!(m.to(), Square::F3);
        assert_eq!(m.uci(), "N@f3");
        assert_eq!(Move::from_uci("p@a1").unwrap().uci(), "P@a1");
        // a drop on a1 is not a null move
        assert!(!Move::new_drop(PieceType::Pawn, Square::A1).is_null());
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(Move::from_uci("e2"), Err(MoveParseError::InvalidLength(2)));
        assert_eq!(Move::from_uci("e2e4q1"), Err(MoveParseError::InvalidLength(6)));
        assert!(matches!(
            Move::from_uci("e2e2"),
            Err(MoveParseError::SameSquare(_))
        ));
        assert!(matches!(
            Move::from_uci("i2e4"),
            Err(MoveParseError::InvalidSquare(_))
        ));
        assert!(matches!(
            Move::from_uci("X@e4"),
            Err(MoveParseError::InvalidPiece('X'))
        ));
    }

    #[test]
    fn uci_round_trip() {
        for uci in ["g1f3", "e7e8r", "h2h1b", "Q@d5", "0000", "e1h1"] {
            assert_eq!(Move::from_uci(uci).unwrap().uci(), uci);
        }
    }
}
