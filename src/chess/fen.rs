use std::str::SplitWhitespace;

use arrayvec::ArrayVec;

use crate::{
    chess::{
        piece::{Colour, PieceType},
        piecelayout::PieceLayout,
        squareset::SquareSet,
        types::{File, Rank, Square},
    },
    errors::FenParseError,
};

/// The flags of a FEN castling field, in the order they were written.
/// Each is one of `KQkq` or a file letter `A`-`H` / `a`-`h`.
pub type CastlingFlags = ArrayVec<u8, 4>;

/// A parsed FEN. Missing trailing fields default to `w - - 0 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    pub board: PieceLayout,
    pub turn: Colour,
    pub castling: CastlingFlags,
    pub ep: Option<Square>,
    pub halfmove: u32,
    pub fullmove: u32,
}

impl Fen {
    /// Parses a FEN. Every field is validated before anything is returned.
    pub fn parse(fen: &str) -> Result<Self, FenParseError> {
        Self::parse_inner(&mut fen.split_whitespace())
    }

    fn parse_inner(tokens: &mut SplitWhitespace<'_>) -> Result<Self, FenParseError> {
        // Field #1: Piece placement
        let board_str = tokens.next().ok_or(FenParseError::MissingBoard)?;

        // Field #2: Active colour
        let turn = tokens.next().map_or(Ok(Colour::White), Self::parse_turn)?;

        // Field #3: Castling availability
        let castling = tokens
            .next()
            .map_or_else(|| Ok(CastlingFlags::new()), parse_castling)?;

        // Field #4: En passant target square
        let ep = tokens.next().map_or(Ok(None), Self::parse_ep)?;

        // Field #5: Halfmove clock
        let halfmove = tokens.next().map_or(Ok(0), |s| {
            s.parse::<u32>()
                .map_err(|_| FenParseError::InvalidHalfmoveClock(s.to_string()))
        })?;

        // Field #6: Fullmove number, where 0 is read as 1
        let fullmove = tokens.next().map_or(Ok(1), |s| {
            s.parse::<u32>()
                .map(|n| max!(n, 1))
                .map_err(|_| FenParseError::InvalidFullmoveNumber(s.to_string()))
        })?;

        // trailing fields are checked before the board
        if tokens.next().is_some() {
            return Err(FenParseError::ExtraTokens);
        }
        let board = PieceLayout::from_board_fen(board_str)?;

        Ok(Self {
            board,
            turn,
            castling,
            ep,
            halfmove,
            fullmove,
        })
    }

    fn parse_turn(s: &str) -> Result<Colour, FenParseError> {
        match s {
            "w" => Ok(Colour::White),
            "b" => Ok(Colour::Black),
            _ => Err(FenParseError::InvalidSide(s.to_string())),
        }
    }

    fn parse_ep(s: &str) -> Result<Option<Square>, FenParseError> {
        if s == "-" {
            return Ok(None);
        }
        s.parse()
            .map(Some)
            .map_err(|_| FenParseError::InvalidEnPassant(s.to_string()))
    }
}

/// Validates a castling field: `-`, or up to two white flags followed by up
/// to two black flags.
pub fn parse_castling(s: &str) -> Result<CastlingFlags, FenParseError> {
    let invalid = || FenParseError::InvalidCastling(s.to_string());
    let mut flags = CastlingFlags::new();
    if s == "-" || s.is_empty() {
        return Ok(flags);
    }

    let bytes = s.as_bytes();
    let white = bytes
        .iter()
        .take_while(|c| matches!(c, b'K' | b'Q' | b'A'..=b'H'))
        .count();
    let black = bytes[white..]
        .iter()
        .take_while(|c| matches!(c, b'k' | b'q' | b'a'..=b'h'))
        .count();
    if white > 2 || black > 2 || white + black != bytes.len() {
        return Err(invalid());
    }
    flags.try_extend_from_slice(bytes).map_err(|_| invalid())?;
    Ok(flags)
}

/// Resolves castling flags against a placement into a set of rook squares.
///
/// `Q`/`q` picks the outermost rook on the a-side of the king and `K`/`k`
/// the outermost on the h-side, falling back to the corner square. A file
/// letter names the rook's file directly.
pub fn castling_rights_from_flags(layout: &PieceLayout, flags: &[u8]) -> SquareSet {
    let mut rights = SquareSet::EMPTY;
    for &flag in flags {
        let colour = if flag.is_ascii_uppercase() {
            Colour::White
        } else {
            Colour::Black
        };
        let backrank = SquareSet::RANKS[Rank::One.relative_to(colour)];
        let rooks = layout.pieces_mask(PieceType::Rook, colour) & backrank;
        let king = layout.king(colour);

        match flag.to_ascii_lowercase() {
            b'q' => match (king, rooks.lsb()) {
                (Some(king), Some(rook)) if rook < king => rights |= rook.as_set(),
                // no rooks at all still counts as "left of the king"
                (Some(_), None) => (),
                _ => rights |= SquareSet::FILE_A & backrank,
            },
            b'k' => match (king, rooks.msb()) {
                (Some(king), Some(rook)) if king < rook => rights |= rook.as_set(),
                _ => rights |= SquareSet::FILE_H & backrank,
            },
            letter => {
                if let Some(file) = File::from_char(letter) {
                    rights |= SquareSet::FILES[file] & backrank;
                }
            }
        }
    }
    rights
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn parse_startpos() {
        let fen = Fen::parse(STARTPOS).unwrap();
        assert_eq!(fen.turn, Colour::White);
        assert_eq!(fen.halfmove, 0);
        assert_eq!(fen.fullmove, 1);
        assert_eq!(fen.castling.as_slice(), b"KQkq");
        assert!(fen.ep.is_none());
        assert_eq!(fen.board, PieceLayout::starting());
    }

    #[test]
    fn parse_board_only() {
        let fen = Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").unwrap();
        assert_eq!(fen.turn, Colour::White);
        assert!(fen.castling.is_empty());
        assert_eq!(fen.halfmove, 0);
        assert_eq!(fen.fullmove, 1);
    }

    #[test]
    fn parse_bad_segments() {
        let err = Fen::parse("rnbqkbnr/pppppppp/8/8/8/8").unwrap_err();
        assert_eq!(err, FenParseError::BoardSegments(6));
        let err = Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR/PPPPPPPP/RNBQKBNR")
            .unwrap_err();
        assert_eq!(err, FenParseError::BoardSegments(10));
    }

    #[test]
    fn reject_adjacent_digits() {
        let result = Fen::parse("rnbqkbnr/pppppppp/44/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert!(matches!(result, Err(FenParseError::AdjacentDigits)));
    }

    #[test]
    fn reject_uppercase_side() {
        let result = Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR W KQkq - 0 1");
        assert!(matches!(result, Err(FenParseError::InvalidSide(_))));
    }

    #[test]
    fn ep_square_is_not_rank_checked() {
        let fen = Fen::parse("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e4 0 1")
            .unwrap();
        assert_eq!(fen.ep, Some(Square::E4));
        let result = Fen::parse("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq E3 0 1");
        assert!(matches!(result, Err(FenParseError::InvalidEnPassant(_))));
    }

    #[test]
    fn counters() {
        let fen = Fen::parse("4k3/8/8/8/8/8/8/4K3 w - - 150 0").unwrap();
        assert_eq!(fen.halfmove, 150);
        assert_eq!(fen.fullmove, 1);
        assert!(matches!(
            Fen::parse("4k3/8/8/8/8/8/8/4K3 w - - -1 1"),
            Err(FenParseError::InvalidHalfmoveClock(_))
        ));
        assert!(matches!(
            Fen::parse("4k3/8/8/8/8/8/8/4K3 w - - 0 x"),
            Err(FenParseError::InvalidFullmoveNumber(_))
        ));
    }

    #[test]
    fn reject_extra_tokens() {
        let result = Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 extra");
        assert!(matches!(result, Err(FenParseError::ExtraTokens)));
    }

    #[test]
    fn castling_field_shape() {
        assert_eq!(parse_castling("-").unwrap().len(), 0);
        assert_eq!(parse_castling("KQkq").unwrap().as_slice(), b"KQkq");
        assert_eq!(parse_castling("HAha").unwrap().as_slice(), b"HAha");
        assert_eq!(parse_castling("Kq").unwrap().as_slice(), b"Kq");
        assert_eq!(parse_castling("k").unwrap().as_slice(), b"k");
        for bad in ["kK", "KQK", "Kx", "KQkqk", "I", "--"] {
            assert!(
                matches!(parse_castling(bad), Err(FenParseError::InvalidCastling(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn castling_flags_resolve_to_rooks() {
        let layout = PieceLayout::starting();
        assert_eq!(
            castling_rights_from_flags(&layout, b"KQkq"),
            SquareSet::CORNERS
        );
        assert_eq!(
            castling_rights_from_flags(&layout, b"Hb"),
            Square::H1.as_set() | Square::B8.as_set()
        );

        // chess960: rooks on b1 and g1 with the king on d1
        let layout = PieceLayout::from_board_fen("1r1k2r1/8/8/8/8/8/8/1R1K2R1").unwrap();
        assert_eq!(
            castling_rights_from_flags(&layout, b"KQ"),
            Square::B1.as_set() | Square::G1.as_set()
        );

        // no rooks: q adds nothing, k falls back to the corner
        let layout = PieceLayout::from_board_fen("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert_eq!(castling_rights_from_flags(&layout, b"Q"), SquareSet::EMPTY);
        assert_eq!(castling_rights_from_flags(&layout, b"K"), Square::H1.as_set());
    }
}
