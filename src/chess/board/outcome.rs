use std::fmt::{self, Display};

use fxhash::FxHashMap;

use crate::chess::{
    board::Board,
    piece::{Colour, PieceType},
    squareset::SquareSet,
    types::Square,
};

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyfiveMoves,
    FivefoldRepetition,
    /// Claimable, not automatic.
    FiftyMoves,
    /// Claimable, not automatic.
    ThreefoldRepetition,
    VariantWin,
    VariantLoss,
    VariantDraw,
}

impl Termination {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::InsufficientMaterial => "insufficient material",
            Self::SeventyfiveMoves => "seventy-five moves",
            Self::FivefoldRepetition => "fivefold repetition",
            Self::FiftyMoves => "fifty moves",
            Self::ThreefoldRepetition => "threefold repetition",
            Self::VariantWin => "variant win",
            Self::VariantLoss => "variant loss",
            Self::VariantDraw => "variant draw",
        }
    }
}

impl Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The end of a game. `winner` is `None` for draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    pub termination: Termination,
    pub winner: Option<Colour>,
}

impl Outcome {
    /// `1-0`, `0-1` or `1/2-1/2`.
    pub const fn result(&self) -> &'static str {
        match self.winner {
            Some(Colour::White) => "1-0",
            Some(Colour::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.result(), self.termination)
    }
}

/// What makes two positions the same for repetition purposes: placement,
/// side to move, effective castling rights and a legal en passant square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranspositionKey {
    pieces: [SquareSet; 6],
    colours: [SquareSet; 2],
    turn: Colour,
    castling: SquareSet,
    ep_square: Option<Square>,
}

impl Board {
    pub fn transposition_key(&self) -> TranspositionKey {
        let layout = self.layout();
        TranspositionKey {
            pieces: layout.pieces,
            colours: layout.colours,
            turn: self.turn(),
            castling: self.clean_castling_rights(),
            ep_square: self.ep_square().filter(|_| self.has_legal_en_passant()),
        }
    }

    /// How the game ended, if it did. With `claim_draw`, draws that a player
    /// could claim count as well.
    pub fn outcome(&self, claim_draw: bool) -> Option<Outcome> {
        let turn = self.turn();
        if self.is_variant_loss() {
            return Some(Outcome { termination: Termination::VariantLoss, winner: Some(!turn) });
        }
        if self.is_variant_win() {
            return Some(Outcome { termination: Termination::VariantWin, winner: Some(turn) });
        }
        if self.is_variant_draw() {
            return Some(Outcome { termination: Termination::VariantDraw, winner: None });
        }

        if self.is_checkmate() {
            return Some(Outcome { termination: Termination::Checkmate, winner: Some(!turn) });
        }
        let draw = |termination| Some(Outcome { termination, winner: None });
        if self.is_insufficient_material() {
            return draw(Termination::InsufficientMaterial);
        }
        if !self.legal_moves().any() {
            return draw(Termination::Stalemate);
        }

        if self.is_seventyfive_moves() {
            return draw(Termination::SeventyfiveMoves);
        }
        if self.is_fivefold_repetition() {
            return draw(Termination::FivefoldRepetition);
        }

        if claim_draw {
            if self.can_claim_fifty_moves() {
                return draw(Termination::FiftyMoves);
            }
            if self.can_claim_threefold_repetition() {
                return draw(Termination::ThreefoldRepetition);
            }
        }

        None
    }

    pub fn is_game_over(&self, claim_draw: bool) -> bool {
        self.outcome(claim_draw).is_some()
    }

    /// The result string, or `*` while the game goes on.
    pub fn result(&self, claim_draw: bool) -> &'static str {
        self.outcome(claim_draw).map_or("*", |outcome| outcome.result())
    }

    /// Whether neither side can ever deliver mate.
    pub fn is_insufficient_material(&self) -> bool {
        Colour::all().all(|colour| self.has_insufficient_material(colour))
    }

    /// Whether `colour` cannot mate by any sequence of legal moves.
    ///
    /// Only the material on the board is inspected, so some dead positions
    /// (for example blocked pawn chains) are not detected.
    pub fn has_insufficient_material(&self, colour: Colour) -> bool {
        let layout = self.layout();
        let ours = layout.colours[colour];
        let pieces = |piece_type: PieceType| layout.pieces[piece_type];

        if (ours & (pieces(PieceType::Pawn) | pieces(PieceType::Rook) | pieces(PieceType::Queen))).non_empty() {
            return false;
        }

        // a lone knight mates only with help from enemy pieces other than
        // queens
        if (ours & pieces(PieceType::Knight)).non_empty() {
            return ours.count() <= 2
                && (layout.colours[!colour] & !pieces(PieceType::King) & !pieces(PieceType::Queen))
                    .is_empty();
        }

        // bishops of both square colours can mate, and so can any bishop
        // once a pawn or knight can be used to block
        if (ours & pieces(PieceType::Bishop)).non_empty() {
            let bishops = pieces(PieceType::Bishop);
            let same_colour = (bishops & SquareSet::DARK_SQUARES).is_empty()
                || (bishops & SquareSet::LIGHT_SQUARES).is_empty();
            return same_colour && pieces(PieceType::Pawn).is_empty() && pieces(PieceType::Knight).is_empty();
        }

        true
    }

    fn is_halfmoves(&self, n: u32) -> bool {
        self.halfmove_clock() >= n && self.legal_moves().any()
    }

    /// Seventy-five moves without a capture or pawn move. Ends the game.
    pub fn is_seventyfive_moves(&self) -> bool {
        self.is_halfmoves(150)
    }

    /// Fifty moves without a capture or pawn move. Only claimable.
    pub fn is_fifty_moves(&self) -> bool {
        self.is_halfmoves(100)
    }

    pub fn is_fivefold_repetition(&self) -> bool {
        self.is_repetition(5)
    }

    /// Whether the fifty-move rule applies now or after some legal move.
    pub fn can_claim_fifty_moves(&self) -> bool {
        if self.is_fifty_moves() {
            return true;
        }
        if self.halfmove_clock() >= 99 {
            for m in self.legal_moves() {
                if self.is_zeroing(m) {
                    continue;
                }
                let mut probe = self.probe();
                probe.push(m);
                if probe.is_fifty_moves() {
                    return true;
                }
            }
        }
        false
    }

    /// Whether the current position occurred three times, or would after
    /// some legal move. Only the history since the last irreversible move is
    /// searched.
    pub fn can_claim_threefold_repetition(&self) -> bool {
        let key = self.transposition_key();
        let mut seen = FxHashMap::<TranspositionKey, u32>::default();
        *seen.entry(key).or_default() += 1;

        let mut replay = self.clone();
        while let Ok(m) = replay.pop() {
            if replay.is_irreversible(m) {
                break;
            }
            *seen.entry(replay.transposition_key()).or_default() += 1;
        }

        if seen.get(&key).copied().unwrap_or_default() >= 3 {
            return true;
        }

        self.legal_moves().iter().any(|m| {
            let mut probe = self.probe();
            probe.push(m);
            seen.get(&probe.transposition_key()).copied().unwrap_or_default() >= 2
        })
    }

    pub fn can_claim_draw(&self) -> bool {
        self.can_claim_fifty_moves() || self.can_claim_threefold_repetition()
    }

    /// Whether the current position occurred at least `count` times,
    /// counting itself. Positions before the last irreversible move are not
    /// considered.
    pub fn is_repetition(&self, count: usize) -> bool {
        // cheap pass on occupancy alone
        let occupied = self.occupied();
        let mut maybe_repetitions = 1;
        for state in self.history.iter().rev() {
            if state.layout.occupied() == occupied {
                maybe_repetitions += 1;
                if maybe_repetitions >= count {
                    break;
                }
            }
        }
        if maybe_repetitions < count {
            return false;
        }

        let key = self.transposition_key();
        let mut remaining = count;
        let mut replay = self.clone();
        loop {
            if remaining <= 1 {
                return true;
            }
            if replay.move_stack().len() < remaining - 1 {
                return false;
            }
            let Ok(m) = replay.pop() else {
                return false;
            };
            if replay.is_irreversible(m) {
                return false;
            }
            if replay.transposition_key() == key {
                remaining -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn play(board: &mut Board, moves: &[&str]) {
        for uci in moves {
            board.push_uci(uci).unwrap();
        }
    }

    #[test]
    fn checkmate_outcome() {
        let mut b = Board::starting();
        play(&mut b, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        let outcome = b.outcome(false).unwrap();
        assert_eq!(outcome.termination, Termination::Checkmate);
        assert_eq!(outcome.winner, Some(Colour::Black));
        assert_eq!(outcome.result(), "0-1");
        assert_eq!(b.result(false), "0-1");
        assert!(b.is_game_over(false));
    }

    #[test]
    fn ongoing_game() {
        let b = Board::starting();
        assert_eq!(b.outcome(true), None);
        assert_eq!(b.result(true), "*");
        assert!(!b.is_game_over(true));
    }

    #[test]
    fn stalemate_outcome() {
        let b = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let outcome = b.outcome(false).unwrap();
        assert_eq!(outcome.termination, Termination::Stalemate);
        assert_eq!(outcome.result(), "1/2-1/2");
    }

    #[test]
    fn insufficient_material() {
        let cases = [
            ("8/8/8/8/8/8/8/K6k w - - 0 1", true, true),
            ("8/8/8/8/8/8/8/KN5k w - - 0 1", true, true),
            ("8/8/8/8/8/8/8/KB5k w - - 0 1", true, true),
            // same-coloured bishops on both sides
            ("8/8/8/3b4/8/8/8/KB5k w - - 0 1", true, true),
            // opposite-coloured bishops can mate
            ("8/8/8/4b3/8/8/8/KB5k w - - 0 1", false, false),
            // knight against a rook can help mate
            ("8/8/8/8/8/8/8/KN4rk w - - 0 1", false, false),
            // knight against a queen cannot
            ("8/8/8/8/8/8/8/KN4qk w - - 0 1", true, false),
            ("8/8/8/8/8/8/P7/K6k w - - 0 1", false, true),
            ("8/8/8/8/8/8/8/KNN4k w - - 0 1", false, true),
        ];
        for (fen, white, black) in cases {
            let b = board(fen);
            assert_eq!(b.has_insufficient_material(Colour::White), white, "{fen}");
            assert_eq!(b.has_insufficient_material(Colour::Black), black, "{fen}");
            assert_eq!(b.is_insufficient_material(), white && black, "{fen}");
        }
        let outcome = board("8/8/8/8/8/8/8/KB5k w - - 0 1").outcome(false).unwrap();
        assert_eq!(outcome.termination, Termination::InsufficientMaterial);
    }

    #[test]
    fn move_rules() {
        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 150 80");
        assert!(b.is_seventyfive_moves());
        assert_eq!(
            b.outcome(false).unwrap().termination,
            Termination::SeventyfiveMoves
        );

        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 100 60");
        assert!(b.is_fifty_moves());
        assert_eq!(b.outcome(false), None);
        assert_eq!(
            b.outcome(true).unwrap().termination,
            Termination::FiftyMoves
        );

        // one quiet move away
        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 99 60");
        assert!(!b.is_fifty_moves());
        assert!(b.can_claim_fifty_moves());
        assert!(b.can_claim_draw());

        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 98 60");
        assert!(!b.can_claim_fifty_moves());
    }

    #[test]
    fn threefold_and_fivefold() {
        let mut b = Board::starting();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];

        play(&mut b, &shuffle);
        assert!(b.is_repetition(2));
        assert!(!b.is_repetition(3));
        assert!(!b.can_claim_threefold_repetition());

        // the next knight move reaches a third occurrence
        play(&mut b, &shuffle[..3]);
        assert!(b.can_claim_threefold_repetition());
        play(&mut b, &shuffle[3..]);
        assert!(b.is_repetition(3));
        assert!(b.can_claim_threefold_repetition());
        assert_eq!(b.outcome(false), None);
        assert_eq!(
            b.outcome(true).unwrap().termination,
            Termination::ThreefoldRepetition
        );

        play(&mut b, &shuffle);
        play(&mut b, &shuffle);
        assert!(b.is_fivefold_repetition());
        assert_eq!(
            b.outcome(false).unwrap().termination,
            Termination::FivefoldRepetition
        );
    }

    #[test]
    fn repetition_stops_at_irreversible_moves() {
        let mut b = Board::starting();
        play(&mut b, &["g1f3", "g8f6", "f3g1", "f6g8", "e2e4", "e7e5"]);
        play(&mut b, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert!(b.is_repetition(2));
        assert!(!b.is_repetition(3));
    }

    #[test]
    fn lost_castling_rights_change_the_key() {
        let mut b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let start = b.transposition_key();
        play(&mut b, &["e1f1", "e8f8", "f1e1", "f8e8"]);
        assert_ne!(b.transposition_key(), start);
        assert!(!b.is_repetition(2));
    }

    #[test]
    fn unusable_ep_square_does_not_change_the_key() {
        let with_ep = board("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        let without = board("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(with_ep.transposition_key(), without.transposition_key());
        assert_eq!(with_ep, without);
    }
}
