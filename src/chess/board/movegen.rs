use std::{
    fmt::{Display, Formatter},
    ops::Deref,
};

use crate::chess::{
    attacks,
    board::Board,
    chessmove::Move,
    piece::{Black, Col, Colour, PieceType, White},
    squareset::SquareSet,
    types::{File, Rank, Square},
};

/// The most legal moves any reachable position has.
pub const MAX_POSITION_MOVES: usize = 218;

/// Moves in generation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveList {
    inner: Vec<Move>,
}

impl MoveList {
    pub fn new() -> Self {
        Self {
            inner: Vec::with_capacity(MAX_POSITION_MOVES),
        }
    }

    fn push(&mut self, m: Move) {
        self.inner.push(m);
    }

    /// All four promotions of a pawn move landing on the last rank, or the
    /// plain move otherwise.
    fn push_pawn_move(&mut self, from: Square, to: Square) {
        if SquareSet::BACK_RANKS.contains_square(to) {
            for promo in PieceType::PROMOTIONS {
                self.push(Move::new_with_promo(from, to, promo));
            }
        } else {
            self.push(Move::new(from, to));
        }
    }

    pub fn into_inner(self) -> Vec<Move> {
        self.inner
    }
}

impl Deref for MoveList {
    type Target = [Move];

    fn deref(&self) -> &[Move] {
        &self.inner
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl Extend<Move> for MoveList {
    fn extend<T: IntoIterator<Item = Move>>(&mut self, iter: T) {
        self.inner.extend(iter);
    }
}

impl Display for MoveList {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        if self.inner.is_empty() {
            return write!(f, "MoveList: (0) []");
        }
        writeln!(f, "MoveList: ({}) [", self.inner.len())?;
        for m in &self.inner[0..self.inner.len() - 1] {
            writeln!(f, "  {m},")?;
        }
        writeln!(f, "  {}", self.inner[self.inner.len() - 1])?;
        write!(f, "]")
    }
}

impl Board {
    /// Pseudo-legal moves from squares in `from_mask` to squares in
    /// `to_mask`. These may leave the king in check, but castling moves are
    /// fully checked.
    pub fn generate_pseudo_legal_moves(&self, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = MoveList::new();
        self.pseudo_legal_moves_into(from_mask, to_mask, &mut out);
        out
    }

    fn pseudo_legal_moves_into(&self, from_mask: SquareSet, to_mask: SquareSet, out: &mut MoveList) {
        let layout = self.layout();
        let turn = self.turn();
        let our_pieces = layout.colours[turn];

        let non_pawns = our_pieces & !layout.pieces[PieceType::Pawn] & from_mask;
        for from in non_pawns.iter_reversed() {
            let targets = layout.attacks_mask(from) & !our_pieces & to_mask;
            for to in targets.iter_reversed() {
                out.push(Move::new(from, to));
            }
        }

        if (from_mask & layout.pieces[PieceType::King]).non_empty() {
            self.castling_moves_into(from_mask, to_mask, out);
        }

        let pawns = layout.pieces[PieceType::Pawn] & our_pieces & from_mask;
        if pawns.is_empty() {
            return;
        }

        for from in pawns.iter_reversed() {
            let targets = attacks::pawn_attacks(turn, from) & layout.colours[!turn] & to_mask;
            for to in targets.iter_reversed() {
                out.push_pawn_move(from, to);
            }
        }

        match turn {
            Colour::White => self.pawn_advances_into::<White>(pawns, to_mask, out),
            Colour::Black => self.pawn_advances_into::<Black>(pawns, to_mask, out),
        }

        if self.ep_square().is_some() {
            self.pseudo_legal_ep_into(from_mask, to_mask, out);
        }
    }

    fn pawn_advances_into<C: Col>(&self, pawns: SquareSet, to_mask: SquareSet, out: &mut MoveList) {
        let empty = !self.occupied();
        let forward = |bb: SquareSet| if C::WHITE { bb.north_one() } else { bb.south_one() };
        let double_ranks = SquareSet::RANKS[Rank::Three.relative_to(C::COLOUR)]
            | SquareSet::RANKS[C::PAWN_DOUBLE_RANK];

        let single_moves = forward(pawns) & empty;
        let double_moves = forward(single_moves) & empty & double_ranks & to_mask;

        for to in (single_moves & to_mask).iter_reversed() {
            if let Some(from) = to.offset(-C::PAWN_FWD_OFFSET) {
                out.push_pawn_move(from, to);
            }
        }
        for to in double_moves.iter_reversed() {
            if let Some(from) = to.offset(-C::PAWN_DOUBLE_OFFSET) {
                out.push(Move::new(from, to));
            }
        }
    }

    /// Pseudo-legal en passant captures.
    pub fn generate_pseudo_legal_ep(&self, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = MoveList::new();
        self.pseudo_legal_ep_into(from_mask, to_mask, &mut out);
        out
    }

    fn pseudo_legal_ep_into(&self, from_mask: SquareSet, to_mask: SquareSet, out: &mut MoveList) {
        let Some(ep_square) = self.ep_square() else {
            return;
        };
        if !to_mask.contains_square(ep_square) || self.occupied().contains_square(ep_square) {
            return;
        }
        let turn = self.turn();
        let capturers = self.pieces_mask(PieceType::Pawn, turn)
            & from_mask
            & attacks::pawn_attacks(!turn, ep_square)
            & SquareSet::RANKS[Rank::Five.relative_to(turn)];
        for capturer in capturers.iter_reversed() {
            out.push(Move::new(capturer, ep_square));
        }
    }

    /// Pseudo-legal captures, en passant included.
    pub fn generate_pseudo_legal_captures(&self, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = self.generate_pseudo_legal_moves(from_mask, to_mask & self.occupied_co(!self.turn()));
        self.pseudo_legal_ep_into(from_mask, to_mask, &mut out);
        out
    }

    /// Legal castling moves, encoded for this board's mode.
    pub fn generate_castling_moves(&self, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = MoveList::new();
        self.castling_moves_into(from_mask, to_mask, &mut out);
        out
    }

    fn castling_moves_into(&self, from_mask: SquareSet, to_mask: SquareSet, out: &mut MoveList) {
        if self.is_variant_end() {
            return;
        }
        let layout = self.layout();
        let turn = self.turn();
        let backrank_rank = Rank::One.relative_to(turn);
        let backrank = SquareSet::RANKS[backrank_rank];
        let Some(king) = (layout.pieces_mask(PieceType::King, turn)
            & !layout.promoted
            & backrank
            & from_mask)
            .lsb()
        else {
            return;
        };
        let king_bb = king.as_set();
        let occupied = self.occupied();

        for candidate in (self.clean_castling_rights() & backrank & to_mask).iter_reversed() {
            let rook_bb = candidate.as_set();
            let a_side = candidate < king;
            let (king_to, rook_to) = if a_side {
                (Square::from_rank_file(backrank_rank, File::C), Square::from_rank_file(backrank_rank, File::D))
            } else {
                (Square::from_rank_file(backrank_rank, File::G), Square::from_rank_file(backrank_rank, File::F))
            };
            let king_path = attacks::between(king, king_to);
            let rook_path = attacks::between(candidate, rook_to);

            let blocked = ((occupied ^ king_bb ^ rook_bb)
                & (king_path | rook_path | king_to.as_set() | rook_to.as_set()))
            .non_empty();
            if blocked
                || self.attacked_for_king(king_path | king_bb, occupied ^ king_bb)
                || self.attacked_for_king(
                    king_to.as_set(),
                    occupied ^ king_bb ^ rook_bb ^ rook_to.as_set(),
                )
            {
                continue;
            }
            out.push(self.from_chess960(self.chess960(), Move::new(king, candidate)));
        }
    }

    /// Whether the opponent attacks any square of `path`, given `occupied`.
    pub(crate) fn attacked_for_king(&self, path: SquareSet, occupied: SquareSet) -> bool {
        let layout = self.layout();
        path.iter_reversed()
            .any(|sq| layout.attackers_mask_with(!self.turn(), sq, occupied).non_empty())
    }

    /// Legal moves from squares in `from_mask` to squares in `to_mask`.
    ///
    /// Without a king every pseudo-legal move is legal.
    pub fn generate_legal_moves(&self, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = MoveList::new();
        if self.is_variant_end() {
            return out;
        }

        let Some(king) = self.pieces_mask(PieceType::King, self.turn()).msb() else {
            self.pseudo_legal_moves_into(from_mask, to_mask, &mut out);
            return out;
        };
        let blockers = self.slider_blockers(king);
        let checkers = self.attackers_mask(!self.turn(), king);

        let candidates = if checkers.non_empty() {
            self.generate_evasions(king, checkers, from_mask, to_mask)
        } else {
            self.generate_pseudo_legal_moves(from_mask, to_mask)
        };
        out.extend(candidates.into_iter().filter(|&m| self.is_safe(king, blockers, m)));
        out
    }

    /// Legal en passant captures.
    pub fn generate_legal_ep(&self, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = MoveList::new();
        if self.is_variant_end() {
            return out;
        }
        out.extend(
            self.generate_pseudo_legal_ep(from_mask, to_mask)
                .into_iter()
                .filter(|&m| !self.is_into_check(m)),
        );
        out
    }

    /// Legal captures, en passant included.
    pub fn generate_legal_captures(&self, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = self.generate_legal_moves(from_mask, to_mask & self.occupied_co(!self.turn()));
        out.extend(self.generate_legal_ep(from_mask, to_mask));
        out
    }

    /// Our pieces that are the only thing between our king and an enemy
    /// slider aimed at it.
    fn slider_blockers(&self, king: Square) -> SquareSet {
        let layout = self.layout();
        let rooks_and_queens = layout.orthogonal_sliders();
        let bishops_and_queens = layout.diagonal_sliders();
        let snipers = (attacks::rank_attacks(king, SquareSet::EMPTY) & rooks_and_queens)
            | (attacks::file_attacks(king, SquareSet::EMPTY) & rooks_and_queens)
            | (attacks::diagonal_attacks(king, SquareSet::EMPTY) & bishops_and_queens);

        let occupied = self.occupied();
        let mut blockers = SquareSet::EMPTY;
        for sniper in (snipers & layout.colours[!self.turn()]).iter_reversed() {
            let b = attacks::between(king, sniper) & occupied;
            if b.one() {
                blockers |= b;
            }
        }
        blockers & layout.colours[self.turn()]
    }

    fn is_safe(&self, king: Square, blockers: SquareSet, m: Move) -> bool {
        if m.from() == king {
            self.is_castling(m) || !self.is_attacked_by(!self.turn(), m.to())
        } else if self.is_en_passant(m) {
            self.pin_mask(self.turn(), m.from()).contains_square(m.to())
                && !self.ep_skewered(king, m.from())
        } else {
            !blockers.contains_square(m.from()) || attacks::ray(m.from(), m.to()).contains_square(king)
        }
    }

    /// Whether taking en passant with `capturer` would open a line to the
    /// king, since both pawns leave the same rank at once.
    fn ep_skewered(&self, king: Square, capturer: Square) -> bool {
        let Some(ep_square) = self.ep_square() else {
            return false;
        };
        let Some(last_double) = ep_square.pawn_push(!self.turn()) else {
            return false;
        };
        let layout = self.layout();
        let occupancy = (self.occupied() & !last_double.as_set() & !capturer.as_set()) | ep_square.as_set();
        let them = layout.colours[!self.turn()];

        let horizontal_attackers = them & layout.orthogonal_sliders();
        if (attacks::rank_attacks(king, occupancy) & horizontal_attackers).non_empty() {
            return true;
        }

        // not reachable by a double push in a real game, but setups can have it
        let diagonal_attackers = them & layout.diagonal_sliders();
        (attacks::diagonal_attacks(king, occupancy) & diagonal_attackers).non_empty()
    }

    /// Moves that might get out of check: king steps off the checking lines,
    /// and with a single checker, captures and blocks.
    fn generate_evasions(&self, king: Square, checkers: SquareSet, from_mask: SquareSet, to_mask: SquareSet) -> MoveList {
        let mut out = MoveList::new();
        let layout = self.layout();
        let sliders = checkers & (layout.diagonal_sliders() | layout.orthogonal_sliders());
        let mut attacked = SquareSet::EMPTY;
        for checker in sliders.iter_reversed() {
            attacked |= attacks::ray(king, checker) & !checker.as_set();
        }

        if from_mask.contains_square(king) {
            let targets = attacks::king_attacks(king) & !layout.colours[self.turn()] & !attacked & to_mask;
            for to in targets.iter_reversed() {
                out.push(Move::new(king, to));
            }
        }

        if checkers.one() {
            let Some(checker) = checkers.msb() else {
                return out;
            };
            let target = attacks::between(king, checker) | checkers;
            self.pseudo_legal_moves_into(
                !layout.pieces[PieceType::King] & from_mask,
                target & to_mask,
                &mut out,
            );

            // a pawn that just double-pushed can be taken en passant, which
            // does not land on the target squares
            if let Some(ep_square) = self.ep_square() {
                if !target.contains_square(ep_square)
                    && ep_square.pawn_push(!self.turn()) == Some(checker)
                {
                    self.pseudo_legal_ep_into(from_mask, to_mask, &mut out);
                }
            }
        }

        out
    }

    /// Whether `m` obeys piece movement and occupancy, ignoring checks.
    /// Castling is accepted in the encoding this board uses.
    pub fn is_pseudo_legal(&self, m: Move) -> bool {
        if m.is_null() || m.is_drop() {
            return false;
        }
        let Some(piece) = self.piece_type_at(m.from()) else {
            return false;
        };
        let from_mask = m.from().as_set();
        let to_mask = m.to().as_set();
        let turn = self.turn();
        if !self.occupied_co(turn).contains_square(m.from()) {
            return false;
        }

        if m.is_promo() {
            if piece != PieceType::Pawn {
                return false;
            }
            if m.to().rank() != Rank::Eight.relative_to(turn) {
                return false;
            }
        }

        if piece == PieceType::King {
            let castling = self.from_chess960(self.chess960(), Move::new(m.from(), m.to()));
            if self.generate_castling_moves(SquareSet::FULL, SquareSet::FULL).contains(&castling) {
                return true;
            }
        }

        if self.occupied_co(turn).contains_square(m.to()) {
            return false;
        }

        if piece == PieceType::Pawn {
            return self.generate_pseudo_legal_moves(from_mask, to_mask).contains(&m);
        }

        (self.attacks_mask(m.from()) & to_mask).non_empty()
    }

    pub fn is_legal(&self, m: Move) -> bool {
        !self.is_variant_end() && self.is_pseudo_legal(m) && !self.is_into_check(m)
    }

    /// Whether a pseudo-legal move would leave our own king in check.
    pub fn is_into_check(&self, m: Move) -> bool {
        let Some(king) = self.king(self.turn()) else {
            return false;
        };

        let checkers = self.attackers_mask(!self.turn(), king);
        if checkers.non_empty()
            && !self
                .generate_evasions(king, checkers, m.from().as_set(), m.to().as_set())
                .contains(&m)
        {
            return true;
        }

        !self.is_safe(king, self.slider_blockers(king), m)
    }

    /// Whether the side that just moved left its king in check.
    pub fn was_into_check(&self) -> bool {
        self.king(!self.turn())
            .is_some_and(|king| self.is_attacked_by(self.turn(), king))
    }

    /// Whether `m` gives check. The move must be pseudo-legal.
    pub fn gives_check(&self, m: Move) -> bool {
        let mut probe = self.probe();
        probe.push(m);
        probe.is_check()
    }

    pub fn is_castling(&self, m: Move) -> bool {
        if !self.layout().pieces[PieceType::King].contains_square(m.from()) {
            return false;
        }
        m.from().file().abs_diff(m.to().file()) > 1
            || self
                .pieces_mask(PieceType::Rook, self.turn())
                .contains_square(m.to())
    }

    pub fn is_kingside_castling(&self, m: Move) -> bool {
        self.is_castling(m) && m.to().file() > m.from().file()
    }

    pub fn is_queenside_castling(&self, m: Move) -> bool {
        self.is_castling(m) && m.to().file() < m.from().file()
    }

    pub fn is_en_passant(&self, m: Move) -> bool {
        self.ep_square() == Some(m.to())
            && self.layout().pieces[PieceType::Pawn].contains_square(m.from())
            && matches!(m.from().inner().abs_diff(m.to().inner()), 7 | 9)
            && !self.occupied().contains_square(m.to())
    }

    pub fn is_capture(&self, m: Move) -> bool {
        self.occupied_co(!self.turn()).contains_square(m.to()) || self.is_en_passant(m)
    }

    /// Pawn moves and captures, which reset the halfmove clock.
    pub fn is_zeroing(&self, m: Move) -> bool {
        let touched = m.from().as_set() ^ m.to().as_set();
        (touched & self.layout().pieces[PieceType::Pawn]).non_empty()
            || (touched & self.occupied_co(!self.turn())).non_empty()
            || m.drop() == Some(PieceType::Pawn)
    }

    /// Whether `m` loses any castling rights, by moving a rook or king or by
    /// capturing a rook.
    pub fn reduces_castling_rights(&self, m: Move) -> bool {
        let rights = self.clean_castling_rights();
        let touched = m.from().as_set() ^ m.to().as_set();
        let layout = self.layout();
        let unpromoted_kings = layout.pieces[PieceType::King] & !layout.promoted;

        (touched & rights).non_empty()
            || ((rights & SquareSet::RANK_1).non_empty()
                && (touched & unpromoted_kings & layout.colours[Colour::White]).non_empty())
            || ((rights & SquareSet::RANK_8).non_empty()
                && (touched & unpromoted_kings & layout.colours[Colour::Black]).non_empty())
    }

    /// Whether no position before `m` can occur again after it.
    pub fn is_irreversible(&self, m: Move) -> bool {
        self.is_zeroing(m) || self.reduces_castling_rights(m) || self.has_legal_en_passant()
    }

    pub fn has_pseudo_legal_en_passant(&self) -> bool {
        self.ep_square().is_some()
            && !self
                .generate_pseudo_legal_ep(SquareSet::FULL, SquareSet::FULL)
                .is_empty()
    }

    pub fn has_legal_en_passant(&self) -> bool {
        self.ep_square().is_some()
            && !self
                .generate_legal_ep(SquareSet::FULL, SquareSet::FULL)
                .is_empty()
    }

    /// Enemy pieces giving check.
    pub fn checkers_mask(&self) -> SquareSet {
        self.king(self.turn())
            .map_or(SquareSet::EMPTY, |king| self.attackers_mask(!self.turn(), king))
    }

    pub fn is_check(&self) -> bool {
        self.checkers_mask().non_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && !self.legal_moves().any()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && !self.is_variant_end() && !self.legal_moves().any()
    }

    pub fn legal_moves(&self) -> LegalMoves<'_> {
        LegalMoves { board: self }
    }

    pub fn pseudo_legal_moves(&self) -> PseudoLegalMoves<'_> {
        PseudoLegalMoves { board: self }
    }
}

/// The legal moves of a position, generated on demand.
#[derive(Clone, Copy)]
pub struct LegalMoves<'a> {
    board: &'a Board,
}

impl LegalMoves<'_> {
    pub fn iter(&self) -> std::vec::IntoIter<Move> {
        self.board
            .generate_legal_moves(SquareSet::FULL, SquareSet::FULL)
            .into_iter()
    }

    pub fn any(&self) -> bool {
        !self
            .board
            .generate_legal_moves(SquareSet::FULL, SquareSet::FULL)
            .is_empty()
    }

    pub fn count(&self) -> usize {
        self.board
            .generate_legal_moves(SquareSet::FULL, SquareSet::FULL)
            .len()
    }

    pub fn contains(&self, m: Move) -> bool {
        self.board.is_legal(m)
    }
}

impl IntoIterator for LegalMoves<'_> {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The pseudo-legal moves of a position, generated on demand.
#[derive(Clone, Copy)]
pub struct PseudoLegalMoves<'a> {
    board: &'a Board,
}

impl PseudoLegalMoves<'_> {
    pub fn iter(&self) -> std::vec::IntoIter<Move> {
        self.board
            .generate_pseudo_legal_moves(SquareSet::FULL, SquareSet::FULL)
            .into_iter()
    }

    pub fn any(&self) -> bool {
        !self
            .board
            .generate_pseudo_legal_moves(SquareSet::FULL, SquareSet::FULL)
            .is_empty()
    }

    pub fn count(&self) -> usize {
        self.board
            .generate_pseudo_legal_moves(SquareSet::FULL, SquareSet::FULL)
            .len()
    }

    pub fn contains(&self, m: Move) -> bool {
        self.board.is_pseudo_legal(m)
    }
}

impl IntoIterator for PseudoLegalMoves<'_> {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
