pub mod epd;
pub mod movegen;
pub mod outcome;
mod san;
pub mod validation;

use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
};

use crate::{
    chess::{
        chessmove::Move,
        fen::{self, Fen},
        piece::{Colour, Piece, PieceType},
        piecelayout::PieceLayout,
        squareset::SquareSet,
        types::{File, Rank, Square},
        variant::{Rules, Standard},
    },
    errors::{Chess960IndexError, EmptyMoveStack, FenParseError, MoveParseError},
};

/// Everything about a position except its move history.
///
/// `push` records one of these before mutating the board, and `pop` puts it
/// back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardState {
    pub layout: PieceLayout,
    pub turn: Colour,
    /// Rook squares that still carry castling rights.
    pub castling_rights: SquareSet,
    pub ep_square: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl BoardState {
    const fn empty() -> Self {
        Self {
            layout: PieceLayout {
                pieces: [SquareSet::EMPTY; 6],
                colours: [SquareSet::EMPTY; 2],
                promoted: SquareSet::EMPTY,
            },
            turn: Colour::White,
            castling_rights: SquareSet::EMPTY,
            ep_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

/// How the en passant field of a FEN is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnPassantMode {
    /// Only when a legal en passant capture exists.
    #[default]
    Legal,
    /// Whenever an en passant square is set.
    Fen,
    /// Only when a pseudo-legal en passant capture exists.
    XFen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenOptions {
    /// Castling rights as rook files (`HAha`) instead of `KQkq`.
    pub shredder: bool,
    pub en_passant: EnPassantMode,
    /// Mark promoted pieces with `~`. Defaults to on in Chess960 mode.
    pub promoted: Option<bool>,
}

/// A chess position with its move history.
#[derive(Clone)]
pub struct Board {
    state: BoardState,
    /// Moves pushed since the last reset, as the caller sees them.
    move_stack: Vec<Move>,
    /// One snapshot per entry of `move_stack`.
    history: Vec<BoardState>,
    chess960: bool,
    rules: &'static dyn Rules,
}

impl Board {
    pub const STARTING_FEN: &'static str =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    pub const STARTING_FEN_960: &'static str =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w AHah - 0 1";

    /// An empty board with white to move.
    pub fn empty() -> Self {
        Self {
            state: BoardState::empty(),
            move_stack: Vec::new(),
            history: Vec::new(),
            chess960: false,
            rules: &Standard,
        }
    }

    pub fn starting() -> Self {
        let mut out = Self::empty();
        out.reset();
        out
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenParseError> {
        let mut out = Self::empty();
        out.set_fen(fen)?;
        Ok(out)
    }

    /// The Chess960 starting position `scharnagl`, in Chess960 mode.
    pub fn from_chess960_pos(scharnagl: u32) -> Result<Self, Chess960IndexError> {
        let mut out = Self::empty();
        out.set_chess960_pos(scharnagl)?;
        Ok(out)
    }

    #[must_use]
    pub fn with_chess960(mut self, chess960: bool) -> Self {
        self.chess960 = chess960;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: &'static dyn Rules) -> Self {
        self.rules = rules;
        self
    }

    pub const fn layout(&self) -> &PieceLayout {
        &self.state.layout
    }

    pub const fn state(&self) -> &BoardState {
        &self.state
    }

    pub const fn turn(&self) -> Colour {
        self.state.turn
    }

    pub fn set_turn(&mut self, turn: Colour) {
        self.state.turn = turn;
    }

    /// The raw castling rights, which may name squares without a rook.
    /// See [`Board::clean_castling_rights`].
    pub const fn castling_rights(&self) -> SquareSet {
        self.state.castling_rights
    }

    pub fn set_castling_rights(&mut self, rights: SquareSet) {
        self.state.castling_rights = rights;
    }

    /// The en passant square as set, whether or not a capture is possible.
    pub const fn ep_square(&self) -> Option<Square> {
        self.state.ep_square
    }

    pub fn set_ep_square(&mut self, ep_square: Option<Square>) {
        self.state.ep_square = ep_square;
    }

    pub const fn halfmove_clock(&self) -> u32 {
        self.state.halfmove_clock
    }

    pub fn set_halfmove_clock(&mut self, halfmove_clock: u32) {
        self.state.halfmove_clock = halfmove_clock;
    }

    pub const fn fullmove_number(&self) -> u32 {
        self.state.fullmove_number
    }

    pub fn set_fullmove_number(&mut self, fullmove_number: u32) {
        self.state.fullmove_number = fullmove_number;
    }

    pub const fn chess960(&self) -> bool {
        self.chess960
    }

    pub fn set_chess960(&mut self, chess960: bool) {
        self.chess960 = chess960;
    }

    pub fn rules(&self) -> &'static dyn Rules {
        self.rules
    }

    pub fn move_stack(&self) -> &[Move] {
        &self.move_stack
    }

    /// Half-moves since the start of the game, derived from the fullmove
    /// number and the side to move.
    pub fn ply(&self) -> u32 {
        2 * (self.state.fullmove_number.saturating_sub(1)) + u32::from(self.turn() == Colour::Black)
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.state.layout.piece_at(sq)
    }

    pub fn piece_type_at(&self, sq: Square) -> Option<PieceType> {
        self.state.layout.piece_type_at(sq)
    }

    pub fn colour_at(&self, sq: Square) -> Option<Colour> {
        self.state.layout.colour_at(sq)
    }

    pub fn king(&self, colour: Colour) -> Option<Square> {
        self.state.layout.king(colour)
    }

    pub fn occupied(&self) -> SquareSet {
        self.state.layout.occupied()
    }

    pub fn occupied_co(&self, colour: Colour) -> SquareSet {
        self.state.layout.occupied_co(colour)
    }

    pub fn pieces_mask(&self, piece_type: PieceType, colour: Colour) -> SquareSet {
        self.state.layout.pieces_mask(piece_type, colour)
    }

    pub fn attacks_mask(&self, sq: Square) -> SquareSet {
        self.state.layout.attacks_mask(sq)
    }

    pub fn attackers_mask(&self, colour: Colour, sq: Square) -> SquareSet {
        self.state.layout.attackers_mask(colour, sq)
    }

    pub fn is_attacked_by(&self, colour: Colour, sq: Square) -> bool {
        self.state.layout.is_attacked_by(colour, sq)
    }

    pub fn pin_mask(&self, colour: Colour, sq: Square) -> SquareSet {
        self.state.layout.pin_mask(colour, sq)
    }

    pub fn is_pinned(&self, colour: Colour, sq: Square) -> bool {
        self.state.layout.is_pinned(colour, sq)
    }

    pub fn piece_map(&self, mask: SquareSet) -> BTreeMap<Square, Piece> {
        self.state.layout.piece_map(mask)
    }

    /// Puts a piece on the board. Forgets the move history.
    pub fn set_piece_at(&mut self, sq: Square, piece: Piece, promoted: bool) {
        self.state.layout.set_piece_at(sq, piece, promoted);
        self.clear_stack();
    }

    /// Removes a piece from the board. Forgets the move history.
    pub fn remove_piece_at(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.state.layout.remove_piece_at(sq);
        self.clear_stack();
        piece
    }

    pub fn set_piece_map(&mut self, map: &BTreeMap<Square, Piece>) {
        self.state.layout.set_piece_map(map);
        self.clear_stack();
    }

    /// Back to the standard starting position.
    pub fn reset(&mut self) {
        self.state = BoardState {
            layout: PieceLayout::starting(),
            turn: Colour::White,
            castling_rights: SquareSet::CORNERS,
            ep_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };
        self.clear_stack();
    }

    /// Standard starting placement, keeping the rest of the state.
    pub fn reset_board(&mut self) {
        self.state.layout.reset();
        self.clear_stack();
    }

    /// An empty board with no castling rights, white to move.
    pub fn clear(&mut self) {
        self.state = BoardState::empty();
        self.clear_stack();
    }

    /// Removes every piece, keeping the rest of the state.
    pub fn clear_board(&mut self) {
        self.state.layout.clear();
        self.clear_stack();
    }

    /// Forgets the move history, keeping the position.
    pub fn clear_stack(&mut self) {
        self.move_stack.clear();
        self.history.clear();
    }

    /// A copy that only remembers the last `depth` moves.
    pub fn copy_with_stack(&self, depth: usize) -> Self {
        let depth = min!(depth, self.move_stack.len());
        Self {
            state: self.state,
            move_stack: self.move_stack[self.move_stack.len() - depth..].to_vec(),
            history: self.history[self.history.len() - depth..].to_vec(),
            chess960: self.chess960,
            rules: self.rules,
        }
    }

    /// The position before the first move of the history.
    pub fn root(&self) -> Self {
        let mut out = self.copy_with_stack(0);
        if let Some(&first) = self.history.first() {
            out.state = first;
        }
        out
    }

    /// Copy used to probe moves from `&self` methods. Keeps one snapshot so
    /// that the castling rights are read exactly as on `self`.
    fn probe(&self) -> Self {
        self.copy_with_stack(1)
    }

    /// The position with a square-set symmetry applied. Forgets the history.
    #[must_use]
    pub fn transform(&self, f: impl Fn(SquareSet) -> SquareSet) -> Self {
        let mut out = self.copy_with_stack(0);
        out.state.layout = self.state.layout.transform(&f);
        out.state.ep_square = self.state.ep_square.and_then(|sq| f(sq.as_set()).msb());
        out.state.castling_rights = f(self.state.castling_rights);
        out
    }

    /// Flipped vertically with colours and the side to move swapped.
    #[must_use]
    pub fn mirror(&self) -> Self {
        let mut out = self.transform(SquareSet::flip_vertical);
        out.state.layout.colours.swap(0, 1);
        out.state.turn = !self.state.turn;
        out
    }

    /// Makes a move. Null moves pass the turn.
    ///
    /// # Panics
    ///
    /// Panics if the move is neither null nor a drop and its origin square
    /// is empty. Nothing is modified in that case.
    pub fn push(&mut self, mv: Move) {
        let mv = self.to_chess960(mv);
        let moving = if mv.is_null() || mv.is_drop() {
            None
        } else if let Some(piece_type) = self.state.layout.piece_type_at(mv.from()) {
            Some(piece_type)
        } else {
            panic!(
                "push() expects move to be pseudo-legal, but got {mv} in {}",
                self.state.layout.board_fen(false)
            );
        };
        let zeroing = self.is_zeroing(mv);

        let snapshot = self.state;
        let recorded = self.from_chess960(self.chess960, mv);
        self.state.castling_rights = self.clean_castling_rights();
        self.move_stack.push(recorded);
        self.history.push(snapshot);

        let ep_square = self.state.ep_square.take();
        self.state.halfmove_clock = self.state.halfmove_clock.saturating_add(1);
        if self.state.turn == Colour::Black {
            self.state.fullmove_number = self.state.fullmove_number.saturating_add(1);
        }

        let turn = self.state.turn;
        let Some(mut piece_type) = moving else {
            if let Some(drop) = mv.drop() {
                self.state.layout.set_piece_at(mv.to(), Piece::new(turn, drop), false);
            }
            self.state.turn = !turn;
            return;
        };

        if zeroing {
            self.state.halfmove_clock = 0;
        }

        let (from, to) = (mv.from(), mv.to());
        let layout = &mut self.state.layout;
        let mut promoted = layout.promoted.contains_square(from);
        layout.remove_piece_at(from);
        let mut capture_square = to;
        let mut captured = layout.piece_type_at(to);

        // castling rights
        let rights = &mut self.state.castling_rights;
        *rights &= !(from.as_set() | to.as_set());
        if piece_type == PieceType::King && !promoted {
            *rights &= !SquareSet::RANKS[Rank::One.relative_to(turn)];
        } else if captured == Some(PieceType::King) && !layout.promoted.contains_square(to) {
            // a king was captured on its own back rank
            if to.rank() == Rank::One.relative_to(!turn) {
                *rights &= !SquareSet::RANKS[to.rank()];
            }
        }

        if piece_type == PieceType::Pawn {
            let diff = i16::from(to.inner()) - i16::from(from.inner());
            if diff == 16 && from.rank() == Rank::Two {
                self.state.ep_square = from.add(8);
            } else if diff == -16 && from.rank() == Rank::Seven {
                self.state.ep_square = from.sub(8);
            } else if Some(to) == ep_square && matches!(diff.abs(), 7 | 9) && captured.is_none() {
                if let Some(behind) = to.pawn_push(!turn) {
                    capture_square = behind;
                    captured = layout.remove_piece_at(behind).map(Piece::piece_type);
                }
            }
        }

        if let Some(promotion) = mv.promotion() {
            promoted = true;
            piece_type = promotion;
        }

        let castling = piece_type == PieceType::King && layout.colours[turn].contains_square(to);
        if castling {
            let backrank = Rank::One.relative_to(turn);
            let (king_file, rook_file) = if to.file() < from.file() {
                (File::C, File::D)
            } else {
                (File::G, File::F)
            };
            layout.remove_piece_at(to);
            layout.set_piece_at(
                Square::from_rank_file(backrank, king_file),
                Piece::new(turn, PieceType::King),
                false,
            );
            layout.set_piece_at(
                Square::from_rank_file(backrank, rook_file),
                Piece::new(turn, PieceType::Rook),
                false,
            );
        } else {
            let was_promoted = layout.promoted.contains_square(to);
            layout.set_piece_at(to, Piece::new(turn, piece_type), promoted);
            if let Some(captured) = captured {
                self.rules
                    .on_capture(layout, mv, capture_square, captured, was_promoted);
            }
        }

        self.state.turn = !turn;
    }

    /// Takes back the last move and returns it.
    pub fn pop(&mut self) -> Result<Move, EmptyMoveStack> {
        let mv = self.move_stack.pop().ok_or(EmptyMoveStack)?;
        self.state = self.history.pop().ok_or(EmptyMoveStack)?;
        Ok(mv)
    }

    /// The last move, without taking it back.
    pub fn peek(&self) -> Result<Move, EmptyMoveStack> {
        self.move_stack.last().copied().ok_or(EmptyMoveStack)
    }

    /// Rewrites a standard castling move (`e1g1`) into king-takes-rook form
    /// (`e1h1`), which is what the board uses internally.
    pub(crate) fn to_chess960(&self, mv: Move) -> Move {
        let Some(rank) = castling_king_rank(mv.from()) else {
            return mv;
        };
        let layout = &self.state.layout;
        if !layout.pieces[PieceType::King].contains_square(mv.from()) {
            return mv;
        }
        let rooks = layout.pieces[PieceType::Rook];
        let g = Square::from_rank_file(rank, File::G);
        let c = Square::from_rank_file(rank, File::C);
        if mv.to() == g && !rooks.contains_square(g) {
            Move::new(mv.from(), Square::from_rank_file(rank, File::H))
        } else if mv.to() == c && !rooks.contains_square(c) {
            Move::new(mv.from(), Square::from_rank_file(rank, File::A))
        } else {
            mv
        }
    }

    /// The inverse of [`Board::to_chess960`], applied unless `chess960`.
    pub(crate) fn from_chess960(&self, chess960: bool, mv: Move) -> Move {
        if chess960 || mv.is_promo() || mv.is_drop() {
            return mv;
        }
        let Some(rank) = castling_king_rank(mv.from()) else {
            return mv;
        };
        if !self.state.layout.pieces[PieceType::King].contains_square(mv.from()) {
            return mv;
        }
        if mv.to() == Square::from_rank_file(rank, File::H) {
            Move::new(mv.from(), Square::from_rank_file(rank, File::G))
        } else if mv.to() == Square::from_rank_file(rank, File::A) {
            Move::new(mv.from(), Square::from_rank_file(rank, File::C))
        } else {
            mv
        }
    }

    /// The castling rights that can still matter: rights without a rook on
    /// the square, without an unmoved king, or on a square that cannot be
    /// castled with are dropped.
    ///
    /// Once moves have been pushed the raw rights are already clean and are
    /// returned as they are.
    pub fn clean_castling_rights(&self) -> SquareSet {
        if !self.history.is_empty() {
            return self.state.castling_rights;
        }

        let layout = &self.state.layout;
        let castling = self.state.castling_rights & layout.pieces[PieceType::Rook];
        let mut white = castling & SquareSet::RANK_1 & layout.colours[Colour::White];
        let mut black = castling & SquareSet::RANK_8 & layout.colours[Colour::Black];
        let unpromoted_kings = layout.pieces[PieceType::King] & !layout.promoted;

        if !self.chess960 {
            white &= Square::A1.as_set() | Square::H1.as_set();
            black &= Square::A8.as_set() | Square::H8.as_set();
            if !(unpromoted_kings & layout.colours[Colour::White]).contains_square(Square::E1) {
                white = SquareSet::EMPTY;
            }
            if !(unpromoted_kings & layout.colours[Colour::Black]).contains_square(Square::E8) {
                black = SquareSet::EMPTY;
            }
            return white | black;
        }

        let mut out = SquareSet::EMPTY;
        for (colour, rights, backrank) in [
            (Colour::White, white, SquareSet::RANK_1),
            (Colour::Black, black, SquareSet::RANK_8),
        ] {
            let Some(king) = (unpromoted_kings & layout.colours[colour] & backrank).msb() else {
                continue;
            };
            // only the outermost rook on each side of the king
            if let Some(a_side) = rights.lsb().filter(|&rook| rook < king) {
                out |= a_side.as_set();
            }
            if let Some(h_side) = rights.msb().filter(|&rook| rook > king) {
                out |= h_side.as_set();
            }
        }
        out
    }

    pub fn has_castling_rights(&self, colour: Colour) -> bool {
        (self.clean_castling_rights() & SquareSet::RANKS[Rank::One.relative_to(colour)]).non_empty()
    }

    pub fn has_kingside_castling_rights(&self, colour: Colour) -> bool {
        self.castling_rook_relative_to_king(colour, |rook, king| rook > king)
    }

    pub fn has_queenside_castling_rights(&self, colour: Colour) -> bool {
        self.castling_rook_relative_to_king(colour, |rook, king| rook < king)
    }

    fn castling_rook_relative_to_king(&self, colour: Colour, side: impl Fn(u64, u64) -> bool) -> bool {
        let layout = &self.state.layout;
        let backrank = SquareSet::RANKS[Rank::One.relative_to(colour)];
        let king_mask = layout.pieces_mask(PieceType::King, colour) & backrank & !layout.promoted;
        if king_mask.is_empty() {
            return false;
        }
        (self.clean_castling_rights() & backrank)
            .into_iter()
            .any(|rook| side(rook.as_set().inner(), king_mask.inner()))
    }

    /// Whether the castling rights can only be expressed in Chess960 terms:
    /// a rook off the corners, or rights held by a king off the e-file.
    pub fn has_chess960_castling_rights(&self) -> bool {
        let mut as_960 = self.clone();
        as_960.chess960 = true;
        let rights = as_960.clean_castling_rights();
        let layout = &self.state.layout;

        if (rights & !SquareSet::CORNERS).non_empty() {
            return true;
        }
        let king_on = |colour, sq: Square| layout.pieces_mask(PieceType::King, colour).contains_square(sq);
        if (rights & SquareSet::RANK_1).non_empty() && !king_on(Colour::White, Square::E1) {
            return true;
        }
        if (rights & SquareSet::RANK_8).non_empty() && !king_on(Colour::Black, Square::E8) {
            return true;
        }
        false
    }

    /// Castling rights in Shredder-FEN form, e.g. `HAha`.
    pub fn castling_shredder_fen(&self) -> String {
        let rights = self.clean_castling_rights();
        if rights.is_empty() {
            return "-".to_string();
        }
        let white = (rights & SquareSet::RANK_1)
            .iter_reversed()
            .map(|sq| sq.file().char().to_ascii_uppercase());
        let black = (rights & SquareSet::RANK_8).iter_reversed().map(|sq| sq.file().char());
        white.chain(black).collect()
    }

    /// Castling rights in X-FEN form: `KQkq` where that is unambiguous, the
    /// rook's file otherwise.
    pub fn castling_xfen(&self) -> String {
        let mut builder = String::with_capacity(4);
        let rights = self.clean_castling_rights();
        let layout = &self.state.layout;

        for colour in Colour::all() {
            let Some(king) = self.king(colour) else {
                continue;
            };
            let backrank = SquareSet::RANKS[Rank::One.relative_to(colour)];
            for rook in (rights & backrank).iter_reversed() {
                let a_side = rook.file() < king.file();
                let other_rooks =
                    layout.pieces_mask(PieceType::Rook, colour) & backrank & !rook.as_set();
                let ch = if other_rooks
                    .into_iter()
                    .any(|other| (other.file() < rook.file()) == a_side)
                {
                    rook.file().char()
                } else if a_side {
                    'q'
                } else {
                    'k'
                };
                builder.push(match colour {
                    Colour::White => ch.to_ascii_uppercase(),
                    Colour::Black => ch,
                });
            }
        }

        if builder.is_empty() {
            builder.push('-');
        }
        builder
    }

    /// The board part of the FEN, with promoted pieces marked in Chess960
    /// mode unless `promoted` says otherwise.
    pub fn board_fen(&self, promoted: Option<bool>) -> String {
        self.state.layout.board_fen(promoted.unwrap_or(self.chess960))
    }

    pub fn fen(&self) -> String {
        self.fen_with(FenOptions::default())
    }

    pub fn fen_with(&self, options: FenOptions) -> String {
        format!(
            "{} {} {}",
            self.epd_with(options),
            self.state.halfmove_clock,
            self.state.fullmove_number
        )
    }

    /// The first four FEN fields.
    pub fn epd_with(&self, options: FenOptions) -> String {
        let ep_square = match options.en_passant {
            EnPassantMode::Fen => self.state.ep_square,
            EnPassantMode::XFen => self.state.ep_square.filter(|_| self.has_pseudo_legal_en_passant()),
            EnPassantMode::Legal => self.state.ep_square.filter(|_| self.has_legal_en_passant()),
        };
        let castling = if options.shredder {
            self.castling_shredder_fen()
        } else {
            self.castling_xfen()
        };
        format!(
            "{} {} {} {}",
            self.board_fen(options.promoted),
            self.state.turn.fen_char(),
            castling,
            ep_square.map_or_else(|| "-".to_string(), |sq| sq.to_string()),
        )
    }

    /// Replaces the whole position. Forgets the move history.
    /// Nothing changes if the FEN is invalid.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenParseError> {
        let parsed = Fen::parse(fen)?;
        self.state = BoardState {
            castling_rights: fen::castling_rights_from_flags(&parsed.board, &parsed.castling),
            layout: parsed.board,
            turn: parsed.turn,
            ep_square: parsed.ep,
            halfmove_clock: parsed.halfmove,
            fullmove_number: parsed.fullmove,
        };
        self.clear_stack();
        log::trace!("set position {}", self.fen());
        Ok(())
    }

    /// Replaces the placement, keeping the rest of the state.
    pub fn set_board_fen(&mut self, board_fen: &str) -> Result<(), FenParseError> {
        self.state.layout = PieceLayout::from_board_fen(board_fen)?;
        self.clear_stack();
        Ok(())
    }

    /// Replaces the castling rights from a FEN castling field.
    pub fn set_castling_fen(&mut self, castling_fen: &str) -> Result<(), FenParseError> {
        let flags = fen::parse_castling(castling_fen)?;
        self.state.castling_rights = fen::castling_rights_from_flags(&self.state.layout, &flags);
        self.clear_stack();
        Ok(())
    }

    /// The Scharnagl index if this is a Chess960 starting position.
    /// Move counters are not checked unless `ignore_counters` is off.
    pub fn chess960_pos(&self, ignore_turn: bool, ignore_castling: bool, ignore_counters: bool) -> Option<u32> {
        if self.state.ep_square.is_some() {
            return None;
        }
        if !ignore_turn && self.state.turn != Colour::White {
            return None;
        }
        if !ignore_castling && self.clean_castling_rights() != self.state.layout.pieces[PieceType::Rook] {
            return None;
        }
        if !ignore_counters && (self.state.fullmove_number != 1 || self.state.halfmove_clock != 0) {
            return None;
        }
        self.state.layout.chess960_pos()
    }

    /// Sets up Chess960 starting position `scharnagl` and switches to
    /// Chess960 mode.
    pub fn set_chess960_pos(&mut self, scharnagl: u32) -> Result<(), Chess960IndexError> {
        let layout = PieceLayout::from_chess960_pos(scharnagl)?;
        self.chess960 = true;
        self.state = BoardState {
            castling_rights: layout.pieces[PieceType::Rook],
            layout,
            turn: Colour::White,
            ep_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };
        self.clear_stack();
        Ok(())
    }

    /// The legal move from `from` to `to`. A pawn moving to the last rank
    /// promotes to a queen unless `promotion` is given. Castling can be given
    /// either as a king hop or as king-takes-rook.
    pub fn find_move(&self, from: Square, to: Square, promotion: Option<PieceType>) -> Result<Move, MoveParseError> {
        let layout = &self.state.layout;
        let promotion = promotion.or_else(|| {
            (layout.pieces[PieceType::Pawn].contains_square(from)
                && SquareSet::BACK_RANKS.contains_square(to))
            .then_some(PieceType::Queen)
        });
        let raw = match promotion {
            Some(promotion) => Move::new_with_promo(from, to, promotion),
            None => Move::new(from, to),
        };
        let mv = self.from_chess960(self.chess960, raw);
        if !self.is_legal(mv) {
            return Err(MoveParseError::IllegalMove {
                uci: mv.uci(),
                fen: self.fen(),
            });
        }
        Ok(mv)
    }

    /// Parses a move in UCI notation and checks that it is legal here.
    /// Castling is accepted in either encoding and returned in the one this
    /// board uses.
    pub fn parse_uci(&self, uci: &str) -> Result<Move, MoveParseError> {
        let mv = Move::from_uci(uci)?;
        if mv.is_null() {
            return Ok(mv);
        }
        let mv = self.from_chess960(self.chess960, self.to_chess960(mv));
        if !self.is_legal(mv) {
            return Err(MoveParseError::IllegalMove {
                uci: uci.to_string(),
                fen: self.fen(),
            });
        }
        Ok(mv)
    }

    pub fn push_uci(&mut self, uci: &str) -> Result<Move, MoveParseError> {
        let mv = self.parse_uci(uci)?;
        self.push(mv);
        Ok(mv)
    }

    /// UCI notation for `mv`, with castling written the Chess960 way if
    /// `chess960` (default: this board's mode).
    pub fn uci(&self, mv: Move, chess960: Option<bool>) -> String {
        self.encode_castling(mv, chess960).uci()
    }

    /// As [`Board::uci`], but the null move is `@@@@`.
    pub fn xboard(&self, mv: Move, chess960: Option<bool>) -> String {
        self.encode_castling(mv, chess960).xboard()
    }

    fn encode_castling(&self, mv: Move, chess960: Option<bool>) -> Move {
        self.from_chess960(chess960.unwrap_or(self.chess960), self.to_chess960(mv))
    }

    /// Ascii board, rank 8 first.
    pub fn to_display_string(&self) -> String {
        self.state.layout.to_display_string()
    }

    pub fn to_unicode_string(&self, invert_colour: bool, empty_square: char) -> String {
        self.state.layout.to_unicode_string(invert_colour, empty_square)
    }

    pub fn is_variant_end(&self) -> bool {
        self.rules.is_variant_end(self)
    }

    pub fn is_variant_loss(&self) -> bool {
        self.rules.is_variant_loss(self)
    }

    pub fn is_variant_win(&self) -> bool {
        self.rules.is_variant_win(self)
    }

    pub fn is_variant_draw(&self) -> bool {
        self.rules.is_variant_draw(self)
    }
}

/// The back rank a king on `sq` castles along in standard chess.
const fn castling_king_rank(sq: Square) -> Option<Rank> {
    match sq {
        Square::E1 => Some(Rank::One),
        Square::E8 => Some(Rank::Eight),
        _ => None,
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}

/// Positions are equal if they are the same for repetition purposes and have
/// the same move counters.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.state.halfmove_clock == other.state.halfmove_clock
            && self.state.fullmove_number == other.state.fullmove_number
            && self.rules.config().uci_variant == other.rules.config().uci_variant
            && self.transposition_key() == other.transposition_key()
    }
}

impl Eq for Board {}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.chess960 {
            write!(f, "Board({:?}, chess960=True)", self.fen())
        } else {
            write!(f, "Board({:?})", self.fen())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_round_trip() {
        let fens = [
            Board::STARTING_FEN,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkb1r/ppppp1pp/7n/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "4k3/8/8/8/8/8/8/4K2R w K - 17 42",
        ];
        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(board.fen(), fen);
            assert_eq!(Board::from_fen(&board.fen()).unwrap(), board);
        }
    }

    #[test]
    fn set_fen_is_atomic() {
        let mut board = Board::starting();
        board.push_uci("e2e4").unwrap();
        let before = board.fen();
        assert!(board.set_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1").is_err());
        assert!(board.set_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1").is_err());
        assert_eq!(board.fen(), before);
        assert_eq!(board.move_stack().len(), 1);
    }

    #[test]
    fn ep_square_only_shown_when_legal() {
        // the c3 square is set, but no black pawn can take
        let board =
            Board::from_fen("rnbq1bnr/p1ppkppp/8/4p3/1pP5/BP3PP1/P2PP2P/RN1QKBNR b KQ c3 0 5")
                .unwrap();
        assert_eq!(board.ep_square(), Some(Square::C3));
        assert!(board.fen().contains(" KQ - "));
        let fen = board.fen_with(FenOptions {
            en_passant: EnPassantMode::Fen,
            ..FenOptions::default()
        });
        assert!(fen.contains(" KQ c3 "));

        let board =
            Board::from_fen("r1bqkbnr/pppp1p1p/2n5/4pPp1/4P3/8/PPPP2PP/RNBQKBNR w KQkq g6 0 4")
                .unwrap();
        assert!(board.fen().contains(" g6 "));
    }

    #[test]
    fn push_pop_restores_state() {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let before = *board.state();
        let moves: Vec<Move> = board.legal_moves().iter().collect();
        for mv in moves {
            board.push(mv);
            assert_eq!(board.peek(), Ok(mv));
            assert_eq!(board.pop(), Ok(mv));
            assert_eq!(*board.state(), before, "{mv} did not undo cleanly");
        }
        board.push(Move::NULL);
        assert_eq!(board.turn(), Colour::Black);
        assert_eq!(board.pop(), Ok(Move::NULL));
        assert_eq!(*board.state(), before);
        assert_eq!(board.pop(), Err(EmptyMoveStack));
        assert_eq!(board.peek(), Err(EmptyMoveStack));
    }

    #[test]
    fn push_counters_and_ep() {
        let mut board = Board::starting();
        board.push_uci("g1f3").unwrap();
        assert_eq!(board.halfmove_clock(), 1);
        assert_eq!(board.fullmove_number(), 1);
        board.push_uci("d7d5").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 2);
        assert_eq!(board.ep_square(), Some(Square::D6));
        assert_eq!(board.ply(), 2);
        board.push_uci("b1c3").unwrap();
        assert_eq!(board.ep_square(), None);
    }

    #[test]
    #[should_panic(expected = "push() expects move to be pseudo-legal")]
    fn push_from_empty_square_panics() {
        let mut board = Board::starting();
        board.push(Move::new(Square::E4, Square::E5));
    }

    #[test]
    fn castling_both_encodings() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        for uci in ["e1g1", "e1h1"] {
            let mut board = Board::from_fen(fen).unwrap();
            let mv = board.push_uci(uci).unwrap();
            assert_eq!(mv, Move::new(Square::E1, Square::G1));
            assert_eq!(board.piece_at(Square::G1), Some(Piece::WK));
            assert_eq!(board.piece_at(Square::F1), Some(Piece::WR));
            assert_eq!(board.castling_xfen(), "kq");
        }

        let mut board = Board::from_fen(fen).unwrap().with_chess960(true);
        let mv = board.push_uci("e1c1").unwrap();
        assert_eq!(mv, Move::new(Square::E1, Square::A1));
        assert_eq!(board.piece_at(Square::C1), Some(Piece::WK));
        assert_eq!(board.piece_at(Square::D1), Some(Piece::WR));
        assert_eq!(board.uci(mv, Some(false)), "e1a1");
    }

    #[test]
    fn uci_output_follows_mode() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = Move::new(Square::E1, Square::G1);
        assert_eq!(board.uci(mv, None), "e1g1");
        assert_eq!(board.uci(mv, Some(true)), "e1h1");
        assert_eq!(board.xboard(Move::NULL, None), "@@@@");
    }

    #[test]
    fn parse_uci_errors() {
        let board = Board::starting();
        assert_eq!(board.parse_uci("0000"), Ok(Move::NULL));
        assert!(matches!(
            board.parse_uci("e2e5"),
            Err(MoveParseError::IllegalMove { .. })
        ));
        assert!(matches!(
            board.parse_uci("e2"),
            Err(MoveParseError::InvalidLength(2))
        ));
    }

    #[test]
    fn find_move_autoqueens() {
        let board = Board::from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        let mv = board.find_move(Square::A7, Square::A8, None).unwrap();
        assert_eq!(mv.promotion(), Some(PieceType::Queen));
        let mv = board.find_move(Square::A7, Square::A8, Some(PieceType::Knight)).unwrap();
        assert_eq!(mv.promotion(), Some(PieceType::Knight));
        assert!(board.find_move(Square::A7, Square::B8, None).is_err());
    }

    #[test]
    fn clean_castling_rights_standard() {
        let mut board = Board::starting();
        // rights on squares without a rook are dropped
        board.set_castling_rights(SquareSet::FULL);
        assert_eq!(board.clean_castling_rights(), SquareSet::CORNERS);
        // a rook that has moved loses its rights
        board.set_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        board.push_uci("h2h4").unwrap();
        board.push_uci("a7a5").unwrap();
        board.push_uci("h1h3").unwrap();
        board.push_uci("a8a6").unwrap();
        assert_eq!(board.castling_xfen(), "Qk");
        assert!(board.has_queenside_castling_rights(Colour::White));
        assert!(!board.has_kingside_castling_rights(Colour::White));
        assert!(board.has_castling_rights(Colour::Black));
    }

    #[test]
    fn clean_castling_rights_chess960() {
        let board = Board::from_fen("1r1k2r1/pppppppp/8/8/8/8/PPPPPPPP/1R1K2R1 w GBgb - 0 1")
            .unwrap()
            .with_chess960(true);
        assert_eq!(
            board.clean_castling_rights(),
            SquareSet::from_iter([Square::B1, Square::G1, Square::B8, Square::G8])
        );
        assert_eq!(board.castling_shredder_fen(), "GBgb");
        assert_eq!(board.castling_xfen(), "KQkq");
        assert!(board.has_chess960_castling_rights());
        assert!(!Board::starting().has_chess960_castling_rights());
    }

    #[test]
    fn xfen_disambiguates_inner_rooks() {
        // two rooks on the h-side: the inner one needs its file
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K1RR w G - 0 1")
            .unwrap()
            .with_chess960(true);
        assert_eq!(board.clean_castling_rights(), Square::G1.as_set());
        assert_eq!(board.castling_xfen(), "G");
        let board = Board::from_fen("4k3/8/8/8/8/8/8/1R2KR1R w FB - 0 1")
            .unwrap()
            .with_chess960(true);
        assert_eq!(board.castling_xfen(), "FQ");
        assert_eq!(board.castling_shredder_fen(), "FB");
    }

    #[test]
    fn chess960_positions() {
        let board = Board::from_chess960_pos(518).unwrap();
        assert!(board.chess960());
        assert_eq!(board.fen(), Board::STARTING_FEN);
        assert_eq!(
            board.fen_with(FenOptions {
                shredder: true,
                ..FenOptions::default()
            }),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha - 0 1"
        );
        assert_eq!(board.chess960_pos(false, false, true), Some(518));
        assert_eq!(Board::starting().chess960_pos(false, false, true), Some(518));
        assert_eq!(
            Board::from_chess960_pos(960).unwrap_err(),
            Chess960IndexError(960)
        );

        for scharnagl in [0, 1, 100, 959] {
            let board = Board::from_chess960_pos(scharnagl).unwrap();
            assert_eq!(board.chess960_pos(false, false, false), Some(scharnagl));
        }

        let mut board = Board::starting();
        board.push_uci("e2e4").unwrap();
        assert_eq!(board.chess960_pos(true, false, true), None);
    }

    #[test]
    fn root_and_copies() {
        let mut board = Board::starting();
        for uci in ["e2e4", "e7e5", "g1f3"] {
            board.push_uci(uci).unwrap();
        }
        assert_eq!(board.root(), Board::starting());
        assert!(board.root().move_stack().is_empty());
        let copy = board.copy_with_stack(2);
        assert_eq!(copy.move_stack().len(), 2);
        assert_eq!(copy, board);
        assert_eq!(board.copy_with_stack(10).move_stack().len(), 3);
    }

    #[test]
    fn mirror_swaps_sides() {
        let board =
            Board::from_fen("r1bqkbnr/pppp1p1p/2n5/4pPp1/4P3/8/PPPP2PP/RNBQKBNR w KQkq g6 0 4")
                .unwrap();
        let mirrored = board.mirror();
        assert_eq!(
            mirrored.fen(),
            "rnbqkbnr/pppp2pp/8/4p3/4PpP1/2N5/PPPP1P1P/R1BQKBNR b KQkq g3 0 4"
        );
        assert_eq!(mirrored.mirror(), board);
    }

    #[test]
    fn direct_edits_forget_history() {
        let mut board = Board::starting();
        board.push_uci("e2e4").unwrap();
        board.set_piece_at(Square::E4, Piece::WQ, false);
        assert!(board.move_stack().is_empty());
        assert_eq!(board.remove_piece_at(Square::E4), Some(Piece::WQ));
        assert_eq!(board.remove_piece_at(Square::E4), None);
    }

    #[test]
    fn equality_ignores_history() {
        let mut a = Board::starting();
        a.push_uci("g1f3").unwrap();
        a.push_uci("g8f6").unwrap();
        a.push_uci("f3g1").unwrap();
        a.push_uci("f6g8").unwrap();
        let mut b = Board::starting();
        b.set_halfmove_clock(4);
        b.set_fullmove_number(3);
        assert_eq!(a, b);
        b.set_turn(Colour::Black);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_repr() {
        assert_eq!(
            format!("{:?}", Board::starting()),
            "Board(\"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1\")"
        );
    }
}
