use std::collections::BTreeMap;

use arrayvec::ArrayVec;

use crate::{
    chess::{
        attacks::{self, RayFamily},
        piece::{Colour, Piece, PieceType},
        squareset::SquareSet,
        types::{File, Rank, SQUARES_180, Square},
    },
    errors::{Chess960IndexError, FenParseError},
};

/// Piece placement without any game state: six piece-type sets, two colour
/// sets, and the set of pieces that got their current type by promotion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceLayout {
    pub pieces: [SquareSet; 6],
    pub colours: [SquareSet; 2],
    pub promoted: SquareSet,
}

impl PieceLayout {
    pub const STARTING_BOARD_FEN: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

    /// An empty board.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn starting() -> Self {
        let mut out = Self::default();
        out.reset();
        out
    }

    pub fn reset(&mut self) {
        use PieceType::{Bishop, King, Knight, Pawn, Queen, Rook};
        self.pieces[Pawn] = SquareSet::RANK_2 | SquareSet::RANK_7;
        self.pieces[Knight] = SquareSet::from_iter([Square::B1, Square::G1, Square::B8, Square::G8]);
        self.pieces[Bishop] = SquareSet::from_iter([Square::C1, Square::F1, Square::C8, Square::F8]);
        self.pieces[Rook] = SquareSet::CORNERS;
        self.pieces[Queen] = Square::D1.as_set() | Square::D8.as_set();
        self.pieces[King] = Square::E1.as_set() | Square::E8.as_set();
        self.colours[Colour::White] = SquareSet::RANK_1 | SquareSet::RANK_2;
        self.colours[Colour::Black] = SquareSet::RANK_7 | SquareSet::RANK_8;
        self.promoted = SquareSet::EMPTY;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn occupied(&self) -> SquareSet {
        self.colours[Colour::White] | self.colours[Colour::Black]
    }

    pub fn empty_squares(&self) -> SquareSet {
        !self.occupied()
    }

    pub fn occupied_co(&self, colour: Colour) -> SquareSet {
        self.colours[colour]
    }

    /// The squares holding pieces of the given type and colour.
    pub fn pieces_mask(&self, piece_type: PieceType, colour: Colour) -> SquareSet {
        self.pieces[piece_type] & self.colours[colour]
    }

    pub fn piece_bb(&self, piece: Piece) -> SquareSet {
        self.pieces_mask(piece.piece_type(), piece.colour())
    }

    pub fn diagonal_sliders(&self) -> SquareSet {
        self.pieces[PieceType::Bishop] | self.pieces[PieceType::Queen]
    }

    pub fn orthogonal_sliders(&self) -> SquareSet {
        self.pieces[PieceType::Rook] | self.pieces[PieceType::Queen]
    }

    pub fn piece_type_at(&self, sq: Square) -> Option<PieceType> {
        if !self.occupied().contains_square(sq) {
            return None;
        }
        PieceType::all().find(|&pt| self.pieces[pt].contains_square(sq))
    }

    pub fn colour_at(&self, sq: Square) -> Option<Colour> {
        Colour::all().find(|&c| self.colours[c].contains_square(sq))
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        let piece_type = self.piece_type_at(sq)?;
        let colour = self.colour_at(sq)?;
        Some(Piece::new(colour, piece_type))
    }

    /// The king of `colour`, if there is exactly one unpromoted candidate
    /// (the highest one otherwise).
    pub fn king(&self, colour: Colour) -> Option<Square> {
        (self.pieces_mask(PieceType::King, colour) & !self.promoted).msb()
    }

    /// Squares attacked by whatever stands on `sq`; empty for an empty square.
    pub fn attacks_mask(&self, sq: Square) -> SquareSet {
        let occupied = self.occupied();
        match self.piece_at(sq) {
            None => SquareSet::EMPTY,
            Some(piece) if piece.piece_type() == PieceType::Pawn => {
                attacks::pawn_attacks(piece.colour(), sq)
            }
            Some(piece) => attacks::attacks_by_type(piece.piece_type(), sq, occupied),
        }
    }

    /// Pieces of `colour` attacking `sq`, with the given occupancy for sliders.
    pub fn attackers_mask_with(&self, colour: Colour, sq: Square, occupied: SquareSet) -> SquareSet {
        let kings = attacks::king_attacks(sq) & self.pieces[PieceType::King];
        let knights = attacks::knight_attacks(sq) & self.pieces[PieceType::Knight];
        let orthos = (attacks::rank_attacks(sq, occupied) | attacks::file_attacks(sq, occupied))
            & self.orthogonal_sliders();
        let diags = attacks::diagonal_attacks(sq, occupied) & self.diagonal_sliders();
        let pawns = attacks::pawn_attacks(!colour, sq) & self.pieces[PieceType::Pawn];
        (kings | knights | orthos | diags | pawns) & self.colours[colour]
    }

    pub fn attackers_mask(&self, colour: Colour, sq: Square) -> SquareSet {
        self.attackers_mask_with(colour, sq, self.occupied())
    }

    pub fn is_attacked_by(&self, colour: Colour, sq: Square) -> bool {
        self.attackers_mask(colour, sq).non_empty()
    }

    /// The line a piece on `sq` is pinned along, relative to `colour`'s king,
    /// or [`SquareSet::FULL`] if it is free to move.
    pub fn pin_mask(&self, colour: Colour, sq: Square) -> SquareSet {
        let Some(king) = self.king(colour) else {
            return SquareSet::FULL;
        };
        let sq_mask = sq.as_set();
        let occupied = self.occupied();

        for family in RayFamily::ALL {
            let rays = family.empty_board(king);
            if !rays.contains_square(sq) {
                continue;
            }
            let sliders = match family {
                RayFamily::File | RayFamily::Rank => self.orthogonal_sliders(),
                RayFamily::Diagonal => self.diagonal_sliders(),
            };
            let snipers = rays & sliders & self.colours[!colour];
            for sniper in snipers.iter_reversed() {
                if attacks::between(sniper, king) & (occupied | sq_mask) == sq_mask {
                    return attacks::ray(king, sniper);
                }
            }
            break;
        }

        SquareSet::FULL
    }

    pub fn is_pinned(&self, colour: Colour, sq: Square) -> bool {
        self.pin_mask(colour, sq) != SquareSet::FULL
    }

    /// Removes whatever stands on `sq`, returning it.
    pub fn remove_piece_at(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.piece_at(sq)?;
        let mask = !sq.as_set();
        self.pieces[piece.piece_type()] &= mask;
        self.colours[piece.colour()] &= mask;
        self.promoted &= mask;
        Some(piece)
    }

    /// Puts `piece` on `sq`, replacing whatever stood there.
    pub fn set_piece_at(&mut self, sq: Square, piece: Piece, promoted: bool) {
        self.remove_piece_at(sq);
        let sq_bb = sq.as_set();
        self.pieces[piece.piece_type()] |= sq_bb;
        self.colours[piece.colour()] |= sq_bb;
        if promoted {
            self.promoted |= sq_bb;
        }
    }

    /// All pieces within `mask`, keyed by square.
    pub fn piece_map(&self, mask: SquareSet) -> BTreeMap<Square, Piece> {
        (self.occupied() & mask)
            .into_iter()
            .filter_map(|sq| Some((sq, self.piece_at(sq)?)))
            .collect()
    }

    pub fn set_piece_map(&mut self, map: &BTreeMap<Square, Piece>) {
        self.clear();
        for (&sq, &piece) in map {
            self.set_piece_at(sq, piece, false);
        }
    }

    /// The board part of a FEN. With `promoted`, promoted pieces carry a `~`.
    pub fn board_fen(&self, promoted: bool) -> String {
        let mut builder = String::with_capacity(72);
        let mut empty = 0;
        for &sq in &SQUARES_180 {
            if let Some(piece) = self.piece_at(sq) {
                if empty != 0 {
                    builder.push(char::from(b'0' + empty));
                    empty = 0;
                }
                builder.push(piece.char());
                if promoted && self.promoted.contains_square(sq) {
                    builder.push('~');
                }
            } else {
                empty += 1;
            }
            if sq.file() == File::H {
                if empty != 0 {
                    builder.push(char::from(b'0' + empty));
                    empty = 0;
                }
                if sq != Square::H1 {
                    builder.push('/');
                }
            }
        }
        builder
    }

    /// Parses the board part of a FEN. Kings are not required.
    pub fn from_board_fen(fen: &str) -> Result<Self, FenParseError> {
        let fen = fen.trim();
        if fen.is_empty() {
            return Err(FenParseError::MissingBoard);
        }
        if fen.contains(char::is_whitespace) {
            return Err(FenParseError::ExtraTokens);
        }

        let mut rows = ArrayVec::<&str, 8>::new();
        let mut parts = fen.split('/');
        while let Some(row) = parts.next() {
            if rows.try_push(row).is_err() {
                return Err(FenParseError::BoardSegments(8 + 1 + parts.count()));
            }
        }
        if rows.len() != 8 {
            return Err(FenParseError::BoardSegments(rows.len()));
        }

        let mut layout = Self::default();
        let mut index = 0;
        for row in &rows {
            let mut squares_in_row = 0;
            let mut prev_was_digit = false;
            let mut prev_was_piece = false;
            for c in row.bytes() {
                match c {
                    b'1'..=b'8' => {
                        if prev_was_digit {
                            return Err(FenParseError::AdjacentDigits);
                        }
                        squares_in_row += c - b'0';
                        index += usize::from(c - b'0');
                        prev_was_digit = true;
                        prev_was_piece = false;
                    }
                    b'~' => {
                        if !prev_was_piece {
                            return Err(FenParseError::DanglingPromotedMarker);
                        }
                        layout.promoted |= SQUARES_180[index - 1].as_set();
                        prev_was_digit = false;
                        prev_was_piece = false;
                    }
                    _ => {
                        let piece = Piece::from_symbol(c)
                            .ok_or(FenParseError::UnexpectedCharacter(char::from(c)))?;
                        squares_in_row += 1;
                        if squares_in_row > 8 {
                            return Err(FenParseError::BadSquaresInSegment);
                        }
                        layout.set_piece_at(SQUARES_180[index], piece, false);
                        index += 1;
                        prev_was_digit = false;
                        prev_was_piece = true;
                    }
                }
                if squares_in_row > 8 {
                    return Err(FenParseError::BadSquaresInSegment);
                }
            }
            if squares_in_row != 8 {
                return Err(FenParseError::BadSquaresInSegment);
            }
        }

        Ok(layout)
    }

    /// The Scharnagl index of a Chess960 starting placement, if this is one.
    pub fn chess960_pos(&self) -> Option<u32> {
        use PieceType::{Bishop, King, Knight, Pawn, Queen, Rook};

        if self.colours[Colour::White] != SquareSet::RANK_1 | SquareSet::RANK_2 {
            return None;
        }
        if self.colours[Colour::Black] != SquareSet::RANK_7 | SquareSet::RANK_8 {
            return None;
        }
        if self.pieces[Pawn] != SquareSet::RANK_2 | SquareSet::RANK_7 {
            return None;
        }
        if self.promoted.non_empty() {
            return None;
        }

        let brnqk = [Bishop, Rook, Knight, Queen, King].map(|pt| self.pieces[pt]);
        if brnqk.map(SquareSet::count) != [4, 4, 4, 2, 2] {
            return None;
        }
        // black mirrors white
        if brnqk
            .iter()
            .any(|&set| (set & SquareSet::RANK_1) << 56 != set & SquareSet::RANK_8)
        {
            return None;
        }

        let bishops = self.pieces[Bishop].inner();
        let light = SquareSet::from_inner(bishops & 0xAA).lsb()?;
        let dark = SquareSet::from_inner(bishops & 0x55).lsb()?;
        let mut index = u32::from(light.inner() - 1) / 2 + u32::from(dark.inner()) * 2;

        let mut q = 0;
        let mut queen_found = false;
        let mut n0 = 0;
        let mut n1 = 0;
        let mut n0_found = false;
        let mut n1_found = false;
        let mut rooks_seen = 0;
        for file in File::all() {
            let sq = Square::from_rank_file(Rank::One, file);
            if self.pieces[Queen].contains_square(sq) {
                queen_found = true;
            } else if self.pieces[Rook].contains_square(sq) || self.pieces[King].contains_square(sq)
            {
                if self.pieces[King].contains_square(sq) {
                    // the king sits between the rooks
                    if rooks_seen != 1 {
                        return None;
                    }
                } else {
                    rooks_seen += 1;
                }
                if !queen_found {
                    q += 1;
                }
                if !n0_found {
                    n0 += 1;
                } else if !n1_found {
                    n1 += 1;
                }
            } else if self.pieces[Knight].contains_square(sq) {
                if !queen_found {
                    q += 1;
                }
                if !n0_found {
                    n0_found = true;
                } else if !n1_found {
                    n1_found = true;
                }
            }
        }

        if n0 < 4 && n1_found && queen_found {
            const N0S: [u32; 4] = [0, 4, 7, 9];
            index += q * 16;
            index += (N0S[n0] + n1) * 96;
            Some(index)
        } else {
            None
        }
    }

    /// The white back rank of the Chess960 starting position `scharnagl`.
    pub fn scharnagl_backrank(scharnagl: u32) -> Result<[PieceType; 8], Chess960IndexError> {
        // https://en.wikipedia.org/wiki/Fischer_random_chess_numbering_scheme#Direct_derivation
        if scharnagl >= 960 {
            return Err(Chess960IndexError(scharnagl));
        }
        let mut out = [None; 8];
        let (n2, light) = (scharnagl / 4, scharnagl % 4);
        out[(light * 2 + 1) as usize] = Some(PieceType::Bishop);
        let (n3, dark) = (n2 / 4, n2 % 4);
        out[(dark * 2) as usize] = Some(PieceType::Bishop);
        let (n4, mut q) = (n3 / 6, n3 % 6);
        for slot in &mut out {
            if slot.is_none() {
                if q == 0 {
                    *slot = Some(PieceType::Queen);
                    break;
                }
                q -= 1;
            }
        }
        let knights = match n4 {
            0 => [0, 1],
            1 => [0, 2],
            2 => [0, 3],
            3 => [0, 4],
            4 => [1, 2],
            5 => [1, 3],
            6 => [1, 4],
            7 => [2, 3],
            8 => [2, 4],
            _ => [3, 4],
        };
        for (i, slot) in out.iter_mut().filter(|slot| slot.is_none()).enumerate() {
            if knights.contains(&i) {
                *slot = Some(PieceType::Knight);
            }
        }
        let mut rest = [PieceType::Rook, PieceType::King, PieceType::Rook].into_iter();
        for slot in &mut out {
            if slot.is_none() {
                *slot = rest.next();
            }
        }
        Ok(out.map(|slot| slot.unwrap_or(PieceType::Pawn)))
    }

    /// The placement of the Chess960 starting position `scharnagl`.
    pub fn from_chess960_pos(scharnagl: u32) -> Result<Self, Chess960IndexError> {
        let backrank = Self::scharnagl_backrank(scharnagl)?;
        let mut out = Self::default();
        for (file, &pt) in File::all().zip(backrank.iter()) {
            let white = Square::from_rank_file(Rank::One, file);
            out.set_piece_at(white, Piece::new(Colour::White, pt), false);
            out.set_piece_at(white.flip_rank(), Piece::new(Colour::Black, pt), false);
        }
        for file in File::all() {
            let white = Square::from_rank_file(Rank::Two, file);
            out.set_piece_at(white, Piece::WP, false);
            out.set_piece_at(white.flip_rank(), Piece::BP, false);
        }
        Ok(out)
    }

    /// Applies a square-set symmetry to every set.
    pub fn transform(&self, f: impl Fn(SquareSet) -> SquareSet) -> Self {
        Self {
            pieces: self.pieces.map(&f),
            colours: self.colours.map(&f),
            promoted: f(self.promoted),
        }
    }

    /// Flipped vertically with colours swapped.
    pub fn mirror(&self) -> Self {
        let mut out = self.transform(SquareSet::flip_vertical);
        out.colours.swap(0, 1);
        out
    }

    /// Ascii board, rank 8 first, `.` for empty squares.
    pub fn to_display_string(&self) -> String {
        self.render(|piece| piece.map_or('.', Piece::char))
    }

    /// Unicode board, rank 8 first.
    pub fn to_unicode_string(&self, invert_colour: bool, empty_square: char) -> String {
        self.render(|piece| match piece {
            Some(piece) if invert_colour => Piece::new(!piece.colour(), piece.piece_type()).unicode_symbol(),
            Some(piece) => piece.unicode_symbol(),
            None => empty_square,
        })
    }

    fn render(&self, glyph: impl Fn(Option<Piece>) -> char) -> String {
        let mut out = String::with_capacity(128);
        for &sq in &SQUARES_180 {
            out.push(glyph(self.piece_at(sq)));
            if sq.file() == File::H {
                if sq != Square::H1 {
                    out.push('\n');
                }
            } else {
                out.push(' ');
            }
        }
        out
    }
}
