//! Precomputed attack sets.
//!
//! Leapers get a plain per-square table. Sliders get, per square, a mask of
//! the squares whose occupancy matters and a map from every subset of that
//! mask to the resulting attack set. Everything is built once, on first use.

use std::sync::LazyLock;

use fxhash::FxHashMap;

use crate::chess::{
    piece::{Colour, PieceType},
    squareset::SquareSet,
    types::Square,
};

const KNIGHT_DELTAS: [i8; 8] = [17, 15, 10, 6, -17, -15, -10, -6];
const KING_DELTAS: [i8; 8] = [9, 8, 7, 1, -9, -8, -7, -1];
const WHITE_PAWN_DELTAS: [i8; 2] = [7, 9];
const BLACK_PAWN_DELTAS: [i8; 2] = [-7, -9];
const DIAGONAL_DELTAS: [i8; 4] = [-9, -7, 7, 9];
const FILE_DELTAS: [i8; 2] = [-8, 8];
const RANK_DELTAS: [i8; 2] = [-1, 1];

/// Occupancy-indexed attacks for one family of slider rays.
struct SliderTable {
    masks: [SquareSet; 64],
    attacks: Box<[FxHashMap<SquareSet, SquareSet>]>,
}

impl SliderTable {
    fn new(deltas: &[i8]) -> Self {
        let mut masks = [SquareSet::EMPTY; 64];
        let mut attacks = Vec::with_capacity(64);
        for sq in Square::all() {
            let mask = sliding_attacks(sq, SquareSet::EMPTY, deltas) & !edges(sq);
            let table = mask
                .carry_rippler()
                .map(|subset| (subset, sliding_attacks(sq, subset, deltas)))
                .collect::<FxHashMap<_, _>>();
            masks[sq] = mask;
            attacks.push(table);
        }
        Self {
            masks,
            attacks: attacks.into_boxed_slice(),
        }
    }

    fn get(&self, sq: Square, occupied: SquareSet) -> SquareSet {
        self.attacks[sq.index()][&(occupied & self.masks[sq])]
    }

    fn empty_board(&self, sq: Square) -> SquareSet {
        self.attacks[sq.index()][&SquareSet::EMPTY]
    }
}

struct AttackTables {
    knight: [SquareSet; 64],
    king: [SquareSet; 64],
    pawn: [[SquareSet; 64]; 2],
    diagonal: SliderTable,
    file: SliderTable,
    rank: SliderTable,
    rays: Box<[[SquareSet; 64]]>,
}

impl AttackTables {
    fn new() -> Self {
        let mut knight = [SquareSet::EMPTY; 64];
        let mut king = [SquareSet::EMPTY; 64];
        let mut pawn = [[SquareSet::EMPTY; 64]; 2];
        for sq in Square::all() {
            knight[sq] = step_attacks(sq, &KNIGHT_DELTAS);
            king[sq] = step_attacks(sq, &KING_DELTAS);
            pawn[Colour::White][sq] = step_attacks(sq, &WHITE_PAWN_DELTAS);
            pawn[Colour::Black][sq] = step_attacks(sq, &BLACK_PAWN_DELTAS);
        }

        let diagonal = SliderTable::new(&DIAGONAL_DELTAS);
        let file = SliderTable::new(&FILE_DELTAS);
        let rank = SliderTable::new(&RANK_DELTAS);

        let mut rays = vec![[SquareSet::EMPTY; 64]; 64].into_boxed_slice();
        for a in Square::all() {
            let diag_a = diagonal.empty_board(a);
            let rank_a = rank.empty_board(a);
            let file_a = file.empty_board(a);
            for b in Square::all() {
                rays[a.index()][b] = if diag_a.contains_square(b) {
                    (diag_a & diagonal.empty_board(b)) | a.as_set() | b.as_set()
                } else if rank_a.contains_square(b) {
                    rank_a | a.as_set()
                } else if file_a.contains_square(b) {
                    file_a | a.as_set()
                } else {
                    SquareSet::EMPTY
                };
            }
        }

        log::debug!(
            "built slider tables: {} diagonal, {} file, {} rank occupancy entries",
            diagonal.attacks.iter().map(FxHashMap::len).sum::<usize>(),
            file.attacks.iter().map(FxHashMap::len).sum::<usize>(),
            rank.attacks.iter().map(FxHashMap::len).sum::<usize>(),
        );

        Self {
            knight,
            king,
            pawn,
            diagonal,
            file,
            rank,
            rays,
        }
    }
}

static TABLES: LazyLock<AttackTables> = LazyLock::new(AttackTables::new);

/// Builds the tables now rather than on the first lookup.
pub fn init() {
    LazyLock::force(&TABLES);
}

/// Walks each delta from `square` until leaving the board or hitting a
/// member of `occupied`, which is included.
pub fn sliding_attacks(square: Square, occupied: SquareSet, deltas: &[i8]) -> SquareSet {
    let mut attacks = SquareSet::EMPTY;
    for &delta in deltas {
        let mut sq = square;
        loop {
            let Some(next) = sq.offset(delta) else {
                break;
            };
            // a jump of more than two files means we wrapped around an edge
            if Square::distance(sq, next) > 2 {
                break;
            }
            attacks.insert(next);
            if occupied.contains_square(next) {
                break;
            }
            sq = next;
        }
    }
    attacks
}

pub fn step_attacks(square: Square, deltas: &[i8]) -> SquareSet {
    sliding_attacks(square, SquareSet::FULL, deltas)
}

/// The board edges that `square` is not itself on.
pub fn edges(square: Square) -> SquareSet {
    ((SquareSet::RANK_1 | SquareSet::RANK_8) & !SquareSet::RANKS[square.rank()])
        | ((SquareSet::FILE_A | SquareSet::FILE_H) & !SquareSet::FILES[square.file()])
}

pub fn knight_attacks(sq: Square) -> SquareSet {
    TABLES.knight[sq]
}

pub fn king_attacks(sq: Square) -> SquareSet {
    TABLES.king[sq]
}

/// Squares attacked by a pawn of `colour` standing on `sq`.
pub fn pawn_attacks(colour: Colour, sq: Square) -> SquareSet {
    TABLES.pawn[colour][sq]
}

pub fn diagonal_attacks(sq: Square, occupied: SquareSet) -> SquareSet {
    TABLES.diagonal.get(sq, occupied)
}

pub fn file_attacks(sq: Square, occupied: SquareSet) -> SquareSet {
    TABLES.file.get(sq, occupied)
}

pub fn rank_attacks(sq: Square, occupied: SquareSet) -> SquareSet {
    TABLES.rank.get(sq, occupied)
}

pub fn bishop_attacks(sq: Square, occupied: SquareSet) -> SquareSet {
    diagonal_attacks(sq, occupied)
}

pub fn rook_attacks(sq: Square, occupied: SquareSet) -> SquareSet {
    file_attacks(sq, occupied) | rank_attacks(sq, occupied)
}

pub fn queen_attacks(sq: Square, occupied: SquareSet) -> SquareSet {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

/// Attacks of a non-pawn piece type. Pawns are colour-dependent, see [`pawn_attacks`].
pub fn attacks_by_type(pt: PieceType, sq: Square, occupied: SquareSet) -> SquareSet {
    match pt {
        PieceType::Pawn => {
            debug_assert!(false, "pawn attacks depend on colour");
            SquareSet::EMPTY
        }
        PieceType::Knight => knight_attacks(sq),
        PieceType::Bishop => bishop_attacks(sq, occupied),
        PieceType::Rook => rook_attacks(sq, occupied),
        PieceType::Queen => queen_attacks(sq, occupied),
        PieceType::King => king_attacks(sq),
    }
}

/// The ray families a slider can pin along, paired with the piece types
/// that move along them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RayFamily {
    File,
    Rank,
    Diagonal,
}

impl RayFamily {
    pub const ALL: [Self; 3] = [Self::File, Self::Rank, Self::Diagonal];

    pub fn attacks(self, sq: Square, occupied: SquareSet) -> SquareSet {
        match self {
            Self::File => file_attacks(sq, occupied),
            Self::Rank => rank_attacks(sq, occupied),
            Self::Diagonal => diagonal_attacks(sq, occupied),
        }
    }

    pub fn empty_board(self, sq: Square) -> SquareSet {
        match self {
            Self::File => TABLES.file.empty_board(sq),
            Self::Rank => TABLES.rank.empty_board(sq),
            Self::Diagonal => TABLES.diagonal.empty_board(sq),
        }
    }
}

/// The full line through `a` and `b` (edge to edge), or empty if they are not aligned.
pub fn ray(a: Square, b: Square) -> SquareSet {
    TABLES.rays[a.index()][b]
}

/// The squares strictly between `a` and `b`, or empty if they are not aligned.
pub fn between(a: Square, b: Square) -> SquareSet {
    let span = (!0u64 << a.index()) ^ (!0u64 << b.index());
    let bb = ray(a, b).inner() & span;
    SquareSet::from_inner(bb & bb.wrapping_sub(1))
}
