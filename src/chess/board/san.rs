use crate::{
    chess::{
        board::Board,
        chessmove::Move,
        piece::{Colour, PieceType},
        squareset::SquareSet,
        types::{File, Rank, Square},
    },
    errors::{MoveParseError, SanError},
};

/// The pieces of a SAN token that survived syntax checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SanParts {
    piece_type: Option<PieceType>,
    from_file: Option<File>,
    from_rank: Option<Rank>,
    to: Square,
    promotion: Option<PieceType>,
}

/// Matches `[NBKRQ]?[a-h]?[1-8]?[-x]?[a-h][1-8](=?[nbrqkNBRQK])?[+#]?`.
fn split_san(san: &str) -> Option<SanParts> {
    let mut bytes = san.as_bytes();

    if let [rest @ .., b'+' | b'#'] = bytes {
        bytes = rest;
    }

    let mut promotion = None;
    match bytes {
        [rest @ .., b'=', p] if b"nbrqkNBRQK".contains(p) => {
            promotion = Some(PieceType::from_symbol(p.to_ascii_lowercase())?);
            bytes = rest;
        }
        [rest @ .., b'1'..=b'8', p] if b"nbrqkNBRQK".contains(p) => {
            promotion = Some(PieceType::from_symbol(p.to_ascii_lowercase())?);
            bytes = &bytes[..rest.len() + 1];
        }
        _ => (),
    }

    let [prefix @ .., file @ b'a'..=b'h', rank @ b'1'..=b'8'] = bytes else {
        return None;
    };
    let to = Square::from_rank_file(Rank::from_char(*rank)?, File::from_char(*file)?);

    let mut prefix = prefix;
    let mut piece_type = None;
    if let [p @ (b'N' | b'B' | b'K' | b'R' | b'Q'), rest @ ..] = prefix {
        piece_type = Some(PieceType::from_symbol(p.to_ascii_lowercase())?);
        prefix = rest;
    }
    let mut from_file = None;
    if let [f @ b'a'..=b'h', rest @ ..] = prefix {
        from_file = File::from_char(*f);
        prefix = rest;
    }
    let mut from_rank = None;
    if let [r @ b'1'..=b'8', rest @ ..] = prefix {
        from_rank = Rank::from_char(*r);
        prefix = rest;
    }
    if let [b'-' | b'x', rest @ ..] = prefix {
        prefix = rest;
    }
    if !prefix.is_empty() {
        return None;
    }

    Some(SanParts {
        piece_type,
        from_file,
        from_rank,
        to,
        promotion,
    })
}

impl Board {
    /// The move in Standard Algebraic Notation, like `Nbd7` or `exd8=Q#`.
    ///
    /// # Panics
    ///
    /// Panics if the move is not null, not a drop, and starts on an empty
    /// square.
    pub fn san(&self, m: Move) -> String {
        self.probe().algebraic_and_push(m, false)
    }

    /// The move in long algebraic notation, like `Ng1-f3` or `e7xd8=Q#`.
    ///
    /// # Panics
    ///
    /// As for [`Board::san`].
    pub fn lan(&self, m: Move) -> String {
        self.probe().algebraic_and_push(m, true)
    }

    /// [`Board::san`], then plays the move.
    pub fn san_and_push(&mut self, m: Move) -> String {
        self.algebraic_and_push(m, false)
    }

    /// [`Board::lan`], then plays the move.
    pub fn lan_and_push(&mut self, m: Move) -> String {
        self.algebraic_and_push(m, true)
    }

    fn algebraic_and_push(&mut self, m: Move, long: bool) -> String {
        let mut san = self.algebraic_without_suffix(m, long);
        self.push(m);

        if m.is_null() {
            return san;
        }
        let is_check = self.is_check();
        let is_checkmate =
            (is_check && self.is_checkmate()) || self.is_variant_loss() || self.is_variant_win();
        if is_checkmate {
            san.push('#');
        } else if is_check {
            san.push('+');
        }
        san
    }

    fn algebraic_without_suffix(&self, m: Move, long: bool) -> String {
        if m.is_null() {
            return "--".to_string();
        }

        let mut san = String::new();
        if let Some(drop) = m.drop() {
            if drop != PieceType::Pawn {
                san.push(drop.symbol().to_ascii_uppercase());
            }
            san.push('@');
            san.push_str(m.to().name());
            return san;
        }

        if self.is_castling(m) {
            return if m.to().file() < m.from().file() {
                "O-O-O".to_string()
            } else {
                "O-O".to_string()
            };
        }

        let piece_type = self
            .piece_type_at(m.from())
            .unwrap_or_else(|| panic!("san() and lan() expect move to be legal or null, but got {m} in {}", self.fen()));
        let capture = self.is_capture(m);

        if piece_type != PieceType::Pawn {
            san.push(piece_type.symbol().to_ascii_uppercase());
        }

        if long {
            san.push_str(m.from().name());
        } else if piece_type != PieceType::Pawn {
            // other pieces of the same type that could also reach the target
            let from_mask = self.pieces_mask(piece_type, self.turn()) & !m.from().as_set();
            let others = self
                .generate_legal_moves(from_mask, m.to().as_set())
                .iter()
                .fold(SquareSet::EMPTY, |acc, other| acc | other.from().as_set());

            if others.non_empty() {
                let mut file = false;
                let mut rank = false;
                if (others & SquareSet::RANKS[m.from().rank()]).non_empty() {
                    file = true;
                }
                if (others & SquareSet::FILES[m.from().file()]).non_empty() {
                    rank = true;
                } else {
                    file = true;
                }
                if file {
                    san.push(m.from().file().char());
                }
                if rank {
                    san.push(m.from().rank().char());
                }
            }
        } else if capture {
            san.push(m.from().file().char());
        }

        if capture {
            san.push('x');
        } else if long {
            san.push('-');
        }

        san.push_str(m.to().name());

        if let Some(promotion) = m.promotion() {
            san.push('=');
            san.push(promotion.symbol().to_ascii_uppercase());
        }

        san
    }

    /// A line of moves in SAN with move numbers, like `1. e4 e5 2. Nf3`.
    /// Every move must be legal in the position it is played from.
    pub fn variation_san(&self, variation: &[Move]) -> Result<String, SanError> {
        let mut board = self.copy_with_stack(0);
        let mut out = Vec::with_capacity(variation.len());
        for &m in variation {
            if !board.is_legal(m) {
                return Err(SanError::IllegalMove {
                    san: m.uci(),
                    fen: board.fen(),
                });
            }
            let number = board.fullmove_number();
            let white = board.turn() == Colour::White;
            let san = board.san_and_push(m);
            if white {
                out.push(format!("{number}. {san}"));
            } else if out.is_empty() {
                out.push(format!("{number}...{san}"));
            } else {
                out.push(san);
            }
        }
        Ok(out.join(" "))
    }

    /// Parses a move in Standard Algebraic Notation. The returned move is
    /// legal.
    ///
    /// Overspecified moves, long algebraic notation and castling written
    /// with zeros are accepted. `--`, `Z0`, `0000` and `@@@@` parse as the
    /// null move.
    pub fn parse_san(&self, san: &str) -> Result<Move, SanError> {
        let illegal = || SanError::IllegalMove {
            san: san.to_string(),
            fen: self.fen(),
        };
        let castling = |kingside: bool| {
            self.generate_castling_moves(SquareSet::FULL, SquareSet::FULL)
                .iter()
                .copied()
                .find(|&m| {
                    if kingside {
                        self.is_kingside_castling(m)
                    } else {
                        self.is_queenside_castling(m)
                    }
                })
                .ok_or_else(illegal)
        };

        match san {
            "O-O" | "O-O+" | "O-O#" | "0-0" | "0-0+" | "0-0#" => return castling(true),
            "O-O-O" | "O-O-O+" | "O-O-O#" | "0-0-0" | "0-0-0+" | "0-0-0#" => return castling(false),
            _ => (),
        }

        let Some(parts) = split_san(san) else {
            return match san {
                "--" | "Z0" | "0000" | "@@@@" => Ok(Move::NULL),
                _ if san.contains(',') => Err(SanError::MultiLeg(san.to_string())),
                _ => Err(SanError::InvalidSan(san.to_string())),
            };
        };

        // own pieces are masked out so that king-takes-rook is never read
        // as castling
        let to_mask = parts.to.as_set() & !self.occupied_co(self.turn());

        let mut from_mask = SquareSet::FULL;
        if let Some(file) = parts.from_file {
            from_mask &= SquareSet::FILES[file];
        }
        if let Some(rank) = parts.from_rank {
            from_mask &= SquareSet::RANKS[rank];
        }

        match (parts.piece_type, parts.from_file, parts.from_rank) {
            (Some(piece_type), _, _) => {
                from_mask &= self.pieces_mask(piece_type, self.turn());
            }
            (None, Some(file), Some(rank)) => {
                let from = Square::from_rank_file(rank, file);
                let m = self
                    .find_move(from, parts.to, parts.promotion)
                    .map_err(|e| match e {
                        MoveParseError::IllegalMove { .. } => illegal(),
                        _ => SanError::InvalidSan(san.to_string()),
                    })?;
                if m.promotion() != parts.promotion {
                    return Err(SanError::MissingPromotion {
                        san: san.to_string(),
                        fen: self.fen(),
                    });
                }
                return Ok(m);
            }
            (None, from_file, _) => {
                from_mask &= self.layout().pieces[PieceType::Pawn];
                // pawn captures need their file written out
                if from_file.is_none() {
                    from_mask &= SquareSet::FILES[parts.to.file()];
                }
            }
        }

        let mut matched = None;
        for m in self.generate_legal_moves(from_mask, to_mask) {
            if m.promotion() != parts.promotion {
                continue;
            }
            if matched.is_some() {
                return Err(SanError::AmbiguousMove {
                    san: san.to_string(),
                    fen: self.fen(),
                });
            }
            matched = Some(m);
        }

        matched.ok_or_else(illegal)
    }

    /// Parses a move in SAN and plays it.
    pub fn push_san(&mut self, san: &str) -> Result<Move, SanError> {
        let m = self.parse_san(san)?;
        self.push(m);
        Ok(m)
    }

    /// XBoard moves are read like SAN.
    pub fn parse_xboard(&self, xboard: &str) -> Result<Move, SanError> {
        self.parse_san(xboard)
    }

    pub fn push_xboard(&mut self, xboard: &str) -> Result<Move, SanError> {
        self.push_san(xboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from_fen(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn simple_pawn_move() {
        let board = Board::default();
        let m = board.parse_san("e4").unwrap();
        assert_eq!(m.from(), Square::E2);
        assert_eq!(m.to(), Square::E4);
    }

    #[test]
    fn pawn_single_push() {
        let board = Board::default();
        let m = board.parse_san("e3").unwrap();
        assert_eq!(m.from(), Square::E2);
        assert_eq!(m.to(), Square::E3);
    }

    #[test]
    fn knight_move() {
        let board = Board::default();
        let m = board.parse_san("Nf3").unwrap();
        assert_eq!(m.from(), Square::G1);
        assert_eq!(m.to(), Square::F3);
    }

    #[test]
    fn pawn_capture() {
        let board = board_from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        let m = board.parse_san("exd5").unwrap();
        assert_eq!(m.from(), Square::E4);
        assert_eq!(m.to(), Square::D5);
        assert_eq!(board.san(m), "exd5");
        // the file is required for pawn captures
        assert!(matches!(board.parse_san("xd5"), Err(SanError::IllegalMove { .. })));
    }

    #[test]
    fn disambiguation_knight() {
        let board =
            board_from_fen("r1bqkbnr/pppp1ppp/2n5/1N2p3/4P3/5N2/PPPP1PPP/R1BQKB1R w KQ - 14 9");
        let e = board.parse_san("Nd4").unwrap_err();
        assert!(matches!(e, SanError::AmbiguousMove { ref san, .. } if san == "Nd4"));
        let m = board.parse_san("Nfd4").unwrap();
        assert_eq!(m.from(), Square::F3);
        assert_eq!(m.to(), Square::D4);
        let m = board.parse_san("N3d4").unwrap();
        assert_eq!(m.from(), Square::F3);
        assert_eq!(m.to(), Square::D4);
        let m = board.parse_san("Nbd4").unwrap();
        assert_eq!(m.from(), Square::B5);
        assert_eq!(m.to(), Square::D4);
        let m = board.parse_san("N5d4").unwrap();
        assert_eq!(m.from(), Square::B5);
        assert_eq!(m.to(), Square::D4);
        assert_eq!(board.san(Move::new(Square::F3, Square::D4)), "Nfd4");
        assert_eq!(board.san(Move::new(Square::B5, Square::D4)), "Nbd4");
    }

    #[test]
    fn disambiguation_pin() {
        let board =
            board_from_fen("r1b1k1nr/ppppbppp/2n5/1N2p3/2Q1P1q1/5N2/PPPP1PPP/R1BK1B1R w - - 20 12");
        let e = board.parse_san("Nfd4").unwrap_err();
        assert!(matches!(e, SanError::IllegalMove { ref san, .. } if san == "Nfd4"));
        let e = board.parse_san("N3d4").unwrap_err();
        assert!(matches!(e, SanError::IllegalMove { ref san, .. } if san == "N3d4"));
        let m = board.parse_san("Nd4").unwrap();
        assert_eq!(m.from(), Square::B5);
        assert_eq!(m.to(), Square::D4);
        let m = board.parse_san("Nbd4").unwrap();
        assert_eq!(m.from(), Square::B5);
        let m = board.parse_san("N5d4").unwrap();
        assert_eq!(m.from(), Square::B5);
        // the pinned knight does not count as a rival
        assert_eq!(board.san(m), "Nd4");
    }

    #[test]
    fn disambiguation_rank() {
        let board = board_from_fen("4k3/8/8/R7/8/8/8/R3K3 w Q - 0 1");
        let e = board.parse_san("Ra3").unwrap_err();
        assert!(matches!(e, SanError::AmbiguousMove { .. }));
        let m = board.parse_san("R1a3").unwrap();
        assert_eq!(m.from(), Square::A1);
        assert_eq!(m.to(), Square::A3);
        assert_eq!(board.san(m), "R1a3");
    }

    #[test]
    fn disambiguation_by_both() {
        // queens on a1, a3 and c1 can all reach b2
        let board = board_from_fen("4k3/8/8/8/8/Q7/8/Q1Q1K3 w - - 0 1");
        assert_eq!(board.san(Move::new(Square::A1, Square::B2)), "Qa1b2");
        assert_eq!(board.san(Move::new(Square::A3, Square::B2)), "Q3b2");
        assert_eq!(board.san(Move::new(Square::C1, Square::B2)), "Qcb2");
        assert_eq!(board.parse_san("Qa1b2").unwrap().from(), Square::A1);
    }

    #[test]
    fn castling_kingside() {
        let board = board_from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let m = board.parse_san("O-O").unwrap();
        assert!(board.is_kingside_castling(m));
        assert_eq!(m.from(), Square::E1);
        assert_eq!(m.to(), Square::G1);
        assert_eq!(board.san(m), "O-O");
    }

    #[test]
    fn castling_queenside() {
        let board = board_from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let m = board.parse_san("O-O-O").unwrap();
        assert!(board.is_queenside_castling(m));
        assert_eq!(m.from(), Square::E1);
        assert_eq!(m.to(), Square::C1);
        assert_eq!(board.san(m), "O-O-O");
    }

    #[test]
    fn castling_zeros() {
        let board = board_from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let m = board.parse_san("0-0").unwrap();
        assert!(board.is_castling(m));
        let m2 = board.parse_san("0-0-0").unwrap();
        assert!(board.is_castling(m2));
    }

    #[test]
    fn castling_chess960() {
        // rooks on b1 and g1, so the kingside castle looks like a king step
        let board = board_from_fen("4k3/8/8/8/8/8/8/1R2K1R1 w GB - 0 1").with_chess960(true);
        let m = board.parse_san("O-O").unwrap();
        assert_eq!(m, Move::new(Square::E1, Square::G1));
        assert_eq!(board.san(m), "O-O");
        let m = board.parse_san("O-O-O").unwrap();
        assert_eq!(m, Move::new(Square::E1, Square::B1));
        assert_eq!(board.san(m), "O-O-O");
    }

    #[test]
    fn promotion() {
        let board = board_from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1");
        let m = board.parse_san("a8=Q").unwrap();
        assert_eq!(m.from(), Square::A7);
        assert_eq!(m.to(), Square::A8);
        assert_eq!(m.promotion(), Some(PieceType::Queen));
        assert_eq!(board.san(m), "a8=Q+");
    }

    #[test]
    fn missing_promotion() {
        let board = board_from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1");
        let e = board.parse_san("a8").unwrap_err();
        assert!(matches!(e, SanError::IllegalMove { ref san, .. } if san == "a8"));
        let e = board.parse_san("a7a8").unwrap_err();
        assert!(matches!(e, SanError::MissingPromotion { ref san, .. } if san == "a7a8"));
    }

    #[test]
    fn terse_promotion() {
        let board = board_from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1");
        let m = board.parse_san("a8q").unwrap();
        assert_eq!(m.from(), Square::A7);
        assert_eq!(m.to(), Square::A8);
        assert_eq!(m.promotion(), Some(PieceType::Queen));
        let m = board.parse_san("a8n").unwrap();
        assert_eq!(m.promotion(), Some(PieceType::Knight));
        let m = board.parse_san("a8=N").unwrap();
        assert_eq!(m.promotion(), Some(PieceType::Knight));
        let m = board.parse_san("a8Q").unwrap();
        assert_eq!(m.promotion(), Some(PieceType::Queen));
        let m = board.parse_san("a7a8=R").unwrap();
        assert_eq!(m.promotion(), Some(PieceType::Rook));
    }

    #[test]
    fn with_check_marker() {
        let board = board_from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        let m = board.parse_san("Qh4+").unwrap();
        assert_eq!(m.from(), Square::D8);
        assert_eq!(m.to(), Square::H4);
        assert_eq!(board.san(m), "Qh4#");
        assert_eq!(board.lan(m), "Qd8-h4#");
    }

    #[test]
    fn capture_without_x() {
        let board = board_from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        let m = board.parse_san("ed5").unwrap();
        assert_eq!(m.to(), Square::D5);
        assert_eq!(board.lan(m), "e4xd5");
    }

    #[test]
    fn invalid() {
        let board = Board::default();
        for bad in ["Ze4", "", "xxxx", "e9", "Nf3 ", "e4!!", "Pe4"] {
            assert!(
                matches!(board.parse_san(bad), Err(SanError::InvalidSan(_))),
                "{bad:?} should be rejected as invalid"
            );
        }
        assert!(matches!(board.parse_san("e4,e5"), Err(SanError::MultiLeg(_))));
    }

    #[test]
    fn null_moves() {
        let board = Board::default();
        for null in ["--", "Z0", "0000", "@@@@"] {
            assert_eq!(board.parse_san(null).unwrap(), Move::NULL);
        }
        assert_eq!(board.san(Move::NULL), "--");
    }

    #[test]
    fn illegal_move() {
        let board = Board::default();
        assert!(matches!(
            board.parse_san("e5"),
            Err(SanError::IllegalMove { .. })
        ));
        // king takes own rook is not castling
        let board = board_from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(matches!(board.parse_san("Kxh1"), Err(SanError::IllegalMove { .. })));
    }

    #[test]
    fn roundtrip() {
        let positions = [
            Board::STARTING_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            "rn3r2/pbppq1p1/1p2pN2/8/3P2NP/6P1/PPP1BP1R/R3K1k1 w Q - 5 18",
        ];
        for p in positions {
            let board = board_from_fen(p);
            for legal_move in board.legal_moves() {
                let san_str = board.san(legal_move);
                let parsed = board.parse_san(&san_str).unwrap();
                assert_eq!(
                    legal_move, parsed,
                    "Roundtrip failed for {san_str}: got {parsed:?}"
                );
                let lan_str = board.lan(legal_move);
                assert_eq!(board.parse_san(&lan_str).unwrap(), legal_move, "{lan_str}");
            }
        }
    }

    #[test]
    fn fully_specified_move() {
        let board = Board::default();
        let m = board.parse_san("Ng1f3").unwrap();
        assert_eq!(m.from(), Square::G1);
        assert_eq!(m.to(), Square::F3);
        let m = board.parse_san("e2-e4").unwrap();
        assert_eq!(m, Move::new(Square::E2, Square::E4));
    }

    #[test]
    fn en_passant() {
        let board = board_from_fen("rnbqkbnr/pppp1ppp/8/4pP2/8/8/PPPPP1PP/RNBQKBNR w KQkq e6 0 3");
        let m = board.parse_san("fxe6").unwrap();
        assert!(board.is_en_passant(m));
        assert_eq!(m.to(), Square::E6);
        let m = board.parse_san("fe6").unwrap();
        assert!(board.is_en_passant(m));
        assert_eq!(board.san(m), "fxe6");
    }

    #[test]
    fn push_and_variation() {
        let mut board = Board::default();
        assert_eq!(board.push_san("e4").unwrap(), Move::new(Square::E2, Square::E4));
        assert_eq!(board.push_xboard("e5").unwrap(), Move::new(Square::E7, Square::E5));
        assert_eq!(board.san_and_push(Move::new(Square::G1, Square::F3)), "Nf3");
        assert_eq!(board.lan_and_push(Move::new(Square::B8, Square::C6)), "Nb8-c6");

        let start = Board::default();
        let line = [
            Move::new(Square::E2, Square::E4),
            Move::new(Square::E7, Square::E5),
            Move::new(Square::G1, Square::F3),
        ];
        assert_eq!(start.variation_san(&line).unwrap(), "1. e4 e5 2. Nf3");

        let mut after_e4 = Board::default();
        after_e4.push_san("e4").unwrap();
        assert_eq!(
            after_e4.variation_san(&line[1..]).unwrap(),
            "1...e5 2. Nf3"
        );

        let err = start.variation_san(&line[1..]).unwrap_err();
        assert!(matches!(err, SanError::IllegalMove { ref san, .. } if san == "e7e5"));
    }

    #[test]
    fn drops_and_long_captures() {
        let board = Board::default();
        assert_eq!(board.san(Move::new_drop(PieceType::Knight, Square::E4)), "N@e4");
        assert_eq!(board.san(Move::new_drop(PieceType::Pawn, Square::E4)), "@e4");

        let board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2").unwrap();
        let exd5 = Move::new(Square::E4, Square::D5);
        assert_eq!(board.san(exd5), "exd5");
        assert_eq!(board.lan(exd5), "e4xd5");
    }
}
