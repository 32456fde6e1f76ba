use crate::{
    chess::{
        board::{Board, FenOptions},
        chessmove::Move,
    },
    errors::EpdParseError,
};

/// The value attached to an EPD opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum EpdOperand {
    /// An opcode on its own, like `noop;`.
    Empty,
    Integer(i64),
    Float(f64),
    String(String),
    Move(Move),
    /// Written as a line for `pv` and as a sorted set otherwise.
    Moves(Vec<Move>),
}

impl From<i64> for EpdOperand {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for EpdOperand {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for EpdOperand {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EpdOperand {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Move> for EpdOperand {
    fn from(value: Move) -> Self {
        Self::Move(value)
    }
}

impl From<Vec<Move>> for EpdOperand {
    fn from(value: Vec<Move>) -> Self {
        Self::Moves(value)
    }
}

/// EPD operations in the order they were written. Inserting an opcode that
/// is already present replaces its operand in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpdOps {
    ops: Vec<(String, EpdOperand)>,
}

impl EpdOps {
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn insert(&mut self, opcode: impl Into<String>, operand: impl Into<EpdOperand>) {
        let opcode = opcode.into();
        let operand = operand.into();
        if let Some(slot) = self.ops.iter_mut().find(|(op, _)| *op == opcode) {
            slot.1 = operand;
        } else {
            self.ops.push((opcode, operand));
        }
    }

    pub fn get(&self, opcode: &str) -> Option<&EpdOperand> {
        self.ops
            .iter()
            .find_map(|(op, operand)| (op == opcode).then_some(operand))
    }

    pub fn contains(&self, opcode: &str) -> bool {
        self.get(opcode).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EpdOperand)> {
        self.ops.iter().map(|(op, operand)| (op.as_str(), operand))
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<K: Into<String>, V: Into<EpdOperand>> FromIterator<(K, V)> for EpdOps {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut ops = Self::new();
        for (opcode, operand) in iter {
            ops.insert(opcode, operand);
        }
        ops
    }
}

/// Operands of these opcodes are lists of moves, even when empty.
const MOVE_LIST_OPCODES: [&str; 3] = ["pv", "am", "bm"];

fn empty_operand(opcode: &str) -> EpdOperand {
    if MOVE_LIST_OPCODES.contains(&opcode) {
        EpdOperand::Moves(Vec::new())
    } else {
        EpdOperand::Empty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Opcode,
    AfterOpcode,
    Numeric,
    String,
    StringEscape,
    San,
}

/// Splits off the four position fields. The rest, if any, is the
/// operations part.
fn split_fields(epd: &str) -> (Vec<&str>, Option<&str>) {
    let mut fields = Vec::with_capacity(4);
    let mut rest = epd.trim_start();
    while fields.len() < 4 && !rest.is_empty() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    let ops = (!rest.is_empty()).then_some(rest);
    (fields, ops)
}

fn parse_numeric(opcode: &str, operand: &str) -> Result<EpdOperand, EpdParseError> {
    let invalid = || EpdParseError::InvalidNumericOperand {
        opcode: opcode.to_string(),
        operand: operand.to_string(),
    };
    let text = operand.trim();
    if text.contains(['.', 'e', 'E']) {
        let value = text.parse::<f64>().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(EpdOperand::Float(value))
    } else {
        text.parse::<i64>().map(EpdOperand::Integer).map_err(|_| invalid())
    }
}

/// Reads the operations part of an EPD. `position` builds the board that
/// move operands are read against, and is only called if one is present.
fn parse_ops(
    text: &str,
    position: impl Fn() -> Result<Board, EpdParseError>,
) -> Result<EpdOps, EpdParseError> {
    let mut ops = EpdOps::new();
    let mut state = ParseState::Opcode;
    let mut opcode = String::new();
    let mut operand = String::new();
    let mut board: Option<Board> = None;

    for ch in text.chars().map(Some).chain(std::iter::once(None)) {
        let at_end = matches!(ch, None | Some(';'));
        match state {
            ParseState::Opcode => match ch {
                Some(' ' | '\t' | '\r' | '\n') => {
                    if opcode == "-" {
                        opcode.clear();
                    } else if !opcode.is_empty() {
                        state = ParseState::AfterOpcode;
                    }
                }
                None | Some(';') => {
                    if opcode != "-" && !opcode.is_empty() {
                        ops.insert(opcode.as_str(), empty_operand(&opcode));
                    }
                    opcode.clear();
                }
                Some(c) => opcode.push(c),
            },
            ParseState::AfterOpcode => match ch {
                Some(' ' | '\t' | '\r' | '\n') => (),
                Some('"') => state = ParseState::String,
                None | Some(';') => {
                    ops.insert(opcode.as_str(), empty_operand(&opcode));
                    opcode.clear();
                    state = ParseState::Opcode;
                }
                Some(c) => {
                    operand.push(c);
                    state = if "+-.0123456789".contains(c) {
                        ParseState::Numeric
                    } else {
                        ParseState::San
                    };
                }
            },
            ParseState::Numeric => {
                if at_end {
                    ops.insert(opcode.as_str(), parse_numeric(&opcode, &operand)?);
                    opcode.clear();
                    operand.clear();
                    state = ParseState::Opcode;
                } else if let Some(c) = ch {
                    operand.push(c);
                }
            }
            ParseState::String => match ch {
                None | Some('"') => {
                    ops.insert(opcode.as_str(), std::mem::take(&mut operand));
                    opcode.clear();
                    state = ParseState::Opcode;
                }
                Some('\\') => state = ParseState::StringEscape,
                Some(c) => operand.push(c),
            },
            ParseState::StringEscape => match ch {
                None => {
                    ops.insert(opcode.as_str(), std::mem::take(&mut operand));
                    opcode.clear();
                    state = ParseState::Opcode;
                }
                Some(c) => {
                    operand.push(c);
                    state = ParseState::String;
                }
            },
            ParseState::San => {
                if !at_end {
                    if let Some(c) = ch {
                        operand.push(c);
                    }
                    continue;
                }
                if board.is_none() {
                    board = Some(position()?);
                }
                let Some(board) = board.as_ref() else {
                    continue;
                };
                let value = match opcode.as_str() {
                    "pv" => {
                        let mut line = board.copy_with_stack(0);
                        let mut moves = Vec::new();
                        for token in operand.split_whitespace() {
                            moves.push(line.push_xboard(token)?);
                        }
                        EpdOperand::Moves(moves)
                    }
                    "am" | "bm" => EpdOperand::Moves(
                        operand
                            .split_whitespace()
                            .map(|token| board.parse_xboard(token))
                            .collect::<Result<_, _>>()?,
                    ),
                    _ => EpdOperand::Move(board.parse_xboard(operand.trim())?),
                };
                ops.insert(opcode.as_str(), value);
                opcode.clear();
                operand.clear();
                state = ParseState::Opcode;
            }
        }
    }

    Ok(ops)
}

/// A move counter operand, which has to be a non-negative integer.
fn counter(ops: &EpdOps, opcode: &str, default: i64) -> Result<i64, EpdParseError> {
    match ops.get(opcode) {
        None => Ok(default),
        Some(&EpdOperand::Integer(n)) if n >= 0 => Ok(n),
        Some(_) => Err(EpdParseError::NonIntegerCounter(opcode.to_string())),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}

impl Board {
    /// The first four FEN fields followed by `ops`, like
    /// `<position> bm Nf3; id "x";`.
    ///
    /// # Panics
    ///
    /// Panics if an opcode is `-` or contains whitespace, or a float operand
    /// is not finite.
    pub fn epd(&self, options: FenOptions, ops: &EpdOps) -> String {
        let mut epd = self.epd_with(options);
        if ops.is_empty() {
            return epd;
        }
        epd.push(' ');
        epd.push_str(&self.epd_operations(ops));
        epd
    }

    fn epd_operations(&self, ops: &EpdOps) -> String {
        let mut out = String::new();
        for (i, (opcode, operand)) in ops.iter().enumerate() {
            assert!(opcode != "-", "dash (-) is not a valid epd opcode");
            assert!(
                !opcode.contains([' ', '\n', '\t', '\r']),
                "invalid whitespace in epd opcode: {opcode:?}"
            );
            if i > 0 {
                out.push(' ');
            }
            out.push_str(opcode);
            match operand {
                EpdOperand::Empty => out.push(';'),
                EpdOperand::Integer(n) => {
                    out.push_str(&format!(" {n};"));
                }
                EpdOperand::Float(x) => {
                    assert!(x.is_finite(), "epd operand for {opcode:?} is not finite: {x}");
                    out.push_str(&format!(" {x:?};"));
                }
                EpdOperand::String(s) => {
                    out.push_str(&format!(" \"{}\";", escape(s)));
                }
                EpdOperand::Move(m) => {
                    out.push_str(&format!(" {};", self.san(*m)));
                }
                EpdOperand::Moves(moves) if opcode == "pv" => {
                    let mut line = self.copy_with_stack(0);
                    for &m in moves {
                        out.push(' ');
                        out.push_str(&line.san_and_push(m));
                    }
                    out.push(';');
                }
                EpdOperand::Moves(moves) => {
                    let mut sans = moves.iter().map(|&m| self.san(m)).collect::<Vec<_>>();
                    sans.sort_unstable();
                    for san in sans {
                        out.push(' ');
                        out.push_str(&san);
                    }
                    out.push(';');
                }
            }
        }
        out
    }

    /// Sets the position from an EPD and returns its operations. The `hmvc`
    /// and `fmvn` operations, if present, become the move counters.
    /// Nothing changes on error.
    pub fn set_epd(&mut self, epd: &str) -> Result<EpdOps, EpdParseError> {
        let epd = epd.trim().trim_end_matches(';');
        let (fields, ops_text) = split_fields(epd);
        let Some(ops_text) = ops_text else {
            self.set_fen(epd)?;
            return Ok(EpdOps::new());
        };

        let position = fields.join(" ");
        let chess960 = self.chess960();
        let ops = parse_ops(ops_text, || {
            Ok(Board::from_fen(&format!("{position} 0 1"))?.with_chess960(chess960))
        })?;

        let halfmove = counter(&ops, "hmvc", 0)?;
        let fullmove = counter(&ops, "fmvn", 1)?;
        self.set_fen(&format!("{position} {halfmove} {fullmove}"))?;
        log::trace!("set position from epd with {} operations", ops.len());
        Ok(ops)
    }

    pub fn from_epd(epd: &str, chess960: bool) -> Result<(Self, EpdOps), EpdParseError> {
        let mut board = Self::empty().with_chess960(chess960);
        let ops = board.set_epd(epd)?;
        Ok((board, ops))
    }
}
