use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenParseError {
    #[error("FEN string is empty")]
    MissingBoard,
    #[error("expected 8 rows in board part of FEN, got {0}")]
    BoardSegments(usize),
    #[error("two consecutive digits in board part of FEN")]
    AdjacentDigits,
    #[error("row of board part of FEN does not describe exactly 8 squares")]
    BadSquaresInSegment,
    #[error("'~' not after a piece in board part of FEN")]
    DanglingPromotedMarker,
    #[error("unexpected character '{0}' in board part of FEN")]
    UnexpectedCharacter(char),
    #[error("expected 'w' or 'b' for turn part of FEN, got \"{0}\"")]
    InvalidSide(String),
    #[error("invalid castling part in FEN: \"{0}\"")]
    InvalidCastling(String),
    #[error("invalid en passant part in FEN: \"{0}\"")]
    InvalidEnPassant(String),
    #[error("invalid half-move clock in FEN: \"{0}\"")]
    InvalidHalfmoveClock(String),
    #[error("invalid fullmove number in FEN: \"{0}\"")]
    InvalidFullmoveNumber(String),
    #[error("FEN string has more parts than expected")]
    ExtraTokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("expected UCI string to be of length 4 or 5, got {0}")]
    InvalidLength(usize),
    #[error("invalid square in UCI move: \"{0}\"")]
    InvalidSquare(String),
    #[error("invalid piece letter '{0}' in UCI move")]
    InvalidPiece(char),
    #[error("invalid UCI move (from and to square are equal): \"{0}\"")]
    SameSquare(String),
    #[error("illegal uci: \"{uci}\" in {fen}")]
    IllegalMove { uci: String, fen: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanError {
    #[error("invalid san: \"{0}\"")]
    InvalidSan(String),
    #[error("unsupported multi-leg move: \"{0}\"")]
    MultiLeg(String),
    #[error("illegal san: \"{san}\" in {fen}")]
    IllegalMove { san: String, fen: String },
    #[error("ambiguous san: \"{san}\" in {fen}")]
    AmbiguousMove { san: String, fen: String },
    #[error("missing promotion piece type: \"{san}\" in {fen}")]
    MissingPromotion { san: String, fen: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EpdParseError {
    #[error(transparent)]
    Fen(#[from] FenParseError),
    #[error(transparent)]
    San(#[from] SanError),
    #[error("expected non-negative integer operand for {0}")]
    NonIntegerCounter(String),
    #[error("invalid numeric operand for epd operation \"{opcode}\": \"{operand}\"")]
    InvalidNumericOperand { opcode: String, operand: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("chess960 position index not 0 <= {0} < 960")]
pub struct Chess960IndexError(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("move stack is empty")]
pub struct EmptyMoveStack;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid square name: \"{0}\"")]
pub struct SquareParseError(pub String);

#[cfg(debug_assertions)]
pub type PositionValidityError = String;
