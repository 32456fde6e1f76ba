#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::multiple_crate_versions,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

//! Rookery, a chess rules library.
//!
//! Positions with full move history, legal move generation for standard
//! chess and Chess960, game termination, and the FEN, EPD, SAN, UCI and
//! XBoard notations.

#[macro_use]
mod macros;

pub mod chess;
pub mod errors;
pub mod perft;

pub use chess::{
    board::{
        Board, BoardState, EnPassantMode, FenOptions,
        epd::{EpdOperand, EpdOps},
        movegen::{LegalMoves, MoveList, PseudoLegalMoves},
        outcome::{Outcome, Termination, TranspositionKey},
        validation::Status,
    },
    chessmove::Move,
    piece::{Colour, Piece, PieceType},
    piecelayout::PieceLayout,
    squareset::SquareSet,
    types::{File, Rank, Square},
    variant::{Rules, Standard, VariantConfig},
};

/// The name of the library.
pub static NAME: &str = "Rookery";
/// The version of the library.
pub static VERSION: &str = env!("CARGO_PKG_VERSION");
