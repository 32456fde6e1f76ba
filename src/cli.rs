use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// The position to operate on, as FEN. Defaults to the standard starting position.
    #[clap(long, global = true, value_name = "FEN")]
    pub fen: Option<String>,
    /// Start from a Chess960 position given by its Scharnagl number (0-959) instead of a FEN.
    #[clap(long, global = true, value_name = "N", conflicts_with = "fen")]
    pub scharnagl: Option<u32>,
    /// Interpret castling and move notation under Chess960 rules.
    #[clap(long, global = true)]
    pub chess960: bool,
    /// Moves to play from the position before running the command, in SAN or UCI.
    #[clap(long = "moves", global = true, value_name = "MOVE", num_args = 1..)]
    pub moves: Vec<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Count the leaf nodes of the legal move tree.
    Perft {
        /// Depth to search to.
        depth: usize,
        /// Print the node count below each root move.
        #[clap(long)]
        divide: bool,
    },
    /// Run a perft suite file with lines of the form `<fen> ;D1 20 ;D2 400`.
    Suite {
        /// Path to the suite.
        path: PathBuf,
        /// Skip depths with more expected nodes than this.
        #[clap(long, value_name = "NODES", default_value = "1000000")]
        nodes_limit: u64,
    },
    /// List the legal moves of the position.
    Moves {
        /// Print moves in UCI notation instead of SAN.
        #[clap(long)]
        uci: bool,
    },
    /// Describe the position: diagram, FEN, validity, check and outcome.
    Status {
        /// Consider draws that must be claimed by a player.
        #[clap(long)]
        claim_draw: bool,
    },
    /// Parse an EPD record and print its position and operations.
    Epd {
        /// The EPD record.
        epd: String,
    },
}
