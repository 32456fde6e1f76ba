#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Command-line front end for the Rookery chess library.

mod cli;

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rookery::{Board, EpdOperand, perft};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    log::debug!("{} {}", rookery::NAME, rookery::VERSION);
    rookery::chess::attacks::init();

    let mut board = setup(&cli)?;

    match cli.command {
        Command::Perft { depth, divide } => {
            let start = Instant::now();
            let nodes = if divide {
                let split = perft::divide(&mut board, depth);
                for &(m, n) in &split {
                    println!("{}: {n}", board.uci(m, None));
                }
                split.iter().map(|&(_, n)| n).sum()
            } else {
                perft::perft(&mut board, depth)
            };
            let elapsed = start.elapsed();
            println!("nodes: {nodes}");
            log::info!(
                "perft({depth}) took {elapsed:?}, {:.0} nps",
                nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
            );
        }
        Command::Suite { path, nodes_limit } => {
            let checked = perft::gamut(&path, cli.chess960, nodes_limit)?;
            println!("{checked} depths passed");
        }
        Command::Moves { uci } => {
            let moves = board
                .legal_moves()
                .iter()
                .map(|m| if uci { board.uci(m, None) } else { board.san(m) })
                .collect::<Vec<_>>();
            println!("{}", moves.join(" "));
        }
        Command::Status { claim_draw } => {
            println!("{board}\n");
            println!("fen: {}", board.fen());
            println!("status: {:?}", board.status());
            if board.is_check() {
                let checkers = board.checkers_mask().into_iter().map(|sq| sq.to_string()).collect::<Vec<_>>();
                println!("check from: {}", checkers.join(" "));
            }
            match board.outcome(claim_draw) {
                Some(outcome) => println!("outcome: {outcome}"),
                None => println!("outcome: none, {} to move", board.turn()),
            }
        }
        Command::Epd { epd } => {
            let (board, ops) = Board::from_epd(&epd, cli.chess960)?;
            println!("{board}\n");
            println!("fen: {}", board.fen());
            for (opcode, operand) in ops.iter() {
                println!("{opcode}: {}", render_operand(&board, operand));
            }
        }
    }

    Ok(())
}

/// Builds the starting position from the global options and plays the
/// requested moves, accepting SAN or UCI for each.
fn setup(cli: &Cli) -> anyhow::Result<Board> {
    let mut board = match (cli.scharnagl, &cli.fen) {
        (Some(scharnagl), _) => Board::from_chess960_pos(scharnagl)?,
        (None, Some(fen)) => Board::from_fen(fen)?.with_chess960(cli.chess960),
        (None, None) => Board::starting().with_chess960(cli.chess960),
    };
    for text in &cli.moves {
        let m = board
            .parse_san(text)
            .or_else(|san_err| board.parse_uci(text).map_err(|_| san_err))
            .with_context(|| format!("cannot play \"{text}\" in {}", board.fen()))?;
        board.push(m);
    }
    Ok(board)
}

fn render_operand(board: &Board, operand: &EpdOperand) -> String {
    match operand {
        EpdOperand::Empty => String::new(),
        EpdOperand::Integer(n) => n.to_string(),
        EpdOperand::Float(x) => format!("{x:?}"),
        EpdOperand::String(s) => format!("{s:?}"),
        EpdOperand::Move(m) => board.san(*m),
        EpdOperand::Moves(moves) => moves.iter().map(|&m| board.san(m)).collect::<Vec<_>>().join(" "),
    }
}
