#![allow(clippy::module_name_repetitions)]

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, bail};

use crate::chess::{board::Board, chessmove::Move};

/// Counts the leaf nodes of the legal move tree to `depth`.
pub fn perft(pos: &mut Board, depth: usize) -> u64 {
    #[cfg(debug_assertions)]
    if let Err(e) = pos.check_validity() {
        panic!("board invalid during perft: {e}");
    }

    if depth == 0 {
        return 1;
    }

    let moves = pos.legal_moves().iter().collect::<Vec<_>>();
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut count = 0;
    for m in moves {
        pos.push(m);
        count += perft(pos, depth - 1);
        if pos.pop().is_err() {
            unreachable!("pop after push cannot fail");
        }
    }

    count
}

/// Node counts below each legal move, in generation order.
pub fn divide(pos: &mut Board, depth: usize) -> Vec<(Move, u64)> {
    let moves = pos.legal_moves().iter().collect::<Vec<_>>();
    let mut out = Vec::with_capacity(moves.len());
    for m in moves {
        pos.push(m);
        out.push((m, perft(pos, depth.saturating_sub(1))));
        if pos.pop().is_err() {
            unreachable!("pop after push cannot fail");
        }
    }
    out
}

/// One line of a perft suite: `<fen> ;D1 20 ;D2 400 ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteEntry {
    pub fen: String,
    pub expected: Vec<(usize, u64)>,
}

impl SuiteEntry {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut parts = line.split(';');
        let fen = parts.next().unwrap_or_default().trim().to_string();
        let mut expected = Vec::new();
        for depth_part in parts {
            let depth_part = depth_part.trim();
            let (d, nodes) = depth_part
                .split_once(' ')
                .with_context(|| format!("malformed depth entry \"{depth_part}\""))?;
            let d = d
                .strip_prefix('D')
                .and_then(|d| d.parse::<usize>().ok())
                .with_context(|| format!("malformed depth \"{d}\""))?;
            let nodes = nodes
                .trim()
                .parse::<u64>()
                .with_context(|| format!("malformed node count \"{nodes}\""))?;
            expected.push((d, nodes));
        }
        Ok(Self { fen, expected })
    }
}

/// Runs every entry of a perft suite file, skipping depths whose expected
/// node count exceeds `nodes_limit`. Fails on the first mismatch.
pub fn gamut(path: &Path, chess960: bool, nodes_limit: u64) -> anyhow::Result<usize> {
    log::info!("running perft on {}", path.display());
    let f = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut checked = 0;
    for line in BufReader::new(f).lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = SuiteEntry::parse(&line)?;
        let mut pos = Board::from_fen(&entry.fen)?.with_chess960(chess960);
        for &(d, nodes) in &entry.expected {
            if nodes > nodes_limit {
                log::debug!("skipping {}, depth {d}", entry.fen);
                break;
            }
            let perft_nodes = perft(&mut pos, d);
            if perft_nodes != nodes {
                bail!("fen {}, depth {d}: expected {nodes}, got {perft_nodes}", entry.fen);
            }
            log::info!("PASS: fen {}, depth {d}", entry.fen);
            checked += 1;
        }
    }
    Ok(checked)
}
