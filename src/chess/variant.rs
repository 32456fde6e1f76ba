use std::fmt::Debug;

use crate::chess::{
    board::Board,
    chessmove::Move,
    piece::PieceType,
    piecelayout::PieceLayout,
    types::Square,
};

/// Static description of a rule set: its names, starting position and
/// whether each side has exactly one king.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantConfig {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub uci_variant: &'static str,
    pub xboard_variant: &'static str,
    pub starting_fen: &'static str,
    pub one_king: bool,
}

pub static STANDARD: VariantConfig = VariantConfig {
    name: "Standard",
    aliases: &["Standard", "Chess", "Classical", "Normal", "Illegal", "From Position"],
    uci_variant: "chess",
    xboard_variant: "normal",
    starting_fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    one_king: true,
};

/// Hooks a rule set can override. Every hook defaults to standard chess, so
/// an implementation only spells out where it differs.
pub trait Rules: Debug + Send + Sync {
    fn config(&self) -> &VariantConfig;

    /// The game ended for a variant-specific reason.
    fn is_variant_end(&self, _board: &Board) -> bool {
        false
    }

    /// The side to move lost for a variant-specific reason.
    fn is_variant_loss(&self, _board: &Board) -> bool {
        false
    }

    /// The side to move won for a variant-specific reason.
    fn is_variant_win(&self, _board: &Board) -> bool {
        false
    }

    fn is_variant_draw(&self, _board: &Board) -> bool {
        false
    }

    /// Called by `push` after the moving piece has landed on a capture.
    fn on_capture(
        &self,
        _layout: &mut PieceLayout,
        _mv: Move,
        _capture_square: Square,
        _captured: PieceType,
        _was_promoted: bool,
    ) {
    }
}

/// Orthodox chess.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl Rules for Standard {
    fn config(&self) -> &VariantConfig {
        &STANDARD
    }
}

static VARIANTS: [&dyn Rules; 1] = [&Standard];

/// Looks a rule set up by any of its aliases, ignoring case.
pub fn find_variant(name: &str) -> Option<&'static dyn Rules> {
    VARIANTS.iter().copied().find(|rules| {
        rules
            .config()
            .aliases
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_alias() {
        for name in ["standard", "Chess", "NORMAL", "from position"] {
            let rules = find_variant(name).unwrap();
            assert_eq!(rules.config().name, "Standard");
        }
        assert!(find_variant("atomic").is_none());
    }

    #[test]
    fn standard_flags() {
        let config = Standard.config();
        assert!(config.one_king);
        assert_eq!(config.uci_variant, "chess");
        assert_eq!(config.xboard_variant, "normal");
        assert_eq!(config.starting_fen, Board::STARTING_FEN);
    }
}
