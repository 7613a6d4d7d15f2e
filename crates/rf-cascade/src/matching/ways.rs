//! Leftmost-anchored ways matcher ("1024 ways" on 5×4)

use crate::grid::{Cell, Grid, Position};
use crate::paytable::PayTable;
use crate::symbols::SymbolId;

use super::MatchGroup;

/// Shortest run of reels that pays
pub const MIN_WAYS_LENGTH: usize = 3;

/// A symbol pays when it (or a wild) shows on every reel from reel 0 up to the
/// first reel lacking it. Every qualifying symbol pays in the same evaluation.
#[derive(Debug, Clone)]
pub struct WaysMatcher {
    pay_table: PayTable,
    candidates: Vec<SymbolId>,
}

impl WaysMatcher {
    pub fn new(pay_table: PayTable, candidates: Vec<SymbolId>) -> Self {
        Self {
            pay_table,
            candidates,
        }
    }

    pub fn find_matches(&self, grid: &Grid) -> Vec<MatchGroup> {
        self.candidates
            .iter()
            .filter_map(|&symbol| self.match_symbol(grid, symbol))
            .collect()
    }

    /// Best (and only) ways match for one symbol
    fn match_symbol(&self, grid: &Grid, symbol: SymbolId) -> Option<MatchGroup> {
        let mut positions = Vec::new();
        let mut length = 0usize;

        for reel in 0..grid.reels() {
            let before = positions.len();
            for (row, cell) in grid.column(reel).iter().enumerate() {
                if matches_symbol(cell, symbol) {
                    positions.push(Position::new(reel, row as u8));
                }
            }
            if positions.len() == before {
                break;
            }
            length += 1;
        }

        if length < MIN_WAYS_LENGTH {
            return None;
        }

        let count = positions.len();
        let base = self.pay_table.pay(symbol, length);

        Some(MatchGroup {
            symbol,
            count,
            positions,
            reels_spanned: Some(length as u8),
            payout: base * count as f64 / length as f64,
        })
    }
}

fn matches_symbol(cell: &Cell, symbol: SymbolId) -> bool {
    match cell {
        Cell::Wild => true,
        Cell::Symbol { id, .. } => *id == symbol,
        Cell::Empty => false,
    }
}
