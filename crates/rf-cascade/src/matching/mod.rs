//! Match detection
//!
//! Two strategies share one contract: a grid in, a list of [`MatchGroup`]s out.
//! Wild cells count as any ordinary symbol in both. Bonus symbols never match
//! ordinarily; they are counted on the final grid by [`find_bonus`].

mod adjacency;
mod ways;

pub use adjacency::AdjacencyMatcher;
pub use ways::WaysMatcher;

use serde::{Deserialize, Serialize};

use crate::config::{AlgorithmConfig, CascadeConfig, WinMechanism};
use crate::grid::{Grid, Position};
use crate::symbols::SymbolId;

/// One matched group, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    /// Symbol the group pays as
    pub symbol: SymbolId,
    /// Matched cells, in discovery order
    pub positions: Vec<Position>,
    /// Number of matched cells
    pub count: usize,
    /// Consecutive reels from the left (ways wins only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reels_spanned: Option<u8>,
    /// Pay in bet multiples, before the cascade multiplier
    pub payout: f64,
}

impl MatchGroup {
    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }
}

/// Match strategy selected by [`WinMechanism`]
#[derive(Debug, Clone)]
pub enum MatchEngine {
    Adjacency(AdjacencyMatcher),
    Ways(WaysMatcher),
}

impl MatchEngine {
    /// Build the configured strategy
    pub fn from_config(algorithm: &AlgorithmConfig, cascade: &CascadeConfig) -> Self {
        match cascade.win_mechanism {
            WinMechanism::ClusterPays => Self::Adjacency(AdjacencyMatcher::new(
                algorithm.pay_table.clone(),
                cascade.min_match as usize,
                cascade.adjacency,
                algorithm.bonus_symbols.clone(),
            )),
            WinMechanism::Ways => Self::Ways(WaysMatcher::new(
                algorithm.pay_table.clone(),
                algorithm.paying_symbols(),
            )),
        }
    }

    pub fn find_matches(&self, grid: &Grid) -> Vec<MatchGroup> {
        match self {
            Self::Adjacency(m) => m.find_matches(grid),
            Self::Ways(m) => m.find_matches(grid),
        }
    }

    /// Cheap check used when leaning a draw
    pub fn has_match(&self, grid: &Grid) -> bool {
        !self.find_matches(grid).is_empty()
    }

    pub fn mechanism(&self) -> WinMechanism {
        match self {
            Self::Adjacency(_) => WinMechanism::ClusterPays,
            Self::Ways(_) => WinMechanism::Ways,
        }
    }
}

/// Bonus symbols landed on the final grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTrigger {
    pub symbol: SymbolId,
    pub count: usize,
    pub positions: Vec<Position>,
    pub free_spins: u32,
}

/// Count bonus symbols; the best-represented one triggers at the configured count
pub fn find_bonus(grid: &Grid, algorithm: &AlgorithmConfig) -> Option<BonusTrigger> {
    let mut best: Option<(SymbolId, Vec<Position>)> = None;

    for &bonus in &algorithm.bonus_symbols {
        let positions: Vec<Position> = grid
            .iter()
            .filter(|(_, cell)| cell.symbol_id() == Some(bonus))
            .map(|(pos, _)| pos)
            .collect();

        let better = match &best {
            Some((_, current)) => positions.len() > current.len(),
            None => true,
        };
        if better {
            best = Some((bonus, positions));
        }
    }

    let (symbol, positions) = best?;
    if positions.len() < algorithm.bonus_trigger_count as usize {
        return None;
    }

    Some(BonusTrigger {
        symbol,
        count: positions.len(),
        positions,
        free_spins: algorithm.bonus_free_spins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    fn grid_with_bonus(count: u8) -> Grid {
        let mut grid = Grid::from_ids(&vec![vec![0, 1, 2, 3]; 5], 99).unwrap();
        for reel in 0..count {
            grid.set(Position::new(reel, 1), Cell::symbol(7));
        }
        grid
    }

    #[test]
    fn test_bonus_trigger_threshold() {
        let algorithm = AlgorithmConfig::reference();
        assert!(find_bonus(&grid_with_bonus(2), &algorithm).is_none());

        let trigger = find_bonus(&grid_with_bonus(4), &algorithm).unwrap();
        assert_eq!(trigger.symbol, 7);
        assert_eq!(trigger.count, 4);
        assert_eq!(trigger.positions[0], Position::new(0, 1));
        assert_eq!(trigger.free_spins, algorithm.bonus_free_spins);
    }

    #[test]
    fn test_no_bonus_symbols_configured() {
        let mut algorithm = AlgorithmConfig::reference();
        algorithm.bonus_symbols.clear();
        assert!(find_bonus(&grid_with_bonus(5), &algorithm).is_none());
    }

    #[test]
    fn test_engine_follows_mechanism() {
        let algorithm = AlgorithmConfig::reference();
        let mut cascade = CascadeConfig::default();
        assert_eq!(
            MatchEngine::from_config(&algorithm, &cascade).mechanism(),
            WinMechanism::Ways
        );
        cascade.win_mechanism = WinMechanism::ClusterPays;
        assert_eq!(
            MatchEngine::from_config(&algorithm, &cascade).mechanism(),
            WinMechanism::ClusterPays
        );
    }
}
