//! Golden symbol and wild lifecycle
//!
//! Golden symbols exist only in a spin's initial grid. When a match consumes
//! one, the cell becomes a wild instead of being cleared. Wilds stay on the
//! grid, falling with gravity, until a later match consumes them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::grid::{GoldenTag, Grid, Position};
use crate::symbols::SymbolId;

/// Report entry for one golden symbol of the initial grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenSymbolInfo {
    pub tag: GoldenTag,
    /// Position in the initial grid
    pub position: Position,
    /// Base symbol id
    pub symbol: SymbolId,
    pub is_golden: bool,
    /// Set when a match consumed the symbol
    pub became_wild: bool,
    /// Cascade step of the conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_at_step: Option<u32>,
    /// Where the wild appeared (the symbol may have fallen before converting)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wild_position: Option<Position>,
}

impl GoldenSymbolInfo {
    /// Report entries for every golden cell, ordered by tag
    pub fn collect(grid: &Grid) -> Vec<Self> {
        let mut report: Vec<Self> = grid
            .iter()
            .filter_map(|(position, cell)| {
                Some(Self {
                    tag: cell.golden_tag()?,
                    position,
                    symbol: cell.symbol_id()?,
                    is_golden: true,
                    became_wild: false,
                    converted_at_step: None,
                    wild_position: None,
                })
            })
            .collect();
        report.sort_by_key(|info| info.tag);
        report
    }

    /// Flag the conversion; a symbol becomes wild at most once
    pub fn mark_wild(&mut self, step: u32, at: Position) -> bool {
        if self.became_wild {
            return false;
        }
        self.became_wild = true;
        self.converted_at_step = Some(step);
        self.wild_position = Some(at);
        true
    }
}

/// One entry of the wild transition log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildTransition {
    /// 1-based cascade step
    pub step: u32,
    pub position: Position,
    /// Base symbol the wild came from, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    /// `true` for golden → wild, `false` for a wild consumed by a match
    pub to_wild: bool,
}

/// Active wild positions and the symbol each one came from
#[derive(Debug, Clone, Default)]
pub struct WildTracker {
    active: HashSet<Position>,
    origins: HashMap<Position, SymbolId>,
    created_this_step: HashSet<Position>,
}

impl WildTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track wilds already on a grid (forced grids); they have no origin
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            active: grid.wild_positions().into_iter().collect(),
            ..Self::default()
        }
    }

    /// Start a new cascade step
    pub fn begin_step(&mut self) {
        self.created_this_step.clear();
    }

    /// Register a wild converted from `origin`
    pub fn register(&mut self, pos: Position, origin: SymbolId) {
        self.active.insert(pos);
        self.origins.insert(pos, origin);
        self.created_this_step.insert(pos);
    }

    /// Drop a consumed wild, returning its origin
    pub fn remove(&mut self, pos: Position) -> Option<SymbolId> {
        self.active.remove(&pos);
        self.created_this_step.remove(&pos);
        self.origins.remove(&pos)
    }

    /// Rekey entries after gravity. All moves are lifted out before any is
    /// reinserted, so chains like `a → b, b → c` cannot clobber each other.
    pub fn relocate(&mut self, moves: &[(Position, Position)]) {
        let lifted: Vec<(Position, Option<SymbolId>, bool)> = moves
            .iter()
            .filter(|(from, _)| self.active.remove(from))
            .map(|&(from, to)| {
                let created = self.created_this_step.remove(&from);
                (to, self.origins.remove(&from), created)
            })
            .collect();

        for (to, origin, created) in lifted {
            self.active.insert(to);
            if let Some(origin) = origin {
                self.origins.insert(to, origin);
            }
            if created {
                self.created_this_step.insert(to);
            }
        }
    }

    pub fn is_active(&self, pos: Position) -> bool {
        self.active.contains(&pos)
    }

    pub fn origin(&self, pos: Position) -> Option<SymbolId> {
        self.origins.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active wild positions, sorted
    pub fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.active.iter().copied().collect();
        positions.sort();
        positions
    }

    /// Wilds created in the current step, sorted
    pub fn created_this_step(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.created_this_step.iter().copied().collect();
        positions.sort();
        positions
    }
}
