//! Cluster matcher: flood fill over same-symbol and wild cells

use std::collections::HashSet;

use crate::config::Adjacency;
use crate::grid::{Cell, Grid, Position};
use crate::paytable::PayTable;
use crate::symbols::SymbolId;

use super::MatchGroup;

/// Symbol a component of only wilds pays as
pub const ALL_WILD_SYMBOL: SymbolId = 0;

/// Neighbour offsets (reel, row): up, down, left, right
const ORTHOGONAL: [(i8, i8); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
/// Diagonal offsets, checked after the orthogonal ones
const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

#[derive(Debug, Clone)]
pub struct AdjacencyMatcher {
    pay_table: PayTable,
    min_match: usize,
    adjacency: Adjacency,
    bonus_symbols: Vec<SymbolId>,
}

impl AdjacencyMatcher {
    pub fn new(
        pay_table: PayTable,
        min_match: usize,
        adjacency: Adjacency,
        bonus_symbols: Vec<SymbolId>,
    ) -> Self {
        Self {
            pay_table,
            min_match,
            adjacency,
            bonus_symbols,
        }
    }

    /// Scan row-major and flood fill from each cell not yet consumed.
    ///
    /// Non-wild cells belong to at most one component. A wild can join
    /// several neighbouring components but only seeds a component of its own
    /// when no earlier component reached it.
    pub fn find_matches(&self, grid: &Grid) -> Vec<MatchGroup> {
        let mut visited: HashSet<Position> = HashSet::new();
        let mut absorbed: HashSet<Position> = HashSet::new();
        let mut groups = Vec::new();

        for seed in grid.positions_row_major() {
            if visited.contains(&seed) || absorbed.contains(&seed) {
                continue;
            }

            let symbol = match grid.get(seed) {
                Cell::Empty => continue,
                Cell::Symbol { id, .. } if self.is_bonus(id) => continue,
                Cell::Symbol { id, .. } => id,
                Cell::Wild => self.wild_seed_symbol(grid, seed),
            };

            let component = self.flood(grid, seed, symbol);
            for &pos in &component {
                if grid.get(pos).is_wild() {
                    absorbed.insert(pos);
                } else {
                    visited.insert(pos);
                }
            }

            if component.len() >= self.min_match {
                groups.push(MatchGroup {
                    symbol,
                    count: component.len(),
                    payout: self.pay_table.pay(symbol, component.len()),
                    positions: component,
                    reels_spanned: None,
                });
            }
        }

        groups
    }

    fn is_bonus(&self, id: SymbolId) -> bool {
        self.bonus_symbols.contains(&id)
    }

    fn neighbours<'a>(&'a self, grid: &'a Grid, pos: Position) -> impl Iterator<Item = Position> + 'a {
        let orthogonal: &'static [(i8, i8)] = &ORTHOGONAL;
        let diagonal: &'static [(i8, i8)] = match self.adjacency {
            Adjacency::Orthogonal => &[],
            Adjacency::Diagonal => &DIAGONAL,
        };
        orthogonal
            .iter()
            .chain(diagonal.iter())
            .filter_map(move |&(dr, dc)| {
                let next = Position::new(
                    pos.reel.checked_add_signed(dr)?,
                    pos.row.checked_add_signed(dc)?,
                );
                grid.contains(next).then_some(next)
            })
    }

    fn joins(&self, cell: Cell, symbol: SymbolId) -> bool {
        match cell {
            Cell::Wild => true,
            Cell::Symbol { id, .. } => id == symbol && !self.is_bonus(id),
            Cell::Empty => false,
        }
    }

    /// Depth-first fill from `seed`, returning positions in discovery order
    fn flood(&self, grid: &Grid, seed: Position, symbol: SymbolId) -> Vec<Position> {
        let mut seen = HashSet::from([seed]);
        let mut order = Vec::new();
        let mut stack = vec![seed];

        while let Some(pos) = stack.pop() {
            order.push(pos);
            for next in self.neighbours(grid, pos) {
                if !seen.contains(&next) && self.joins(grid.get(next), symbol) {
                    seen.insert(next);
                    stack.push(next);
                }
            }
        }

        order
    }

    /// Symbol for a component seeded by a wild: the first non-wild neighbour
    /// of the wild region, walking it in discovery order. All wild pays as
    /// [`ALL_WILD_SYMBOL`].
    fn wild_seed_symbol(&self, grid: &Grid, seed: Position) -> SymbolId {
        let mut seen = HashSet::from([seed]);
        let mut queue = vec![seed];
        let mut index = 0;

        while let Some(&pos) = queue.get(index) {
            index += 1;
            for next in self.neighbours(grid, pos) {
                match grid.get(next) {
                    Cell::Symbol { id, .. } if !self.is_bonus(id) => return id,
                    Cell::Wild if seen.insert(next) => queue.push(next),
                    _ => {}
                }
            }
        }

        ALL_WILD_SYMBOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WILD: SymbolId = 99;

    fn matcher(min_match: usize, adjacency: Adjacency) -> AdjacencyMatcher {
        let pays = PayTable::new()
            .with(0, &[0.0, 0.0, 20.0, 60.0, 200.0])
            .with(1, &[0.0, 0.0, 5.0, 10.0, 15.0]);
        AdjacencyMatcher::new(pays, min_match, adjacency, vec![7])
    }

    /// Grid where no symbol touches an equal neighbour
    fn checker() -> Vec<Vec<SymbolId>> {
        (0..5u32)
            .map(|reel| (0..4u32).map(|row| 2 + (reel + row) % 2 * 3 + reel % 2).collect())
            .collect()
    }

    #[test]
    fn test_checker_has_no_groups() {
        let grid = Grid::from_ids(&checker(), WILD).unwrap();
        assert!(matcher(2, Adjacency::Orthogonal).find_matches(&grid).is_empty());
    }

    #[test]
    fn test_vertical_triple() {
        let mut ids = checker();
        ids[0][0] = 0;
        ids[0][1] = 0;
        ids[0][2] = 0;
        let grid = Grid::from_ids(&ids, WILD).unwrap();
        let groups = matcher(3, Adjacency::Orthogonal).find_matches(&grid);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].symbol, 0);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].payout, 20.0);
        assert_eq!(groups[0].positions[0], Position::new(0, 0));
    }

    #[test]
    fn test_groups_below_minimum_are_dropped() {
        let mut ids = checker();
        ids[0][0] = 0;
        ids[1][0] = 0;
        let grid = Grid::from_ids(&ids, WILD).unwrap();
        assert!(matcher(3, Adjacency::Orthogonal).find_matches(&grid).is_empty());
        assert_eq!(matcher(2, Adjacency::Orthogonal).find_matches(&grid).len(), 1);
    }

    #[test]
    fn test_diagonal_mode_joins_corners() {
        let mut ids = checker();
        ids[0][0] = 0;
        ids[1][1] = 0;
        ids[2][2] = 0;
        let grid = Grid::from_ids(&ids, WILD).unwrap();
        assert!(matcher(3, Adjacency::Orthogonal).find_matches(&grid).is_empty());
        let groups = matcher(3, Adjacency::Diagonal).find_matches(&grid);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 3);
    }

    #[test]
    fn test_wild_bridges_and_is_shared() {
        // 0 W 1 on row 0, with 0 under the first 0 and 1 under the 1
        let mut ids = checker();
        ids[0][0] = 0;
        ids[0][1] = 0;
        ids[1][0] = WILD;
        ids[2][0] = 1;
        ids[2][1] = 1;
        let grid = Grid::from_ids(&ids, WILD).unwrap();
        let groups = matcher(3, Adjacency::Orthogonal).find_matches(&grid);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].symbol, 0);
        assert_eq!(groups[1].symbol, 1);
        assert!(groups.iter().all(|g| g.contains(Position::new(1, 0))));
    }

    #[test]
    fn test_wild_seed_takes_first_neighbour() {
        // Wild at the top-left seeds first; its down neighbour is 1
        let mut ids = checker();
        ids[0][0] = WILD;
        ids[0][1] = 1;
        ids[1][0] = 0;
        ids[1][1] = 1;
        let grid = Grid::from_ids(&ids, WILD).unwrap();
        let groups = matcher(3, Adjacency::Orthogonal).find_matches(&grid);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].symbol, 1);
        assert_eq!(groups[0].count, 3);
    }

    #[test]
    fn test_all_wild_component_pays_as_symbol_zero() {
        let mut grid = Grid::empty(3, 3);
        for reel in 0..3 {
            grid.set(Position::new(reel, 1), Cell::Wild);
        }
        let groups = matcher(3, Adjacency::Orthogonal).find_matches(&grid);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].symbol, ALL_WILD_SYMBOL);
        assert_eq!(groups[0].payout, 20.0);
    }

    #[test]
    fn test_bonus_symbols_never_cluster() {
        let mut ids = checker();
        for row in 0..4 {
            ids[3][row] = 7;
        }
        let grid = Grid::from_ids(&ids, WILD).unwrap();
        assert!(matcher(3, Adjacency::Orthogonal).find_matches(&grid).is_empty());
    }

    #[test]
    fn test_every_group_meets_minimum() {
        let grid = Grid::from_ids(&vec![vec![0, 0, 1, 1]; 5], WILD).unwrap();
        let groups = matcher(4, Adjacency::Orthogonal).find_matches(&grid);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.count >= 4));
        assert_eq!(groups[0].count, 10);
    }
}
