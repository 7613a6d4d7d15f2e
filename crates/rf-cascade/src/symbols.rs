//! Symbol ids and weighted symbol generation

use serde::{Deserialize, Serialize};

use crate::config::GoldenWildConfig;
use crate::grid::{Cell, Grid, Position};
use crate::rng::RandomSource;

/// Symbol identifier
pub type SymbolId = u32;

/// Per-reel symbol weights, indexed by symbol id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(pub Vec<u32>);

impl WeightTable {
    /// Same weight for every symbol id
    pub fn uniform(symbol_count: usize, weight: u32) -> Self {
        Self(vec![weight; symbol_count])
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&w| w as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Walk the cumulative prefix and return the first id whose cumulative
    /// weight exceeds `draw`
    pub fn pick(&self, draw: u64) -> SymbolId {
        let mut cumulative = 0u64;
        for (id, &w) in self.0.iter().enumerate() {
            cumulative += w as u64;
            if draw < cumulative {
                return id as SymbolId;
            }
        }
        0
    }

    /// Draw one symbol id. A zero total weight always yields id 0.
    pub fn draw(&self, rng: &dyn RandomSource) -> SymbolId {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        self.pick(rng.next_range(0, total))
    }
}

/// Weighted symbol generator with golden promotion
pub struct SymbolGenerator<'a> {
    weights: &'a [WeightTable],
    golden: &'a GoldenWildConfig,
}

impl<'a> SymbolGenerator<'a> {
    pub fn new(weights: &'a [WeightTable], golden: &'a GoldenWildConfig) -> Self {
        Self { weights, golden }
    }

    /// Plain draw for one cell of `reel`
    pub fn draw(&self, reel: u8, rng: &dyn RandomSource) -> SymbolId {
        match self.weights.get(reel as usize) {
            Some(table) => table.draw(rng),
            None => 0,
        }
    }

    /// Draw for the initial grid: base id first, then an independent golden roll
    /// for eligible symbols
    pub fn draw_initial(&self, reel: u8, rng: &dyn RandomSource) -> (SymbolId, bool) {
        let id = self.draw(reel, rng);
        let golden = self.golden.is_eligible(id) && rng.next_f64() < self.golden.golden_probability;
        (id, golden)
    }

    /// Fresh initial grid for a spin; the only place golden symbols are created
    pub fn generate_grid(&self, reels: u8, rows: u8, rng: &dyn RandomSource) -> Grid {
        let mut grid = Grid::empty(reels, rows);
        for reel in 0..reels {
            for row in 0..rows {
                let pos = Position::new(reel, row);
                let (id, golden) = self.draw_initial(reel, rng);
                grid.set(pos, Cell::symbol(id));
                if golden {
                    grid.gild(pos);
                }
            }
        }
        grid
    }

    /// Plain cell for gravity refill, never golden or wild
    pub fn refill_cell(&self, reel: u8, rng: &dyn RandomSource) -> Cell {
        Cell::symbol(self.draw(reel, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ChaChaSource;

    #[test]
    fn test_pick_walks_cumulative_prefix() {
        let table = WeightTable(vec![2, 0, 3]);
        assert_eq!(table.pick(0), 0);
        assert_eq!(table.pick(1), 0);
        assert_eq!(table.pick(2), 2);
        assert_eq!(table.pick(4), 2);
    }

    #[test]
    fn test_zero_weight_yields_zero() {
        let rng = ChaChaSource::seeded(1);
        let table = WeightTable(vec![0, 0, 0]);
        for _ in 0..10 {
            assert_eq!(table.draw(&rng), 0);
        }
        assert_eq!(WeightTable(Vec::new()).draw(&rng), 0);
    }

    #[test]
    fn test_weight_distribution() {
        let rng = ChaChaSource::seeded(99);
        let table = WeightTable(vec![1, 3]);
        let ones = (0..20_000).filter(|_| table.draw(&rng) == 1).count();
        let share = ones as f64 / 20_000.0;
        assert!((share - 0.75).abs() < 0.02, "share = {}", share);
    }

    #[test]
    fn test_golden_only_for_eligible() {
        let rng = ChaChaSource::seeded(5);
        let weights = vec![WeightTable(vec![1, 1])];
        let golden = GoldenWildConfig {
            golden_probability: 1.0,
            eligible_symbols: vec![1],
            ..Default::default()
        };
        let generator = SymbolGenerator::new(&weights, &golden);
        for _ in 0..200 {
            let (id, is_golden) = generator.draw_initial(0, &rng);
            assert_eq!(is_golden, id == 1);
        }
    }

    #[test]
    fn test_refill_never_golden() {
        let rng = ChaChaSource::seeded(5);
        let weights = vec![WeightTable(vec![1, 1])];
        let golden = GoldenWildConfig {
            golden_probability: 1.0,
            eligible_symbols: vec![0, 1],
            ..Default::default()
        };
        let generator = SymbolGenerator::new(&weights, &golden);
        for _ in 0..100 {
            let cell = generator.refill_cell(0, &rng);
            assert!(cell.golden_tag().is_none());
            assert!(!cell.is_wild());
        }
        let grid = generator.generate_grid(1, 4, &rng);
        assert!(grid.iter().all(|(_, c)| c.golden_tag().is_some()));
    }
}
