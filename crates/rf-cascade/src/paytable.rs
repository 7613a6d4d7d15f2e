//! Pay table

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// Pay values per symbol id, in bet multiples
///
/// Entry `n - 1` is the pay for `n` of a kind: `n` cells in a cluster, or `n`
/// consecutive reels for ways wins. Counts beyond the table pay the last entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayTable {
    pub pays: BTreeMap<SymbolId, Vec<f64>>,
}

impl PayTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set pays for a symbol
    pub fn with(mut self, symbol: SymbolId, pays: &[f64]) -> Self {
        self.pays.insert(symbol, pays.to_vec());
        self
    }

    /// Pay for `count` of a kind
    pub fn pay(&self, symbol: SymbolId, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        match self.pays.get(&symbol) {
            Some(pays) if !pays.is_empty() => pays[count.min(pays.len()) - 1],
            _ => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pays.values().all(|p| p.iter().all(|&v| v <= 0.0))
    }

    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.pays.keys().copied()
    }

    /// Reference 1024-ways table for seven paying symbols (ids 0..=6, 6 highest)
    pub fn reference() -> Self {
        Self::new()
            .with(0, &[0.0, 0.0, 0.04, 0.10, 0.25])
            .with(1, &[0.0, 0.0, 0.05, 0.10, 0.35])
            .with(2, &[0.0, 0.0, 0.05, 0.15, 0.45])
            .with(3, &[0.0, 0.0, 0.07, 0.20, 0.50])
            .with(4, &[0.0, 0.0, 0.10, 0.25, 0.90])
            .with(5, &[0.0, 0.0, 0.15, 0.35, 1.40])
            .with(6, &[0.0, 0.0, 0.20, 0.50, 2.00])
    }

    /// Reference cluster table for the same symbols, keyed by cluster size.
    /// Clusters start at 4 cells; 10 or more pay the last entry.
    pub fn cluster_reference() -> Self {
        let mut table = Self::new();
        for (symbol, pays) in [
            (0, [0.3, 0.6, 1.25, 2.5, 5.0, 8.0, 16.0]),
            (1, [0.4, 0.8, 1.6, 3.2, 6.0, 10.0, 20.0]),
            (2, [0.5, 1.0, 2.0, 4.0, 7.5, 12.0, 24.0]),
            (3, [0.6, 1.25, 2.5, 5.0, 10.0, 16.0, 32.0]),
            (4, [1.0, 2.0, 4.0, 8.0, 15.0, 25.0, 50.0]),
            (5, [1.5, 3.0, 6.0, 12.0, 25.0, 40.0, 80.0]),
            (6, [3.0, 6.0, 12.0, 25.0, 50.0, 80.0, 160.0]),
        ] {
            let mut sized = vec![0.0; 3];
            sized.extend(pays);
            table.pays.insert(symbol, sized);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_lookup() {
        let table = PayTable::new().with(0, &[0.0, 0.0, 20.0, 60.0, 200.0]);
        assert_eq!(table.pay(0, 0), 0.0);
        assert_eq!(table.pay(0, 2), 0.0);
        assert_eq!(table.pay(0, 3), 20.0);
        assert_eq!(table.pay(0, 5), 200.0);
        // Beyond the table clamps to the last entry
        assert_eq!(table.pay(0, 9), 200.0);
        assert_eq!(table.pay(7, 3), 0.0);
    }

    #[test]
    fn test_empty_detection() {
        assert!(PayTable::new().is_empty());
        assert!(PayTable::new().with(1, &[0.0, 0.0]).is_empty());
        assert!(!PayTable::reference().is_empty());
    }

    #[test]
    fn test_cluster_table_starts_at_four() {
        let table = PayTable::cluster_reference();
        assert_eq!(table.symbols().count(), 7);
        for symbol in table.symbols() {
            assert_eq!(table.pay(symbol, 3), 0.0);
            assert!(table.pay(symbol, 4) > 0.0);
            assert!(table.pay(symbol, 10) > table.pay(symbol, 9));
            assert_eq!(table.pay(symbol, 25), table.pay(symbol, 10));
        }
        assert_eq!(table.pay(0, 4), 0.3);
        assert_eq!(table.pay(6, 10), 160.0);
    }

    #[test]
    fn test_json_keys() {
        let table = PayTable::new().with(3, &[0.0, 1.0]);
        let json = serde_json::to_string(&table).unwrap();
        let back: PayTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
