//! Symbol grid
//!
//! Cells are stored reel-major (`cells[reel][row]`) like the rest of the
//! slot code, with row 0 at the top. Wild and empty cells are distinct
//! variants here even though they share one sentinel id once exported.

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub reel: u8,
    pub row: u8,
}

impl Position {
    pub const fn new(reel: u8, row: u8) -> Self {
        Self { reel, row }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.reel, self.row)
    }
}

/// Index into a spin's golden symbol report
pub type GoldenTag = u16;

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    /// Ordinary (or bonus) symbol, optionally golden
    Symbol {
        id: SymbolId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        golden: Option<GoldenTag>,
    },
    /// Wild, matches any ordinary symbol
    Wild,
    /// Cleared during a cascade step, waiting for gravity refill
    Empty,
}

impl Cell {
    pub const fn symbol(id: SymbolId) -> Self {
        Self::Symbol { id, golden: None }
    }

    pub fn symbol_id(&self) -> Option<SymbolId> {
        match self {
            Self::Symbol { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, Self::Wild)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn golden_tag(&self) -> Option<GoldenTag> {
        match self {
            Self::Symbol { golden, .. } => *golden,
            _ => None,
        }
    }

    /// External id: wild and empty both export as the sentinel
    pub fn to_id(&self, sentinel: SymbolId) -> SymbolId {
        match self {
            Self::Symbol { id, .. } => *id,
            Self::Wild | Self::Empty => sentinel,
        }
    }
}

/// Fixed-size rectangular grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    reels: u8,
    rows: u8,
    cells: Vec<Vec<Cell>>,
    /// Next golden tag to hand out
    #[serde(default)]
    next_golden: GoldenTag,
}

impl Grid {
    /// Create a grid filled with empty cells
    pub fn empty(reels: u8, rows: u8) -> Self {
        Self {
            reels,
            rows,
            cells: vec![vec![Cell::Empty; rows as usize]; reels as usize],
            next_golden: 0,
        }
    }

    /// Build from external ids (`ids[reel][row]`); the sentinel becomes a wild
    pub fn from_ids(ids: &[Vec<SymbolId>], wild_sentinel: SymbolId) -> Option<Self> {
        let reels = u8::try_from(ids.len()).ok()?;
        let rows = u8::try_from(ids.first()?.len()).ok()?;
        if rows == 0 || ids.iter().any(|col| col.len() != rows as usize) {
            return None;
        }

        let cells = ids
            .iter()
            .map(|col| {
                col.iter()
                    .map(|&id| {
                        if id == wild_sentinel {
                            Cell::Wild
                        } else {
                            Cell::symbol(id)
                        }
                    })
                    .collect()
            })
            .collect();

        Some(Self {
            reels,
            rows,
            cells,
            next_golden: 0,
        })
    }

    pub fn reels(&self) -> u8 {
        self.reels
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.reel < self.reels && pos.row < self.rows
    }

    /// Cell at position (empty when out of bounds)
    pub fn get(&self, pos: Position) -> Cell {
        self.cells
            .get(pos.reel as usize)
            .and_then(|col| col.get(pos.row as usize))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    pub fn set(&mut self, pos: Position, cell: Cell) {
        if let Some(slot) = self
            .cells
            .get_mut(pos.reel as usize)
            .and_then(|col| col.get_mut(pos.row as usize))
        {
            *slot = cell;
        }
    }

    /// Mark an ordinary symbol as golden, returning its tag
    pub fn gild(&mut self, pos: Position) -> Option<GoldenTag> {
        let tag = self.next_golden;
        match self.cells.get_mut(pos.reel as usize)?.get_mut(pos.row as usize)? {
            Cell::Symbol { golden, .. } if golden.is_none() => {
                *golden = Some(tag);
                self.next_golden += 1;
                Some(tag)
            }
            _ => None,
        }
    }

    /// Column cells, top to bottom
    pub fn column(&self, reel: u8) -> &[Cell] {
        self.cells
            .get(reel as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn column_mut(&mut self, reel: u8) -> Option<&mut Vec<Cell>> {
        self.cells.get_mut(reel as usize)
    }

    /// All positions in row-major order (row by row, left to right)
    pub fn positions_row_major(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.reels).map(move |reel| Position::new(reel, row)))
    }

    /// Positions holding wilds
    pub fn wild_positions(&self) -> Vec<Position> {
        self.iter().filter(|(_, c)| c.is_wild()).map(|(p, _)| p).collect()
    }

    /// Number of empty cells
    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_empty()).count()
    }

    /// Iterate `(position, cell)` reel by reel
    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(reel, col)| {
            col.iter()
                .enumerate()
                .map(move |(row, &cell)| (Position::new(reel as u8, row as u8), cell))
        })
    }

    /// Export as ids (`[reel][row]`), wild and empty as the sentinel
    pub fn to_ids(&self, sentinel: SymbolId) -> Vec<Vec<SymbolId>> {
        self.cells
            .iter()
            .map(|col| col.iter().map(|c| c.to_id(sentinel)).collect())
            .collect()
    }
}
