//! Cascade loop: match → pay → remove/convert → gravity → refill → repeat

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::CascadeConfig;
use crate::grid::{Cell, Grid, Position};
use crate::matching::{MatchEngine, MatchGroup};
use crate::rng::RandomSource;
use crate::symbols::SymbolGenerator;
use crate::wild::{GoldenSymbolInfo, WildTracker, WildTransition};

/// One completed cascade step, kept for audit and replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// 1-based step index
    pub index: u32,
    pub groups: Vec<MatchGroup>,
    /// Step win in currency: Σ payouts × multiplier × bet
    pub win: f64,
    pub multiplier: f64,
    pub before_removal: Grid,
    /// Cleared cells are empty, converted golden cells are wild
    pub after_removal: Grid,
    pub after_refill: Grid,
    /// Wilds converted during this step
    pub wilds_created: Vec<Position>,
}

/// Everything the loop produced for one spin
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub steps: Vec<CascadeStep>,
    /// Sum of step wins before any compensation
    pub raw_win: f64,
    pub final_grid: Grid,
    pub golden: Vec<GoldenSymbolInfo>,
    pub transitions: Vec<WildTransition>,
    pub tracker: WildTracker,
}

impl CascadeOutcome {
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn wilds_created(&self) -> usize {
        self.transitions.iter().filter(|t| t.to_wild).count()
    }
}

/// Drives the cascade for one spin
pub struct CascadeRunner<'a> {
    matcher: &'a MatchEngine,
    config: &'a CascadeConfig,
    generator: SymbolGenerator<'a>,
    rng: &'a dyn RandomSource,
}

impl<'a> CascadeRunner<'a> {
    pub fn new(
        matcher: &'a MatchEngine,
        config: &'a CascadeConfig,
        generator: SymbolGenerator<'a>,
        rng: &'a dyn RandomSource,
    ) -> Self {
        Self {
            matcher,
            config,
            generator,
            rng,
        }
    }

    /// Run until a step finds nothing or the step cap is reached
    pub fn run(&self, initial: Grid, bet: f64) -> CascadeOutcome {
        let mut grid = initial;
        let mut golden = GoldenSymbolInfo::collect(&grid);
        let mut tracker = WildTracker::from_grid(&grid);
        let mut transitions = Vec::new();
        let mut steps = Vec::new();
        let mut raw_win = 0.0;

        for index in 1..=self.config.max_cascades {
            let groups = self.matcher.find_matches(&grid);
            if groups.is_empty() {
                break;
            }

            let multiplier = self.config.multiplier_for_step(index);
            let win = groups.iter().map(|g| g.payout).sum::<f64>() * multiplier * bet;
            raw_win += win;

            tracker.begin_step();
            let before_removal = grid.clone();
            remove_matches(
                &mut grid,
                &groups,
                index,
                &mut tracker,
                &mut golden,
                &mut transitions,
            );
            let after_removal = grid.clone();
            let wilds_created = tracker.created_this_step();

            apply_gravity(&mut grid, &mut tracker);
            self.refill(&mut grid);

            log::trace!(
                "[Cascade] step {} groups={} x{} win={:.2} wilds={}",
                index,
                groups.len(),
                multiplier,
                win,
                tracker.len()
            );

            steps.push(CascadeStep {
                index,
                groups,
                win,
                multiplier,
                before_removal,
                after_removal,
                after_refill: grid.clone(),
                wilds_created,
            });
        }

        CascadeOutcome {
            steps,
            raw_win,
            final_grid: grid,
            golden,
            transitions,
            tracker,
        }
    }

    /// Draw plain symbols into every empty cell, top to bottom per reel
    pub fn refill(&self, grid: &mut Grid) {
        for reel in 0..grid.reels() {
            if let Some(column) = grid.column_mut(reel) {
                for cell in column.iter_mut().filter(|c| c.is_empty()) {
                    *cell = self.generator.refill_cell(reel, self.rng);
                }
            }
        }
    }
}

/// Clear matched cells. Golden cells convert to wilds first; only then is any
/// other matched cell, including a matched wild, emptied.
pub fn remove_matches(
    grid: &mut Grid,
    groups: &[MatchGroup],
    step: u32,
    tracker: &mut WildTracker,
    golden: &mut [GoldenSymbolInfo],
    transitions: &mut Vec<WildTransition>,
) {
    let marked: BTreeSet<Position> = groups
        .iter()
        .flat_map(|g| g.positions.iter().copied())
        .collect();
    let mut converted = BTreeSet::new();

    for &pos in &marked {
        if let Cell::Symbol {
            id,
            golden: Some(tag),
        } = grid.get(pos)
        {
            let Some(info) = golden.iter_mut().find(|g| g.tag == tag) else {
                continue;
            };
            if !info.mark_wild(step, pos) {
                continue;
            }
            grid.set(pos, Cell::Wild);
            tracker.register(pos, id);
            transitions.push(WildTransition {
                step,
                position: pos,
                symbol: Some(id),
                to_wild: true,
            });
            converted.insert(pos);
        }
    }

    for &pos in marked.difference(&converted) {
        if grid.get(pos).is_wild() {
            let origin = tracker.remove(pos);
            transitions.push(WildTransition {
                step,
                position: pos,
                symbol: origin,
                to_wild: false,
            });
        }
        grid.set(pos, Cell::Empty);
    }
}

/// Compact every column downward, keeping relative order, and rekey moved
/// wilds. Returns the number of cells now waiting for refill.
pub fn apply_gravity(grid: &mut Grid, tracker: &mut WildTracker) -> usize {
    let mut moves = Vec::new();
    let mut vacated = 0;

    for reel in 0..grid.reels() {
        let Some(column) = grid.column_mut(reel) else {
            continue;
        };

        let survivors: Vec<(usize, Cell)> = column
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .collect();
        let gap = column.len() - survivors.len();
        vacated += gap;

        column.iter_mut().take(gap).for_each(|c| *c = Cell::Empty);
        for (offset, (from_row, cell)) in survivors.into_iter().enumerate() {
            let to_row = gap + offset;
            column[to_row] = cell;
            if cell.is_wild() && to_row != from_row {
                moves.push((
                    Position::new(reel, from_row as u8),
                    Position::new(reel, to_row as u8),
                ));
            }
        }
    }

    tracker.relocate(&moves);
    vacated
}
