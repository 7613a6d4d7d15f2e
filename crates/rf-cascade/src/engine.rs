//! Cascade slot engine facade
//!
//! Wires the generator, matcher, cascade loop and RTP controller together per
//! spin. Configuration sits behind a read/write lock; the controller and all
//! counters sit behind one mutex that a spin holds from plan to record, so
//! concurrent callers never interleave their effect on the RTP history.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::cascade::{CascadeOutcome, CascadeRunner};
use crate::config::{AlgorithmConfig, EngineConfig, validate_target};
use crate::error::{EngineError, EngineResult};
use crate::grid::{Cell, Grid};
use crate::matching::{MatchEngine, find_bonus};
use crate::rng::{ChaChaSource, RandomSource};
use crate::rtp::{ControllerSnapshot, RtpController, SpinPlan};
use crate::spin::{ForcedGrid, SpinRequest, SpinResult, WinTier};
use crate::stats::{EngineStatistics, SessionStats};
use crate::symbols::SymbolGenerator;

/// Validated configuration and the strategies built from it
struct Rules {
    config: EngineConfig,
    matcher: MatchEngine,
}

impl Rules {
    fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let matcher = MatchEngine::from_config(&config.algorithm, &config.cascade);
        Ok(Self { config, matcher })
    }
}

/// Everything that persists across spins
struct EngineState {
    controller: RtpController,
    stats: EngineStatistics,
    sessions: HashMap<String, SessionStats>,
    spin_counter: u64,
}

/// Cascade slot engine
pub struct SlotEngine {
    rng: Arc<dyn RandomSource>,
    rules: RwLock<Rules>,
    state: Mutex<EngineState>,
}

impl SlotEngine {
    /// Create an engine; the configuration is validated here
    pub fn new(config: EngineConfig, rng: Arc<dyn RandomSource>) -> EngineResult<Self> {
        let rules = Rules::new(config)?;
        let controller = RtpController::from_config(&rules.config.algorithm, &rules.config.controller);

        log::info!(
            "[SlotEngine] '{}' {}x{} {:?} target RTP {:.4} ({:?} controller)",
            rules.config.name,
            rules.config.algorithm.reels,
            rules.config.algorithm.rows,
            rules.matcher.mechanism(),
            rules.config.algorithm.target_rtp,
            controller.kind()
        );

        Ok(Self {
            rng,
            rules: RwLock::new(rules),
            state: Mutex::new(EngineState {
                controller,
                stats: EngineStatistics::default(),
                sessions: HashMap::new(),
                spin_counter: 0,
            }),
        })
    }

    /// Engine with a deterministic ChaCha source
    pub fn seeded(config: EngineConfig, seed: u64) -> EngineResult<Self> {
        Self::new(config, Arc::new(ChaChaSource::seeded(seed)))
    }

    /// Engine with an OS-seeded ChaCha source
    pub fn from_entropy(config: EngineConfig) -> EngineResult<Self> {
        Self::new(config, Arc::new(ChaChaSource::from_entropy()))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN
    // ═══════════════════════════════════════════════════════════════════════════

    /// Play one spin. The bet is checked before anything random happens.
    pub fn spin(&self, request: SpinRequest) -> EngineResult<SpinResult> {
        let rules = self.rules.read();
        rules.config.bets.check(request.bet)?;

        let mut state = self.state.lock();
        let rng = self.rng.as_ref();
        let plan = state.controller.plan(request.bet, rng);

        let config = &rules.config;
        let generator = SymbolGenerator::new(&config.algorithm.weight_tables, &config.golden);
        let initial = self.draw_initial(&rules, &generator, &plan);

        let outcome = CascadeRunner::new(&rules.matcher, &config.cascade, generator, rng)
            .run(initial.clone(), request.bet);

        Ok(self.settle(&rules, &mut state, request, &initial, outcome, &plan, false))
    }

    /// Play from a caller-supplied grid. No lean is applied; compensation is.
    pub fn spin_forced(&self, request: SpinRequest, forced: &ForcedGrid) -> EngineResult<SpinResult> {
        let rules = self.rules.read();
        rules.config.bets.check(request.bet)?;
        let initial = build_forced_grid(&rules.config, forced)?;

        let mut state = self.state.lock();
        let rng = self.rng.as_ref();
        let plan = SpinPlan {
            bias: None,
            lean_attempts: 1,
            multiplier: state.controller.multiplier(),
            weighted_rtp: state.controller.snapshot().weighted_rtp,
        };

        let config = &rules.config;
        let generator = SymbolGenerator::new(&config.algorithm.weight_tables, &config.golden);
        let outcome = CascadeRunner::new(&rules.matcher, &config.cascade, generator, rng)
            .run(initial.clone(), request.bet);

        Ok(self.settle(&rules, &mut state, request, &initial, outcome, &plan, true))
    }

    /// Draw the initial grid, redrawing while its match status disagrees with
    /// the lean decision
    fn draw_initial(&self, rules: &Rules, generator: &SymbolGenerator<'_>, plan: &SpinPlan) -> Grid {
        let algorithm = &rules.config.algorithm;
        let rng = self.rng.as_ref();
        let mut grid = generator.generate_grid(algorithm.reels, algorithm.rows, rng);

        if let Some(bias) = plan.bias {
            for _ in 1..plan.lean_attempts {
                if rules.matcher.has_match(&grid) == bias {
                    break;
                }
                grid = generator.generate_grid(algorithm.reels, algorithm.rows, rng);
            }
        }

        grid
    }

    /// Apply compensation and cap, record the outcome, build the result
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        rules: &Rules,
        state: &mut EngineState,
        request: SpinRequest,
        initial: &Grid,
        outcome: CascadeOutcome,
        plan: &SpinPlan,
        forced: bool,
    ) -> SpinResult {
        let config = &rules.config;
        let bet = request.bet;
        let wild = config.golden.wild_symbol;

        let compensated = outcome.raw_win * plan.multiplier;
        let cap = config.algorithm.max_win_ratio * bet;
        let capped = compensated > cap;
        let total_win = compensated.min(cap);

        state.controller.record_outcome(bet, total_win);
        state.spin_counter += 1;

        let win_ratio = total_win / bet;
        let bonus = find_bonus(&outcome.final_grid, &config.algorithm);
        let now = Utc::now();

        let result = SpinResult {
            spin_id: format!("{}-{:08}", request.session_id, state.spin_counter),
            session_id: request.session_id,
            bet,
            total_win,
            raw_win: outcome.raw_win,
            compensation: plan.multiplier,
            win_ratio,
            is_win: total_win > 0.0,
            capped,
            win_tier: WinTier::classify(win_ratio, &config.win_tiers),
            initial_grid: initial.to_ids(wild),
            final_ids: outcome.final_grid.to_ids(wild),
            wild_positions: outcome.tracker.positions(),
            cascades: outcome.steps,
            final_grid: outcome.final_grid,
            golden_symbols: outcome.golden,
            wild_transitions: outcome.transitions,
            bonus,
            biased: plan.bias,
            forced,
            metadata: request.metadata,
            timestamp: now,
        };

        state.stats.record(&result);
        state
            .sessions
            .entry(result.session_id.clone())
            .or_insert_with(|| SessionStats::new(result.session_id.clone(), now))
            .record(&result);

        log::debug!(
            "[SlotEngine] {} bet={:.2} raw={:.2} x{:.3} win={:.2} cascades={} bias={:?}",
            result.spin_id,
            bet,
            result.raw_win,
            plan.multiplier,
            total_win,
            result.cascade_depth(),
            plan.bias
        );

        result
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replace the algorithm config. RTP histories are kept and the
    /// controller follows the new target.
    pub fn configure_algorithm(&self, algorithm: AlgorithmConfig) -> EngineResult<()> {
        let mut rules = self.rules.write();
        let mut config = rules.config.clone();
        config.algorithm = algorithm;
        let next = Rules::new(config)?;

        let mut state = self.state.lock();
        state
            .controller
            .follow(&next.config.algorithm, &next.config.controller);
        *rules = next;

        log::info!(
            "[SlotEngine] Algorithm reconfigured: {}x{} target RTP {:.4}",
            rules.config.algorithm.reels,
            rules.config.algorithm.rows,
            rules.config.algorithm.target_rtp
        );
        Ok(())
    }

    /// Replace the whole configuration; the controller starts fresh
    pub fn reconfigure(&self, config: EngineConfig) -> EngineResult<()> {
        let mut rules = self.rules.write();
        let next = Rules::new(config)?;

        let mut state = self.state.lock();
        state.controller = RtpController::from_config(&next.config.algorithm, &next.config.controller);
        *rules = next;

        log::info!(
            "[SlotEngine] Reconfigured '{}' ({:?} controller)",
            rules.config.name,
            state.controller.kind()
        );
        Ok(())
    }

    /// Retarget the controller. Fixed-odds controllers refuse.
    pub fn set_target_rtp(&self, target_rtp: f64) -> EngineResult<()> {
        validate_target(target_rtp)?;
        let mut rules = self.rules.write();
        let mut state = self.state.lock();
        state.controller.set_target(target_rtp)?;

        let snapshot = state.controller.snapshot();
        let algorithm = &mut rules.config.algorithm;
        algorithm.target_rtp = snapshot.target_rtp;
        algorithm.min_rtp = snapshot.min_rtp;
        algorithm.max_rtp = snapshot.max_rtp;

        log::info!("[SlotEngine] Target RTP set to {:.4}", target_rtp);
        Ok(())
    }

    pub fn config(&self) -> EngineConfig {
        self.rules.read().config.clone()
    }

    /// Export the configuration as JSON
    pub fn export_config(&self) -> EngineResult<String> {
        self.rules.read().config.to_json()
    }

    /// Import a JSON configuration (same as [`Self::reconfigure`])
    pub fn import_config(&self, json: &str) -> EngineResult<()> {
        self.reconfigure(EngineConfig::from_json(json)?)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATISTICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn statistics(&self) -> EngineStatistics {
        self.state.lock().stats.clone()
    }

    pub fn session_statistics(&self, session_id: &str) -> EngineResult<SessionStats> {
        self.state
            .lock()
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))
    }

    /// Clear counters and sessions; RTP histories are kept
    pub fn reset_statistics(&self) {
        let mut state = self.state.lock();
        state.stats = EngineStatistics::default();
        state.sessions.clear();
    }

    /// Drop the controller's RTP histories
    pub fn reset_controller(&self) {
        self.state.lock().controller.reset();
    }

    pub fn controller_snapshot(&self) -> ControllerSnapshot {
        self.state.lock().controller.snapshot()
    }
}

impl std::fmt::Debug for SlotEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotEngine")
            .field("name", &self.rules.read().config.name)
            .finish_non_exhaustive()
    }
}

/// Turn a forced grid into a validated [`Grid`]
fn build_forced_grid(config: &EngineConfig, forced: &ForcedGrid) -> EngineResult<Grid> {
    let algorithm = &config.algorithm;
    let wild = config.golden.wild_symbol;

    let mut grid = Grid::from_ids(&forced.ids, wild)
        .ok_or_else(|| EngineError::InvalidGrid("grid must be rectangular and non-empty".into()))?;

    if grid.reels() != algorithm.reels || grid.rows() != algorithm.rows {
        return Err(EngineError::InvalidGrid(format!(
            "grid is {}x{}, expected {}x{}",
            grid.reels(),
            grid.rows(),
            algorithm.reels,
            algorithm.rows
        )));
    }

    if let Some((pos, id)) = grid
        .iter()
        .filter_map(|(pos, cell)| cell.symbol_id().map(|id| (pos, id)))
        .find(|&(_, id)| id >= algorithm.symbol_count)
    {
        return Err(EngineError::InvalidGrid(format!("unknown symbol {} at {}", id, pos)));
    }

    for &pos in &forced.golden {
        match grid.get(pos) {
            Cell::Symbol { id, .. } if !algorithm.is_bonus(id) => {
                grid.gild(pos);
            }
            _ => {
                return Err(EngineError::InvalidGrid(format!(
                    "{} cannot hold a golden symbol",
                    pos
                )));
            }
        }
    }

    Ok(grid)
}
