//! Sequential batch simulation against one engine

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::engine::SlotEngine;
use crate::error::EngineResult;
use crate::spin::{SpinRequest, WinTier};
use crate::stats::EngineStatistics;

/// Session id used for simulated spins
pub const SIMULATION_SESSION: &str = "simulation";

/// Batch summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub rtp: f64,
    /// RTP before compensation
    pub raw_rtp: f64,
    pub target_rtp: f64,
    pub hit_rate: f64,
    pub average_cascade_depth: f64,
    pub max_cascade_depth: u32,
    pub max_win_ratio: f64,
    pub bonus_triggers: u64,
    pub wilds_created: u64,
    pub biased_spins: u64,
    pub tier_counts: BTreeMap<WinTier, u64>,
    pub duration_ms: u64,
}

impl SimulationReport {
    pub fn from_statistics(stats: &EngineStatistics, target_rtp: f64, duration_ms: u64) -> Self {
        Self {
            spins: stats.total_spins,
            total_bet: stats.total_bet,
            total_win: stats.total_win,
            rtp: stats.rtp(),
            raw_rtp: stats.raw_rtp(),
            target_rtp,
            hit_rate: stats.hit_rate(),
            average_cascade_depth: stats.average_cascade_depth(),
            max_cascade_depth: stats.max_cascade_depth,
            max_win_ratio: stats.max_win_ratio,
            bonus_triggers: stats.bonus_triggers,
            wilds_created: stats.wilds_created,
            biased_spins: stats.biased_spins,
            tier_counts: stats.tier_counts.clone(),
            duration_ms,
        }
    }

    /// Distance from target
    pub fn rtp_error(&self) -> f64 {
        self.rtp - self.target_rtp
    }
}

/// Issue `spins` spins at a fixed bet, one after another
pub fn simulate(engine: &SlotEngine, spins: u64, bet: f64) -> EngineResult<SimulationReport> {
    simulate_collect(engine, spins, bet).map(|(report, _)| report)
}

/// As [`simulate`], also returning the raw counters for merging
pub fn simulate_collect(
    engine: &SlotEngine,
    spins: u64,
    bet: f64,
) -> EngineResult<(SimulationReport, EngineStatistics)> {
    let start = Instant::now();
    let mut stats = EngineStatistics::default();

    for _ in 0..spins {
        let result = engine.spin(SpinRequest::new(SIMULATION_SESSION, bet))?;
        stats.record(&result);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    let target = engine.controller_snapshot().target_rtp;
    let report = SimulationReport::from_statistics(&stats, target, duration_ms);

    log::info!(
        "[Simulation] {} spins: RTP {:.4} (target {:.4}, raw {:.4}), hit rate {:.3}, {} ms",
        report.spins,
        report.rtp,
        report.target_rtp,
        report.raw_rtp,
        report.hit_rate,
        report.duration_ms
    );

    Ok((report, stats))
}
