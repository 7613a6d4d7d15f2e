//! Aggregate and per-session counters
//!
//! Counters only move through [`EngineStatistics::record`] and
//! [`SessionStats::record`]; callers receive copies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::spin::{SpinResult, WinTier};

/// Engine-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStatistics {
    pub total_spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    /// Paid before compensation
    pub total_raw_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub cascade_steps: u64,
    pub max_cascade_depth: u32,
    pub wilds_created: u64,
    pub golden_symbols: u64,
    pub bonus_triggers: u64,
    /// Spins whose draw was leaned toward a win
    pub biased_spins: u64,
    pub forced_spins: u64,
    pub capped_wins: u64,
    pub max_win_ratio: f64,
    pub tier_counts: BTreeMap<WinTier, u64>,
}

impl EngineStatistics {
    pub fn record(&mut self, result: &SpinResult) {
        self.total_spins += 1;
        self.total_bet += result.bet;
        self.total_win += result.total_win;
        self.total_raw_win += result.raw_win;

        if result.is_win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        let depth = result.cascade_depth() as u32;
        self.cascade_steps += depth as u64;
        self.max_cascade_depth = self.max_cascade_depth.max(depth);
        self.wilds_created += result.wilds_created() as u64;
        self.golden_symbols += result.golden_symbols.len() as u64;

        if result.triggers_bonus() {
            self.bonus_triggers += 1;
        }
        if result.biased == Some(true) {
            self.biased_spins += 1;
        }
        if result.forced {
            self.forced_spins += 1;
        }
        if result.capped {
            self.capped_wins += 1;
        }
        if result.win_ratio > self.max_win_ratio {
            self.max_win_ratio = result.win_ratio;
        }
        if let Some(tier) = result.win_tier {
            *self.tier_counts.entry(tier).or_default() += 1;
        }
    }

    /// Realized RTP (paid / wagered)
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            self.total_win / self.total_bet
        } else {
            0.0
        }
    }

    /// RTP the cascades produced before compensation
    pub fn raw_rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            self.total_raw_win / self.total_bet
        } else {
            0.0
        }
    }

    /// Fraction of winning spins
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            self.wins as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }

    pub fn average_cascade_depth(&self) -> f64 {
        if self.total_spins > 0 {
            self.cascade_steps as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }

    /// Fold another set of counters in (parallel batch runs)
    pub fn merge(&mut self, other: &Self) {
        self.total_spins += other.total_spins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.total_raw_win += other.total_raw_win;
        self.wins += other.wins;
        self.losses += other.losses;
        self.cascade_steps += other.cascade_steps;
        self.max_cascade_depth = self.max_cascade_depth.max(other.max_cascade_depth);
        self.wilds_created += other.wilds_created;
        self.golden_symbols += other.golden_symbols;
        self.bonus_triggers += other.bonus_triggers;
        self.biased_spins += other.biased_spins;
        self.forced_spins += other.forced_spins;
        self.capped_wins += other.capped_wins;
        self.max_win_ratio = self.max_win_ratio.max(other.max_win_ratio);
        for (tier, count) in &other.tier_counts {
            *self.tier_counts.entry(*tier).or_default() += count;
        }
    }
}

/// Counters for one session id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub bonus_triggers: u64,
    pub first_spin_at: DateTime<Utc>,
    pub last_spin_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new(session_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            spins: 0,
            total_bet: 0.0,
            total_win: 0.0,
            wins: 0,
            bonus_triggers: 0,
            first_spin_at: at,
            last_spin_at: at,
        }
    }

    pub fn record(&mut self, result: &SpinResult) {
        self.spins += 1;
        self.total_bet += result.bet;
        self.total_win += result.total_win;
        if result.is_win {
            self.wins += 1;
        }
        if result.triggers_bonus() {
            self.bonus_triggers += 1;
        }
        self.last_spin_at = result.timestamp;
    }

    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            self.total_win / self.total_bet
        } else {
            0.0
        }
    }
}
