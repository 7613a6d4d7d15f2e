//! Cascade engine configuration
//!
//! All configuration is immutable for the lifetime of an engine; changes go
//! through an explicit reconfiguration call that re-runs [`EngineConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::paytable::PayTable;
use crate::symbols::{SymbolId, WeightTable};

/// Reel count bounds
pub const MIN_REELS: u8 = 3;
pub const MAX_REELS: u8 = 10;
/// Row count bounds
pub const MIN_ROWS: u8 = 2;
pub const MAX_ROWS: u8 = 10;
/// Accepted target RTP range
pub const MIN_TARGET_RTP: f64 = 0.80;
pub const MAX_TARGET_RTP: f64 = 0.99;
/// Default controller band around the target
pub const RTP_BAND_LOW: f64 = 0.85;
pub const RTP_BAND_HIGH: f64 = 1.15;

/// Core math: grid size, symbol weights, pays and RTP target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Number of reels (columns)
    pub reels: u8,
    /// Rows per reel
    pub rows: u8,
    /// Symbol ids are `0..symbol_count`
    pub symbol_count: u32,
    /// One weight table per reel
    pub weight_tables: Vec<WeightTable>,
    /// Pay table keyed by symbol id
    pub pay_table: PayTable,
    /// Target RTP (0.96 = 96%)
    pub target_rtp: f64,
    /// Lower edge of the controller band
    pub min_rtp: f64,
    /// Upper edge of the controller band
    pub max_rtp: f64,
    /// Bonus/scatter ids, excluded from ordinary matching
    #[serde(default)]
    pub bonus_symbols: Vec<SymbolId>,
    /// Bonus symbols needed on the final grid to trigger
    #[serde(default = "default_bonus_trigger_count")]
    pub bonus_trigger_count: u8,
    /// Free spins awarded by a bonus trigger
    #[serde(default)]
    pub bonus_free_spins: u32,
    /// Per-spin win cap (bet multiplier)
    #[serde(default = "default_max_win_ratio")]
    pub max_win_ratio: f64,
}

fn default_bonus_trigger_count() -> u8 {
    3
}

fn default_max_win_ratio() -> f64 {
    5000.0
}

impl AlgorithmConfig {
    /// Reference 5×4 game: seven paying symbols plus one bonus symbol (id 7)
    pub fn reference() -> Self {
        let weights = WeightTable(vec![30, 28, 24, 20, 16, 12, 8, 3]);
        Self {
            reels: 5,
            rows: 4,
            symbol_count: 8,
            weight_tables: vec![weights; 5],
            pay_table: PayTable::reference(),
            target_rtp: 0.96,
            min_rtp: 0.96 * RTP_BAND_LOW,
            max_rtp: 0.96 * RTP_BAND_HIGH,
            bonus_symbols: vec![7],
            bonus_trigger_count: 3,
            bonus_free_spins: 10,
            max_win_ratio: default_max_win_ratio(),
        }
    }

    /// Set the target and derive the default band around it
    pub fn with_target(mut self, target_rtp: f64) -> Self {
        self.target_rtp = target_rtp;
        self.min_rtp = target_rtp * RTP_BAND_LOW;
        self.max_rtp = target_rtp * RTP_BAND_HIGH;
        self
    }

    pub fn is_bonus(&self, id: SymbolId) -> bool {
        self.bonus_symbols.contains(&id)
    }

    /// Ids that take part in ordinary matching
    pub fn paying_symbols(&self) -> Vec<SymbolId> {
        (0..self.symbol_count).filter(|&id| !self.is_bonus(id)).collect()
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(MIN_REELS..=MAX_REELS).contains(&self.reels) {
            return Err(invalid(format!(
                "reel count {} outside {}..={}",
                self.reels, MIN_REELS, MAX_REELS
            )));
        }
        if !(MIN_ROWS..=MAX_ROWS).contains(&self.rows) {
            return Err(invalid(format!(
                "row count {} outside {}..={}",
                self.rows, MIN_ROWS, MAX_ROWS
            )));
        }
        if self.symbol_count == 0 {
            return Err(invalid("symbol count must be positive"));
        }
        if self.weight_tables.len() != self.reels as usize {
            return Err(invalid(format!(
                "{} weight tables for {} reels",
                self.weight_tables.len(),
                self.reels
            )));
        }
        if let Some((reel, table)) = self
            .weight_tables
            .iter()
            .enumerate()
            .find(|(_, t)| t.len() != self.symbol_count as usize)
        {
            return Err(invalid(format!(
                "weight table for reel {} has {} entries, expected {}",
                reel,
                table.len(),
                self.symbol_count
            )));
        }
        if self.pay_table.is_empty() {
            return Err(invalid("pay table is empty"));
        }
        if self
            .pay_table
            .pays
            .values()
            .flatten()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(invalid("pay table values must be finite and non-negative"));
        }
        validate_target(self.target_rtp)?;
        if !(self.min_rtp > 0.0 && self.min_rtp <= self.target_rtp && self.target_rtp <= self.max_rtp)
        {
            return Err(invalid(format!(
                "RTP band {}..{} does not contain target {}",
                self.min_rtp, self.max_rtp, self.target_rtp
            )));
        }
        if let Some(id) = self.bonus_symbols.iter().find(|&&id| id >= self.symbol_count) {
            return Err(invalid(format!("bonus symbol {} is not a configured symbol", id)));
        }
        if self.bonus_trigger_count == 0 {
            return Err(invalid("bonus trigger count must be positive"));
        }
        if !(self.max_win_ratio.is_finite() && self.max_win_ratio > 0.0) {
            return Err(invalid("max win ratio must be positive"));
        }
        Ok(())
    }
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Check a target RTP against the accepted range
pub fn validate_target(target_rtp: f64) -> EngineResult<()> {
    if !(MIN_TARGET_RTP..=MAX_TARGET_RTP).contains(&target_rtp) {
        return Err(invalid(format!(
            "target RTP {} outside [{}, {}]",
            target_rtp, MIN_TARGET_RTP, MAX_TARGET_RTP
        )));
    }
    Ok(())
}

/// Which match engine drives the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinMechanism {
    /// Leftmost-anchored ways (1024 ways on 5×4)
    #[default]
    Ways,
    /// Connected clusters of one symbol
    ClusterPays,
}

/// Neighbourhood used by cluster matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjacency {
    /// Up, down, left, right
    #[default]
    Orthogonal,
    /// Orthogonal plus the four diagonals
    Diagonal,
}

/// Cascade loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Grid width (must equal the reel count)
    pub width: u8,
    /// Grid height (must equal the row count)
    pub height: u8,
    /// Minimum cluster size
    pub min_match: u8,
    /// Maximum cascade steps per spin
    pub max_cascades: u32,
    /// Multiplier per step, step 1 first. Steps outside the table pay ×1.
    pub multipliers: Vec<f64>,
    #[serde(default)]
    pub adjacency: Adjacency,
    #[serde(default)]
    pub win_mechanism: WinMechanism,
}

impl CascadeConfig {
    /// Multiplier for a 1-based step index
    pub fn multiplier_for_step(&self, step: u32) -> f64 {
        if step == 0 {
            return 1.0;
        }
        self.multipliers
            .get(step as usize - 1)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn validate(&self, algorithm: &AlgorithmConfig) -> EngineResult<()> {
        if self.width != algorithm.reels || self.height != algorithm.rows {
            return Err(invalid(format!(
                "cascade grid {}x{} does not match {} reels x {} rows",
                self.width, self.height, algorithm.reels, algorithm.rows
            )));
        }
        if self.min_match < 2 {
            return Err(invalid("minimum match size must be at least 2"));
        }
        if self.max_cascades == 0 {
            return Err(invalid("max cascades must be positive"));
        }
        if self.multipliers.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            return Err(invalid("cascade multipliers must be positive"));
        }
        Ok(())
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 4,
            min_match: 3,
            max_cascades: 8,
            multipliers: vec![1.0, 2.0, 3.0, 5.0],
            adjacency: Adjacency::Orthogonal,
            win_mechanism: WinMechanism::Ways,
        }
    }
}

/// Golden symbol and wild settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenWildConfig {
    /// Chance an eligible symbol in the initial grid is golden
    pub golden_probability: f64,
    /// Base symbols that can be golden
    pub eligible_symbols: Vec<SymbolId>,
    /// External id shared by wild and empty cells
    pub wild_symbol: SymbolId,
}

impl GoldenWildConfig {
    pub fn is_eligible(&self, id: SymbolId) -> bool {
        self.eligible_symbols.contains(&id)
    }

    pub fn validate(&self, algorithm: &AlgorithmConfig) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.golden_probability) {
            return Err(invalid(format!(
                "golden probability {} outside [0, 1]",
                self.golden_probability
            )));
        }
        if self.wild_symbol < algorithm.symbol_count {
            return Err(invalid(format!(
                "wild sentinel {} collides with a configured symbol",
                self.wild_symbol
            )));
        }
        if let Some(id) = self
            .eligible_symbols
            .iter()
            .find(|&&id| id >= algorithm.symbol_count || algorithm.is_bonus(id))
        {
            return Err(invalid(format!("symbol {} cannot be golden", id)));
        }
        Ok(())
    }
}

impl Default for GoldenWildConfig {
    fn default() -> Self {
        Self {
            golden_probability: 0.12,
            eligible_symbols: vec![3, 4, 5, 6],
            wild_symbol: 99,
        }
    }
}

/// RTP controller variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// Rolling-window controller that leans draws and scales wins
    #[default]
    Dynamic,
    /// Plain odds, no steering and no live retargeting
    Fixed,
}

/// RTP controller tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub kind: ControllerKind,
    /// Short window length (seconds)
    pub short_window_secs: i64,
    /// Short window sample cap
    pub short_capacity: usize,
    /// Long window length (seconds)
    pub long_window_secs: i64,
    /// Long window sample cap
    pub long_capacity: usize,
    /// Share of the short window in the weighted RTP
    pub short_weight: f64,
    /// How strongly the bias probability reacts to RTP deviation
    pub compensation_factor: f64,
    /// Symmetric random jitter on the bias probability
    pub bias_jitter: f64,
    /// Bets at or above this get the penalty
    pub large_bet_threshold: f64,
    /// Bias probability penalty for large bets
    pub large_bet_penalty: f64,
    /// Initial grids drawn when leaning a spin
    pub lean_attempts: u8,
    /// Std-dev of per-spin RTP below which adjustments widen
    pub low_volatility: f64,
    /// Std-dev of per-spin RTP above which adjustments narrow
    pub high_volatility: f64,
    /// Trim per average bet of lifetime balance owed against the target.
    /// Zero disables the trim.
    pub integral_gain: f64,
}

impl ControllerConfig {
    pub fn fixed() -> Self {
        Self {
            kind: ControllerKind::Fixed,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.short_window_secs <= 0 || self.long_window_secs <= 0 {
            return Err(invalid("RTP windows must be positive"));
        }
        if self.short_capacity == 0 || self.long_capacity == 0 {
            return Err(invalid("RTP window capacities must be positive"));
        }
        if !(0.0..=1.0).contains(&self.short_weight) {
            return Err(invalid("short window weight outside [0, 1]"));
        }
        if self.lean_attempts == 0 {
            return Err(invalid("lean attempts must be at least 1"));
        }
        if self.low_volatility > self.high_volatility {
            return Err(invalid("volatility thresholds are inverted"));
        }
        if !(self.integral_gain.is_finite() && self.integral_gain >= 0.0) {
            return Err(invalid("integral gain must be finite and non-negative"));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kind: ControllerKind::Dynamic,
            short_window_secs: 15 * 60,
            short_capacity: 100,
            long_window_secs: 24 * 60 * 60,
            long_capacity: 1000,
            short_weight: 0.3,
            compensation_factor: 0.5,
            bias_jitter: 0.02,
            large_bet_threshold: 50.0,
            large_bet_penalty: 0.03,
            lean_attempts: 2,
            low_volatility: 0.5,
            high_volatility: 2.0,
            integral_gain: 0.003,
        }
    }
}

/// Accepted bet range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min_bet: f64,
    pub max_bet: f64,
}

impl BetLimits {
    /// Check a bet; runs before any randomness is drawn
    pub fn check(&self, bet: f64) -> EngineResult<()> {
        if !bet.is_finite() || bet <= 0.0 {
            return Err(EngineError::InvalidBet(bet));
        }
        if bet < self.min_bet {
            return Err(EngineError::BetTooLow {
                bet,
                min: self.min_bet,
            });
        }
        if bet > self.max_bet {
            return Err(EngineError::BetTooHigh {
                bet,
                max: self.max_bet,
            });
        }
        Ok(())
    }
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            min_bet: 0.10,
            max_bet: 100.0,
        }
    }
}

/// Thresholds for categorizing wins (bet multipliers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinTierThresholds {
    pub big_win: f64,
    pub mega_win: f64,
    pub epic_win: f64,
    pub ultra_win: f64,
}

impl Default for WinTierThresholds {
    fn default() -> Self {
        Self {
            big_win: 15.0,
            mega_win: 25.0,
            epic_win: 50.0,
            ultra_win: 100.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Game name
    #[serde(default = "default_name")]
    pub name: String,
    pub algorithm: AlgorithmConfig,
    #[serde(default)]
    pub cascade: CascadeConfig,
    #[serde(default)]
    pub golden: GoldenWildConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub bets: BetLimits,
    #[serde(default)]
    pub win_tiers: WinTierThresholds,
}

fn default_name() -> String {
    "Cascade Slot".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            algorithm: AlgorithmConfig::reference(),
            cascade: CascadeConfig::default(),
            golden: GoldenWildConfig::default(),
            controller: ControllerConfig::default(),
            bets: BetLimits::default(),
            win_tiers: WinTierThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Reference game with cluster pays instead of ways: same grid and
    /// weights, a pay table keyed by cluster size, clusters of 4 or more
    pub fn cluster_pays() -> Self {
        let mut config = Self::default();
        config.name = "Cascade Cluster".into();
        config.algorithm.pay_table = PayTable::cluster_reference();
        config.cascade.win_mechanism = WinMechanism::ClusterPays;
        config.cascade.min_match = 4;
        config
    }

    /// Run every configuration check
    pub fn validate(&self) -> EngineResult<()> {
        self.algorithm.validate()?;
        self.cascade.validate(&self.algorithm)?;
        self.golden.validate(&self.algorithm)?;
        self.controller.validate()?;
        if !(self.bets.min_bet.is_finite()
            && self.bets.max_bet.is_finite()
            && self.bets.min_bet > 0.0
            && self.bets.min_bet <= self.bets.max_bet)
        {
            return Err(invalid(format!(
                "bet limits {}..{} are invalid",
                self.bets.min_bet, self.bets.max_bet
            )));
        }
        Ok(())
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| invalid(e.to_string()))
    }

    /// Parse and validate JSON
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| invalid(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(msg: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig(msg.into())
}
