//! Dynamic RTP controller
//!
//! Keeps a short and a long rolling window of outcomes and steers toward the
//! target two ways: it leans the initial draw toward or away from a win, and
//! it scales computed wins by a compensation multiplier. Neither makes a
//! single spin deterministic.
//!
//! The windowed correction alone settles with a standing offset whenever the
//! leaned raw RTP differs from the target. A lifetime balance (what the game
//! owes players against the target, in average bets) trims the multiplier
//! until that offset drains.

use crate::config::ControllerConfig;
use crate::rng::RandomSource;

use super::history::RtpHistory;

/// Bias probability clamp
pub const MIN_BIAS_PROBABILITY: f64 = 0.1;
pub const MAX_BIAS_PROBABILITY: f64 = 0.9;
/// Compensation multiplier clamp
pub const MIN_COMPENSATION: f64 = 0.5;
pub const MAX_COMPENSATION: f64 = 2.0;

/// Clamp on the lifetime balance trim
pub const MIN_TRIM: f64 = 0.5;
pub const MAX_TRIM: f64 = 2.0;

/// Volatility adjustment when recent outcomes are calm
const CALM_ADJUSTMENT: f64 = 1.2;
/// Volatility adjustment when recent outcomes are noisy
const NOISY_ADJUSTMENT: f64 = 0.8;

/// Piecewise compensation for a realized RTP against the target.
///
/// `d` is the relative deviation `(current - target) / target`:
///
/// | d               | multiplier                         |
/// |-----------------|------------------------------------|
/// | ≤ -0.5          | 2.0                                |
/// | (-0.5, -0.1)    | 1.3 → 2.0 as d falls               |
/// | [-0.1, 0.1]     | 1 - 3d                             |
/// | (0.1, 0.5)      | 0.7 → 0.5 as d rises               |
/// | ≥ 0.5           | 0.5                                |
pub fn compensation_multiplier(current_rtp: f64, target_rtp: f64) -> f64 {
    if target_rtp <= 0.0 {
        return 1.0;
    }
    let d = (current_rtp - target_rtp) / target_rtp;
    let m = if d <= -0.5 {
        2.0
    } else if d < -0.1 {
        1.3 + (-d - 0.1) / 0.4 * 0.7
    } else if d <= 0.1 {
        1.0 - 3.0 * d
    } else if d < 0.5 {
        0.7 - (d - 0.1) / 0.4 * 0.2
    } else {
        0.5
    };
    m.clamp(MIN_COMPENSATION, MAX_COMPENSATION)
}

#[derive(Debug, Clone)]
pub struct DynamicRtpController {
    target_rtp: f64,
    min_rtp: f64,
    max_rtp: f64,
    config: ControllerConfig,
    short: RtpHistory,
    long: RtpHistory,
    /// Σ(target × bet − win) since the last reset
    balance: f64,
    lifetime_bet: f64,
    lifetime_spins: u64,
}

impl DynamicRtpController {
    pub fn new(target_rtp: f64, min_rtp: f64, max_rtp: f64, config: ControllerConfig) -> Self {
        Self {
            target_rtp,
            min_rtp,
            max_rtp,
            short: RtpHistory::new(config.short_window_secs, config.short_capacity),
            long: RtpHistory::new(config.long_window_secs, config.long_capacity),
            config,
            balance: 0.0,
            lifetime_bet: 0.0,
            lifetime_spins: 0,
        }
    }

    pub fn target_rtp(&self) -> f64 {
        self.target_rtp
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_rtp, self.max_rtp)
    }

    pub fn short_window(&self) -> &RtpHistory {
        &self.short
    }

    pub fn long_window(&self) -> &RtpHistory {
        &self.long
    }

    /// Retarget, keeping the band's relative width
    pub fn set_target(&mut self, target_rtp: f64) {
        let low = self.min_rtp / self.target_rtp;
        let high = self.max_rtp / self.target_rtp;
        self.set_band(target_rtp, target_rtp * low, target_rtp * high);
    }

    /// Replace target and band; histories are kept
    pub fn set_band(&mut self, target_rtp: f64, min_rtp: f64, max_rtp: f64) {
        self.target_rtp = target_rtp;
        self.min_rtp = min_rtp;
        self.max_rtp = max_rtp;
    }

    /// Append to both windows and settle against the lifetime balance
    pub fn record_outcome(&mut self, bet: f64, win: f64) {
        self.short.record(bet, win);
        self.long.record(bet, win);
        self.balance += self.target_rtp * bet - win;
        self.lifetime_bet += bet;
        self.lifetime_spins += 1;

        let rtp = self.weighted_rtp();
        if rtp < self.min_rtp || rtp > self.max_rtp {
            log::warn!(
                "[RTP] weighted {:.4} outside band [{:.4}, {:.4}] (target {:.4})",
                rtp,
                self.min_rtp,
                self.max_rtp,
                self.target_rtp
            );
        }
    }

    /// Short/long blend. A missing window defers to the other, both missing
    /// reads as on target.
    pub fn weighted_rtp(&self) -> f64 {
        match (self.short.rtp(), self.long.rtp()) {
            (Some(short), Some(long)) => {
                self.config.short_weight * short + (1.0 - self.config.short_weight) * long
            }
            (Some(short), None) => short,
            (None, Some(long)) => long,
            (None, None) => self.target_rtp,
        }
    }

    /// Calm windows widen corrections, noisy ones narrow them
    pub fn volatility_adjustment(&self) -> f64 {
        match self.short.volatility() {
            Some(sd) if sd < self.config.low_volatility => CALM_ADJUSTMENT,
            Some(sd) if sd > self.config.high_volatility => NOISY_ADJUSTMENT,
            _ => 1.0,
        }
    }

    /// Win-lean probability before jitter
    pub fn base_bias_probability(&self, bet: f64) -> f64 {
        let weighted = self.weighted_rtp();
        let deviation = (self.target_rtp - weighted) / self.target_rtp;
        let mut p = self.target_rtp
            + deviation * self.config.compensation_factor * self.volatility_adjustment();
        if bet >= self.config.large_bet_threshold {
            p -= self.config.large_bet_penalty;
        }
        p
    }

    /// Should this spin lean toward a win?
    pub fn should_bias(&self, bet: f64, rng: &dyn RandomSource) -> bool {
        let p = (self.base_bias_probability(bet) + rng.jitter(self.config.bias_jitter))
            .clamp(MIN_BIAS_PROBABILITY, MAX_BIAS_PROBABILITY);
        rng.next_f64() < p
    }

    /// Amount owed to players against the target since the last reset.
    /// Negative when the game has paid more than the target.
    ///
    /// Each outcome settles at the target in force when it was recorded, so
    /// retargeting does not rewrite the past.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Lifetime balance in average bets, turned into a multiplier trim
    pub fn balance_trim(&self) -> f64 {
        if self.lifetime_spins == 0 || self.lifetime_bet <= 0.0 {
            return 1.0;
        }
        let average_bet = self.lifetime_bet / self.lifetime_spins as f64;
        (1.0 + self.config.integral_gain * self.balance / average_bet).clamp(MIN_TRIM, MAX_TRIM)
    }

    /// Multiplier for the next computed win: the windowed correction, scaled
    /// by the volatility adjustment and trimmed by the lifetime balance
    pub fn spin_multiplier(&self) -> f64 {
        let m = compensation_multiplier(self.weighted_rtp(), self.target_rtp);
        let windowed = (1.0 + (m - 1.0) * self.volatility_adjustment())
            .clamp(MIN_COMPENSATION, MAX_COMPENSATION);
        (windowed * self.balance_trim()).clamp(MIN_COMPENSATION, MAX_COMPENSATION)
    }

    pub fn lean_attempts(&self) -> u8 {
        self.config.lean_attempts
    }

    pub fn reset(&mut self) {
        self.short.clear();
        self.long.clear();
        self.balance = 0.0;
        self.lifetime_bet = 0.0;
        self.lifetime_spins = 0;
    }
}
