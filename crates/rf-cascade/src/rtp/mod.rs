//! RTP controllers
//!
//! [`RtpController`] is a closed set of strategies: the rolling-window
//! [`DynamicRtpController`] and the pass-through [`FixedOddsController`].

mod dynamic;
mod fixed;
mod history;

pub use dynamic::*;
pub use fixed::FixedOddsController;
pub use history::{RtpHistory, RtpSample};

use serde::{Deserialize, Serialize};

use crate::config::{AlgorithmConfig, ControllerConfig, ControllerKind, validate_target};
use crate::error::{EngineError, EngineResult};
use crate::rng::RandomSource;

/// Controller decisions for one spin, taken from the same state snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPlan {
    /// Lean the draw toward (`Some(true)`) or away from a win; `None` = plain draw
    pub bias: Option<bool>,
    /// Draws allowed while leaning
    pub lean_attempts: u8,
    /// Applied to the raw cascade win
    pub multiplier: f64,
    /// Weighted RTP the plan was based on
    pub weighted_rtp: f64,
}

/// Where the weighted RTP sits relative to the band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RtpBand {
    Below,
    Within,
    Above,
}

/// Point-in-time view of a controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub kind: ControllerKind,
    pub target_rtp: f64,
    pub min_rtp: f64,
    pub max_rtp: f64,
    pub short_rtp: Option<f64>,
    pub long_rtp: Option<f64>,
    pub weighted_rtp: f64,
    pub volatility_adjustment: f64,
    /// Lifetime amount owed against the target (dynamic controller only)
    pub balance: f64,
    pub short_samples: usize,
    pub long_samples: usize,
    pub band: RtpBand,
}

#[derive(Debug, Clone)]
pub enum RtpController {
    Dynamic(DynamicRtpController),
    Fixed(FixedOddsController),
}

impl RtpController {
    pub fn from_config(algorithm: &AlgorithmConfig, config: &ControllerConfig) -> Self {
        match config.kind {
            ControllerKind::Dynamic => Self::Dynamic(DynamicRtpController::new(
                algorithm.target_rtp,
                algorithm.min_rtp,
                algorithm.max_rtp,
                config.clone(),
            )),
            ControllerKind::Fixed => Self::Fixed(FixedOddsController::new(
                algorithm.target_rtp,
                algorithm.min_rtp,
                algorithm.max_rtp,
                config.long_window_secs,
                config.long_capacity,
            )),
        }
    }

    pub fn kind(&self) -> ControllerKind {
        match self {
            Self::Dynamic(_) => ControllerKind::Dynamic,
            Self::Fixed(_) => ControllerKind::Fixed,
        }
    }

    pub fn target_rtp(&self) -> f64 {
        match self {
            Self::Dynamic(c) => c.target_rtp(),
            Self::Fixed(c) => c.target_rtp(),
        }
    }

    /// Decide the bias and multiplier for the next spin
    pub fn plan(&self, bet: f64, rng: &dyn RandomSource) -> SpinPlan {
        match self {
            Self::Dynamic(c) => SpinPlan {
                bias: Some(c.should_bias(bet, rng)),
                lean_attempts: c.lean_attempts(),
                multiplier: c.spin_multiplier(),
                weighted_rtp: c.weighted_rtp(),
            },
            Self::Fixed(c) => SpinPlan {
                bias: None,
                lean_attempts: 1,
                multiplier: 1.0,
                weighted_rtp: c.history().rtp().unwrap_or(c.target_rtp()),
            },
        }
    }

    /// Compensation for the next win without drawing a bias (forced spins)
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Dynamic(c) => c.spin_multiplier(),
            Self::Fixed(_) => 1.0,
        }
    }

    pub fn record_outcome(&mut self, bet: f64, win: f64) {
        match self {
            Self::Dynamic(c) => c.record_outcome(bet, win),
            Self::Fixed(c) => c.record_outcome(bet, win),
        }
    }

    /// Live retargeting; only the dynamic controller supports it
    pub fn set_target(&mut self, target_rtp: f64) -> EngineResult<()> {
        validate_target(target_rtp)?;
        match self {
            Self::Dynamic(c) => {
                c.set_target(target_rtp);
                Ok(())
            }
            Self::Fixed(_) => Err(EngineError::Unsupported(
                "fixed-odds controller cannot change its target RTP; rebuild it instead".into(),
            )),
        }
    }

    /// Follow a new algorithm config. Dynamic histories survive; a fixed
    /// controller is rebuilt.
    pub fn follow(&mut self, algorithm: &AlgorithmConfig, config: &ControllerConfig) {
        match self {
            Self::Dynamic(c) if config.kind == ControllerKind::Dynamic => {
                c.set_band(algorithm.target_rtp, algorithm.min_rtp, algorithm.max_rtp)
            }
            _ => *self = Self::from_config(algorithm, config),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Dynamic(c) => c.reset(),
            Self::Fixed(c) => c.reset(),
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let (snapshot, weighted) = match self {
            Self::Dynamic(c) => {
                let (min_rtp, max_rtp) = c.bounds();
                let weighted = c.weighted_rtp();
                (
                    ControllerSnapshot {
                        kind: ControllerKind::Dynamic,
                        target_rtp: c.target_rtp(),
                        min_rtp,
                        max_rtp,
                        short_rtp: c.short_window().rtp(),
                        long_rtp: c.long_window().rtp(),
                        weighted_rtp: weighted,
                        volatility_adjustment: c.volatility_adjustment(),
                        balance: c.balance(),
                        short_samples: c.short_window().len(),
                        long_samples: c.long_window().len(),
                        band: RtpBand::Within,
                    },
                    weighted,
                )
            }
            Self::Fixed(c) => {
                let (min_rtp, max_rtp) = c.bounds();
                let weighted = c.history().rtp().unwrap_or(c.target_rtp());
                (
                    ControllerSnapshot {
                        kind: ControllerKind::Fixed,
                        target_rtp: c.target_rtp(),
                        min_rtp,
                        max_rtp,
                        short_rtp: None,
                        long_rtp: c.history().rtp(),
                        weighted_rtp: weighted,
                        volatility_adjustment: 1.0,
                        balance: 0.0,
                        short_samples: 0,
                        long_samples: c.history().len(),
                        band: RtpBand::Within,
                    },
                    weighted,
                )
            }
        };

        let band = if weighted < snapshot.min_rtp {
            RtpBand::Below
        } else if weighted > snapshot.max_rtp {
            RtpBand::Above
        } else {
            RtpBand::Within
        };
        ControllerSnapshot { band, ..snapshot }
    }
}
