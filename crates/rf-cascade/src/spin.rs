//! Spin request and result

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cascade::CascadeStep;
use crate::config::WinTierThresholds;
use crate::grid::{Grid, Position};
use crate::matching::BonusTrigger;
use crate::symbols::SymbolId;
use crate::wild::{GoldenSymbolInfo, WildTransition};

/// One spin call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRequest {
    pub session_id: String,
    pub bet: f64,
    /// Opaque caller data, echoed in the result
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl SpinRequest {
    pub fn new(session_id: impl Into<String>, bet: f64) -> Self {
        Self {
            session_id: session_id.into(),
            bet,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Caller-supplied initial grid for replays and scenario checks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForcedGrid {
    /// Ids per reel, top to bottom; the wild sentinel places a wild
    pub ids: Vec<Vec<SymbolId>>,
    /// Cells to mark golden
    #[serde(default)]
    pub golden: Vec<Position>,
}

impl ForcedGrid {
    pub fn new(ids: Vec<Vec<SymbolId>>) -> Self {
        Self {
            ids,
            golden: Vec::new(),
        }
    }

    pub fn with_golden(mut self, pos: Position) -> Self {
        self.golden.push(pos);
        self
    }
}

/// Win size category by win/bet ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinTier {
    Win,
    BigWin,
    MegaWin,
    EpicWin,
    UltraWin,
}

impl WinTier {
    /// `None` for a zero win
    pub fn classify(win_ratio: f64, thresholds: &WinTierThresholds) -> Option<Self> {
        if win_ratio <= 0.0 {
            None
        } else if win_ratio >= thresholds.ultra_win {
            Some(Self::UltraWin)
        } else if win_ratio >= thresholds.epic_win {
            Some(Self::EpicWin)
        } else if win_ratio >= thresholds.mega_win {
            Some(Self::MegaWin)
        } else if win_ratio >= thresholds.big_win {
            Some(Self::BigWin)
        } else {
            Some(Self::Win)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::BigWin => "big",
            Self::MegaWin => "mega",
            Self::EpicWin => "epic",
            Self::UltraWin => "ultra",
        }
    }
}

/// Complete spin result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinResult {
    /// `<session>-<sequence>`
    pub spin_id: String,
    pub session_id: String,
    pub bet: f64,
    /// Paid amount after compensation and cap
    pub total_win: f64,
    /// Cascade win before compensation
    pub raw_win: f64,
    /// Compensation multiplier applied to the raw win
    pub compensation: f64,
    /// total_win / bet
    pub win_ratio: f64,
    pub is_win: bool,
    /// Win hit the per-spin cap
    pub capped: bool,
    pub win_tier: Option<WinTier>,
    /// Initial grid ids (wild sentinel for wilds)
    pub initial_grid: Vec<Vec<SymbolId>>,
    pub cascades: Vec<CascadeStep>,
    pub final_grid: Grid,
    /// Final grid as ids
    pub final_ids: Vec<Vec<SymbolId>>,
    pub golden_symbols: Vec<GoldenSymbolInfo>,
    pub wild_transitions: Vec<WildTransition>,
    /// Wilds left on the final grid
    pub wild_positions: Vec<Position>,
    pub bonus: Option<BonusTrigger>,
    /// Lean decision (`None` when the draw was not steered)
    pub biased: Option<bool>,
    /// Initial grid came from the caller
    pub forced: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl SpinResult {
    pub fn cascade_depth(&self) -> usize {
        self.cascades.len()
    }

    pub fn wilds_created(&self) -> usize {
        self.wild_transitions.iter().filter(|t| t.to_wild).count()
    }

    pub fn triggers_bonus(&self) -> bool {
        self.bonus.is_some()
    }
}
