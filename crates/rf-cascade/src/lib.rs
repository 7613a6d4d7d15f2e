//! # rf-cascade: Cascading Slot Math Engine
//!
//! Computes outcomes for an elimination-style slot: a weighted random grid,
//! repeated match → remove → gravity refill steps with a growing multiplier,
//! golden symbols that turn into persistent wilds, and a controller that steers
//! realized RTP toward a configured target.
//!
//! ## Architecture
//!
//! ```text
//! SlotEngine
//!     │
//!     ├── RandomSource (ChaCha20, injected)
//!     ├── SymbolGenerator (per-reel weights, golden roll)
//!     ├── MatchEngine (Ways | Adjacency)
//!     ├── CascadeRunner ── WildTracker
//!     └── RtpController (Dynamic | Fixed)
//!           │
//!           v
//!     SpinResult → EngineStatistics
//! ```

pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod matching;
pub mod paytable;
pub mod rng;
pub mod rtp;
pub mod simulation;
pub mod spin;
pub mod stats;
pub mod symbols;
pub mod wild;

pub use cascade::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use grid::*;
pub use matching::*;
pub use paytable::*;
pub use rng::*;
pub use rtp::*;
pub use simulation::*;
pub use spin::*;
pub use stats::*;
pub use symbols::*;
pub use wild::*;
