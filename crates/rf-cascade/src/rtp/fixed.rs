//! Fixed-odds controller: plain draws, wins paid as computed

use super::history::RtpHistory;

/// Observes outcomes for reporting but never steers. The target is baked in
/// at construction; changing it means building a new controller.
#[derive(Debug, Clone)]
pub struct FixedOddsController {
    target_rtp: f64,
    min_rtp: f64,
    max_rtp: f64,
    history: RtpHistory,
}

impl FixedOddsController {
    pub fn new(target_rtp: f64, min_rtp: f64, max_rtp: f64, window_secs: i64, capacity: usize) -> Self {
        Self {
            target_rtp,
            min_rtp,
            max_rtp,
            history: RtpHistory::new(window_secs, capacity),
        }
    }

    pub fn target_rtp(&self) -> f64 {
        self.target_rtp
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_rtp, self.max_rtp)
    }

    pub fn history(&self) -> &RtpHistory {
        &self.history
    }

    pub fn record_outcome(&mut self, bet: f64, win: f64) {
        self.history.record(bet, win);
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_without_steering() {
        let mut c = FixedOddsController::new(0.9, 0.8, 1.0, 60, 10);
        c.record_outcome(2.0, 1.0);
        assert_eq!(c.history().rtp(), Some(0.5));
        assert_eq!(c.target_rtp(), 0.9);
        c.reset();
        assert!(c.history().is_empty());
    }
}
