//! Rolling bet/win history with running totals

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// One recorded spin outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtpSample {
    pub timestamp: DateTime<Utc>,
    pub bet: f64,
    pub win: f64,
    /// win / bet
    pub rtp: f64,
}

impl RtpSample {
    pub fn new(timestamp: DateTime<Utc>, bet: f64, win: f64) -> Self {
        Self {
            timestamp,
            bet,
            win,
            rtp: if bet > 0.0 { win / bet } else { 0.0 },
        }
    }
}

/// Samples bounded by age and count
///
/// Eviction drops over-capacity samples first, then samples older than the
/// window. Totals are maintained incrementally.
#[derive(Debug, Clone)]
pub struct RtpHistory {
    window: TimeDelta,
    capacity: usize,
    samples: VecDeque<RtpSample>,
    total_bet: f64,
    total_win: f64,
}

impl RtpHistory {
    pub fn new(window_secs: i64, capacity: usize) -> Self {
        Self {
            window: TimeDelta::try_seconds(window_secs).unwrap_or(TimeDelta::MAX),
            capacity,
            samples: VecDeque::with_capacity(capacity.min(4096)),
            total_bet: 0.0,
            total_win: 0.0,
        }
    }

    /// Record an outcome stamped now
    pub fn record(&mut self, bet: f64, win: f64) {
        self.push(RtpSample::new(Utc::now(), bet, win));
    }

    /// Record a prepared sample and evict relative to its timestamp
    pub fn push(&mut self, sample: RtpSample) {
        self.total_bet += sample.bet;
        self.total_win += sample.win;
        let now = sample.timestamp;
        self.samples.push_back(sample);
        self.evict(now);
    }

    /// Evict by count, then by age
    pub fn evict(&mut self, now: DateTime<Utc>) {
        while self.samples.len() > self.capacity {
            self.pop_front();
        }
        if let Some(cutoff) = now.checked_sub_signed(self.window) {
            while self.samples.front().is_some_and(|s| s.timestamp < cutoff) {
                self.pop_front();
            }
        }
    }

    fn pop_front(&mut self) {
        if let Some(old) = self.samples.pop_front() {
            self.total_bet -= old.bet;
            self.total_win -= old.win;
        }
        if self.samples.is_empty() {
            self.total_bet = 0.0;
            self.total_win = 0.0;
        }
    }

    /// Realized RTP over the window, `None` without wagers
    pub fn rtp(&self) -> Option<f64> {
        (self.total_bet > 0.0).then(|| self.total_win / self.total_bet)
    }

    /// Population std-dev of per-sample RTP (needs two samples)
    pub fn volatility(&self) -> Option<f64> {
        let n = self.samples.len();
        if n < 2 {
            return None;
        }
        let mean = self.samples.iter().map(|s| s.rtp).sum::<f64>() / n as f64;
        let variance = self
            .samples
            .iter()
            .map(|s| (s.rtp - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        Some(variance.sqrt())
    }

    pub fn total_bet(&self) -> f64 {
        self.total_bet
    }

    pub fn total_win(&self) -> f64 {
        self.total_win
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.total_bet = 0.0;
        self.total_win = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_running_totals() {
        let mut history = RtpHistory::new(60, 10);
        assert_eq!(history.rtp(), None);
        history.record(1.0, 0.5);
        history.record(1.0, 1.5);
        assert_relative_eq!(history.rtp().unwrap(), 1.0);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_eviction() {
        let mut history = RtpHistory::new(3600, 3);
        for win in [10.0, 0.0, 0.0, 0.0] {
            history.record(1.0, win);
        }
        assert_eq!(history.len(), 3);
        assert_relative_eq!(history.total_win(), 0.0);
        assert_relative_eq!(history.total_bet(), 3.0);
    }

    #[test]
    fn test_age_eviction() {
        let mut history = RtpHistory::new(60, 100);
        let start = Utc::now();
        history.push(RtpSample::new(start, 1.0, 4.0));
        history.push(RtpSample::new(start + TimeDelta::seconds(30), 1.0, 0.0));
        assert_eq!(history.len(), 2);

        history.push(RtpSample::new(start + TimeDelta::seconds(90), 1.0, 1.0));
        assert_eq!(history.len(), 2);
        assert_relative_eq!(history.rtp().unwrap(), 0.5);
    }

    #[test]
    fn test_volatility() {
        let mut history = RtpHistory::new(60, 10);
        history.record(1.0, 0.0);
        assert_eq!(history.volatility(), None);
        history.record(1.0, 2.0);
        assert_relative_eq!(history.volatility().unwrap(), 1.0);
    }

    #[test]
    fn test_clear() {
        let mut history = RtpHistory::new(60, 10);
        history.record(2.0, 1.0);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.rtp(), None);
    }
}
