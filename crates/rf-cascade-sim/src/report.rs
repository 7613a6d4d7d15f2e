//! Batch report

use chrono::{DateTime, Utc};
use rf_cascade::{EngineStatistics, SimulationReport};
use serde::{Deserialize, Serialize};

/// Combined result of all jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub config_name: String,
    pub jobs: usize,
    pub spins_per_job: u64,
    pub bet: f64,
    /// Base seed; job `i` used `seed + i`
    pub seed: Option<u64>,
    pub combined: SimulationReport,
    pub per_job: Vec<SimulationReport>,
    pub generated_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn combine(
        config_name: String,
        spins_per_job: u64,
        bet: f64,
        seed: Option<u64>,
        target_rtp: f64,
        jobs: Vec<(SimulationReport, EngineStatistics)>,
    ) -> Self {
        let mut totals = EngineStatistics::default();
        let mut per_job = Vec::with_capacity(jobs.len());
        let mut duration_ms = 0;

        for (report, stats) in jobs {
            totals.merge(&stats);
            duration_ms = duration_ms.max(report.duration_ms);
            per_job.push(report);
        }

        Self {
            config_name,
            jobs: per_job.len(),
            spins_per_job,
            bet,
            seed,
            combined: SimulationReport::from_statistics(&totals, target_rtp, duration_ms),
            per_job,
            generated_at: Utc::now(),
        }
    }

    /// Spread of per-job RTP (max - min)
    pub fn rtp_spread(&self) -> f64 {
        let rtps = self.per_job.iter().map(|r| r.rtp);
        let max = rtps.clone().fold(f64::MIN, f64::max);
        let min = rtps.fold(f64::MAX, f64::min);
        if self.per_job.is_empty() { 0.0 } else { max - min }
    }
}
