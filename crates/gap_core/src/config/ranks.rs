//! Competitive ladder benchmarks for rank estimation.
//!
//! Each tier lists the rates a typical player of that tier posts. Tiers are
//! ordered from lowest to highest; the estimator relies on that order for
//! neighbours and progression.

use serde::{Deserialize, Serialize};

/// Benchmark rates for one ladder tier. Percentages are 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTier {
    pub name: String,
    pub elo_min: u32,
    pub elo_max: u32,
    pub kd_ratio: f64,
    pub headshot_pct: f64,
    /// Average crosshair offset on deaths, degrees
    pub aim_offset_deg: f64,
    pub bad_aim_pct: f64,
    pub avoidable_pct: f64,
    pub flash_useful_pct: f64,
    pub expensive_death_pct: f64,
    /// Match-to-match K/D standard deviation
    pub kd_stddev: f64,
}

impl RankTier {
    /// `rates`: K/D, HSR, offset, bad aim, avoidable, flash useful,
    /// expensive deaths, K/D stddev.
    fn new(name: &str, elo_min: u32, elo_max: u32, rates: [f64; 8]) -> Self {
        let [kd_ratio, headshot_pct, aim_offset_deg, bad_aim_pct, avoidable_pct, flash_useful_pct, expensive_death_pct, kd_stddev] =
            rates;
        Self {
            name: name.to_string(),
            elo_min,
            elo_max,
            kd_ratio,
            headshot_pct,
            aim_offset_deg,
            bad_aim_pct,
            avoidable_pct,
            flash_useful_pct,
            expensive_death_pct,
            kd_stddev,
        }
    }
}

/// Share of each metric in a tier's overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricWeights {
    pub kd_ratio: f64,
    pub headshot_rate: f64,
    pub aim_offset: f64,
    /// Scored for strengths and weaknesses, but unweighted by default
    pub bad_aim: f64,
    pub avoidable_deaths: f64,
    pub flash_usage: f64,
    pub economy_discipline: f64,
    pub consistency: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            kd_ratio: 0.25,
            headshot_rate: 0.15,
            aim_offset: 0.20,
            bad_aim: 0.0,
            avoidable_deaths: 0.15,
            flash_usage: 0.10,
            economy_discipline: 0.10,
            consistency: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankTable {
    /// Lowest tier first
    pub tiers: Vec<RankTier>,
    pub weights: MetricWeights,
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                RankTier::new("Silver", 0, 5000, [0.65, 20.0, 55.0, 75.0, 60.0, 25.0, 65.0, 0.6]),
                RankTier::new("Gold Nova", 5000, 8000, [0.85, 28.0, 42.0, 62.0, 50.0, 35.0, 55.0, 0.5]),
                RankTier::new("Master Guardian", 8000, 11000, [1.0, 35.0, 32.0, 48.0, 40.0, 45.0, 45.0, 0.4]),
                RankTier::new("Legendary Eagle", 11000, 14000, [1.15, 42.0, 25.0, 35.0, 30.0, 55.0, 35.0, 0.32]),
                RankTier::new("Supreme/Global", 14000, 18000, [1.3, 48.0, 20.0, 25.0, 22.0, 65.0, 25.0, 0.25]),
                RankTier::new("Faceit 1-3", 18000, 20000, [1.4, 52.0, 18.0, 20.0, 18.0, 70.0, 20.0, 0.22]),
                RankTier::new("Faceit 4-7", 20000, 24000, [1.55, 56.0, 15.0, 15.0, 15.0, 75.0, 15.0, 0.18]),
                RankTier::new("Faceit 8-10", 24000, 28000, [1.75, 62.0, 12.0, 10.0, 10.0, 82.0, 10.0, 0.15]),
                RankTier::new("Semi-Pro", 28000, 32000, [2.0, 68.0, 10.0, 5.0, 5.0, 88.0, 5.0, 0.12]),
                RankTier::new("Professional", 32000, 40000, [2.3, 75.0, 8.0, 3.0, 3.0, 92.0, 3.0, 0.10]),
            ],
            weights: MetricWeights::default(),
        }
    }
}
