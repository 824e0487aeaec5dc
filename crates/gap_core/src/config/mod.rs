//! # Analysis Configuration
//!
//! Every threshold the analyzers use, grouped by concern, plus the static
//! zone and price tables. Nothing here is global state: callers build a
//! config once and pass it by reference into the pipeline.
//!
//! ## Usage
//! ```rust
//! use gap_core::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let coach = AnalysisConfig::strict();
//! assert!(coach.aim.bad_deg < config.aim.bad_deg);
//! ```
//!
//! ## Environment Variables
//!
//! - `GAP_CONFIG_PROFILE`: Select preset (strict, lenient, default)

mod ranks;
mod tables;
mod thresholds;

pub use ranks::{MetricWeights, RankTable, RankTier};
pub use tables::{PriceTable, StaticTables, Zone, ZoneTable, UNKNOWN_ZONE};
pub use thresholds::{
    AimThresholds, EconomyThresholds, EngagementThresholds, FlashThresholds,
    GeometryThresholds, OcclusionThresholds, PositioningThresholds, RankingThresholds,
};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use validator::Validate;

/// Competitive servers run at 64 ticks per second.
pub const DEFAULT_TICK_RATE: f64 = 64.0;

/// Full engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ticks per second, used to convert every second-valued window
    #[validate(range(min = 1.0, max = 1024.0))]
    pub tick_rate: f64,
    #[validate]
    pub geometry: GeometryThresholds,
    #[validate]
    pub aim: AimThresholds,
    #[validate]
    pub engagement: EngagementThresholds,
    #[validate]
    pub flash: FlashThresholds,
    #[validate]
    pub occlusion: OcclusionThresholds,
    #[validate]
    pub economy: EconomyThresholds,
    #[validate]
    pub positioning: PositioningThresholds,
    #[validate]
    pub ranking: RankingThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            geometry: GeometryThresholds::default(),
            aim: AimThresholds::default(),
            engagement: EngagementThresholds::default(),
            flash: FlashThresholds::default(),
            occlusion: OcclusionThresholds::default(),
            economy: EconomyThresholds::default(),
            positioning: PositioningThresholds::default(),
            ranking: RankingThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Coach-grade preset: tighter crosshair buckets, findings fire earlier
    pub fn strict() -> Self {
        let mut cfg = Self::default();
        cfg.aim.bad_deg = 20.0;
        cfg.aim.terrible_deg = 45.0;
        cfg.aim.perfect_kill_deg = 10.0;
        cfg.ranking.aim_bad_pct = 35.0;
        cfg.ranking.avoidable_pct = 25.0;
        cfg.ranking.disadvantaged_pct = 30.0;
        cfg.ranking.headshot_floor_pct = 45.0;
        cfg.ranking.flash_useful_pct = 75.0;
        cfg
    }

    /// Casual preset: only flag large problems
    pub fn lenient() -> Self {
        let mut cfg = Self::default();
        cfg.aim.bad_deg = 40.0;
        cfg.aim.terrible_deg = 75.0;
        cfg.ranking.aim_bad_pct = 65.0;
        cfg.ranking.avoidable_pct = 55.0;
        cfg.ranking.disadvantaged_pct = 55.0;
        cfg.ranking.headshot_floor_pct = 25.0;
        cfg.ranking.flash_useful_pct = 45.0;
        cfg
    }

    /// Load preset from `GAP_CONFIG_PROFILE` or use default
    pub fn from_env_or_default() -> Self {
        match env::var("GAP_CONFIG_PROFILE").unwrap_or_default().to_lowercase().as_str() {
            "strict" => Self::strict(),
            "lenient" => Self::lenient(),
            _ => Self::default(),
        }
    }

    /// Parse a full or partial YAML override and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml)?;
        cfg.validated()
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Consume self, returning it only if every range check passes.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Convert a duration in seconds to whole ticks (rounded).
    pub fn ticks(&self, seconds: f64) -> i64 {
        (seconds * self.tick_rate).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use std::io::Write;

    #[test]
    fn test_default_matches_documented_values() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.geometry.fov_degrees, 90.0);
        assert_eq!(cfg.aim.bad_deg, 30.0);
        assert_eq!(cfg.aim.terrible_deg, 60.0);
        assert_eq!(cfg.engagement.close_range_units, 500.0);
        assert_eq!(cfg.engagement.trade_radius_units, 800.0);
        assert_eq!(cfg.flash.useful_blind_s, 1.0);
        assert_eq!(cfg.flash.kill_window_s, 3.0);
        assert_eq!(cfg.flash.pop_move_units, 100.0);
        assert_eq!(cfg.occlusion.lifetime_s, 18.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_ticks_conversion() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.ticks(3.0), 192);
        assert_eq!(cfg.ticks(18.0), 1152);
    }

    #[test]
    fn test_presets_validate() {
        assert!(AnalysisConfig::strict().validate().is_ok());
        assert!(AnalysisConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = AnalysisConfig::from_yaml_str("aim:\n  bad_deg: 25.0\n").unwrap();
        assert_eq!(cfg.aim.bad_deg, 25.0);
        assert_eq!(cfg.aim.terrible_deg, 60.0);
        assert_eq!(cfg.tick_rate, DEFAULT_TICK_RATE);
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let err = AnalysisConfig::from_yaml_str("geometry:\n  fov_degrees: 0.0\n").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)), "got {:?}", err);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_rate: 128.0\neconomy:\n  high_value_death: 4000").unwrap();

        let cfg = AnalysisConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(cfg.tick_rate, 128.0);
        assert_eq!(cfg.economy.high_value_death, 4000);
        assert_eq!(cfg.ticks(1.0), 128);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AnalysisConfig::from_yaml_file("/nonexistent/gap.yaml").unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigIo(_)));
    }
}
