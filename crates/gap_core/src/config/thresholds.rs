//! Threshold groups for [`AnalysisConfig`](super::AnalysisConfig).
//!
//! Every value is overridable; the defaults are the ones the coaching
//! rules were calibrated with on 64-tick competitive matches.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Sightline queries
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeometryThresholds {
    /// Horizontal field of view used for "visible enemy" queries
    #[validate(range(min = 1.0, max = 360.0))]
    pub fov_degrees: f64,
}

impl Default for GeometryThresholds {
    fn default() -> Self {
        Self { fov_degrees: 90.0 }
    }
}

/// Crosshair placement buckets
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_aim_order"))]
pub struct AimThresholds {
    /// Offsets at or above this are "bad"
    #[validate(range(min = 0.0, max = 180.0))]
    pub bad_deg: f64,
    /// Offsets above this are "terrible"
    #[validate(range(min = 0.0, max = 180.0))]
    pub terrible_deg: f64,
    /// Worst examples kept per summary
    pub worst_examples: usize,
    /// Headshot kills at or under this offset count as perfect
    #[validate(range(min = 0.0, max = 180.0))]
    pub perfect_kill_deg: f64,
}

impl Default for AimThresholds {
    fn default() -> Self {
        Self { bad_deg: 30.0, terrible_deg: 60.0, worst_examples: 5, perfect_kill_deg: 20.0 }
    }
}

fn validate_aim_order(aim: &AimThresholds) -> Result<(), ValidationError> {
    if aim.bad_deg > aim.terrible_deg {
        return Err(ValidationError::new("bad_deg_above_terrible_deg"));
    }
    Ok(())
}

/// Duel context: trades, range, utility
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngagementThresholds {
    /// Deaths closer than this count as close-range duels
    #[validate(range(min = 0.0))]
    pub close_range_units: f64,
    /// Teammates within this radius can trade
    #[validate(range(min = 0.0))]
    pub trade_radius_units: f64,
    /// Utility thrown this long before a death counts as "used"
    #[validate(range(min = 0.0))]
    pub utility_window_s: f64,
}

impl Default for EngagementThresholds {
    fn default() -> Self {
        Self { close_range_units: 500.0, trade_radius_units: 800.0, utility_window_s: 3.0 }
    }
}

/// Flash usefulness and pop-flash detection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FlashThresholds {
    /// Enemy blind longer than this makes a flash useful
    #[validate(range(min = 0.0))]
    pub useful_blind_s: f64,
    /// Thrower kill inside this window makes a flash useful
    #[validate(range(min = 0.0))]
    pub kill_window_s: f64,
    /// Post-throw movement above this marks a pop-flash
    #[validate(range(min = 0.0))]
    pub pop_move_units: f64,
    /// Window after the throw checked for movement
    #[validate(range(min = 0.0))]
    pub pop_window_s: f64,
}

impl Default for FlashThresholds {
    fn default() -> Self {
        Self { useful_blind_s: 1.0, kill_window_s: 3.0, pop_move_units: 100.0, pop_window_s: 1.0 }
    }
}

/// Smoke volumes
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OcclusionThresholds {
    #[validate(range(min = 0.0))]
    pub lifetime_s: f64,
    #[validate(range(min = 0.0))]
    pub radius_units: f64,
}

impl Default for OcclusionThresholds {
    fn default() -> Self {
        Self { lifetime_s: 18.0, radius_units: 250.0 }
    }
}

/// Buy-tier ladder and loss reporting
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_bucket_ladder"))]
pub struct EconomyThresholds {
    /// Spend below this is a pistol-tier round
    pub pistol_cap: u32,
    /// Spend below this is an eco
    pub eco_cap: u32,
    /// Spend below this is a force-buy, at or above is a full buy
    pub full_buy_cap: u32,
    /// Deaths carrying more than this are "expensive"
    pub high_value_death: u32,
    /// Worst losses kept in the aggregate
    pub worst_losses: usize,
    /// Worst losses at or above this become highlights
    pub major_loss_highlight: u32,
}

impl Default for EconomyThresholds {
    fn default() -> Self {
        Self {
            pistol_cap: 1000,
            eco_cap: 2000,
            full_buy_cap: 3500,
            high_value_death: 3000,
            worst_losses: 3,
            major_loss_highlight: 4000,
        }
    }
}

fn validate_bucket_ladder(eco: &EconomyThresholds) -> Result<(), ValidationError> {
    if !(eco.pistol_cap <= eco.eco_cap && eco.eco_cap <= eco.full_buy_cap) {
        return Err(ValidationError::new("bucket_caps_not_ascending"));
    }
    Ok(())
}

/// Zone classification
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PositioningThresholds {
    /// K/D below this marks a danger zone
    #[validate(range(min = 0.0))]
    pub danger_ratio: f64,
    /// K/D at or above this marks a strong zone
    #[validate(range(min = 0.0))]
    pub strong_ratio: f64,
    /// Kills + deaths required before a zone is classified
    pub min_engagements: u32,
    /// Length of the danger and strong lists
    pub max_listed: usize,
}

impl Default for PositioningThresholds {
    fn default() -> Self {
        Self { danger_ratio: 0.7, strong_ratio: 1.5, min_engagements: 2, max_listed: 3 }
    }
}

/// Finding triggers and ranking
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RankingThresholds {
    /// Findings emitted
    pub max_findings: usize,
    /// Aim finding fires above this share of bad-or-worse death offsets
    #[validate(range(min = 0.0, max = 100.0))]
    pub aim_bad_pct: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub avoidable_pct: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub disadvantaged_pct: f64,
    /// Flash finding fires below this usefulness share
    #[validate(range(min = 0.0, max = 100.0))]
    pub flash_useful_pct: f64,
    /// Pop-flash finding fires below this share
    #[validate(range(min = 0.0, max = 100.0))]
    pub pop_flash_pct: f64,
    /// Pop-flash share is only rated above this many flashes
    pub pop_flash_min_flashes: usize,
    /// Headshot finding fires below this rate
    #[validate(range(min = 0.0, max = 100.0))]
    pub headshot_floor_pct: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub expensive_death_pct: f64,
    /// Economy severity multiplier
    #[validate(range(min = 0.0, max = 1.0))]
    pub economy_weight: f64,
}

impl Default for RankingThresholds {
    fn default() -> Self {
        Self {
            max_findings: 3,
            aim_bad_pct: 50.0,
            avoidable_pct: 40.0,
            disadvantaged_pct: 40.0,
            flash_useful_pct: 60.0,
            pop_flash_pct: 40.0,
            pop_flash_min_flashes: 3,
            headshot_floor_pct: 35.0,
            expensive_death_pct: 50.0,
            economy_weight: 0.8,
        }
    }
}
