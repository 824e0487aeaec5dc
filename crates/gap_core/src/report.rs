//! # Analysis Report
//!
//! Output of one run. Plain data: serializable, schema-described, and
//! deterministic (no hash-ordered collections), so two runs over the same
//! input produce byte-identical JSON.

use crate::analysis::{
    AimSummary, DeathAssessment, EconomyReport, FlashAssessment, Highlight, KillAssessment, PositioningReport,
    PriorityFinding, RankEstimate,
};
use crate::error::{Result, SkippedEvent};
use schemars::schema::RootSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Headline statistics. Percentages are 0-100.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Overview {
    pub kills: usize,
    pub deaths: usize,
    /// `None` when the player never died
    pub kd_ratio: Option<f64>,
    pub headshot_rate_pct: f64,
    /// Average crosshair offset on deaths
    pub avg_aim_offset_deg: f64,
    pub bad_aim_pct: f64,
    pub avoidable_death_pct: f64,
    pub disadvantaged_duel_pct: f64,
    pub flashes: usize,
    pub flash_useful_pct: f64,
    pub pop_flash_pct: f64,
    pub total_value_lost: u64,
    pub avg_value_lost: f64,
    pub expensive_death_pct: f64,
    pub net_economy: i64,
    /// Records dropped for missing required fields
    pub skipped_events: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AimReport {
    /// Offset to the attacker at each death
    pub deaths: AimSummary,
    /// Offset to the victim at each kill
    pub kills: AimSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AnalysisReport {
    pub player: String,
    pub map_name: String,
    pub overview: Overview,
    /// Most severe findings, at most `ranking.max_findings`
    pub findings: Vec<PriorityFinding>,
    /// Ladder placement; `None` when the rank table is empty
    pub rank: Option<RankEstimate>,
    pub aim: AimReport,
    pub deaths: Vec<DeathAssessment>,
    pub kills: Vec<KillAssessment>,
    pub flashes: Vec<FlashAssessment>,
    pub positioning: PositioningReport,
    pub economy: EconomyReport,
    pub highlights: Vec<Highlight>,
    pub skipped: Vec<SkippedEvent>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 (hex) of the compact JSON encoding.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// JSON schema of [`AnalysisReport`].
pub fn report_schema() -> RootSchema {
    schemars::schema_for!(AnalysisReport)
}
