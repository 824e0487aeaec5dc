//! JSON in / JSON out entry point for non-Rust hosts.

use crate::config::{AnalysisConfig, StaticTables};
use crate::replay::MatchData;
use crate::{analyze_match_with_tables, AnalysisReport};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const REQUEST_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    REQUEST_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Exact, case-sensitive player name
    pub player: String,
    #[serde(rename = "match")]
    pub match_data: MatchData,
    /// Partial overrides on top of the default thresholds
    #[serde(default)]
    pub config: Option<AnalysisConfig>,
    /// Replacement zone and price tables
    #[serde(default)]
    pub tables: Option<StaticTables>,
}

/// Parse a request, run the analysis, return the report JSON.
///
/// Errors come back as human-readable strings.
pub fn analyze_match_json(request_json: &str) -> Result<String, String> {
    let request: AnalysisRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid JSON request: {}", e))?;

    if request.schema_version != REQUEST_SCHEMA_VERSION {
        return Err(format!("Unsupported schema version: {}", request.schema_version));
    }

    let config = request
        .config
        .unwrap_or_default()
        .validated()
        .map_err(|e| e.to_string())?;
    let tables = request.tables.unwrap_or_default();
    debug!(player = %request.player, frames = request.match_data.frames.len(), "json analysis request");

    let report: AnalysisReport =
        analyze_match_with_tables(&request.match_data, &request.player, &config, &tables).map_err(|e| e.to_string())?;

    serde_json::to_string(&report).map_err(|e| format!("Failed to serialize report: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "player": "me",
        "match": {
            "map_name": "de_dust2",
            "frames": [
                {"tick": 0, "player": "me", "team": "CT", "position": [0.0, 0.0, 0.0], "angles": {"pitch": 0.0, "yaw": 180.0}},
                {"tick": 0, "player": "them", "team": "T", "position": [500.0, 0.0, 0.0]}
            ],
            "deaths": [{"tick": 64, "victim": "me", "attacker": "them", "weapon": "ak47"}]
        }
    }"#;

    #[test]
    fn test_round_trip_request() {
        let out = analyze_match_json(REQUEST).unwrap();
        let report: AnalysisReport = serde_json::from_str(&out).unwrap();
        assert_eq!(report.player, "me");
        assert_eq!(report.overview.deaths, 1);
    }

    #[test]
    fn test_unknown_player_message() {
        let request = REQUEST.replacen("\"player\": \"me\"", "\"player\": \"ME\"", 1);
        let err = analyze_match_json(&request).unwrap_err();
        assert_eq!(err, "Player not found in match: ME");
    }

    #[test]
    fn test_bad_schema_version() {
        let request = REQUEST.replacen('{', "{\"schema_version\": 9,", 1);
        let err = analyze_match_json(&request).unwrap_err();
        assert!(err.contains("Unsupported schema version"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let request = REQUEST.replacen('{', "{\"config\": {\"geometry\": {\"fov_degrees\": 0.0}},", 1);
        let err = analyze_match_json(&request).unwrap_err();
        assert!(err.starts_with("Invalid configuration"), "got {}", err);
    }

    #[test]
    fn test_garbage_input() {
        assert!(analyze_match_json("not json").unwrap_err().starts_with("Invalid JSON request"));
    }
}
