//! # gap_core - Gameplay Gap Analysis for FPS Replays
//!
//! Turns a decoded competitive match (per-tick positions, view angles,
//! health, equipment, plus death/blind/grenade events) into ranked,
//! actionable findings for one player.
//!
//! ## Pipeline
//! raw records → [`state::StateIndex`] (enrichment) → positioning and
//! economy aggregates → [`analysis::GapAnalyzer`] (classification and
//! ranking, rank estimate) → [`AnalysisReport`]
//!
//! Several reports for one player fold into an [`AggregateReport`] with
//! [`aggregate_reports`].
//!
//! ## Features
//! - Deterministic: the same match and config give byte-identical output
//! - No global state: thresholds and tables are passed in explicitly
//! - JSON API for non-Rust hosts ([`api::analyze_match_json`])
//!
//! ## Usage
//! ```rust
//! use gap_core::{analyze_match, AnalysisConfig, MatchData};
//!
//! let data = MatchData::default();
//! let err = analyze_match(&data, "nobody", &AnalysisConfig::default()).unwrap_err();
//! assert!(err.is_input_error());
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod replay;
pub mod report;
pub mod state;

pub use analysis::{
    aggregate_reports, AggregateReport, FindingCategory, GapAnalyzer, PriorityFinding, RankEstimate, RoundEconomyBucket,
};
pub use api::{analyze_match_json, AnalysisRequest};
pub use config::{AnalysisConfig, PriceTable, RankTable, StaticTables, ZoneTable};
pub use error::{AnalysisError, GeometryError, Result, SkippedEvent};
pub use geometry::{Vec3, ViewAngles};
pub use replay::{BlindRecord, DeathRecord, EquipmentSnapshot, GrenadeRecord, MatchData, PlayerFrame, UtilityKind};
pub use report::{report_schema, AnalysisReport, Overview};

/// Analyse `player` with the built-in zone and price tables.
pub fn analyze_match(data: &MatchData, player: &str, config: &AnalysisConfig) -> Result<AnalysisReport> {
    analyze_match_with_tables(data, player, config, &StaticTables::default())
}

pub fn analyze_match_with_tables(
    data: &MatchData,
    player: &str,
    config: &AnalysisConfig,
    tables: &StaticTables,
) -> Result<AnalysisReport> {
    GapAnalyzer::new(config, tables).analyze(data, player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AimBucket, HighlightKind};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn one_death_match() -> MatchData {
        MatchData {
            map_name: "de_dust2".into(),
            frames: vec![
                PlayerFrame::new(0, "me").with_team("CT").with_health(100),
                PlayerFrame::new(0, "them").with_team("T").with_health(100),
            ],
            deaths: vec![DeathRecord::new(640, "me", "them", "ak47")
                .in_round(3, 42.0)
                .with_victim_position(Vec3::new(0.0, 0.0, 0.0))
                .with_victim_angles(0.0, 180.0)
                .with_attacker_position(Vec3::new(500.0, 0.0, 0.0))
                .with_victim_equipment(EquipmentSnapshot {
                    total_value: None,
                    armor_value: 1000,
                    has_helmet: true,
                    has_defuser: false,
                    weapon: "ak47".into(),
                })],
            ..MatchData::default()
        }
    }

    fn flash_match(blind_s: f64) -> MatchData {
        MatchData {
            map_name: "de_mirage".into(),
            frames: vec![
                PlayerFrame::new(0, "me").with_team("CT").with_position(0.0, 0.0, 0.0),
                PlayerFrame::new(0, "enemy").with_team("T").with_position(800.0, 0.0, 0.0),
            ],
            blinds: vec![BlindRecord { tick: 100, thrower: "me".into(), victim: "enemy".into(), duration_s: blind_s }],
            ..MatchData::default()
        }
    }

    #[test]
    fn test_lone_death_facing_away() {
        let report = analyze_match(&one_death_match(), "me", &AnalysisConfig::default()).unwrap();

        let death = &report.deaths[0];
        assert!(death.is_avoidable);
        assert!(!death.advantages.close_range, "500 units is not close range");
        let aim = death.aim.as_ref().unwrap();
        assert!((aim.offset_deg - 180.0).abs() < 1e-6, "offset = {}", aim.offset_deg);
        assert_eq!(aim.bucket, AimBucket::Terrible);

        assert_eq!(death.equipment_value, Some(2700 + 1000 + 350));
        assert_eq!(report.overview.avoidable_death_pct, 100.0);
        assert_eq!(report.highlights[0].kind, HighlightKind::AvoidableDeath);
        assert_eq!(report.highlights[0].clock, "0:42");
    }

    #[test]
    fn test_flash_short_blind_not_useful() {
        let report = analyze_match(&flash_match(0.5), "me", &AnalysisConfig::default()).unwrap();
        assert_eq!(report.flashes.len(), 1);
        assert!(!report.flashes[0].is_useful);
        assert_eq!(report.overview.flash_useful_pct, 0.0);
    }

    #[test]
    fn test_flash_long_blind_useful() {
        let report = analyze_match(&flash_match(1.3), "me", &AnalysisConfig::default()).unwrap();
        assert!(report.flashes[0].is_useful);
        assert!(!report.flashes[0].followed_by_kill);
    }

    #[test]
    fn test_flash_followed_by_kill_useful() {
        let mut data = flash_match(0.2);
        data.deaths.push(
            DeathRecord::new(250, "enemy", "me", "m4a1").with_attacker_position(Vec3::new(0.0, 0.0, 0.0)),
        );
        let report = analyze_match(&data, "me", &AnalysisConfig::default()).unwrap();
        assert!(report.flashes[0].followed_by_kill);
        assert!(report.flashes[0].is_useful);
    }

    #[test]
    fn test_skipped_events_are_counted() {
        let mut data = one_death_match();
        data.deaths.push(DeathRecord::new(900, "me", "them", "awp"));
        let report = analyze_match(&data, "me", &AnalysisConfig::default()).unwrap();
        assert_eq!(report.overview.skipped_events, 1);
        assert_eq!(report.deaths.len(), 1);
        assert_eq!(report.skipped[0].tick, 900);
    }

    #[test]
    fn test_unknown_map_keeps_economy() {
        let mut data = one_death_match();
        data.map_name = "de_unknown".into();
        let report = analyze_match(&data, "me", &AnalysisConfig::default()).unwrap();
        assert!(!report.positioning.map_known);
        assert_eq!(report.positioning.zones[0].zone, config::UNKNOWN_ZONE);
        assert_eq!(report.economy.total_value_lost, 4050);
    }

    fn covered_death_match() -> MatchData {
        MatchData {
            map_name: "de_dust2".into(),
            frames: vec![
                PlayerFrame::new(0, "me").with_team("CT").with_position(0.0, 0.0, 0.0).with_health(100),
                PlayerFrame::new(0, "ally").with_team("CT").with_position(0.0, 600.0, 0.0).with_health(100),
                PlayerFrame::new(0, "them").with_team("T").with_position(1500.0, 0.0, 0.0).with_health(100),
            ],
            deaths: vec![DeathRecord::new(640, "me", "them", "ak47").in_round(2, 20.0)],
            ..MatchData::default()
        }
    }

    #[test]
    fn test_smoke_between_victim_and_ally_removes_trade() {
        let config = AnalysisConfig::default();

        let covered = analyze_match(&covered_death_match(), "me", &config).unwrap();
        assert_eq!(covered.deaths[0].trade_teammates, vec!["ally".to_string()]);
        assert!(!covered.deaths[0].risk_factors.no_trade_teammate);
        assert!(!covered.deaths[0].is_avoidable);

        let mut smoked = covered_death_match();
        smoked.grenades.push(GrenadeRecord {
            tick: 600,
            thrower: "them".into(),
            kind: UtilityKind::Smoke,
            position: Some(Vec3::new(0.0, 300.0, 0.0)),
        });
        let report = analyze_match(&smoked, "me", &config).unwrap();
        assert!(report.deaths[0].trade_teammates.is_empty());
        assert!(report.deaths[0].risk_factors.no_trade_teammate);
        assert!(report.deaths[0].is_avoidable);
    }

    // ========================================================================
    // Seeded synthetic match
    // ========================================================================

    fn synthetic_match(seed: u64) -> MatchData {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let players: Vec<String> = (0..10).map(|i| format!("p{}", i)).collect();
        let team = |i: usize| if i < 5 { "CT" } else { "T" };
        let mut data = MatchData { map_name: "de_dust2".into(), ..MatchData::default() };

        for tick in (0..6400).step_by(32) {
            for (i, name) in players.iter().enumerate() {
                let mut frame = PlayerFrame::new(tick, name)
                    .with_team(team(i))
                    .with_position(rng.gen_range(-2600.0..2600.0), rng.gen_range(-2600.0..2600.0), 0.0)
                    .with_angles(rng.gen_range(-30.0..30.0), rng.gen_range(-180.0..180.0))
                    .with_health(100);
                if rng.gen_bool(0.2) {
                    frame = frame.with_equipment(EquipmentSnapshot {
                        total_value: if rng.gen_bool(0.5) { Some(rng.gen_range(0..6000)) } else { None },
                        armor_value: rng.gen_range(0..1000),
                        has_helmet: rng.gen_bool(0.5),
                        has_defuser: rng.gen_bool(0.2),
                        weapon: ["ak47", "m4a1", "awp", "glock", "mp9"][rng.gen_range(0..5)].to_string(),
                    });
                }
                data.frames.push(frame);
            }
        }

        for n in 0..40 {
            let victim = rng.gen_range(0..10);
            let attacker = (victim + 5 + rng.gen_range(0..5)) % 10;
            let attacker = if team(attacker) == team(victim) { (attacker + 5) % 10 } else { attacker };
            data.deaths.push(
                DeathRecord::new(rng.gen_range(64..6400), &players[victim], &players[attacker], "ak47")
                    .in_round(n / 4 + 1, rng.gen_range(0.0..115.0))
                    .with_headshot(rng.gen_bool(0.4)),
            );
        }

        for _ in 0..20 {
            let thrower = rng.gen_range(0..10);
            let tick = rng.gen_range(0..6400);
            for victim in 0..10 {
                if rng.gen_bool(0.3) {
                    data.blinds.push(BlindRecord {
                        tick,
                        thrower: players[thrower].clone(),
                        victim: players[victim].clone(),
                        duration_s: rng.gen_range(0.0..3.0),
                    });
                }
            }
            data.grenades.push(GrenadeRecord {
                tick: rng.gen_range(0..6400),
                thrower: players[thrower].clone(),
                kind: UtilityKind::Smoke,
                position: Some(Vec3::new(rng.gen_range(-2000.0..2000.0), rng.gen_range(-2000.0..2000.0), 0.0)),
            });
        }

        data
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let data = synthetic_match(42);
        let config = AnalysisConfig::default();

        for player in ["p0", "p7"] {
            let first = analyze_match(&data, player, &config).unwrap();
            let second = analyze_match(&data, player, &config).unwrap();
            assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
            assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
        }
    }

    #[test]
    fn test_synthetic_report_invariants() {
        let data = synthetic_match(7);
        let config = AnalysisConfig::default();
        let report = analyze_match(&data, "p3", &config).unwrap();

        assert!(report.findings.len() <= config.ranking.max_findings);
        for pair in report.findings.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
        assert!(!report.findings.is_empty());
        for finding in &report.findings {
            assert!(finding.severity <= 100.0);
            assert!(finding.severity > 0.0 || finding.category == FindingCategory::Consistency);
        }
        for pair in report.highlights.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
        assert!(report.positioning.danger_zones.len() <= config.positioning.max_listed);
        assert_eq!(report.economy.per_bucket.len(), 4);
    }

    #[test]
    fn test_aggregate_of_two_runs() {
        let config = AnalysisConfig::default();
        let reports: Vec<(String, AnalysisReport)> = [7, 8]
            .into_iter()
            .map(|seed| (format!("seed{}", seed), analyze_match(&synthetic_match(seed), "p3", &config).unwrap()))
            .collect();

        let agg = aggregate_reports(&reports, &RankTable::default()).unwrap();
        assert_eq!(agg.demos, vec!["seed7", "seed8"]);
        assert_eq!(agg.summary.total_kills, reports[0].1.overview.kills + reports[1].1.overview.kills);
        assert_eq!(agg.deaths.total, reports[0].1.deaths.len() + reports[1].1.deaths.len());
        assert!(agg.trends.is_some());
        assert!(reports.iter().all(|(_, r)| r.rank.is_some()));
        assert!(agg.rank.is_some());
    }

    #[test]
    fn test_report_matches_schema() {
        let report = analyze_match(&synthetic_match(3), "p1", &AnalysisConfig::default()).unwrap();
        let schema = serde_json::to_value(report_schema()).unwrap();
        let instance = serde_json::to_value(&report).unwrap();

        let compiled = jsonschema::JSONSchema::compile(&schema).unwrap();
        assert!(compiled.is_valid(&instance));
    }
}
