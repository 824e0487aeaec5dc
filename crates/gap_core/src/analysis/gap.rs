//! # Gap Analyzer
//!
//! Orchestrates one analysis run:
//!
//! 1. build the [`StateIndex`] and enrich the player's events
//! 2. classify every death, kill and flash
//! 3. aggregate positioning and economy (independently, in parallel)
//! 4. score and rank findings, pick highlights
//!
//! ## Avoidable deaths
//! Two stages, both required:
//! - risk factors: no trade-capable teammate, no utility in the window;
//!   at least [`AVOIDABLE_MIN_RISK_FACTORS`] must be present
//! - advantages: attacker blinded, teammate for the trade, close range,
//!   utility used; none may be present
//!
//! With only two risk factors the first stage means "both present". That
//! is kept as is.

use super::aim::{percentage, AimSample, AimSummary, AimTracker};
use super::economy::{EconomyAnalyzer, EconomyReport};
use super::highlights::{self, HighlightInputs};
use super::positioning::PositioningAnalyzer;
use super::rank::{RankEstimator, RankInputs};
use super::ranking::{rank, score_categories, FindingMetrics};
use crate::config::{AnalysisConfig, FlashThresholds, StaticTables};
use crate::error::{AnalysisError, Result};
use crate::geometry::{self, Vec3};
use crate::replay::{DeathEvent, FlashEvent, KillEvent, MatchData};
use crate::report::{AimReport, AnalysisReport, Overview};
use crate::state::{PositionSample, StateIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Risk factors required before a death can be avoidable.
pub const AVOIDABLE_MIN_RISK_FACTORS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RiskFactors {
    pub no_trade_teammate: bool,
    pub no_utility: bool,
}

impl RiskFactors {
    pub fn count(&self) -> usize {
        usize::from(self.no_trade_teammate) + usize::from(self.no_utility)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Advantages {
    pub attacker_blinded: bool,
    pub teammate_for_trade: bool,
    pub close_range: bool,
    pub utility_used: bool,
}

impl Advantages {
    pub fn any(&self) -> bool {
        self.attacker_blinded || self.teammate_for_trade || self.close_range || self.utility_used
    }
}

pub fn is_avoidable_death(risk: &RiskFactors, advantages: &Advantages) -> bool {
    risk.count() >= AVOIDABLE_MIN_RISK_FACTORS && !advantages.any()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DeathAssessment {
    pub tick: i64,
    pub round: u32,
    pub round_time_s: Option<f64>,
    pub attacker: Option<String>,
    pub weapon: String,
    pub risk_factors: RiskFactors,
    pub advantages: Advantages,
    pub is_avoidable: bool,
    pub had_advantage: bool,
    pub trade_teammates: Vec<String>,
    pub attacker_distance: Option<f64>,
    /// Crosshair offset to the attacker, when measurable
    pub aim: Option<AimSample>,
    pub equipment_value: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct KillAssessment {
    pub tick: i64,
    pub round: u32,
    pub round_time_s: Option<f64>,
    pub victim: String,
    pub weapon: String,
    pub headshot: bool,
    /// Crosshair offset to the victim, when measurable
    pub aim: Option<AimSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FlashAssessment {
    pub tick: i64,
    pub round: Option<u32>,
    pub round_time_s: Option<f64>,
    pub players_blinded: usize,
    pub enemies_blinded: usize,
    pub longest_enemy_blind_s: f64,
    pub followed_by_kill: bool,
    pub is_useful: bool,
    pub is_pop_flash: bool,
    /// Largest thrower displacement inside the pop window
    pub max_displacement: f64,
}

/// Useful: an enemy blinded longer than the threshold, or a follow-up kill.
pub fn is_useful_flash(longest_enemy_blind_s: f64, followed_by_kill: bool, thresholds: &FlashThresholds) -> bool {
    longest_enemy_blind_s > thresholds.useful_blind_s || followed_by_kill
}

/// Largest distance from the throw position over the post-throw samples.
pub fn max_displacement(throw_position: &Vec3, samples: &[PositionSample]) -> f64 {
    samples
        .iter()
        .map(|s| geometry::distance(throw_position, &s.position))
        .fold(0.0, f64::max)
}

/// Any tick in `(after, after + window]`.
fn any_within(sorted_ticks: &[i64], after: i64, window: i64) -> bool {
    let from = sorted_ticks.partition_point(|&t| t <= after);
    sorted_ticks.get(from).map_or(false, |&t| t <= after + window)
}

pub struct GapAnalyzer<'a> {
    config: &'a AnalysisConfig,
    tables: &'a StaticTables,
}

impl<'a> GapAnalyzer<'a> {
    pub fn new(config: &'a AnalysisConfig, tables: &'a StaticTables) -> Self {
        Self { config, tables }
    }

    pub fn assess_death(&self, event: &DeathEvent, aim: &mut AimTracker<'_>) -> DeathAssessment {
        let ctx = &event.context;
        let attacker_distance = event.attacker_distance();

        let risk_factors = RiskFactors {
            no_trade_teammate: ctx.trade_teammates.is_empty(),
            no_utility: !ctx.utility_used,
        };
        let advantages = Advantages {
            attacker_blinded: ctx.attacker_blinded,
            teammate_for_trade: !ctx.trade_teammates.is_empty(),
            close_range: attacker_distance.map_or(false, |d| d < self.config.engagement.close_range_units),
            utility_used: ctx.utility_used,
        };

        let offset = match (event.victim_angles, event.attacker_position) {
            (Some(angles), Some(attacker)) => aim.record(
                event.tick(),
                event.record.attacker.as_deref(),
                geometry::aim_offset_angle(angles, &event.victim_position, &attacker),
            ),
            _ => None,
        };

        DeathAssessment {
            tick: event.tick(),
            round: event.record.round,
            round_time_s: event.record.round_time_s,
            attacker: event.record.attacker.clone(),
            weapon: event.record.weapon.clone(),
            risk_factors,
            advantages,
            is_avoidable: is_avoidable_death(&risk_factors, &advantages),
            had_advantage: advantages.any(),
            trade_teammates: ctx.trade_teammates.clone(),
            attacker_distance,
            aim: offset,
            equipment_value: event
                .equipment
                .as_ref()
                .map(|e| super::economy::value_at(e, &self.tables.prices)),
        }
    }

    pub fn assess_kill(&self, event: &KillEvent, aim: &mut AimTracker<'_>) -> KillAssessment {
        let offset = match (event.attacker_angles, event.victim_position) {
            (Some(angles), Some(victim)) => aim.record(
                event.tick(),
                Some(event.record.victim.as_str()),
                geometry::aim_offset_angle(angles, &event.attacker_position, &victim),
            ),
            _ => None,
        };

        KillAssessment {
            tick: event.tick(),
            round: event.record.round,
            round_time_s: event.record.round_time_s,
            victim: event.record.victim.clone(),
            weapon: event.record.weapon.clone(),
            headshot: event.record.headshot,
            aim: offset,
        }
    }

    pub fn assess_flash(&self, event: &FlashEvent, kill_ticks: &[i64]) -> FlashAssessment {
        let t = &self.config.flash;
        let longest = event.longest_enemy_blind_s();
        let followed_by_kill = any_within(kill_ticks, event.tick, self.config.ticks(t.kill_window_s));
        let displacement = max_displacement(&event.throw_position, &event.thrower_samples);

        FlashAssessment {
            tick: event.tick,
            round: event.round,
            round_time_s: event.round_time_s,
            players_blinded: event.affected.len(),
            enemies_blinded: event.enemies_blinded(),
            longest_enemy_blind_s: longest,
            followed_by_kill,
            is_useful: is_useful_flash(longest, followed_by_kill, t),
            is_pop_flash: displacement > t.pop_move_units,
            max_displacement: displacement,
        }
    }

    /// Full pipeline for one player. Fails only when the player never
    /// appears in the match.
    pub fn analyze(&self, data: &MatchData, player: &str) -> Result<AnalysisReport> {
        if !data.mentions_player(player) {
            return Err(AnalysisError::PlayerNotFound { player: player.to_string() });
        }

        let index = StateIndex::build(data, self.config);
        let events = index.enrich(data, player, self.config);
        debug!(
            deaths = events.deaths.len(),
            kills = events.kills.len(),
            flashes = events.flashes.len(),
            skipped = events.skipped.len(),
            "events enriched"
        );

        let mut death_aim = AimTracker::new(&self.config.aim);
        let deaths: Vec<DeathAssessment> =
            events.deaths.iter().map(|d| self.assess_death(d, &mut death_aim)).collect();
        let mut kill_aim = AimTracker::new(&self.config.aim);
        let kills: Vec<KillAssessment> = events.kills.iter().map(|k| self.assess_kill(k, &mut kill_aim)).collect();

        let kill_ticks: Vec<i64> = events.kills.iter().map(KillEvent::tick).collect();
        let flashes: Vec<FlashAssessment> = events.flashes.iter().map(|f| self.assess_flash(f, &kill_ticks)).collect();

        let aim = AimReport { deaths: death_aim.finish(), kills: kill_aim.finish() };

        let death_positions: Vec<Vec3> = events.deaths.iter().map(|d| d.victim_position).collect();
        let kill_positions: Vec<Vec3> = events.kills.iter().map(|k| k.attacker_position).collect();
        let positioning_analyzer = PositioningAnalyzer::new(&self.tables.zones, &data.map_name, &self.config.positioning);
        let economy_analyzer = EconomyAnalyzer::new(&self.tables.prices, &self.config.economy);

        let (positioning, economy) = rayon::join(
            || positioning_analyzer.analyze(&death_positions, &kill_positions),
            || economy_analyzer.aggregate(&events.deaths, &events.kills),
        );

        let overview = self.overview(&deaths, &kills, &flashes, &aim.deaths, &economy, events.skipped.len());
        let findings = rank(
            score_categories(&self.metrics(&overview, &aim.deaths, &economy), &self.config.ranking),
            self.config.ranking.max_findings,
        );

        let rank = RankEstimator::new(&self.tables.ranks).estimate(&RankInputs::from_overview(&overview));

        let death_ticks: Vec<i64> = deaths.iter().map(|d| d.tick).collect();
        let highlights = highlights::collect(&HighlightInputs {
            deaths: &deaths,
            kills: &kills,
            flashes: &flashes,
            death_ticks: &death_ticks,
            economy: &economy,
            config: self.config,
        });

        info!(
            player,
            map = %data.map_name,
            findings = findings.len(),
            tier = rank.as_ref().map_or("-", |r| r.tier.as_str()),
            highlights = highlights.len(),
            skipped = events.skipped.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            player: player.to_string(),
            map_name: data.map_name.clone(),
            overview,
            findings,
            rank,
            aim,
            deaths,
            kills,
            flashes,
            positioning,
            economy,
            highlights,
            skipped: events.skipped,
        })
    }

    fn overview(
        &self,
        deaths: &[DeathAssessment],
        kills: &[KillAssessment],
        flashes: &[FlashAssessment],
        death_aim: &AimSummary,
        economy: &EconomyReport,
        skipped_events: usize,
    ) -> Overview {
        let avoidable = deaths.iter().filter(|d| d.is_avoidable).count();
        let disadvantaged = deaths.iter().filter(|d| !d.had_advantage).count();
        let headshots = kills.iter().filter(|k| k.headshot).count();
        let useful = flashes.iter().filter(|f| f.is_useful).count();
        let pops = flashes.iter().filter(|f| f.is_pop_flash).count();

        Overview {
            kills: kills.len(),
            deaths: deaths.len(),
            kd_ratio: if deaths.is_empty() { None } else { Some(kills.len() as f64 / deaths.len() as f64) },
            headshot_rate_pct: percentage(headshots, kills.len()),
            avg_aim_offset_deg: death_aim.average_offset_deg,
            bad_aim_pct: death_aim.bad_or_worse_pct,
            avoidable_death_pct: percentage(avoidable, deaths.len()),
            disadvantaged_duel_pct: percentage(disadvantaged, deaths.len()),
            flashes: flashes.len(),
            flash_useful_pct: percentage(useful, flashes.len()),
            pop_flash_pct: percentage(pops, flashes.len()),
            total_value_lost: economy.total_value_lost,
            avg_value_lost: economy.avg_value_lost,
            expensive_death_pct: economy.expensive_death_pct,
            net_economy: economy.net_economy,
            skipped_events,
        }
    }

    fn metrics(&self, overview: &Overview, death_aim: &AimSummary, economy: &EconomyReport) -> FindingMetrics {
        FindingMetrics {
            aim_samples: death_aim.samples,
            bad_aim_pct: death_aim.bad_or_worse_pct,
            deaths: overview.deaths,
            avoidable_pct: overview.avoidable_death_pct,
            disadvantaged_pct: overview.disadvantaged_duel_pct,
            flashes: overview.flashes,
            flash_useful_pct: overview.flash_useful_pct,
            pop_flash_pct: overview.pop_flash_pct,
            kills: overview.kills,
            headshot_pct: overview.headshot_rate_pct,
            valued_deaths: economy.valued_deaths,
            expensive_death_pct: economy.expensive_death_pct,
            high_value_death: self.config.economy.high_value_death,
        }
    }
}
