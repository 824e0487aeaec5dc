//! # Multi-Match Aggregation
//!
//! Folds several single-match reports for the same player into one view:
//! averages and totals, consistency, recurring findings, and a first-half
//! versus second-half trend. Reports are taken in the order given, which is
//! assumed to be chronological.

use super::aim::{percentage, AimBucket, AimSample};
use super::economy::RoundEconomyBucket;
use super::positioning::ZoneStats;
use super::rank::{effective_kd, RankEstimate, RankEstimator, RankInputs, DEFAULT_KD_STDDEV};
use super::ranking::FindingCategory;
use crate::config::RankTable;
use crate::error::{AnalysisError, Result};
use crate::report::AnalysisReport;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::info;

pub const WORST_AIM_LISTED: usize = 10;
pub const DEATH_WEAPONS_LISTED: usize = 5;
pub const RECURRING_FINDINGS_LISTED: usize = 5;
pub const ZONES_LISTED: usize = 3;
/// Zones need this many kills plus deaths to be ranked best or worst
pub const MIN_ZONE_ENGAGEMENTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    High,
    Medium,
    Low,
}

impl ConsistencyLevel {
    fn from_spread(stddev: f64, high_below: f64, medium_below: f64) -> Self {
        if stddev < high_below {
            ConsistencyLevel::High
        } else if stddev < medium_below {
            ConsistencyLevel::Medium
        } else {
            ConsistencyLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregateSummary {
    pub avg_kd_ratio: f64,
    /// Sample standard deviation; 0 for a single match
    pub kd_stddev: f64,
    pub avg_headshot_rate_pct: f64,
    pub headshot_stddev: f64,
    pub avg_aim_offset_deg: f64,
    pub avg_bad_aim_pct: f64,
    pub avg_avoidable_death_pct: f64,
    pub avg_disadvantaged_duel_pct: f64,
    pub avg_flash_useful_pct: f64,
    pub avg_pop_flash_pct: f64,
    pub total_kills: usize,
    pub total_deaths: usize,
    pub total_flashes: usize,
    pub total_value_lost: u64,
    pub avg_value_lost: f64,
    pub avg_expensive_death_pct: f64,
    pub kd_consistency: ConsistencyLevel,
    pub headshot_consistency: ConsistencyLevel,
}

/// An aim sample tagged with the match it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DemoAimSample {
    pub demo: String,
    pub sample: AimSample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregateAim {
    pub avg_offset_deg: f64,
    pub samples: usize,
    /// Bad or terrible
    pub bad: usize,
    pub bad_pct: f64,
    /// Terrible death samples across matches, largest offset first
    pub worst: Vec<DemoAimSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WeaponCount {
    pub weapon: String,
    pub deaths: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregateDeaths {
    pub total: usize,
    pub avoidable: usize,
    pub avoidable_pct: f64,
    pub disadvantaged: usize,
    pub disadvantaged_pct: f64,
    pub top_weapons: Vec<WeaponCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregateUtility {
    pub flashes: usize,
    pub useful: usize,
    pub useful_pct: f64,
    pub pop_flashes: usize,
    pub pop_flash_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregateBucket {
    pub bucket: RoundEconomyBucket,
    pub deaths: usize,
    pub total_value_lost: u64,
    pub avg_value_lost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregateEconomy {
    pub total_value_lost: u64,
    /// Mean of the per-match averages
    pub avg_value_lost: f64,
    pub avg_expensive_death_pct: f64,
    /// Every tier, in ladder order
    pub per_bucket: Vec<AggregateBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregatePositioning {
    /// Summed per zone, by name
    pub zones: Vec<ZoneStats>,
    /// Lowest K/D first
    pub worst_zones: Vec<ZoneStats>,
    /// Highest K/D first
    pub best_zones: Vec<ZoneStats>,
}

/// A finding category seen across matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RecurringFinding {
    pub category: FindingCategory,
    pub label: String,
    /// Matches whose findings include the category
    pub appearances: usize,
    pub frequency_pct: f64,
    pub avg_severity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TrendLine {
    pub trend: Trend,
    /// Second-half mean minus first-half mean
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Trends {
    pub kd_ratio: TrendLine,
    pub headshot_rate: TrendLine,
    /// Lower is better
    pub bad_aim: TrendLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DemoValue {
    pub demo: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Standouts {
    pub best_kd: DemoValue,
    pub worst_kd: DemoValue,
    /// Lowest bad-aim share
    pub best_aim: DemoValue,
    pub worst_aim: DemoValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AggregateReport {
    pub player: String,
    /// Taken from the first match
    pub map_name: String,
    /// In input order
    pub demos: Vec<String>,
    pub summary: AggregateSummary,
    pub aim: AggregateAim,
    pub deaths: AggregateDeaths,
    pub utility: AggregateUtility,
    pub economy: AggregateEconomy,
    pub positioning: AggregatePositioning,
    pub findings: Vec<RecurringFinding>,
    /// `None` for a single match
    pub trends: Option<Trends>,
    pub standouts: Standouts,
    pub rank: Option<RankEstimate>,
}

impl AggregateReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn trend_line(values: &[f64], higher_is_better: bool) -> TrendLine {
    let (first, second) = values.split_at(values.len() / 2);
    let change = mean(second) - mean(first);
    let trend = match change.partial_cmp(&0.0) {
        Some(Ordering::Greater) if higher_is_better => Trend::Improving,
        Some(Ordering::Less) if !higher_is_better => Trend::Improving,
        Some(Ordering::Greater) | Some(Ordering::Less) => Trend::Declining,
        _ => Trend::Stable,
    };
    TrendLine { trend, change }
}

/// Zone K/D for ordering; a zone without deaths ranks above every finite ratio.
fn zone_kd(zone: &ZoneStats) -> f64 {
    zone.kd_ratio.unwrap_or(f64::INFINITY)
}

/// Aggregates `(demo name, report)` pairs for one player.
pub fn aggregate_reports(reports: &[(String, AnalysisReport)], ranks: &RankTable) -> Result<AggregateReport> {
    let Some((_, first)) = reports.first() else {
        return Err(AnalysisError::Aggregation("no reports to aggregate".to_string()));
    };
    if let Some((demo, other)) = reports.iter().find(|(_, r)| r.player != first.player) {
        return Err(AnalysisError::Aggregation(format!(
            "{} is for player {}, expected {}",
            demo, other.player, first.player
        )));
    }

    let kds: Vec<f64> = reports.iter().map(|(_, r)| effective_kd(r.overview.kd_ratio, r.overview.kills)).collect();
    let headshots: Vec<f64> = reports.iter().map(|(_, r)| r.overview.headshot_rate_pct).collect();
    let bad_aim: Vec<f64> = reports.iter().map(|(_, r)| r.overview.bad_aim_pct).collect();

    let summary = summarize(reports, &kds, &headshots, &bad_aim);

    let rank = RankEstimator::new(ranks).estimate(&RankInputs {
        kd_ratio: summary.avg_kd_ratio,
        headshot_pct: summary.avg_headshot_rate_pct,
        aim_offset_deg: summary.avg_aim_offset_deg,
        bad_aim_pct: summary.avg_bad_aim_pct,
        avoidable_pct: summary.avg_avoidable_death_pct,
        flash_useful_pct: summary.avg_flash_useful_pct,
        expensive_death_pct: summary.avg_expensive_death_pct,
        kd_stddev: if reports.len() < 2 { DEFAULT_KD_STDDEV } else { summary.kd_stddev },
    });

    let trends = (reports.len() >= 2).then(|| Trends {
        kd_ratio: trend_line(&kds, true),
        headshot_rate: trend_line(&headshots, true),
        bad_aim: trend_line(&bad_aim, false),
    });

    let aggregate = AggregateReport {
        player: first.player.clone(),
        map_name: first.map_name.clone(),
        demos: reports.iter().map(|(demo, _)| demo.clone()).collect(),
        aim: aggregate_aim(reports),
        deaths: aggregate_deaths(reports),
        utility: aggregate_utility(reports),
        economy: aggregate_economy(reports),
        positioning: aggregate_positioning(reports),
        findings: recurring_findings(reports),
        trends,
        standouts: standouts(reports, &kds, &bad_aim),
        summary,
        rank,
    };

    info!(
        player = %aggregate.player,
        matches = reports.len(),
        tier = aggregate.rank.as_ref().map_or("-", |r| r.tier.as_str()),
        "aggregation complete"
    );
    Ok(aggregate)
}

fn summarize(reports: &[(String, AnalysisReport)], kds: &[f64], headshots: &[f64], bad_aim: &[f64]) -> AggregateSummary {
    let avg = |f: fn(&AnalysisReport) -> f64| mean(&reports.iter().map(|(_, r)| f(r)).collect::<Vec<_>>());
    let kd_stddev = sample_stddev(kds);
    let headshot_stddev = sample_stddev(headshots);

    AggregateSummary {
        avg_kd_ratio: mean(kds),
        kd_stddev,
        avg_headshot_rate_pct: mean(headshots),
        headshot_stddev,
        avg_aim_offset_deg: avg(|r| r.overview.avg_aim_offset_deg),
        avg_bad_aim_pct: mean(bad_aim),
        avg_avoidable_death_pct: avg(|r| r.overview.avoidable_death_pct),
        avg_disadvantaged_duel_pct: avg(|r| r.overview.disadvantaged_duel_pct),
        avg_flash_useful_pct: avg(|r| r.overview.flash_useful_pct),
        avg_pop_flash_pct: avg(|r| r.overview.pop_flash_pct),
        total_kills: reports.iter().map(|(_, r)| r.overview.kills).sum(),
        total_deaths: reports.iter().map(|(_, r)| r.overview.deaths).sum(),
        total_flashes: reports.iter().map(|(_, r)| r.overview.flashes).sum(),
        total_value_lost: reports.iter().map(|(_, r)| r.overview.total_value_lost).sum(),
        avg_value_lost: avg(|r| r.overview.avg_value_lost),
        avg_expensive_death_pct: avg(|r| r.overview.expensive_death_pct),
        kd_consistency: ConsistencyLevel::from_spread(kd_stddev, 0.3, 0.6),
        headshot_consistency: ConsistencyLevel::from_spread(headshot_stddev, 5.0, 10.0),
    }
}

fn aggregate_aim(reports: &[(String, AnalysisReport)]) -> AggregateAim {
    let offsets: Vec<f64> = reports.iter().map(|(_, r)| r.aim.deaths.average_offset_deg).collect();
    let samples = reports.iter().map(|(_, r)| r.aim.deaths.samples).sum();
    let bad = reports.iter().map(|(_, r)| r.aim.deaths.bad + r.aim.deaths.terrible).sum();

    let mut worst: Vec<DemoAimSample> = reports
        .iter()
        .flat_map(|(demo, r)| {
            r.aim
                .deaths
                .worst
                .iter()
                .filter(|s| s.bucket == AimBucket::Terrible)
                .map(move |s| DemoAimSample { demo: demo.clone(), sample: s.clone() })
        })
        .collect();
    worst.sort_by(|a, b| b.sample.offset_deg.total_cmp(&a.sample.offset_deg));
    worst.truncate(WORST_AIM_LISTED);

    AggregateAim { avg_offset_deg: mean(&offsets), samples, bad, bad_pct: percentage(bad, samples), worst }
}

fn aggregate_deaths(reports: &[(String, AnalysisReport)]) -> AggregateDeaths {
    let deaths = reports.iter().flat_map(|(_, r)| &r.deaths);
    let mut total = 0;
    let mut avoidable = 0;
    let mut disadvantaged = 0;
    let mut weapons: BTreeMap<&str, usize> = BTreeMap::new();
    for d in deaths {
        total += 1;
        avoidable += usize::from(d.is_avoidable);
        disadvantaged += usize::from(!d.had_advantage);
        *weapons.entry(d.weapon.as_str()).or_default() += 1;
    }

    let mut top_weapons: Vec<WeaponCount> =
        weapons.into_iter().map(|(weapon, deaths)| WeaponCount { weapon: weapon.to_string(), deaths }).collect();
    // Map order gives name ties; stable sort keeps it.
    top_weapons.sort_by(|a, b| b.deaths.cmp(&a.deaths));
    top_weapons.truncate(DEATH_WEAPONS_LISTED);

    AggregateDeaths {
        total,
        avoidable,
        avoidable_pct: percentage(avoidable, total),
        disadvantaged,
        disadvantaged_pct: percentage(disadvantaged, total),
        top_weapons,
    }
}

fn aggregate_utility(reports: &[(String, AnalysisReport)]) -> AggregateUtility {
    let flashes: Vec<_> = reports.iter().flat_map(|(_, r)| &r.flashes).collect();
    let useful = flashes.iter().filter(|f| f.is_useful).count();
    let pop_flashes = flashes.iter().filter(|f| f.is_pop_flash).count();
    AggregateUtility {
        flashes: flashes.len(),
        useful,
        useful_pct: percentage(useful, flashes.len()),
        pop_flashes,
        pop_flash_pct: percentage(pop_flashes, flashes.len()),
    }
}

fn aggregate_economy(reports: &[(String, AnalysisReport)]) -> AggregateEconomy {
    let per_bucket = RoundEconomyBucket::iter()
        .map(|bucket| {
            let stats = reports.iter().flat_map(|(_, r)| &r.economy.per_bucket).filter(|b| b.bucket == bucket);
            let (deaths, total_value_lost) =
                stats.fold((0, 0u64), |(d, v), b| (d + b.death_count, v.saturating_add(b.total_value_lost)));
            let avg_value_lost = if deaths == 0 { 0.0 } else { total_value_lost as f64 / deaths as f64 };
            AggregateBucket { bucket, deaths, total_value_lost, avg_value_lost }
        })
        .collect();

    let avg_losses: Vec<f64> = reports.iter().map(|(_, r)| r.economy.avg_value_lost).collect();
    let expensive: Vec<f64> = reports.iter().map(|(_, r)| r.economy.expensive_death_pct).collect();
    AggregateEconomy {
        total_value_lost: reports.iter().map(|(_, r)| r.economy.total_value_lost).sum(),
        avg_value_lost: mean(&avg_losses),
        avg_expensive_death_pct: mean(&expensive),
        per_bucket,
    }
}

fn aggregate_positioning(reports: &[(String, AnalysisReport)]) -> AggregatePositioning {
    let mut zones: BTreeMap<&str, ZoneStats> = BTreeMap::new();
    for z in reports.iter().flat_map(|(_, r)| &r.positioning.zones) {
        let entry = zones.entry(z.zone.as_str()).or_insert_with(|| ZoneStats::new(&z.zone));
        entry.kills += z.kills;
        entry.deaths += z.deaths;
    }
    let zones: Vec<ZoneStats> = zones
        .into_values()
        .map(|mut z| {
            z.refresh_ratio();
            z
        })
        .collect();

    let mut ranked: Vec<&ZoneStats> = zones.iter().filter(|z| z.engagements() >= MIN_ZONE_ENGAGEMENTS).collect();
    ranked.sort_by(|a, b| zone_kd(a).total_cmp(&zone_kd(b)).then_with(|| a.zone.cmp(&b.zone)));
    let worst_zones = ranked.iter().take(ZONES_LISTED).map(|&z| z.clone()).collect();
    let best_zones = ranked.iter().rev().take(ZONES_LISTED).map(|&z| z.clone()).collect();

    AggregatePositioning { zones, worst_zones, best_zones }
}

fn recurring_findings(reports: &[(String, AnalysisReport)]) -> Vec<RecurringFinding> {
    let mut seen: Vec<(FindingCategory, usize, f64)> = Vec::new();
    for f in reports.iter().flat_map(|(_, r)| &r.findings) {
        match seen.iter_mut().find(|(c, _, _)| *c == f.category) {
            Some((_, count, total)) => {
                *count += 1;
                *total += f.severity;
            }
            None => seen.push((f.category, 1, f.severity)),
        }
    }

    let mut recurring: Vec<RecurringFinding> = seen
        .into_iter()
        .map(|(category, appearances, total)| RecurringFinding {
            category,
            label: category.label().to_string(),
            appearances,
            frequency_pct: percentage(appearances, reports.len()),
            avg_severity: ((total / appearances as f64) * 10.0).round() / 10.0,
        })
        .collect();
    recurring.sort_by(|a, b| {
        b.avg_severity
            .total_cmp(&a.avg_severity)
            .then_with(|| a.category.precedence().cmp(&b.category.precedence()))
    });
    recurring.truncate(RECURRING_FINDINGS_LISTED);
    recurring
}

fn standouts(reports: &[(String, AnalysisReport)], kds: &[f64], bad_aim: &[f64]) -> Standouts {
    let pick = |values: &[f64], highest: bool| {
        let cmp = |a: &(usize, &f64), b: &(usize, &f64)| a.1.total_cmp(b.1);
        let found = if highest { values.iter().enumerate().max_by(cmp) } else { values.iter().enumerate().min_by(cmp) };
        let (i, &value) = found.unwrap_or((0, &0.0));
        DemoValue { demo: reports.get(i).map(|(demo, _)| demo.clone()).unwrap_or_default(), value }
    };
    Standouts {
        best_kd: pick(kds, true),
        worst_kd: pick(kds, false),
        best_aim: pick(bad_aim, false),
        worst_aim: pick(bad_aim, true),
    }
}
