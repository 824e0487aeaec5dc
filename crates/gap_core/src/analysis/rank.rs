//! # Rank Estimation
//!
//! Places a player on the competitive ladder by scoring their rates against
//! every tier's benchmarks.
//!
//! ## Metric score (0-100)
//! - within a tenth of the tolerance of the benchmark: 100
//! - better than the benchmark: 80 plus 20 per tolerance, capped at 100
//! - worse than the benchmark: 80 minus 80 per tolerance, floored at 0
//!
//! A tier's score is the weighted sum of its metric scores. The best tier
//! wins; ties at or above par go to the higher tier, ties below par to the
//! lower one. The Elo estimate sits inside that tier's range in proportion
//! to how far the score is above 80; a score under 80 lands 30% of the way in.

use crate::config::{MetricWeights, RankTable, RankTier};
use crate::report::Overview;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// K/D spread assumed when only one match is available
pub const DEFAULT_KD_STDDEV: f64 = 0.5;
pub const STRENGTH_MIN_SCORE: f64 = 75.0;
pub const WEAKNESS_MAX_SCORE: f64 = 60.0;
/// Strengths and weaknesses listed, each
pub const TOP_METRICS: usize = 3;
pub const HIGH_CONFIDENCE_MARGIN: f64 = 15.0;
pub const MEDIUM_CONFIDENCE_MARGIN: f64 = 8.0;

/// Score at which a metric exactly meets its benchmark
const PAR_SCORE: f64 = 80.0;
const BELOW_PAR_POSITION: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    KdRatio,
    HeadshotRate,
    AimOffset,
    BadAim,
    AvoidableDeaths,
    FlashUsage,
    EconomyDiscipline,
    Consistency,
}

impl RankMetric {
    pub fn label(self) -> &'static str {
        match self {
            RankMetric::KdRatio => "K/D Ratio",
            RankMetric::HeadshotRate => "Headshot Rate",
            RankMetric::AimOffset => "Crosshair Placement",
            RankMetric::BadAim => "Pre-Aim Quality",
            RankMetric::AvoidableDeaths => "Decision Making",
            RankMetric::FlashUsage => "Utility Usage",
            RankMetric::EconomyDiscipline => "Economy Discipline",
            RankMetric::Consistency => "Consistency",
        }
    }

    pub fn higher_is_better(self) -> bool {
        matches!(self, RankMetric::KdRatio | RankMetric::HeadshotRate | RankMetric::FlashUsage)
    }

    /// Distance from the benchmark that counts as one full step.
    pub fn tolerance(self) -> f64 {
        match self {
            RankMetric::KdRatio => 0.3,
            RankMetric::Consistency => 0.2,
            RankMetric::HeadshotRate | RankMetric::AimOffset => 10.0,
            RankMetric::BadAim
            | RankMetric::AvoidableDeaths
            | RankMetric::FlashUsage
            | RankMetric::EconomyDiscipline => 15.0,
        }
    }

    pub fn benchmark(self, tier: &RankTier) -> f64 {
        match self {
            RankMetric::KdRatio => tier.kd_ratio,
            RankMetric::HeadshotRate => tier.headshot_pct,
            RankMetric::AimOffset => tier.aim_offset_deg,
            RankMetric::BadAim => tier.bad_aim_pct,
            RankMetric::AvoidableDeaths => tier.avoidable_pct,
            RankMetric::FlashUsage => tier.flash_useful_pct,
            RankMetric::EconomyDiscipline => tier.expensive_death_pct,
            RankMetric::Consistency => tier.kd_stddev,
        }
    }

    pub fn weight(self, weights: &MetricWeights) -> f64 {
        match self {
            RankMetric::KdRatio => weights.kd_ratio,
            RankMetric::HeadshotRate => weights.headshot_rate,
            RankMetric::AimOffset => weights.aim_offset,
            RankMetric::BadAim => weights.bad_aim,
            RankMetric::AvoidableDeaths => weights.avoidable_deaths,
            RankMetric::FlashUsage => weights.flash_usage,
            RankMetric::EconomyDiscipline => weights.economy_discipline,
            RankMetric::Consistency => weights.consistency,
        }
    }
}

/// K/D as a number: kills alone when the player never died.
pub fn effective_kd(kd_ratio: Option<f64>, kills: usize) -> f64 {
    kd_ratio.unwrap_or(kills as f64)
}

/// The player's side of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RankInputs {
    pub kd_ratio: f64,
    pub headshot_pct: f64,
    pub aim_offset_deg: f64,
    pub bad_aim_pct: f64,
    pub avoidable_pct: f64,
    pub flash_useful_pct: f64,
    pub expensive_death_pct: f64,
    pub kd_stddev: f64,
}

impl RankInputs {
    /// Single-match inputs; consistency falls back to [`DEFAULT_KD_STDDEV`].
    pub fn from_overview(overview: &Overview) -> Self {
        Self {
            kd_ratio: effective_kd(overview.kd_ratio, overview.kills),
            headshot_pct: overview.headshot_rate_pct,
            aim_offset_deg: overview.avg_aim_offset_deg,
            bad_aim_pct: overview.bad_aim_pct,
            avoidable_pct: overview.avoidable_death_pct,
            flash_useful_pct: overview.flash_useful_pct,
            expensive_death_pct: overview.expensive_death_pct,
            kd_stddev: DEFAULT_KD_STDDEV,
        }
    }

    pub fn value(&self, metric: RankMetric) -> f64 {
        match metric {
            RankMetric::KdRatio => self.kd_ratio,
            RankMetric::HeadshotRate => self.headshot_pct,
            RankMetric::AimOffset => self.aim_offset_deg,
            RankMetric::BadAim => self.bad_aim_pct,
            RankMetric::AvoidableDeaths => self.avoidable_pct,
            RankMetric::FlashUsage => self.flash_useful_pct,
            RankMetric::EconomyDiscipline => self.expensive_death_pct,
            RankMetric::Consistency => self.kd_stddev,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RankConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MetricScore {
    pub metric: RankMetric,
    pub value: f64,
    pub benchmark: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TierScore {
    pub tier: String,
    pub score: f64,
}

/// Distance to the next tier on one weighted metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MetricGap {
    pub metric: RankMetric,
    pub current: f64,
    pub target: f64,
    /// Absolute distance
    pub gap: f64,
    pub needs_improvement: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RankProgression {
    pub next_tier: String,
    pub next_label: String,
    pub gaps: Vec<MetricGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RankEstimate {
    pub tier: String,
    /// Tier name with its Elo range
    pub label: String,
    pub elo_estimate: u32,
    pub elo_min: u32,
    pub elo_max: u32,
    pub confidence: RankConfidence,
    /// Weighted score of the chosen tier
    pub score: f64,
    /// Every tier, ladder order
    pub tier_scores: Vec<TierScore>,
    /// Metric scores against the chosen tier
    pub breakdown: Vec<MetricScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub previous_tier: Option<String>,
    /// `None` at the top of the ladder
    pub progression: Option<RankProgression>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Scores one value against one benchmark, 0-100.
pub fn score_metric(value: f64, benchmark: f64, higher_is_better: bool, tolerance: f64) -> f64 {
    if (value - benchmark).abs() < tolerance * 0.1 {
        return 100.0;
    }
    let diff = if higher_is_better { value - benchmark } else { benchmark - value };
    let score = if diff >= 0.0 {
        (PAR_SCORE + diff / tolerance * (100.0 - PAR_SCORE)).min(100.0)
    } else {
        (PAR_SCORE + diff / tolerance * PAR_SCORE).max(0.0)
    };
    round1(score)
}

fn tier_label(tier: &RankTier, is_top: bool) -> String {
    if is_top {
        format!("{} ({}+ Elo)", tier.name, tier.elo_min)
    } else {
        format!("{} ({}-{} Elo)", tier.name, tier.elo_min, tier.elo_max)
    }
}

pub struct RankEstimator<'a> {
    table: &'a RankTable,
}

impl<'a> RankEstimator<'a> {
    pub fn new(table: &'a RankTable) -> Self {
        Self { table }
    }

    pub fn breakdown(&self, inputs: &RankInputs, tier: &RankTier) -> Vec<MetricScore> {
        RankMetric::iter()
            .map(|metric| {
                let value = inputs.value(metric);
                let benchmark = metric.benchmark(tier);
                MetricScore {
                    metric,
                    value,
                    benchmark,
                    score: score_metric(value, benchmark, metric.higher_is_better(), metric.tolerance()),
                }
            })
            .collect()
    }

    pub fn tier_score(&self, breakdown: &[MetricScore]) -> f64 {
        round1(breakdown.iter().map(|m| m.score * m.metric.weight(&self.table.weights)).sum())
    }

    /// `None` when the ladder is empty.
    pub fn estimate(&self, inputs: &RankInputs) -> Option<RankEstimate> {
        let tiers = &self.table.tiers;
        let scores: Vec<f64> = tiers.iter().map(|t| self.tier_score(&self.breakdown(inputs, t))).collect();

        let best = best_tier(&scores)?;
        let score = scores[best];
        let tier = &tiers[best];

        let position = if score >= PAR_SCORE {
            ((score - PAR_SCORE) / (100.0 - PAR_SCORE)).clamp(0.0, 1.0)
        } else {
            BELOW_PAR_POSITION
        };
        let span = tier.elo_max.saturating_sub(tier.elo_min);
        let elo_estimate = tier.elo_min.saturating_add((f64::from(span) * position) as u32);

        let mut breakdown = self.breakdown(inputs, tier);
        let (strengths, weaknesses) = strengths_and_weaknesses(&breakdown);
        breakdown.iter_mut().for_each(|m| m.value = round1(m.value));

        let progression = tiers.get(best + 1).map(|next| RankProgression {
            next_tier: next.name.clone(),
            next_label: tier_label(next, best + 2 == tiers.len()),
            gaps: self.gaps(inputs, next),
        });

        Some(RankEstimate {
            tier: tier.name.clone(),
            label: tier_label(tier, best + 1 == tiers.len()),
            elo_estimate,
            elo_min: tier.elo_min,
            elo_max: tier.elo_max,
            confidence: confidence(&scores, best),
            score,
            tier_scores: tiers.iter().zip(&scores).map(|(t, &s)| TierScore { tier: t.name.clone(), score: s }).collect(),
            breakdown,
            strengths,
            weaknesses,
            previous_tier: best.checked_sub(1).map(|i| tiers[i].name.clone()),
            progression,
        })
    }

    fn gaps(&self, inputs: &RankInputs, next: &RankTier) -> Vec<MetricGap> {
        RankMetric::iter()
            .filter(|m| m.weight(&self.table.weights) > 0.0)
            .map(|metric| {
                let current = inputs.value(metric);
                let target = metric.benchmark(next);
                let gap = if metric.higher_is_better() { target - current } else { current - target };
                MetricGap {
                    metric,
                    current: round1(current),
                    target,
                    gap: round1(gap.abs()),
                    needs_improvement: gap > 0.0,
                }
            })
            .collect()
    }
}

/// Index of the top score. Beating a benchmark saturates at 100, so among
/// tied tiers at or above par the highest wins; below par the lowest does.
fn best_tier(scores: &[f64]) -> Option<usize> {
    let top = scores.iter().copied().reduce(f64::max)?;
    let mut tied = scores.iter().enumerate().filter(|&(_, &s)| s == top).map(|(i, _)| i);
    if top >= PAR_SCORE {
        tied.last()
    } else {
        tied.next()
    }
}

/// Margin of the best tier over the mean of its neighbours.
fn confidence(scores: &[f64], best: usize) -> RankConfidence {
    let neighbours: Vec<f64> = [best.checked_sub(1), Some(best + 1)]
        .into_iter()
        .flatten()
        .filter_map(|i| scores.get(i).copied())
        .collect();
    if neighbours.is_empty() {
        return RankConfidence::High;
    }
    let margin = scores[best] - neighbours.iter().sum::<f64>() / neighbours.len() as f64;
    if margin > HIGH_CONFIDENCE_MARGIN {
        RankConfidence::High
    } else if margin > MEDIUM_CONFIDENCE_MARGIN {
        RankConfidence::Medium
    } else {
        RankConfidence::Low
    }
}

fn strengths_and_weaknesses(breakdown: &[MetricScore]) -> (Vec<String>, Vec<String>) {
    let mut sorted: Vec<&MetricScore> = breakdown.iter().collect();
    // Stable: equal scores keep metric order.
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    let strengths = sorted
        .iter()
        .take(TOP_METRICS)
        .filter(|m| m.score >= STRENGTH_MIN_SCORE)
        .map(|m| m.metric.label().to_string())
        .collect();
    let tail = sorted.len().saturating_sub(TOP_METRICS);
    let weaknesses = sorted[tail..]
        .iter()
        .filter(|m| m.score < WEAKNESS_MAX_SCORE)
        .map(|m| m.metric.label().to_string())
        .collect();
    (strengths, weaknesses)
}
