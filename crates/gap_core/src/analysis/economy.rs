//! # Economy Analyzer
//!
//! Values the player's equipment at each death and kill and aggregates what
//! was lost and earned, per buy tier.
//!
//! ## Valuation
//! An authoritative `total_value` is used as-is, even when it disagrees
//! with the components. Otherwise the value is weapon price + armor value
//! + helmet bonus + kit bonus. The two paths are never mixed.
//!
//! ## Buy tiers
//! `< pistol_cap` pistol, `< eco_cap` eco, `< full_buy_cap` force-buy,
//! otherwise full-buy.

use crate::config::{EconomyThresholds, PriceTable};
use crate::replay::{DeathEvent, EquipmentSnapshot, KillEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RoundEconomyBucket {
    Pistol,
    Eco,
    ForceBuy,
    FullBuy,
}

impl RoundEconomyBucket {
    pub fn label(self) -> &'static str {
        match self {
            RoundEconomyBucket::Pistol => "pistol",
            RoundEconomyBucket::Eco => "eco",
            RoundEconomyBucket::ForceBuy => "force-buy",
            RoundEconomyBucket::FullBuy => "full-buy",
        }
    }
}

pub fn bucket_of(spend: u32, thresholds: &EconomyThresholds) -> RoundEconomyBucket {
    if spend < thresholds.pistol_cap {
        RoundEconomyBucket::Pistol
    } else if spend < thresholds.eco_cap {
        RoundEconomyBucket::Eco
    } else if spend < thresholds.full_buy_cap {
        RoundEconomyBucket::ForceBuy
    } else {
        RoundEconomyBucket::FullBuy
    }
}

pub fn value_at(snapshot: &EquipmentSnapshot, prices: &PriceTable) -> u32 {
    if let Some(total) = snapshot.total_value {
        return total;
    }

    let helmet = if snapshot.has_helmet { prices.helmet_bonus } else { 0 };
    let kit = if snapshot.has_defuser { prices.kit_bonus } else { 0 };
    prices
        .weapon_price(&snapshot.weapon)
        .saturating_add(snapshot.armor_value)
        .saturating_add(helmet)
        .saturating_add(kit)
}

/// Per-tier totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BucketStats {
    pub bucket: RoundEconomyBucket,
    pub death_count: usize,
    pub total_value_lost: u64,
    pub avg_value_lost: f64,
    pub kill_count: usize,
    pub kill_reward: u64,
}

impl BucketStats {
    fn empty(bucket: RoundEconomyBucket) -> Self {
        Self { bucket, death_count: 0, total_value_lost: 0, avg_value_lost: 0.0, kill_count: 0, kill_reward: 0 }
    }
}

/// A valued death, as listed among the worst losses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LossEntry {
    pub tick: i64,
    pub round: u32,
    pub value: u32,
    pub bucket: RoundEconomyBucket,
    pub weapon: String,
    pub attacker: Option<String>,
}

/// Buy tier of one round, from the most valuable equipment seen in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RoundTier {
    pub round: u32,
    pub peak_value: u32,
    pub bucket: RoundEconomyBucket,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EconomyReport {
    pub valued_deaths: usize,
    /// Deaths with no known equipment; excluded from every value figure
    pub unvalued_deaths: usize,
    pub total_value_lost: u64,
    pub avg_value_lost: f64,
    pub expensive_deaths: usize,
    /// Share of valued deaths above `high_value_death`
    pub expensive_death_pct: f64,
    /// Every tier, in ladder order
    pub per_bucket: Vec<BucketStats>,
    pub worst_losses: Vec<LossEntry>,
    pub total_kill_reward: u64,
    /// Kill rewards minus value lost
    pub net_economy: i64,
    pub round_tiers: Vec<RoundTier>,
}

pub struct EconomyAnalyzer<'a> {
    prices: &'a PriceTable,
    thresholds: &'a EconomyThresholds,
}

impl<'a> EconomyAnalyzer<'a> {
    pub fn new(prices: &'a PriceTable, thresholds: &'a EconomyThresholds) -> Self {
        Self { prices, thresholds }
    }

    pub fn value_at(&self, snapshot: &EquipmentSnapshot) -> u32 {
        value_at(snapshot, self.prices)
    }

    pub fn bucket_of(&self, spend: u32) -> RoundEconomyBucket {
        bucket_of(spend, self.thresholds)
    }

    /// Value each death that has known equipment.
    pub fn value_deaths(&self, deaths: &[DeathEvent]) -> Vec<LossEntry> {
        deaths
            .iter()
            .filter_map(|d| {
                let equipment = d.equipment.as_ref()?;
                let value = self.value_at(equipment);
                Some(LossEntry {
                    tick: d.tick(),
                    round: d.record.round,
                    value,
                    bucket: self.bucket_of(value),
                    weapon: equipment.weapon.clone(),
                    attacker: d.record.attacker.clone(),
                })
            })
            .collect()
    }

    pub fn aggregate(&self, deaths: &[DeathEvent], kills: &[KillEvent]) -> EconomyReport {
        let losses = self.value_deaths(deaths);

        let mut per_bucket: BTreeMap<RoundEconomyBucket, BucketStats> = RoundEconomyBucket::iter()
            .map(|b| (b, BucketStats::empty(b)))
            .collect();
        let mut rounds: BTreeMap<u32, u32> = BTreeMap::new();

        for loss in &losses {
            if let Some(stats) = per_bucket.get_mut(&loss.bucket) {
                stats.death_count += 1;
                stats.total_value_lost += u64::from(loss.value);
            }
            bump_round(&mut rounds, loss.round, loss.value);
        }

        let mut total_kill_reward = 0u64;
        for kill in kills {
            let reward = u64::from(self.prices.kill_reward(&kill.record.weapon));
            total_kill_reward += reward;
            if let Some(equipment) = &kill.equipment {
                let value = self.value_at(equipment);
                if let Some(stats) = per_bucket.get_mut(&self.bucket_of(value)) {
                    stats.kill_count += 1;
                    stats.kill_reward += reward;
                }
                bump_round(&mut rounds, kill.record.round, value);
            }
        }

        for stats in per_bucket.values_mut() {
            stats.avg_value_lost = average(stats.total_value_lost, stats.death_count);
        }

        let total_value_lost: u64 = losses.iter().map(|l| u64::from(l.value)).sum();
        let expensive_deaths = losses.iter().filter(|l| l.value > self.thresholds.high_value_death).count();

        EconomyReport {
            valued_deaths: losses.len(),
            unvalued_deaths: deaths.len() - losses.len(),
            total_value_lost,
            avg_value_lost: average(total_value_lost, losses.len()),
            expensive_deaths,
            expensive_death_pct: super::aim::percentage(expensive_deaths, losses.len()),
            per_bucket: per_bucket.into_values().collect(),
            worst_losses: worst_losses(&losses, self.thresholds.worst_losses),
            total_kill_reward,
            net_economy: total_kill_reward as i64 - total_value_lost as i64,
            round_tiers: rounds
                .into_iter()
                .map(|(round, peak_value)| RoundTier { round, peak_value, bucket: self.bucket_of(peak_value) })
                .collect(),
        }
    }
}

fn bump_round(rounds: &mut BTreeMap<u32, u32>, round: u32, value: u32) {
    let peak = rounds.entry(round).or_insert(0);
    *peak = (*peak).max(value);
}

fn average(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Top `n` losses by value, descending; ties by earliest tick.
pub fn worst_losses(losses: &[LossEntry], n: usize) -> Vec<LossEntry> {
    let mut sorted: Vec<LossEntry> = losses.to_vec();
    sorted.sort_by(|a, b| b.value.cmp(&a.value).then(a.tick.cmp(&b.tick)));
    sorted.truncate(n);
    sorted
}
