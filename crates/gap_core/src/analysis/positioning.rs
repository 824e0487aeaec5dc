//! # Positioning Analyzer
//!
//! Maps engagement positions to named map zones and finds where the player
//! wins and loses fights.
//!
//! ## Classification
//! - danger: K/D < `danger_ratio` and engagements >= `min_engagements`
//! - strong: K/D >= `strong_ratio` and engagements >= `min_engagements`
//!
//! Both lists are ordered by engagements (desc) then zone name, and cut to
//! `max_listed`. Zone "Unknown" is kept in the stats but never listed.
//!
//! A flawless zone (kills, no deaths) has no finite ratio; it is reported
//! as `kd_ratio: None` and always counts as strong.

use crate::config::{PositioningThresholds, Zone, ZoneTable, UNKNOWN_ZONE};
use crate::geometry::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Per-zone engagement counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ZoneStats {
    pub zone: String,
    pub kills: u32,
    pub deaths: u32,
    /// `None` when deaths = 0 (infinite ratio)
    pub kd_ratio: Option<f64>,
}

impl ZoneStats {
    pub(crate) fn new(zone: &str) -> Self {
        Self { zone: zone.to_string(), kills: 0, deaths: 0, kd_ratio: None }
    }

    pub fn engagements(&self) -> u32 {
        self.kills + self.deaths
    }

    pub(crate) fn refresh_ratio(&mut self) {
        self.kd_ratio = if self.deaths == 0 { None } else { Some(self.kills as f64 / self.deaths as f64) };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DangerZone {
    pub zone: String,
    pub kills: u32,
    pub deaths: u32,
    pub kd_ratio: f64,
    /// 0-100, weighted by deaths and ratio shortfall
    pub severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StrongZone {
    pub zone: String,
    pub kills: u32,
    pub deaths: u32,
    pub kd_ratio: Option<f64>,
}

/// Raw 2D coordinates for an external heatmap renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Heatmap {
    pub deaths: Vec<[f64; 2]>,
    pub kills: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PositioningReport {
    /// False when the map has no zone table; every zone is then "Unknown"
    pub map_known: bool,
    /// Every zone with at least one engagement, by name
    pub zones: Vec<ZoneStats>,
    pub danger_zones: Vec<DangerZone>,
    pub strong_zones: Vec<StrongZone>,
    pub recommendations: Vec<String>,
    pub heatmap: Heatmap,
}

/// First zone containing `(x, y)`, "Unknown" if none.
pub fn zone_of<'z>(zones: &'z [Zone], position: &Vec3) -> &'z str {
    zones
        .iter()
        .find(|z| z.contains(position.x, position.y))
        .map(|z| z.name.as_str())
        .unwrap_or(UNKNOWN_ZONE)
}

/// `min(100, deaths * 10 + (1 - ratio) * 20)`
pub fn danger_severity(deaths: u32, kd_ratio: f64) -> f64 {
    (deaths as f64 * 10.0 + (1.0 - kd_ratio) * 20.0).clamp(0.0, 100.0)
}

/// Renders a ratio, with "∞" for a flawless zone.
pub fn format_ratio(kd_ratio: Option<f64>) -> String {
    match kd_ratio {
        Some(r) => format!("{:.2}", r),
        None => "∞".to_string(),
    }
}

pub struct PositioningAnalyzer<'a> {
    zones: &'a [Zone],
    map_known: bool,
    thresholds: &'a PositioningThresholds,
}

impl<'a> PositioningAnalyzer<'a> {
    /// An unknown map degrades to "Unknown" for every position.
    pub fn new(table: &'a ZoneTable, map_name: &str, thresholds: &'a PositioningThresholds) -> Self {
        let zones = table.zones_for(map_name);
        if zones.is_none() {
            warn!(map = map_name, "no zone table for map, positions resolve to Unknown");
        }
        Self { zones: zones.unwrap_or(&[]), map_known: zones.is_some(), thresholds }
    }

    pub fn zone_of(&self, position: &Vec3) -> &'a str {
        zone_of(self.zones, position)
    }

    /// One counter increment per event.
    pub fn aggregate(&self, deaths: &[Vec3], kills: &[Vec3]) -> BTreeMap<String, ZoneStats> {
        let mut stats: BTreeMap<String, ZoneStats> = BTreeMap::new();
        for pos in deaths {
            let zone = self.zone_of(pos);
            stats.entry(zone.to_string()).or_insert_with(|| ZoneStats::new(zone)).deaths += 1;
        }
        for pos in kills {
            let zone = self.zone_of(pos);
            stats.entry(zone.to_string()).or_insert_with(|| ZoneStats::new(zone)).kills += 1;
        }
        stats.values_mut().for_each(ZoneStats::refresh_ratio);
        stats
    }

    pub fn classify<'s>(&self, stats: impl IntoIterator<Item = &'s ZoneStats>) -> (Vec<DangerZone>, Vec<StrongZone>) {
        let t = self.thresholds;
        let mut ranked: Vec<&ZoneStats> = stats
            .into_iter()
            .filter(|s| s.zone != UNKNOWN_ZONE && s.engagements() >= t.min_engagements)
            .collect();
        ranked.sort_by(|a, b| b.engagements().cmp(&a.engagements()).then_with(|| a.zone.cmp(&b.zone)));

        let danger = ranked
            .iter()
            .filter_map(|s| {
                let ratio = s.kd_ratio?;
                (ratio < t.danger_ratio).then(|| DangerZone {
                    zone: s.zone.clone(),
                    kills: s.kills,
                    deaths: s.deaths,
                    kd_ratio: ratio,
                    severity: danger_severity(s.deaths, ratio),
                })
            })
            .take(t.max_listed)
            .collect();

        let strong = ranked
            .iter()
            .filter(|s| s.kd_ratio.map_or(true, |r| r >= t.strong_ratio))
            .map(|s| StrongZone { zone: s.zone.clone(), kills: s.kills, deaths: s.deaths, kd_ratio: s.kd_ratio })
            .take(t.max_listed)
            .collect();

        (danger, strong)
    }

    /// One line per listed zone, danger first.
    pub fn recommend(danger: &[DangerZone], strong: &[StrongZone]) -> Vec<String> {
        let danger_lines = danger.iter().map(|d| {
            format!(
                "Avoid or adapt in {}: {} deaths at K/D {:.2}. Enter with a teammate or utility, or play a different angle.",
                d.zone, d.deaths, d.kd_ratio
            )
        });
        let strong_lines = strong.iter().map(|s| {
            format!(
                "Exploit {}: K/D {} over {} fights. Take more engagements from here.",
                s.zone,
                format_ratio(s.kd_ratio),
                s.kills + s.deaths
            )
        });
        danger_lines.chain(strong_lines).collect()
    }

    pub fn analyze(&self, deaths: &[Vec3], kills: &[Vec3]) -> PositioningReport {
        let stats = self.aggregate(deaths, kills);
        let (danger_zones, strong_zones) = self.classify(stats.values());
        let recommendations = Self::recommend(&danger_zones, &strong_zones);

        PositioningReport {
            map_known: self.map_known,
            zones: stats.into_values().collect(),
            danger_zones,
            strong_zones,
            recommendations,
            heatmap: Heatmap {
                deaths: deaths.iter().map(|p| [p.x, p.y]).collect(),
                kills: kills.iter().map(|p| [p.x, p.y]).collect(),
            },
        }
    }
}
