//! # Priority Ranking
//!
//! Scores every finding category from match-level rates, then keeps the
//! most severe ones.
//!
//! ## Ordering
//! Severity descending. Equal severities fall back to the declaration order
//! of [`FindingCategory`], which is the fixed precedence list:
//! aim offset, avoidable deaths, disadvantaged duels, economy, flash usage,
//! pop-flash, headshot rate.
//!
//! When no category fires, a single [`FindingCategory::Consistency`]
//! finding with severity 0 is emitted so the list is never empty.

use crate::config::RankingThresholds;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Finding categories in tie-break precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    AimOffset,
    AvoidableDeaths,
    DisadvantagedDuels,
    Economy,
    FlashUsage,
    PopFlash,
    HeadshotRate,
    /// Fallback when nothing else fires; never scored
    Consistency,
}

impl FindingCategory {
    /// Position in the precedence list, 0 first.
    pub fn precedence(self) -> usize {
        FindingCategory::iter().position(|c| c == self).unwrap_or(usize::MAX)
    }

    pub fn label(self) -> &'static str {
        match self {
            FindingCategory::AimOffset => "Crosshair placement",
            FindingCategory::AvoidableDeaths => "Avoidable deaths",
            FindingCategory::DisadvantagedDuels => "Disadvantaged duels",
            FindingCategory::Economy => "Economic discipline",
            FindingCategory::FlashUsage => "Utility usage",
            FindingCategory::PopFlash => "Pop-flashes",
            FindingCategory::HeadshotRate => "Headshot rate",
            FindingCategory::Consistency => "Keep it up",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            FindingCategory::AimOffset => "Pre-aim common angles at head height; run deathmatch focused on placement",
            FindingCategory::AvoidableDeaths => "Play next to a teammate and use utility before peeking",
            FindingCategory::DisadvantagedDuels => "Create an advantage before peeking: flash, jiggle or wait for a trade",
            FindingCategory::Economy => "Preserve expensive equipment; play safer angles on full buys",
            FindingCategory::FlashUsage => "Throw flashes to win a specific duel, not to fill time",
            FindingCategory::PopFlash => "Learn the pop-flashes for each map and peek right behind them",
            FindingCategory::HeadshotRate => "Headshot-only deathmatch to fix crosshair height",
            FindingCategory::Consistency => "Work on consistency and clutch decision-making",
        }
    }
}

/// Match-level rates the categories are scored from. Percentages are 0-100.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindingMetrics {
    pub aim_samples: usize,
    pub bad_aim_pct: f64,
    pub deaths: usize,
    pub avoidable_pct: f64,
    pub disadvantaged_pct: f64,
    pub flashes: usize,
    pub flash_useful_pct: f64,
    pub pop_flash_pct: f64,
    pub kills: usize,
    pub headshot_pct: f64,
    pub valued_deaths: usize,
    pub expensive_death_pct: f64,
    pub high_value_death: u32,
}

/// One category with its computed severity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCategory {
    pub category: FindingCategory,
    pub severity: f64,
    pub statistic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PriorityFinding {
    pub category: FindingCategory,
    pub label: String,
    /// 0-100, one decimal
    pub severity: f64,
    pub statistic: String,
    pub recommendation: String,
}

fn gated(trigger: bool, severity: f64) -> f64 {
    if trigger {
        (severity.clamp(0.0, 100.0) * 10.0).round() / 10.0
    } else {
        0.0
    }
}

/// Score every category. Categories whose trigger does not hold score 0.
pub fn score_categories(m: &FindingMetrics, t: &RankingThresholds) -> Vec<ScoredCategory> {
    FindingCategory::iter()
        .filter(|c| *c != FindingCategory::Consistency)
        .map(|category| {
            let (severity, statistic) = match category {
                FindingCategory::AimOffset => (
                    gated(m.aim_samples > 0 && m.bad_aim_pct > t.aim_bad_pct, m.bad_aim_pct),
                    format!("{:.0}% of lost duels started with the crosshair far off target", m.bad_aim_pct),
                ),
                FindingCategory::AvoidableDeaths => (
                    gated(m.deaths > 0 && m.avoidable_pct > t.avoidable_pct, m.avoidable_pct),
                    format!("{:.0}% of deaths were avoidable", m.avoidable_pct),
                ),
                FindingCategory::DisadvantagedDuels => (
                    gated(m.deaths > 0 && m.disadvantaged_pct > t.disadvantaged_pct, m.disadvantaged_pct),
                    format!("{:.0}% of duels taken without any advantage", m.disadvantaged_pct),
                ),
                FindingCategory::Economy => (
                    gated(
                        m.valued_deaths > 0 && m.expensive_death_pct > t.expensive_death_pct,
                        m.expensive_death_pct * t.economy_weight,
                    ),
                    format!("{:.0}% of deaths lost more than ${}", m.expensive_death_pct, m.high_value_death),
                ),
                FindingCategory::FlashUsage => (
                    gated(m.flashes > 0 && m.flash_useful_pct < t.flash_useful_pct, 100.0 - m.flash_useful_pct),
                    format!("Only {:.0}% of flashes were useful", m.flash_useful_pct),
                ),
                FindingCategory::PopFlash => (
                    gated(
                        m.flashes > t.pop_flash_min_flashes && m.pop_flash_pct < t.pop_flash_pct,
                        100.0 - m.pop_flash_pct,
                    ),
                    format!("Only {:.0}% of flashes were pop-flashes", m.pop_flash_pct),
                ),
                FindingCategory::HeadshotRate => (
                    gated(m.kills > 0 && m.headshot_pct < t.headshot_floor_pct, t.headshot_floor_pct - m.headshot_pct),
                    format!("Headshot rate {:.0}% (target {:.0}%+)", m.headshot_pct, t.headshot_floor_pct),
                ),
                FindingCategory::Consistency => (0.0, String::new()),
            };
            ScoredCategory { category, severity, statistic }
        })
        .collect()
}

fn by_severity_then_precedence(a: &ScoredCategory, b: &ScoredCategory) -> Ordering {
    b.severity
        .total_cmp(&a.severity)
        .then_with(|| a.category.precedence().cmp(&b.category.precedence()))
}

fn finding(category: FindingCategory, severity: f64, statistic: String) -> PriorityFinding {
    PriorityFinding {
        category,
        label: category.label().to_string(),
        severity,
        statistic,
        recommendation: category.recommendation().to_string(),
    }
}

/// Keep the `max` most severe categories with severity above 0, or the
/// consistency fallback when none qualifies.
pub fn rank(mut scored: Vec<ScoredCategory>, max: usize) -> Vec<PriorityFinding> {
    scored.retain(|s| s.severity > 0.0);
    scored.sort_by(by_severity_then_precedence);
    let findings: Vec<PriorityFinding> = scored
        .into_iter()
        .take(max)
        .map(|s| finding(s.category, s.severity, s.statistic))
        .collect();

    if findings.is_empty() && max > 0 {
        return vec![finding(
            FindingCategory::Consistency,
            0.0,
            "No category crossed its trigger".to_string(),
        )];
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(category: FindingCategory, severity: f64) -> ScoredCategory {
        ScoredCategory { category, severity, statistic: String::new() }
    }

    #[test]
    fn test_precedence_is_declaration_order() {
        let order: Vec<usize> = FindingCategory::iter().map(FindingCategory::precedence).collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
        assert!(FindingCategory::AimOffset.precedence() < FindingCategory::HeadshotRate.precedence());
        assert!(FindingCategory::Economy.precedence() < FindingCategory::FlashUsage.precedence());
    }

    #[test]
    fn test_ties_break_by_precedence() {
        let findings = rank(
            vec![
                scored(FindingCategory::HeadshotRate, 50.0),
                scored(FindingCategory::FlashUsage, 50.0),
                scored(FindingCategory::AimOffset, 50.0),
                scored(FindingCategory::Economy, 50.0),
            ],
            3,
        );
        let cats: Vec<FindingCategory> = findings.iter().map(|f| f.category).collect();
        assert_eq!(
            cats,
            vec![FindingCategory::AimOffset, FindingCategory::Economy, FindingCategory::FlashUsage]
        );
    }

    #[test]
    fn test_zero_severity_not_emitted() {
        let findings = rank(vec![scored(FindingCategory::PopFlash, 0.0), scored(FindingCategory::Economy, 12.5)], 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].recommendation, FindingCategory::Economy.recommendation());
    }

    #[test]
    fn test_gates() {
        let t = RankingThresholds::default();
        let m = FindingMetrics {
            aim_samples: 4,
            bad_aim_pct: 75.0,
            deaths: 4,
            avoidable_pct: 40.0,
            disadvantaged_pct: 50.0,
            flashes: 3,
            flash_useful_pct: 33.33,
            pop_flash_pct: 0.0,
            kills: 5,
            headshot_pct: 20.0,
            valued_deaths: 4,
            expensive_death_pct: 75.0,
            high_value_death: 3000,
        };
        let scores: Vec<f64> = score_categories(&m, &t).iter().map(|s| s.severity).collect();
        assert_eq!(
            scores,
            vec![
                75.0, // aim
                0.0,  // avoidable: 40 is not above 40
                50.0, // duels
                60.0, // economy: 75 * 0.8
                66.7, // flash usage: 100 - 33.33
                0.0,  // pop-flash: needs more than 3 flashes
                15.0, // headshot: 35 - 20
            ]
        );
    }

    #[test]
    fn test_no_kills_no_headshot_finding() {
        let t = RankingThresholds::default();
        let m = FindingMetrics::default();
        assert!(score_categories(&m, &t).iter().all(|s| s.severity == 0.0));
    }

    #[test]
    fn test_consistency_fallback_when_nothing_fires() {
        let t = RankingThresholds::default();
        let findings = rank(score_categories(&FindingMetrics::default(), &t), t.max_findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::Consistency);
        assert_eq!(findings[0].severity, 0.0);
        assert_eq!(findings[0].recommendation, "Work on consistency and clutch decision-making");

        assert!(rank(Vec::new(), 0).is_empty());
        assert!(score_categories(&FindingMetrics::default(), &t)
            .iter()
            .all(|s| s.category != FindingCategory::Consistency));
    }

    #[test]
    fn test_top_three_by_severity() {
        let t = RankingThresholds::default();
        let m = FindingMetrics {
            aim_samples: 4,
            bad_aim_pct: 75.0,
            deaths: 4,
            disadvantaged_pct: 50.0,
            flashes: 3,
            flash_useful_pct: 33.33,
            kills: 5,
            headshot_pct: 20.0,
            valued_deaths: 4,
            expensive_death_pct: 75.0,
            ..FindingMetrics::default()
        };
        let cats: Vec<FindingCategory> = rank(score_categories(&m, &t), t.max_findings).iter().map(|f| f.category).collect();
        assert_eq!(
            cats,
            vec![FindingCategory::AimOffset, FindingCategory::FlashUsage, FindingCategory::Economy]
        );
    }
}
