//! Review moments worth rewatching, most important first.

use super::aim::AimBucket;
use super::economy::EconomyReport;
use super::gap::{DeathAssessment, FlashAssessment, KillAssessment};
use crate::config::AnalysisConfig;
use serde::{Deserialize, Serialize};

/// Purchase price of a flashbang, the value wasted by a useless flash.
pub const FLASHBANG_COST: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    AvoidableDeath,
    MajorLoss,
    TerribleAim,
    WastedFlash,
    PerfectKill,
}

impl HighlightKind {
    pub fn priority(self) -> u8 {
        match self {
            HighlightKind::AvoidableDeath => 90,
            HighlightKind::MajorLoss => 80,
            HighlightKind::TerribleAim => 70,
            HighlightKind::WastedFlash => 50,
            HighlightKind::PerfectKill => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Highlight {
    pub kind: HighlightKind,
    pub priority: u8,
    pub tick: i64,
    pub round: Option<u32>,
    /// `m:ss` into the round, or into the match when the round clock is unknown
    pub clock: String,
    pub description: String,
    pub value_at_stake: u32,
}

pub struct HighlightInputs<'a> {
    pub deaths: &'a [DeathAssessment],
    pub kills: &'a [KillAssessment],
    pub flashes: &'a [FlashAssessment],
    /// Player death ticks, sorted
    pub death_ticks: &'a [i64],
    pub economy: &'a EconomyReport,
    pub config: &'a AnalysisConfig,
}

pub fn clock(round_time_s: Option<f64>, tick: i64, tick_rate: f64) -> String {
    let seconds = round_time_s.unwrap_or(tick as f64 / tick_rate).max(0.0).floor() as u64;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn highlight(
    kind: HighlightKind,
    tick: i64,
    round: Option<u32>,
    clock: String,
    description: String,
    value_at_stake: u32,
) -> Highlight {
    Highlight { kind, priority: kind.priority(), tick, round, clock, description, value_at_stake }
}

/// Sorted by priority (desc), then tick.
pub fn collect(inputs: &HighlightInputs<'_>) -> Vec<Highlight> {
    let cfg = inputs.config;
    let rate = cfg.tick_rate;
    let mut out = Vec::new();

    for d in inputs.deaths {
        let at = clock(d.round_time_s, d.tick, rate);

        if d.is_avoidable {
            let mut reasons = vec!["no teammate in trade range".to_string(), "no utility used".to_string()];
            if let Some(aim) = d.aim.as_ref().filter(|a| a.bucket != AimBucket::Good) {
                reasons.push(format!("crosshair {:.0}° off", aim.offset_deg));
            }
            out.push(highlight(
                HighlightKind::AvoidableDeath,
                d.tick,
                Some(d.round),
                at.clone(),
                reasons.join(", "),
                d.equipment_value.unwrap_or(0),
            ));
        }

        if let Some(aim) = d.aim.as_ref().filter(|a| a.bucket == AimBucket::Terrible) {
            out.push(highlight(
                HighlightKind::TerribleAim,
                d.tick,
                Some(d.round),
                at,
                format!(
                    "{:.0}° flick needed against {}",
                    aim.offset_deg,
                    d.attacker.as_deref().unwrap_or("unknown")
                ),
                d.equipment_value.unwrap_or(0),
            ));
        }
    }

    for loss in inputs
        .economy
        .worst_losses
        .iter()
        .filter(|l| l.value >= cfg.economy.major_loss_highlight)
    {
        let round_time = inputs.deaths.iter().find(|d| d.tick == loss.tick).and_then(|d| d.round_time_s);
        out.push(highlight(
            HighlightKind::MajorLoss,
            loss.tick,
            Some(loss.round),
            clock(round_time, loss.tick, rate),
            format!("${} lost ({})", loss.value, loss.weapon),
            loss.value,
        ));
    }

    let window = cfg.ticks(cfg.flash.kill_window_s);
    for f in inputs.flashes.iter().filter(|f| !f.is_useful) {
        let from = inputs.death_ticks.partition_point(|&t| t <= f.tick);
        let Some(&death_tick) = inputs.death_ticks.get(from).filter(|&&t| t <= f.tick + window) else {
            continue;
        };
        out.push(highlight(
            HighlightKind::WastedFlash,
            f.tick,
            f.round,
            clock(f.round_time_s, f.tick, rate),
            format!("Useless flash, died {:.1}s later", (death_tick - f.tick) as f64 / rate),
            FLASHBANG_COST,
        ));
    }

    for k in inputs.kills.iter().filter(|k| k.headshot) {
        let Some(aim) = k.aim.as_ref().filter(|a| a.offset_deg <= cfg.aim.perfect_kill_deg) else {
            continue;
        };
        out.push(highlight(
            HighlightKind::PerfectKill,
            k.tick,
            Some(k.round),
            clock(k.round_time_s, k.tick, rate),
            format!("Headshot with {:.0}° pre-aim on {}", aim.offset_deg, k.victim),
            0,
        ));
    }

    out.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.tick.cmp(&b.tick)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aim::AimSample;
    use crate::analysis::gap::{Advantages, RiskFactors};

    fn death(tick: i64, avoidable: bool, offset: Option<f64>, value: u32) -> DeathAssessment {
        DeathAssessment {
            tick,
            round: 1,
            round_time_s: Some(75.4),
            attacker: Some("them".into()),
            weapon: "ak47".into(),
            risk_factors: RiskFactors { no_trade_teammate: avoidable, no_utility: avoidable },
            advantages: Advantages::default(),
            is_avoidable: avoidable,
            had_advantage: false,
            trade_teammates: Vec::new(),
            attacker_distance: None,
            aim: offset.map(|offset_deg| AimSample {
                tick,
                offset_deg,
                bucket: crate::analysis::aim::classify_offset(offset_deg, &Default::default()),
                opponent: None,
            }),
            equipment_value: Some(value),
        }
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(clock(Some(75.4), 0, 64.0), "1:15");
        assert_eq!(clock(None, 640, 64.0), "0:10");
        assert_eq!(clock(Some(-3.0), 0, 64.0), "0:00");
    }

    #[test]
    fn test_priority_then_tick_order() {
        let config = AnalysisConfig::default();
        let deaths = vec![death(500, false, Some(120.0), 1000), death(900, true, Some(45.0), 2500), death(300, true, None, 0)];
        let flashes = vec![FlashAssessment {
            tick: 800,
            round: None,
            round_time_s: None,
            players_blinded: 0,
            enemies_blinded: 0,
            longest_enemy_blind_s: 0.0,
            followed_by_kill: false,
            is_useful: false,
            is_pop_flash: false,
            max_displacement: 0.0,
        }];
        let economy = EconomyReport::default();
        let inputs = HighlightInputs {
            deaths: &deaths,
            kills: &[],
            flashes: &flashes,
            death_ticks: &[300, 500, 900],
            economy: &economy,
            config: &config,
        };

        let got: Vec<(HighlightKind, i64)> = collect(&inputs).iter().map(|h| (h.kind, h.tick)).collect();
        assert_eq!(
            got,
            vec![
                (HighlightKind::AvoidableDeath, 300),
                (HighlightKind::AvoidableDeath, 900),
                (HighlightKind::TerribleAim, 500),
                (HighlightKind::WastedFlash, 800),
            ]
        );
    }

    #[test]
    fn test_avoidable_description_mentions_bad_aim() {
        let config = AnalysisConfig::default();
        let deaths = vec![death(900, true, Some(45.0), 2500)];
        let economy = EconomyReport::default();
        let inputs = HighlightInputs {
            deaths: &deaths,
            kills: &[],
            flashes: &[],
            death_ticks: &[900],
            economy: &economy,
            config: &config,
        };
        let h = collect(&inputs);
        assert_eq!(h[0].description, "no teammate in trade range, no utility used, crosshair 45° off");
        assert_eq!(h[0].value_at_stake, 2500);
    }

    #[test]
    fn test_wasted_flash_uses_round_clock() {
        let config = AnalysisConfig::default();
        let flashes = vec![FlashAssessment {
            tick: 6400,
            round: Some(4),
            round_time_s: Some(61.5),
            players_blinded: 1,
            enemies_blinded: 1,
            longest_enemy_blind_s: 0.4,
            followed_by_kill: false,
            is_useful: false,
            is_pop_flash: false,
            max_displacement: 0.0,
        }];
        let economy = EconomyReport::default();
        let inputs = HighlightInputs {
            deaths: &[],
            kills: &[],
            flashes: &flashes,
            death_ticks: &[6464],
            economy: &economy,
            config: &config,
        };
        let h = collect(&inputs);
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].round, Some(4));
        assert_eq!(h[0].clock, "1:01");
        assert_eq!(h[0].description, "Useless flash, died 1.0s later");
    }
}
