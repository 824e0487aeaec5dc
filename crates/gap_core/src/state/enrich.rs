//! Event enrichment.
//!
//! Raw records often lack positions or equipment at the exact event tick.
//! Missing fields are filled from the nearest preceding frame; records that
//! still lack a required field are skipped and reported, never guessed.

use super::StateIndex;
use crate::config::AnalysisConfig;
use crate::error::{EventKind, SkippedEvent};
use crate::replay::{
    BlindEntry, DeathContext, DeathEvent, DeathRecord, FlashEvent, KillEvent, MatchData, UtilityKind,
};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use tracing::warn;

/// Every event for one player, plus the records dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct EnrichedEvents {
    pub deaths: Vec<DeathEvent>,
    pub kills: Vec<KillEvent>,
    pub flashes: Vec<FlashEvent>,
    pub skipped: Vec<SkippedEvent>,
}

fn skip(skipped: &mut Vec<SkippedEvent>, kind: EventKind, tick: i64, missing: &str) {
    warn!(?kind, tick, missing, "skipping malformed event");
    skipped.push(SkippedEvent { kind, tick, missing: missing.to_string() });
}

impl StateIndex {
    /// Resolve every death, kill and flash of `player`.
    pub fn enrich(&self, data: &MatchData, player: &str, config: &AnalysisConfig) -> EnrichedEvents {
        let mut out = EnrichedEvents::default();

        let utility_ticks = data.utility_ticks(player);
        let utility_window = config.ticks(config.engagement.utility_window_s);

        for record in data.deaths_of(player) {
            match self.enrich_death(data, record, &utility_ticks, utility_window, config) {
                Some(event) => out.deaths.push(event),
                None => skip(&mut out.skipped, EventKind::Death, record.tick, "victim_position"),
            }
        }

        for record in data.kills_by(player) {
            match self.enrich_kill(record, player) {
                Some(event) => out.kills.push(event),
                None => skip(&mut out.skipped, EventKind::Kill, record.tick, "attacker_position"),
            }
        }

        for tick in flash_ticks(data, player) {
            match self.enrich_flash(data, player, tick, config) {
                Some(event) => out.flashes.push(event),
                None => skip(&mut out.skipped, EventKind::Flash, tick, "thrower_position"),
            }
        }

        out
    }

    fn enrich_death(
        &self,
        data: &MatchData,
        record: &DeathRecord,
        utility_ticks: &[i64],
        utility_window: i64,
        config: &AnalysisConfig,
    ) -> Option<DeathEvent> {
        let tick = record.tick;
        let victim = record.victim.as_str();
        let victim_position = record.victim_position.or_else(|| self.position_at(tick, victim))?;
        let attacker = record.attacker.as_deref();

        let trade_teammates = self
            .trade_capable_teammates(tick, victim, &victim_position)
            .into_iter()
            .map(|mate| mate.name)
            .collect();

        let attacker_blinded = attacker.map_or(false, |attacker| {
            data.blinds
                .iter()
                .filter(|b| b.victim == attacker)
                .any(|b| b.tick <= tick && tick <= b.tick + config.ticks(b.duration_s))
        });

        // Utility counts when thrown in [tick - window, tick)
        let from = utility_ticks.partition_point(|&t| t < tick - utility_window);
        let utility_used = utility_ticks.get(from).map_or(false, |&t| t < tick);

        Some(DeathEvent {
            victim_position,
            victim_angles: record.victim_angles.or_else(|| self.angles_at(tick, victim)),
            attacker_position: record
                .attacker_position
                .or_else(|| attacker.and_then(|a| self.position_at(tick, a))),
            equipment: record
                .victim_equipment
                .clone()
                .or_else(|| self.equipment_at(tick, victim).cloned()),
            context: DeathContext { trade_teammates, attacker_blinded, utility_used },
            record: record.clone(),
        })
    }

    fn enrich_kill(&self, record: &DeathRecord, player: &str) -> Option<KillEvent> {
        let tick = record.tick;
        let attacker_position = record.attacker_position.or_else(|| self.position_at(tick, player))?;

        Some(KillEvent {
            attacker_position,
            attacker_angles: record.attacker_angles.or_else(|| self.angles_at(tick, player)),
            victim_position: record
                .victim_position
                .or_else(|| self.position_at(tick, &record.victim)),
            equipment: self.equipment_at(tick, player).cloned(),
            record: record.clone(),
        })
    }

    fn enrich_flash(&self, data: &MatchData, player: &str, tick: i64, config: &AnalysisConfig) -> Option<FlashEvent> {
        let throw_position = self.position_at(tick, player)?;

        let affected = data
            .blinds
            .iter()
            .filter(|b| b.thrower == player && b.tick == tick)
            .map(|b| BlindEntry {
                player: b.victim.clone(),
                duration_s: b.duration_s,
                is_enemy: b.victim != player && !self.same_team(tick, player, &b.victim),
            })
            .collect();

        let (round, round_time_s) = round_near(data, tick, config.ticks(config.flash.kill_window_s), config.tick_rate);

        Some(FlashEvent {
            tick,
            thrower: player.to_string(),
            throw_position,
            affected,
            thrower_samples: self.position_samples(player, tick, tick + config.ticks(config.flash.pop_window_s)),
            round,
            round_time_s,
        })
    }
}

/// Round and round clock at `tick`, read off the closest obituary no more
/// than `window` ticks away. Equal distances prefer the later record.
fn round_near(data: &MatchData, tick: i64, window: i64, tick_rate: f64) -> (Option<u32>, Option<f64>) {
    let nearest = data
        .deaths
        .iter()
        .filter(|d| (d.tick - tick).abs() <= window)
        .min_by_key(|d| ((d.tick - tick).abs(), Reverse(d.tick)));

    match nearest {
        Some(d) => {
            let clock = d
                .round_time_s
                .map(|t| t - (d.tick - tick) as f64 / tick_rate)
                .filter(|t| *t >= 0.0);
            (Some(d.round), clock)
        }
        None => (None, None),
    }
}

/// Flash ticks for `player`: blind groups by `(thrower, tick)` plus
/// flashbang records that blinded nobody.
fn flash_ticks(data: &MatchData, player: &str) -> Vec<i64> {
    let ticks: BTreeSet<i64> = data
        .blinds
        .iter()
        .filter(|b| b.thrower == player)
        .map(|b| b.tick)
        .chain(
            data.grenades
                .iter()
                .filter(|g| g.thrower == player && g.kind == UtilityKind::Flashbang)
                .map(|g| g.tick),
        )
        .collect();
    ticks.into_iter().collect()
}
