//! Enriched, immutable per-player events.
//!
//! Each event keeps its source record untouched and carries the derived
//! fields (resolved positions, equipment, duel context) alongside it.

use super::types::{DeathRecord, EquipmentSnapshot};
use crate::geometry::{Vec3, ViewAngles};
use crate::state::PositionSample;

/// Situation around a death, resolved from the state index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeathContext {
    /// Teammates alive, in trade range and with a clear sightline
    pub trade_teammates: Vec<String>,
    /// The attacker was blinded at the death tick
    pub attacker_blinded: bool,
    /// The victim threw utility in the preceding window
    pub utility_used: bool,
}

/// The analysed player died.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathEvent {
    pub record: DeathRecord,
    pub victim_position: Vec3,
    pub victim_angles: Option<ViewAngles>,
    pub attacker_position: Option<Vec3>,
    pub equipment: Option<EquipmentSnapshot>,
    pub context: DeathContext,
}

impl DeathEvent {
    pub fn tick(&self) -> i64 {
        self.record.tick
    }

    /// Distance to the attacker, when the attacker position is known.
    pub fn attacker_distance(&self) -> Option<f64> {
        self.attacker_position.map(|pos| (pos - self.victim_position).norm())
    }
}

/// The analysed player got a kill.
#[derive(Debug, Clone, PartialEq)]
pub struct KillEvent {
    pub record: DeathRecord,
    pub attacker_position: Vec3,
    pub attacker_angles: Option<ViewAngles>,
    pub victim_position: Option<Vec3>,
    /// The player's own equipment at the kill tick
    pub equipment: Option<EquipmentSnapshot>,
}

impl KillEvent {
    pub fn tick(&self) -> i64 {
        self.record.tick
    }
}

/// One player caught by a flash.
#[derive(Debug, Clone, PartialEq)]
pub struct BlindEntry {
    pub player: String,
    pub duration_s: f64,
    /// Not known to share the thrower's team
    pub is_enemy: bool,
}

/// A flashbang thrown by the analysed player.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashEvent {
    pub tick: i64,
    pub thrower: String,
    pub throw_position: Vec3,
    pub affected: Vec<BlindEntry>,
    /// Thrower positions in the post-throw window
    pub thrower_samples: Vec<PositionSample>,
    /// Round of the closest obituary around the throw, if any
    pub round: Option<u32>,
    /// Round clock at the throw, derived from that obituary
    pub round_time_s: Option<f64>,
}

impl FlashEvent {
    /// Longest blind on an enemy, 0 when no enemy was caught.
    pub fn longest_enemy_blind_s(&self) -> f64 {
        self.affected
            .iter()
            .filter(|b| b.is_enemy)
            .map(|b| b.duration_s)
            .fold(0.0, f64::max)
    }

    pub fn enemies_blinded(&self) -> usize {
        self.affected.iter().filter(|b| b.is_enemy).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_enemy_blind_ignores_teammates() {
        let flash = FlashEvent {
            tick: 10,
            thrower: "me".into(),
            throw_position: Vec3::zeros(),
            affected: vec![
                BlindEntry { player: "mate".into(), duration_s: 3.0, is_enemy: false },
                BlindEntry { player: "a".into(), duration_s: 0.4, is_enemy: true },
                BlindEntry { player: "b".into(), duration_s: 1.2, is_enemy: true },
            ],
            thrower_samples: Vec::new(),
            round: None,
            round_time_s: None,
        };
        assert_eq!(flash.longest_enemy_blind_s(), 1.2);
        assert_eq!(flash.enemies_blinded(), 2);
    }

    #[test]
    fn test_attacker_distance() {
        let death = DeathEvent {
            record: DeathRecord::new(1, "me", "them", "ak47"),
            victim_position: Vec3::zeros(),
            victim_angles: None,
            attacker_position: Some(Vec3::new(300.0, 400.0, 0.0)),
            equipment: None,
            context: DeathContext::default(),
        };
        assert_eq!(death.attacker_distance(), Some(500.0));
    }
}
