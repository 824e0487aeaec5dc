//! Decoded match records, as produced by the external replay parser.
//!
//! Every field the parser may fail to resolve is an `Option`; the state
//! index fills gaps from the nearest preceding frame during enrichment.

use crate::geometry::{Vec3, ViewAngles};
use serde::{Deserialize, Serialize};

fn unknown_weapon() -> String {
    "unknown".to_string()
}

/// Equipment carried by a player at one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub struct EquipmentSnapshot {
    /// Authoritative equipment value reported by the game, when present
    pub total_value: Option<u32>,
    /// Armor value in currency units
    pub armor_value: u32,
    pub has_helmet: bool,
    pub has_defuser: bool,
    /// Active weapon identifier
    pub weapon: String,
}

/// One sparse per-tick sample for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFrame {
    pub tick: i64,
    pub player: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angles: Option<ViewAngles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<EquipmentSnapshot>,
}

impl PlayerFrame {
    pub fn new(tick: i64, player: &str) -> Self {
        Self {
            tick,
            player: player.to_string(),
            team: None,
            position: None,
            angles: None,
            health: None,
            equipment: None,
        }
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(Vec3::new(x, y, z));
        self
    }

    pub fn with_angles(mut self, pitch: f64, yaw: f64) -> Self {
        self.angles = Some(ViewAngles::new(pitch, yaw));
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_equipment(mut self, equipment: EquipmentSnapshot) -> Self {
        self.equipment = Some(equipment);
        self
    }
}

/// An obituary: `victim` was killed by `attacker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub tick: i64,
    pub victim: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacker: Option<String>,
    #[serde(default = "unknown_weapon")]
    pub weapon: String,
    #[serde(default)]
    pub headshot: bool,
    #[serde(default)]
    pub round: u32,
    /// Seconds since the round started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_time_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim_position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim_angles: Option<ViewAngles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacker_position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacker_angles: Option<ViewAngles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim_equipment: Option<EquipmentSnapshot>,
}

impl DeathRecord {
    pub fn new(tick: i64, victim: &str, attacker: &str, weapon: &str) -> Self {
        Self {
            tick,
            victim: victim.to_string(),
            attacker: Some(attacker.to_string()),
            weapon: weapon.to_string(),
            headshot: false,
            round: 0,
            round_time_s: None,
            victim_position: None,
            victim_angles: None,
            attacker_position: None,
            attacker_angles: None,
            victim_equipment: None,
        }
    }

    pub fn in_round(mut self, round: u32, round_time_s: f64) -> Self {
        self.round = round;
        self.round_time_s = Some(round_time_s);
        self
    }

    pub fn with_headshot(mut self, headshot: bool) -> Self {
        self.headshot = headshot;
        self
    }

    pub fn with_victim_position(mut self, pos: Vec3) -> Self {
        self.victim_position = Some(pos);
        self
    }

    pub fn with_victim_angles(mut self, pitch: f64, yaw: f64) -> Self {
        self.victim_angles = Some(ViewAngles::new(pitch, yaw));
        self
    }

    pub fn with_attacker_position(mut self, pos: Vec3) -> Self {
        self.attacker_position = Some(pos);
        self
    }

    pub fn with_attacker_angles(mut self, pitch: f64, yaw: f64) -> Self {
        self.attacker_angles = Some(ViewAngles::new(pitch, yaw));
        self
    }

    pub fn with_victim_equipment(mut self, equipment: EquipmentSnapshot) -> Self {
        self.victim_equipment = Some(equipment);
        self
    }

    fn key(&self) -> (i64, &str) {
        (self.tick, self.victim.as_str())
    }
}

/// One player blinded by one flashbang.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlindRecord {
    pub tick: i64,
    pub thrower: String,
    pub victim: String,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    Flashbang,
    Smoke,
    Molotov,
    HeGrenade,
    Decoy,
}

/// A thrown grenade. Smoke records carry the detonation tick and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrenadeRecord {
    pub tick: i64,
    pub thrower: String,
    pub kind: UtilityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

/// A complete decoded match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchData {
    pub map_name: String,
    pub frames: Vec<PlayerFrame>,
    /// Every obituary in the match
    pub deaths: Vec<DeathRecord>,
    /// Extra kill records; merged with kills derived from `deaths`
    pub kills: Vec<DeathRecord>,
    pub blinds: Vec<BlindRecord>,
    pub grenades: Vec<GrenadeRecord>,
}

impl MatchData {
    /// Exact, case-sensitive identity match against every record.
    pub fn mentions_player(&self, player: &str) -> bool {
        self.frames.iter().any(|f| f.player == player)
            || self
                .deaths
                .iter()
                .chain(self.kills.iter())
                .any(|d| d.victim == player || d.attacker.as_deref() == Some(player))
            || self.blinds.iter().any(|b| b.thrower == player || b.victim == player)
            || self.grenades.iter().any(|g| g.thrower == player)
    }

    /// Records where `player` died, in tick order.
    pub fn deaths_of<'a>(&'a self, player: &str) -> Vec<&'a DeathRecord> {
        let mut out: Vec<_> = self.deaths.iter().filter(|d| d.victim == player).collect();
        out.sort_by(|a, b| a.key().cmp(&b.key()));
        out
    }

    /// Records where `player` got the kill, deduplicated by `(tick, victim)`.
    pub fn kills_by<'a>(&'a self, player: &str) -> Vec<&'a DeathRecord> {
        let mut out: Vec<_> = self
            .deaths
            .iter()
            .chain(self.kills.iter())
            .filter(|d| d.attacker.as_deref() == Some(player) && d.victim != player)
            .collect();
        out.sort_by(|a, b| a.key().cmp(&b.key()));
        out.dedup_by(|a, b| a.key() == b.key());
        out
    }

    /// Ticks at which `player` threw any grenade, sorted.
    pub fn utility_ticks(&self, player: &str) -> Vec<i64> {
        let mut ticks: Vec<i64> = self
            .grenades
            .iter()
            .filter(|g| g.thrower == player)
            .map(|g| g.tick)
            .chain(self.blinds.iter().filter(|b| b.thrower == player).map(|b| b.tick))
            .collect();
        ticks.sort_unstable();
        ticks.dedup();
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kills_are_deduplicated() {
        let kill = DeathRecord::new(100, "enemy", "me", "ak47");
        let data = MatchData {
            deaths: vec![kill.clone(), DeathRecord::new(50, "me", "enemy", "awp")],
            kills: vec![kill],
            ..MatchData::default()
        };
        assert_eq!(data.kills_by("me").len(), 1);
        assert_eq!(data.deaths_of("me").len(), 1);
    }

    #[test]
    fn test_identity_is_case_sensitive() {
        let data = MatchData {
            frames: vec![PlayerFrame::new(1, "ZywOo")],
            ..MatchData::default()
        };
        assert!(data.mentions_player("ZywOo"));
        assert!(!data.mentions_player("zywoo"));
    }

    #[test]
    fn test_match_json_accepts_sparse_records() {
        let json = r#"{
            "map_name": "de_mirage",
            "frames": [{"tick": 1, "player": "a", "position": [1.0, 2.0, 3.0]}],
            "deaths": [{"tick": 5, "victim": "a"}]
        }"#;
        let data: MatchData = serde_json::from_str(json).unwrap();
        assert_eq!(data.frames[0].position, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(data.deaths[0].weapon, "unknown");
        assert!(data.deaths[0].attacker.is_none());
    }

    #[test]
    fn test_utility_ticks_merge_blinds_and_grenades() {
        let data = MatchData {
            grenades: vec![GrenadeRecord {
                tick: 30,
                thrower: "me".into(),
                kind: UtilityKind::Smoke,
                position: None,
            }],
            blinds: vec![
                BlindRecord { tick: 10, thrower: "me".into(), victim: "x".into(), duration_s: 1.0 },
                BlindRecord { tick: 10, thrower: "me".into(), victim: "y".into(), duration_s: 2.0 },
            ],
            ..MatchData::default()
        };
        assert_eq!(data.utility_ticks("me"), vec![10, 30]);
    }
}
