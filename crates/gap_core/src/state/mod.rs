//! # State Index
//!
//! Read-only, tick-keyed view of the whole match built once per run.
//!
//! - `timeline` - per-player sorted samples, nearest-preceding lookup
//! - `occlusion` - smoke volumes with fixed lifetimes
//! - `enrich` - fills raw records into immutable death/kill/flash events
//!
//! Every query is a point query: a binary search per player timeline plus
//! a bounded scan of the few smokes alive at that tick. Nothing rescans the
//! match.

mod enrich;
mod occlusion;
mod timeline;

pub use enrich::EnrichedEvents;
pub use occlusion::OcclusionIndex;
pub use timeline::{FrameState, PlayerTimeline};

use crate::config::AnalysisConfig;
use crate::geometry::{self, OcclusionVolume, Vec3, ViewAngles};
use crate::replay::{EquipmentSnapshot, MatchData, UtilityKind};
use fxhash::FxHashMap;
use tracing::debug;

/// An enemy the player could see at a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleEnemy {
    pub name: String,
    pub position: Vec3,
    pub distance: f64,
}

/// A teammate close enough, with a clear sightline, to trade a kill.
#[derive(Debug, Clone, PartialEq)]
pub struct TeammateSighting {
    pub name: String,
    pub position: Vec3,
    pub distance: f64,
}

/// One position sample from a player's timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub tick: i64,
    pub position: Vec3,
}

#[derive(Debug, Clone)]
pub struct StateIndex {
    players: FxHashMap<String, PlayerTimeline>,
    /// Player names, sorted, for deterministic iteration
    roster: Vec<String>,
    occluders: OcclusionIndex,
    fov_degrees: f64,
    trade_radius: f64,
}

impl StateIndex {
    pub fn build(data: &MatchData, config: &AnalysisConfig) -> Self {
        let mut grouped: FxHashMap<&str, Vec<&crate::replay::PlayerFrame>> = FxHashMap::default();
        for frame in &data.frames {
            grouped.entry(frame.player.as_str()).or_default().push(frame);
        }

        let mut roster: Vec<String> = grouped.keys().map(|k| k.to_string()).collect();
        roster.sort();

        let players: FxHashMap<String, PlayerTimeline> = grouped
            .into_iter()
            .map(|(name, frames)| (name.to_string(), PlayerTimeline::from_frames(frames)))
            .collect();

        let smokes = data
            .grenades
            .iter()
            .filter(|g| g.kind == UtilityKind::Smoke)
            .filter_map(|g| g.position.map(|pos| (g.tick, pos)));
        let occluders = OcclusionIndex::new(
            smokes,
            config.ticks(config.occlusion.lifetime_s),
            config.occlusion.radius_units,
        );

        debug!(
            players = roster.len(),
            frames = data.frames.len(),
            smokes = occluders.len(),
            "state index built"
        );

        Self {
            players,
            roster,
            occluders,
            fov_degrees: config.geometry.fov_degrees,
            trade_radius: config.engagement.trade_radius_units,
        }
    }

    pub fn contains_player(&self, player: &str) -> bool {
        self.players.contains_key(player)
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Nearest-preceding resolved state for `player`.
    pub fn state_at(&self, tick: i64, player: &str) -> Option<&FrameState> {
        self.players.get(player)?.at(tick)
    }

    pub fn position_at(&self, tick: i64, player: &str) -> Option<Vec3> {
        self.state_at(tick, player)?.position
    }

    pub fn angles_at(&self, tick: i64, player: &str) -> Option<ViewAngles> {
        self.state_at(tick, player)?.angles
    }

    pub fn health_at(&self, tick: i64, player: &str) -> Option<i32> {
        self.state_at(tick, player)?.health
    }

    pub fn equipment_at(&self, tick: i64, player: &str) -> Option<&EquipmentSnapshot> {
        self.state_at(tick, player)?.equipment.as_ref()
    }

    pub fn team_at(&self, tick: i64, player: &str) -> Option<&str> {
        self.state_at(tick, player)?.team.as_deref()
    }

    pub fn active_occluders(&self, tick: i64) -> Vec<OcclusionVolume> {
        self.occluders.active_at(tick)
    }

    /// True when both players have a known team and it is the same.
    pub fn same_team(&self, tick: i64, a: &str, b: &str) -> bool {
        match (self.team_at(tick, a), self.team_at(tick, b)) {
            (Some(ta), Some(tb)) => ta == tb,
            _ => false,
        }
    }

    /// Living enemies inside the player's FOV with no active smoke between.
    pub fn visible_enemies(&self, tick: i64, player: &str) -> Vec<VisibleEnemy> {
        let Some(me) = self.state_at(tick, player) else {
            return Vec::new();
        };
        let (Some(my_pos), Some(my_angles), Some(my_team)) = (me.position, me.angles, me.team.as_deref()) else {
            return Vec::new();
        };

        let view_dir = geometry::to_direction(my_angles);
        let smokes = self.active_occluders(tick);

        self.roster
            .iter()
            .filter(|name| name.as_str() != player)
            .filter_map(|name| {
                let state = self.state_at(tick, name)?;
                let team = state.team.as_deref()?;
                let pos = state.position?;
                if team == my_team || !state.is_alive() {
                    return None;
                }
                let to_enemy = pos - my_pos;
                if !geometry::is_within_fov(&view_dir, &to_enemy, self.fov_degrees) {
                    return None;
                }
                if !geometry::is_occlusion_clear(&my_pos, &pos, &smokes, tick) {
                    return None;
                }
                Some(VisibleEnemy { name: name.clone(), position: pos, distance: to_enemy.norm() })
            })
            .collect()
    }

    /// Living teammates within trade radius of `target` with a clear
    /// sightline to it.
    pub fn trade_capable_teammates(&self, tick: i64, player: &str, target: &Vec3) -> Vec<TeammateSighting> {
        let Some(my_team) = self.team_at(tick, player) else {
            return Vec::new();
        };
        let smokes = self.active_occluders(tick);

        self.roster
            .iter()
            .filter(|name| name.as_str() != player)
            .filter_map(|name| {
                let state = self.state_at(tick, name)?;
                let pos = state.position?;
                if state.team.as_deref() != Some(my_team) || !state.is_alive() {
                    return None;
                }
                let distance = geometry::distance(&pos, target);
                if distance > self.trade_radius {
                    return None;
                }
                if !geometry::is_occlusion_clear(&pos, target, &smokes, tick) {
                    return None;
                }
                Some(TeammateSighting { name: name.clone(), position: pos, distance })
            })
            .collect()
    }

    /// Known positions of `player` with `after < tick <= until`.
    pub fn position_samples(&self, player: &str, after: i64, until: i64) -> Vec<PositionSample> {
        let Some(timeline) = self.players.get(player) else {
            return Vec::new();
        };
        timeline
            .between(after, until)
            .filter_map(|(tick, state)| state.position.map(|position| PositionSample { tick, position }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{GrenadeRecord, PlayerFrame};

    fn scene() -> MatchData {
        MatchData {
            map_name: "de_test".into(),
            frames: vec![
                PlayerFrame::new(0, "me").with_team("CT").with_position(0.0, 0.0, 0.0).with_angles(0.0, 0.0).with_health(100),
                PlayerFrame::new(0, "ally").with_team("CT").with_position(0.0, 600.0, 0.0).with_health(100),
                PlayerFrame::new(0, "far_ally").with_team("CT").with_position(0.0, 2000.0, 0.0).with_health(100),
                PlayerFrame::new(0, "front").with_team("T").with_position(1000.0, 0.0, 0.0).with_health(100),
                PlayerFrame::new(0, "behind").with_team("T").with_position(-1000.0, 0.0, 0.0).with_health(100),
                PlayerFrame::new(50, "front").with_health(0),
            ],
            ..MatchData::default()
        }
    }

    #[test]
    fn test_visible_enemies_respects_fov() {
        let index = StateIndex::build(&scene(), &AnalysisConfig::default());
        let seen: Vec<String> = index.visible_enemies(10, "me").into_iter().map(|e| e.name).collect();
        assert_eq!(seen, vec!["front".to_string()]);
    }

    #[test]
    fn test_dead_enemies_not_visible() {
        let index = StateIndex::build(&scene(), &AnalysisConfig::default());
        assert!(index.visible_enemies(60, "me").is_empty());
    }

    #[test]
    fn test_smoke_hides_enemy() {
        let mut data = scene();
        data.grenades.push(GrenadeRecord {
            tick: 5,
            thrower: "front".into(),
            kind: UtilityKind::Smoke,
            position: Some(Vec3::new(500.0, 0.0, 0.0)),
        });
        let index = StateIndex::build(&data, &AnalysisConfig::default());
        assert!(index.visible_enemies(10, "me").is_empty());
        assert_eq!(index.visible_enemies(4, "me").len(), 1, "smoke not yet detonated");
    }

    #[test]
    fn test_trade_capable_teammates_within_radius() {
        let index = StateIndex::build(&scene(), &AnalysisConfig::default());
        let mates = index.trade_capable_teammates(10, "me", &Vec3::zeros());
        assert_eq!(mates.len(), 1);
        assert_eq!(mates[0].name, "ally");
        assert!((mates[0].distance - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_smoke_blocks_trade_sightline() {
        let mut data = scene();
        data.grenades.push(GrenadeRecord {
            tick: 5,
            thrower: "front".into(),
            kind: UtilityKind::Smoke,
            position: Some(Vec3::new(0.0, 300.0, 0.0)),
        });
        let index = StateIndex::build(&data, &AnalysisConfig::default());
        assert!(index.trade_capable_teammates(10, "me", &Vec3::zeros()).is_empty());
        assert_eq!(index.trade_capable_teammates(4, "me", &Vec3::zeros()).len(), 1, "smoke not yet detonated");
    }

    #[test]
    fn test_dead_teammate_cannot_trade() {
        let mut data = scene();
        data.frames.push(PlayerFrame::new(40, "ally").with_health(0));
        let index = StateIndex::build(&data, &AnalysisConfig::default());
        assert_eq!(index.trade_capable_teammates(39, "me", &Vec3::zeros()).len(), 1);
        assert!(index.trade_capable_teammates(40, "me", &Vec3::zeros()).is_empty());
    }

    #[test]
    fn test_trade_radius_boundary_inclusive() {
        let mut data = scene();
        data.frames.push(PlayerFrame::new(0, "edge").with_team("CT").with_position(-800.0, 0.0, 0.0).with_health(100));
        data.frames.push(PlayerFrame::new(0, "outside").with_team("CT").with_position(0.0, -800.5, 0.0).with_health(100));
        let index = StateIndex::build(&data, &AnalysisConfig::default());

        let names: Vec<String> = index
            .trade_capable_teammates(10, "me", &Vec3::zeros())
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["ally".to_string(), "edge".to_string()]);
    }

    #[test]
    fn test_nearest_preceding_lookup() {
        let index = StateIndex::build(&scene(), &AnalysisConfig::default());
        assert_eq!(index.health_at(49, "front"), Some(100));
        assert_eq!(index.health_at(50, "front"), Some(0));
        assert_eq!(index.health_at(-1, "front"), None);
        assert!(index.same_team(0, "me", "ally"));
        assert!(!index.same_team(0, "me", "front"));
        assert!(!index.same_team(0, "me", "ghost"));
    }

    #[test]
    fn test_position_samples_window() {
        let data = MatchData {
            frames: (0..5).map(|i| PlayerFrame::new(i * 10, "me").with_position(i as f64 * 50.0, 0.0, 0.0)).collect(),
            ..MatchData::default()
        };
        let index = StateIndex::build(&data, &AnalysisConfig::default());
        let samples = index.position_samples("me", 0, 30);
        assert_eq!(samples.iter().map(|s| s.tick).collect::<Vec<_>>(), vec![10, 20, 30]);
    }
}
