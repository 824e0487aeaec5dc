//! Per-player sorted tick timeline with hold-last-value semantics.

use crate::geometry::{Vec3, ViewAngles};
use crate::replay::{EquipmentSnapshot, PlayerFrame};

/// Fully resolved player state at one sampled tick.
///
/// Each field holds the most recent value seen at or before this tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameState {
    pub team: Option<String>,
    pub position: Option<Vec3>,
    pub angles: Option<ViewAngles>,
    pub health: Option<i32>,
    pub equipment: Option<EquipmentSnapshot>,
}

impl FrameState {
    fn absorb(&mut self, frame: &PlayerFrame) {
        if frame.team.is_some() {
            self.team = frame.team.clone();
        }
        if frame.position.is_some() {
            self.position = frame.position;
        }
        if frame.angles.is_some() {
            self.angles = frame.angles;
        }
        if frame.health.is_some() {
            self.health = frame.health;
        }
        if frame.equipment.is_some() {
            self.equipment = frame.equipment.clone();
        }
    }

    /// Unknown health counts as alive.
    pub fn is_alive(&self) -> bool {
        self.health.map_or(true, |hp| hp > 0)
    }
}

/// Sorted tick keys with parallel resolved states.
#[derive(Debug, Clone, Default)]
pub struct PlayerTimeline {
    ticks: Vec<i64>,
    states: Vec<FrameState>,
}

impl PlayerTimeline {
    /// Build from one player's frames in any order. Frames sharing a tick
    /// are merged in input order.
    pub fn from_frames(mut frames: Vec<&PlayerFrame>) -> Self {
        frames.sort_by_key(|f| f.tick);

        let mut ticks: Vec<i64> = Vec::with_capacity(frames.len());
        let mut states: Vec<FrameState> = Vec::with_capacity(frames.len());
        let mut current = FrameState::default();

        for frame in frames {
            current.absorb(frame);
            match ticks.last() {
                Some(&last) if last == frame.tick => {
                    if let Some(slot) = states.last_mut() {
                        *slot = current.clone();
                    }
                }
                _ => {
                    ticks.push(frame.tick);
                    states.push(current.clone());
                }
            }
        }

        Self { ticks, states }
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Nearest sample at or before `tick` (binary search).
    pub fn at(&self, tick: i64) -> Option<&FrameState> {
        let idx = self.ticks.partition_point(|&t| t <= tick);
        if idx == 0 {
            None
        } else {
            self.states.get(idx - 1)
        }
    }

    /// Samples with `after < tick <= until`, in tick order.
    pub fn between(&self, after: i64, until: i64) -> impl Iterator<Item = (i64, &FrameState)> {
        let lo = self.ticks.partition_point(|&t| t <= after);
        let hi = self.ticks.partition_point(|&t| t <= until).max(lo);
        self.ticks[lo..hi].iter().copied().zip(self.states[lo..hi].iter())
    }
}
