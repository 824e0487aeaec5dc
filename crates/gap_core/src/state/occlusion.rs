//! Time-indexed smoke volumes.

use crate::geometry::{OcclusionVolume, Vec3};

/// Occlusion volumes sorted by detonation tick.
///
/// Lifetimes are bounded by `max_span`, so the volumes active at a tick all
/// detonated inside `[tick - max_span, tick]` and two binary searches bound
/// the candidates.
#[derive(Debug, Clone, Default)]
pub struct OcclusionIndex {
    volumes: Vec<OcclusionVolume>,
    max_span: i64,
}

impl OcclusionIndex {
    /// Build from `(detonation_tick, center)` pairs with a fixed lifetime.
    pub fn new(detonations: impl IntoIterator<Item = (i64, Vec3)>, lifetime_ticks: i64, radius: f64) -> Self {
        let mut volumes: Vec<OcclusionVolume> = detonations
            .into_iter()
            .map(|(tick, center)| OcclusionVolume {
                center,
                radius,
                start_tick: tick,
                end_tick: tick + lifetime_ticks,
            })
            .collect();
        volumes.sort_by_key(|v| v.start_tick);

        Self { volumes, max_span: lifetime_ticks.max(0) }
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Volumes that block sightlines at `tick`.
    pub fn active_at(&self, tick: i64) -> Vec<OcclusionVolume> {
        let lo = self.volumes.partition_point(|v| v.start_tick < tick - self.max_span);
        let hi = self.volumes.partition_point(|v| v.start_tick <= tick).max(lo);
        self.volumes[lo..hi].iter().filter(|v| v.is_active(tick)).copied().collect()
    }
}
