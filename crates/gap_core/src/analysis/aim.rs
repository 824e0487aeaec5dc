//! # Aim Offset
//!
//! Buckets the crosshair offset measured at each duel and keeps a running
//! summary: average offset, bucket counts and the worst examples.
//!
//! ## Buckets
//! - good: offset < `bad_deg`
//! - bad: `bad_deg` <= offset <= `terrible_deg`
//! - terrible: offset > `terrible_deg`
//!
//! Degenerate samples (shooter and target at the same position) are counted
//! separately and never enter the average or the buckets.

use crate::config::AimThresholds;
use crate::error::GeometryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AimBucket {
    Good,
    Bad,
    Terrible,
}

pub fn classify_offset(offset_deg: f64, thresholds: &AimThresholds) -> AimBucket {
    if offset_deg < thresholds.bad_deg {
        AimBucket::Good
    } else if offset_deg <= thresholds.terrible_deg {
        AimBucket::Bad
    } else {
        AimBucket::Terrible
    }
}

/// One measured offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AimSample {
    pub tick: i64,
    pub offset_deg: f64,
    pub bucket: AimBucket,
    /// The other player in the duel
    pub opponent: Option<String>,
}

/// Aggregate over every sample of one kind (deaths or kills).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AimSummary {
    pub samples: usize,
    pub average_offset_deg: f64,
    pub good: usize,
    pub bad: usize,
    pub terrible: usize,
    /// Share of samples in the bad or terrible bucket
    pub bad_or_worse_pct: f64,
    /// Largest offsets, descending, ties by earliest tick
    pub worst: Vec<AimSample>,
    /// Samples dropped for degenerate geometry
    pub degenerate: usize,
}

/// Streaming accumulator for [`AimSummary`].
#[derive(Debug, Clone)]
pub struct AimTracker<'a> {
    thresholds: &'a AimThresholds,
    sum: f64,
    summary: AimSummary,
}

impl<'a> AimTracker<'a> {
    pub fn new(thresholds: &'a AimThresholds) -> Self {
        Self { thresholds, sum: 0.0, summary: AimSummary::default() }
    }

    /// Record one offset computation. Returns the sample when it counted.
    pub fn record(
        &mut self,
        tick: i64,
        opponent: Option<&str>,
        offset: Result<f64, GeometryError>,
    ) -> Option<AimSample> {
        let offset_deg = match offset {
            Ok(deg) => deg,
            Err(GeometryError::DegenerateGeometry) => {
                self.summary.degenerate += 1;
                return None;
            }
        };

        let bucket = classify_offset(offset_deg, self.thresholds);
        let sample = AimSample { tick, offset_deg, bucket, opponent: opponent.map(str::to_string) };

        self.sum += offset_deg;
        self.summary.samples += 1;
        self.summary.average_offset_deg = self.sum / self.summary.samples as f64;
        match bucket {
            AimBucket::Good => self.summary.good += 1,
            AimBucket::Bad => self.summary.bad += 1,
            AimBucket::Terrible => self.summary.terrible += 1,
        }

        self.push_worst(sample.clone());
        Some(sample)
    }

    fn push_worst(&mut self, sample: AimSample) {
        let worst = &mut self.summary.worst;
        let at = worst.partition_point(|w| {
            w.offset_deg > sample.offset_deg || (w.offset_deg == sample.offset_deg && w.tick <= sample.tick)
        });
        if at < self.thresholds.worst_examples {
            worst.insert(at, sample);
            worst.truncate(self.thresholds.worst_examples);
        }
    }

    pub fn finish(mut self) -> AimSummary {
        let s = &mut self.summary;
        s.bad_or_worse_pct = percentage(s.bad + s.terrible, s.samples);
        self.summary
    }
}

/// `part / whole` as a percentage, 0 for an empty whole.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
