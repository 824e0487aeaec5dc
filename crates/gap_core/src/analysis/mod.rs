//! # Analysis
//!
//! Classification and aggregation over enriched events.
//!
//! - `aim` - crosshair offset buckets and running summary
//! - `positioning` - zone mapping and danger/strong zones
//! - `economy` - equipment valuation, buy tiers, losses and kill rewards
//! - `gap` - per-event classification and the orchestrator
//! - `ranking` - severity scoring and the priority findings
//! - `highlights` - review moments
//! - `aggregate` - several matches for one player folded into one view
//! - `rank` - ladder tier and Elo estimate from headline rates

pub mod aggregate;
pub mod aim;
pub mod economy;
pub mod gap;
pub mod highlights;
pub mod positioning;
pub mod rank;
pub mod ranking;

pub use aggregate::{
    aggregate_reports, AggregateAim, AggregateBucket, AggregateDeaths, AggregateEconomy, AggregatePositioning,
    AggregateReport, AggregateSummary, AggregateUtility, ConsistencyLevel, DemoAimSample, DemoValue, RecurringFinding,
    Standouts, Trend, TrendLine, Trends, WeaponCount,
};
pub use aim::{classify_offset, AimBucket, AimSample, AimSummary, AimTracker};
pub use economy::{
    bucket_of, value_at, BucketStats, EconomyAnalyzer, EconomyReport, LossEntry, RoundEconomyBucket, RoundTier,
};
pub use gap::{
    is_avoidable_death, Advantages, DeathAssessment, FlashAssessment, GapAnalyzer, KillAssessment, RiskFactors,
};
pub use highlights::{Highlight, HighlightKind};
pub use positioning::{DangerZone, Heatmap, PositioningAnalyzer, PositioningReport, StrongZone, ZoneStats};
pub use rank::{
    effective_kd, score_metric, MetricGap, MetricScore, RankConfidence, RankEstimate, RankEstimator, RankInputs,
    RankMetric, RankProgression, TierScore,
};
pub use ranking::{FindingCategory, PriorityFinding};
