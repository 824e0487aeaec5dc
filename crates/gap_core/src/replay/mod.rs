//! # Replay Records
//!
//! Input side of the engine.
//!
//! - `types` - decoded records as delivered by the replay parser (serde)
//! - `events` - per-player events after enrichment by the state index

mod events;
mod types;

pub use events::{BlindEntry, DeathContext, DeathEvent, FlashEvent, KillEvent};
pub use types::{
    BlindRecord, DeathRecord, EquipmentSnapshot, GrenadeRecord, MatchData, PlayerFrame, UtilityKind,
};
