use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors for a single analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Player not found in match: {player}")]
    PlayerNotFound { player: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot aggregate: {0}")]
    Aggregation(String),
}

impl From<validator::ValidationErrors> for AnalysisError {
    fn from(err: validator::ValidationErrors) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

impl AnalysisError {
    /// Errors the caller can fix by changing input rather than code.
    pub fn is_input_error(&self) -> bool {
        match self {
            AnalysisError::PlayerNotFound { .. } => true,
            AnalysisError::InvalidConfig(_) => true,
            AnalysisError::ConfigParse(_) => true,
            AnalysisError::ConfigIo(_) => false,
            AnalysisError::Serialization(_) => false,
            AnalysisError::Aggregation(_) => true,
        }
    }
}

/// Non-fatal geometry failures; the affected sample is dropped from aggregates.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Degenerate geometry: zero-length direction vector")]
    DegenerateGeometry,
}

/// Which event list a skipped record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Death,
    Kill,
    Flash,
}

/// A record dropped during enrichment because a required field was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SkippedEvent {
    pub kind: EventKind,
    pub tick: i64,
    /// Name of the missing field
    pub missing: String,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
