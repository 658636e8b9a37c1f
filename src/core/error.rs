use thiserror::Error;

use crate::core::types::{ArmyId, CombatId, LeaderId, LocationId, RoadId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Narrative error: {0}")]
    Narrative(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Reasons a player (or AI) action is rejected.
///
/// Rejection never leaves partial mutation behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("The game is already over")]
    GameOver,

    #[error("Army not found: {0}")]
    ArmyNotFound(ArmyId),

    #[error("Leader not found: {0}")]
    LeaderNotFound(LeaderId),

    #[error("Location not found: {0}")]
    LocationNotFound(LocationId),

    #[error("Road not found: {0}")]
    RoadNotFound(RoadId),

    #[error("Combat not found: {0}")]
    CombatNotFound(CombatId),

    #[error("Not owned by acting faction")]
    NotOwner,

    #[error("Insufficient gold: need {needed}, have {available}")]
    InsufficientGold { needed: u32, available: u32 },

    #[error("Insufficient troops: need {needed}, have {available}")]
    InsufficientTroops { needed: u32, available: u32 },

    #[error("Insufficient food: need {needed}, have {available}")]
    InsufficientFood { needed: u32, available: u32 },

    #[error("Action limit reached for this turn")]
    ActionLimitReached,

    #[error("Illegal target: {0}")]
    IllegalTarget(String),

    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;
