//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Turn counter (simulation time unit)
pub type Turn = u32;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier for factions (0 is reserved for Neutral)
    FactionId,
    "F"
);
id_type!(
    /// Location identifier (cities and rural areas)
    LocationId,
    "L"
);
id_type!(
    /// Road identifier
    RoadId,
    "R"
);
id_type!(
    /// Unique identifier for an army
    ArmyId,
    "A"
);
id_type!(
    /// Unique identifier for leaders (characters)
    LeaderId,
    "C"
);
id_type!(
    /// AI mission identifier, unique within a faction
    MissionId,
    "M"
);
id_type!(
    /// Supply convoy identifier
    ConvoyId,
    "V"
);
id_type!(
    /// Identifier for a detected combat awaiting resolution
    CombatId,
    "B"
);

impl FactionId {
    /// The non-playing faction that owns unclaimed territory
    pub const NEUTRAL: FactionId = FactionId(0);

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Every pair of distinct factions is at war
    pub fn is_hostile_to(&self, other: FactionId) -> bool {
        *self != other
    }
}

/// Direction of travel along a road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// From the road's `from` endpoint toward `to` (stage index increases)
    Forward,
    /// From `to` back toward `from` (stage index decreases)
    Backward,
}

impl Direction {
    pub fn reversed(&self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}
