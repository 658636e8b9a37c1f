//! Armies and their placement on the road graph

use serde::{Deserialize, Serialize};

use crate::core::types::{ArmyId, Direction, FactionId, LocationId, RoadId};

/// Where an army stands: exactly one of a location or a road stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArmyPosition {
    AtLocation { id: LocationId },
    AtRoadStage { road: RoadId, stage: usize },
}

impl ArmyPosition {
    pub fn location(&self) -> Option<LocationId> {
        match self {
            Self::AtLocation { id } => Some(*id),
            Self::AtRoadStage { .. } => None,
        }
    }

    pub fn road_stage(&self) -> Option<(RoadId, usize)> {
        match self {
            Self::AtLocation { .. } => None,
            Self::AtRoadStage { road, stage } => Some((*road, *stage)),
        }
    }

    pub fn is_on_road(&self) -> bool {
        matches!(self, Self::AtRoadStage { .. })
    }
}

impl From<LocationId> for ArmyPosition {
    fn from(id: LocationId) -> Self {
        Self::AtLocation { id }
    }
}

/// Road currently being travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Travel {
    pub road: RoadId,
    pub direction: Direction,
}

/// Transient per-turn flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyFlags {
    /// Already acted (fought, retreated, recruited) this turn
    pub spent: bool,
    /// Pinned in front of a besieged location
    pub sieging: bool,
    /// Holding position; excluded from movement
    pub garrisoned: bool,
    /// Raised by an uprising
    pub insurgent: bool,
    /// Already advanced by the movement resolver this turn
    pub just_moved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Army {
    pub id: ArmyId,
    pub faction: FactionId,
    pub name: String,
    pub strength: u32,
    pub position: ArmyPosition,
    #[serde(default)]
    pub travel: Option<Travel>,
    #[serde(default)]
    pub destination: Option<LocationId>,
    #[serde(default)]
    pub trip_origin: Option<LocationId>,
    #[serde(default)]
    pub turns_until_arrival: u32,
    #[serde(default)]
    pub last_safe_position: Option<ArmyPosition>,
    #[serde(default)]
    pub food_source: Option<LocationId>,
    #[serde(default)]
    pub flags: ArmyFlags,
}

impl Army {
    pub fn new(id: ArmyId, faction: FactionId, position: ArmyPosition, strength: u32) -> Self {
        let food_source = position.location();
        Self {
            id,
            faction,
            name: format!("Army {}", id.0),
            strength,
            position,
            travel: None,
            destination: None,
            trip_origin: None,
            turns_until_arrival: 0,
            last_safe_position: Some(position),
            food_source,
            flags: ArmyFlags::default(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn insurgent(mut self) -> Self {
        self.flags.insurgent = true;
        self
    }

    pub fn location(&self) -> Option<LocationId> {
        self.position.location()
    }

    pub fn is_alive(&self) -> bool {
        self.strength > 0
    }

    /// Army has somewhere to go and nothing pinning it
    pub fn is_marching(&self) -> bool {
        (self.travel.is_some() || self.destination.is_some()) && !self.flags.garrisoned
    }

    /// Eligible for the movement resolver this turn
    pub fn can_move(&self) -> bool {
        self.is_alive()
            && !self.flags.spent
            && !self.flags.sieging
            && !self.flags.garrisoned
            && !self.flags.just_moved
            && (self.travel.is_some() || self.destination.is_some())
    }

    /// Idle: at a location with no orders and nothing pinning it
    pub fn is_idle(&self) -> bool {
        self.is_alive()
            && self.location().is_some()
            && self.destination.is_none()
            && self.travel.is_none()
            && !self.flags.sieging
    }

    /// Give movement orders to the army
    pub fn order_move_to(&mut self, destination: LocationId) {
        if self.trip_origin.is_none() {
            self.trip_origin = self.location();
        }
        self.destination = Some(destination);
        self.flags.garrisoned = false;
    }

    /// Drop all movement intent (used for retreats and siege remainders)
    pub fn clear_orders(&mut self) {
        self.destination = None;
        self.trip_origin = None;
        self.travel = None;
        self.turns_until_arrival = 0;
    }

    /// Halt and hold the current position
    pub fn order_hold(&mut self) {
        if self.travel.is_none() {
            self.clear_orders();
        } else {
            self.destination = None;
        }
        self.flags.garrisoned = self.location().is_some();
    }

    /// Start-of-turn reset for the transient flags
    pub fn reset_turn_flags(&mut self) {
        self.flags.spent = false;
        self.flags.sieging = false;
        self.flags.just_moved = false;
    }
}
