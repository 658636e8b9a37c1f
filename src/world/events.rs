//! Structured turn events and the running event log

use serde::{Deserialize, Serialize};

use crate::core::types::{
    ArmyId, CombatId, ConvoyId, FactionId, LeaderId, LocationId, RoadId, Turn,
};
use crate::world::army::ArmyPosition;
use crate::world::leader::LeaderStatus;
use crate::world::location::TaxLevel;

/// Why the movement resolver held an army in place
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    HeadOnSwap,
    ContactEngagement,
    ZoneOfControl,
}

/// Which side prevailed in a fight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleSide {
    Attacker,
    Defender,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    // Movement
    ArmyArrived { army: ArmyId, location: LocationId },
    MovementBlocked { army: ArmyId, reason: BlockReason },
    LeaderArrived { leader: LeaderId, location: LocationId, status: LeaderStatus },

    // Combat
    CombatDetected { combat: CombatId, position: ArmyPosition, attacker: FactionId, defender: FactionId },
    BattleFought {
        position: ArmyPosition,
        attacker: FactionId,
        defender: FactionId,
        attacker_power: u32,
        defender_power: u32,
        winner: BattleSide,
        death_toll: u32,
        pyrrhic: bool,
    },
    LocationCaptured { location: LocationId, from: FactionId, to: FactionId },
    SiegeStarted { location: LocationId, besieger: FactionId, troops: u32, fortification: u8, cost: u32 },
    Retreated { army: ArmyId, to: ArmyPosition },
    LeaderKilled { leader: LeaderId },
    LeaderEscaped { leader: LeaderId, to: LocationId },

    // Insurrection
    InsurrectionLaunched { leader: LeaderId, location: LocationId, strength: u32 },
    SpontaneousUprising { location: LocationId, strength: u32 },

    // Construction & recruitment
    ArmyRecruited { army: ArmyId, location: LocationId, strength: u32 },
    FortificationStarted { location: LocationId, target_level: u8 },
    StageFortificationStarted { road: RoadId, stage: usize, target_level: u8 },
    ConstructionCompleted { location: LocationId, level: u8 },
    StageConstructionCompleted { road: RoadId, stage: usize, level: u8 },
    ConstructionInterrupted { location: LocationId },
    StageConstructionInterrupted { road: RoadId, stage: usize },

    // Logistics
    IncomeCollected { gold: u32 },
    TaxChanged { location: LocationId, level: TaxLevel },
    Famine { location: LocationId, population_lost: u32 },
    ConvoyDispatched { convoy: ConvoyId, to: LocationId, food: u32 },
    ConvoyDelivered { convoy: ConvoyId, location: LocationId, food: u32 },
    ConvoyLost { convoy: ConvoyId, location: LocationId },
    NegotiationStarted { location: LocationId, offer: u32 },
    NegotiationSucceeded { location: LocationId },
    NegotiationFailed { location: LocationId },

    // Outcome
    Victory { faction: FactionId },
}

/// A single structured log entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: Turn,
    pub faction: Option<FactionId>,
    pub location: Option<LocationId>,
    pub kind: EventKind,
}

impl LogEntry {
    pub fn new(turn: Turn, kind: EventKind) -> Self {
        Self {
            turn,
            faction: None,
            location: None,
            kind,
        }
    }

    pub fn for_faction(mut self, faction: FactionId) -> Self {
        self.faction = Some(faction);
        self
    }

    pub fn at(mut self, location: LocationId) -> Self {
        self.location = Some(location);
        self
    }
}

/// The complete event log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    pub entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        self.entries.extend(entries);
    }

    pub fn for_turn(&self, turn: Turn) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.turn == turn)
    }

    pub fn for_faction(&self, faction: FactionId) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.faction == Some(faction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filters() {
        let mut log = EventLog::new();
        log.extend([
            LogEntry::new(1, EventKind::IncomeCollected { gold: 10 }).for_faction(FactionId(1)),
            LogEntry::new(2, EventKind::IncomeCollected { gold: 20 }).for_faction(FactionId(2)),
            LogEntry::new(2, EventKind::Victory { faction: FactionId(2) }),
        ]);
        assert_eq!(log.for_turn(2).count(), 2);
        assert_eq!(log.for_faction(FactionId(1)).count(), 1);
    }
}
