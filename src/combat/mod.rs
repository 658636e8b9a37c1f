//! Combat resolution
//!
//! Detection turns co-located hostile armies into a `Contact`. A contact is
//! resolved by one side's choice: fight, retreat, retreat into a paired
//! city, or lay siege. Contacts between non-human factions are resolved
//! automatically by the cascade; contacts involving a human wait in
//! `GameState::pending_combats` for a choice.

pub mod cascade;
pub mod detection;
pub mod power;
pub mod resolution;

use serde::{Deserialize, Serialize};

use crate::core::types::{ArmyId, CombatId, FactionId, LocationId};
use crate::world::{ArmyPosition, BattleSide, GameState};

pub use cascade::{auto_resolve, choose_attacker, choose_defender, resolve_stale_pending, run_cascade};
pub use detection::detect_contacts;
pub use power::{side_power, SidePower};
pub use resolution::{resolve_combat, CombatChoice};

/// A detected engagement between two factions at one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: CombatId,
    pub position: ArmyPosition,
    /// Set when the engagement happens at a location rather than a road stage
    pub location: Option<LocationId>,
    pub attacker: FactionId,
    pub defender: FactionId,
    pub attacker_armies: Vec<ArmyId>,
    pub defender_armies: Vec<ArmyId>,
    /// Attacking force was raised by an uprising
    pub insurgent: bool,
}

impl Contact {
    pub fn involves(&self, faction: FactionId) -> bool {
        self.attacker == faction || self.defender == faction
    }

    pub fn side_of(&self, faction: FactionId) -> Option<BattleSide> {
        if faction == self.attacker {
            Some(BattleSide::Attacker)
        } else if faction == self.defender {
            Some(BattleSide::Defender)
        } else {
            None
        }
    }

    pub fn armies(&self, side: BattleSide) -> &[ArmyId] {
        match side {
            BattleSide::Attacker => &self.attacker_armies,
            BattleSide::Defender => &self.defender_armies,
        }
    }

    pub fn faction(&self, side: BattleSide) -> FactionId {
        match side {
            BattleSide::Attacker => self.attacker,
            BattleSide::Defender => self.defender,
        }
    }

    pub fn involves_human(&self, state: &GameState) -> bool {
        state.is_human(self.attacker) || state.is_human(self.defender)
    }

    /// Drop armies that died or left the position since detection
    pub fn refreshed(&self, state: &GameState) -> Contact {
        let still_here = |id: &ArmyId| {
            state
                .army(*id)
                .is_some_and(|a| a.is_alive() && a.position == self.position)
        };
        Contact {
            attacker_armies: self.attacker_armies.iter().copied().filter(still_here).collect(),
            defender_armies: self.defender_armies.iter().copied().filter(still_here).collect(),
            ..self.clone()
        }
    }

    /// One side has nothing left to fight with
    pub fn is_empty(&self) -> bool {
        self.attacker_armies.is_empty() || self.defender_armies.is_empty()
    }
}
