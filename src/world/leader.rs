//! Leaders (characters) who command armies or act alone

use serde::{Deserialize, Serialize};

use crate::core::types::{ArmyId, FactionId, LeaderId, LocationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaderStatus {
    Available,
    Undercover,
    Moving,
    OnMission,
    Governing,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Slips away from lost battles
    Ghost,
    /// Doubles the command bonus
    Commander,
    /// Raises larger uprisings
    Agitator,
    /// Extra stability while governing
    Administrator,
    /// Cheaper negotiated settlements
    Negotiator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderStats {
    /// Stability added per turn while governing
    pub stability: u32,
    /// Fraction of the side's strength added to its power
    pub command_bonus: f64,
    /// Insurrection and infiltration effectiveness (0..=5)
    pub clandestine: u32,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub traits: Vec<String>,
}

impl Default for LeaderStats {
    fn default() -> Self {
        Self {
            stability: 1,
            command_bonus: 0.1,
            clandestine: 1,
            abilities: Vec::new(),
            traits: Vec::new(),
        }
    }
}

impl LeaderStats {
    pub fn has(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    /// Command bonus fraction including ability multipliers
    pub fn effective_command_bonus(&self) -> f64 {
        if self.has(Ability::Commander) {
            self.command_bonus * 2.0
        } else {
            self.command_bonus
        }
    }
}

/// What an independent leader was sent to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderAssignment {
    Governor { location: LocationId },
    Undercover { location: LocationId },
    Insurrection { target: LocationId, gold: u32 },
}

impl LeaderAssignment {
    pub fn target(&self) -> LocationId {
        match self {
            Self::Governor { location } | Self::Undercover { location } => *location,
            Self::Insurrection { target, .. } => *target,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leader {
    pub id: LeaderId,
    pub name: String,
    pub faction: FactionId,
    pub status: LeaderStatus,
    #[serde(default)]
    pub stats: LeaderStats,
    #[serde(default)]
    pub location: Option<LocationId>,
    #[serde(default)]
    pub army: Option<ArmyId>,
    #[serde(default)]
    pub destination: Option<LocationId>,
    #[serde(default)]
    pub turns_until_arrival: u32,
    #[serde(default)]
    pub assignment: Option<LeaderAssignment>,
}

impl Leader {
    pub fn new(id: LeaderId, name: &str, faction: FactionId, location: LocationId) -> Self {
        Self {
            id,
            name: name.to_string(),
            faction,
            status: LeaderStatus::Available,
            stats: LeaderStats::default(),
            location: Some(location),
            army: None,
            destination: None,
            turns_until_arrival: 0,
            assignment: None,
        }
    }

    pub fn with_stats(mut self, stats: LeaderStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.status != LeaderStatus::Dead
    }

    /// Free for a new assignment
    pub fn is_available(&self) -> bool {
        self.status == LeaderStatus::Available && self.army.is_none() && self.assignment.is_none()
    }

    /// Travelling on its own, not with an army
    pub fn is_travelling_alone(&self) -> bool {
        self.army.is_none() && self.destination.is_some() && self.status == LeaderStatus::Moving
    }

    pub fn kill(&mut self) {
        self.status = LeaderStatus::Dead;
        self.army = None;
        self.location = None;
        self.destination = None;
        self.assignment = None;
        self.turns_until_arrival = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commander_doubles_bonus() {
        let mut stats = LeaderStats {
            command_bonus: 0.15,
            ..LeaderStats::default()
        };
        assert!((stats.effective_command_bonus() - 0.15).abs() < 1e-9);
        stats.abilities.push(Ability::Commander);
        assert!((stats.effective_command_bonus() - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_kill_clears_position() {
        let mut leader = Leader::new(LeaderId(1), "Mara", FactionId(1), LocationId(2));
        leader.army = Some(ArmyId(4));
        leader.kill();
        assert!(!leader.is_alive());
        assert!(leader.army.is_none());
        assert!(leader.location.is_none());
    }

    #[test]
    fn test_availability() {
        let mut leader = Leader::new(LeaderId(1), "Mara", FactionId(1), LocationId(2));
        assert!(leader.is_available());
        leader.assignment = Some(LeaderAssignment::Governor {
            location: LocationId(2),
        });
        assert!(!leader.is_available());
    }
}
