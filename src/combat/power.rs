//! Combat power of one side of a contact

use crate::combat::Contact;
use crate::core::types::{ArmyId, FactionId};
use crate::world::{ArmyPosition, BattleSide, GameState};

/// Breakdown of a side's power
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SidePower {
    /// Sum of troop strength
    pub raw: u32,
    /// Leader command bonus in troop-equivalents
    pub command: u32,
    /// Wall and terrain bonus (defender only)
    pub defense: u32,
}

impl SidePower {
    pub fn total(&self) -> u32 {
        self.raw.saturating_add(self.command).saturating_add(self.defense)
    }
}

pub fn raw_strength(state: &GameState, armies: &[ArmyId]) -> u32 {
    armies
        .iter()
        .filter_map(|id| state.army(*id))
        .map(|a| a.strength)
        .sum()
}

/// Each attached leader adds their command fraction of the whole side
pub fn command_bonus(state: &GameState, armies: &[ArmyId], raw: u32) -> u32 {
    let fraction: f64 = armies
        .iter()
        .flat_map(|id| state.attached_leaders(*id))
        .map(|l| l.stats.effective_command_bonus())
        .sum();
    (fraction * raw as f64).floor() as u32
}

/// Defensive bonus at a position; zero below the garrison threshold
pub fn defense_bonus(state: &GameState, position: ArmyPosition, defender: FactionId, raw: u32) -> u32 {
    let config = &state.config;
    if raw < config.fortification_threshold {
        return 0;
    }
    match position {
        ArmyPosition::AtLocation { id } => state
            .location(id)
            .filter(|l| l.faction == defender)
            .map(|l| config.fortification_bonus_for(l.fortification))
            .unwrap_or(0),
        ArmyPosition::AtRoadStage { road, stage } => {
            let Some(stage) = state.stage(road, stage) else {
                return 0;
            };
            let works = match stage.works_owner {
                Some(owner) if owner == defender => config.fortification_bonus_for(stage.fortification),
                _ => 0,
            };
            stage.natural_defense + works
        }
    }
}

pub fn side_power(state: &GameState, contact: &Contact, side: BattleSide) -> SidePower {
    let armies = contact.armies(side);
    let raw = raw_strength(state, armies);
    let command = command_bonus(state, armies, raw);
    let defense = match side {
        BattleSide::Attacker => 0,
        BattleSide::Defender => defense_bonus(state, contact.position, contact.defender, raw),
    };
    SidePower { raw, command, defense }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::{CombatId, LeaderId, LocationId, RoadId};
    use crate::world::{Ability, Leader, LeaderStats, Location, LocationKind, Road};

    fn walled_city(level: u8) -> GameState {
        let mut state = GameState::new(1, EngineConfig::default());
        state.locations.push(
            Location::new(LocationId(1), "Citadel", LocationKind::City, FactionId(2)).with_fortification(level),
        );
        state
    }

    fn contact(state: &GameState, position: ArmyPosition) -> Contact {
        let ids = |f: FactionId| {
            state
                .armies_at(position)
                .iter()
                .filter(|a| a.faction == f)
                .map(|a| a.id)
                .collect()
        };
        Contact {
            id: CombatId(1),
            position,
            location: position.location(),
            attacker: FactionId(1),
            defender: FactionId(2),
            attacker_armies: ids(FactionId(1)),
            defender_armies: ids(FactionId(2)),
            insurgent: false,
        }
    }

    #[test]
    fn test_walls_need_threshold_garrison() {
        let mut state = walled_city(3);
        state.spawn_army(FactionId(2), LocationId(1).into(), 499);
        let c = contact(&state, LocationId(1).into());
        let power = side_power(&state, &c, BattleSide::Defender);
        assert_eq!(power.defense, 0);
        assert_eq!(power.total(), 499);
    }

    #[test]
    fn test_walls_apply_at_threshold() {
        let mut state = walled_city(3);
        state.spawn_army(FactionId(2), LocationId(1).into(), 500);
        let c = contact(&state, LocationId(1).into());
        let power = side_power(&state, &c, BattleSide::Defender);
        assert_eq!(power.defense, 4000);
        assert_eq!(power.total(), 4500);
    }

    #[test]
    fn test_attacker_never_gets_walls() {
        let mut state = walled_city(2);
        state.spawn_army(FactionId(1), LocationId(1).into(), 2000);
        let c = contact(&state, LocationId(1).into());
        assert_eq!(side_power(&state, &c, BattleSide::Attacker).defense, 0);
    }

    #[test]
    fn test_leader_command_bonus() {
        let mut state = walled_city(0);
        let army = state.spawn_army(FactionId(1), LocationId(1).into(), 1000);
        let mut leader = Leader::new(LeaderId(1), "Vask", FactionId(1), LocationId(1)).with_stats(LeaderStats {
            command_bonus: 0.1,
            abilities: vec![Ability::Commander],
            ..LeaderStats::default()
        });
        leader.army = Some(army);
        state.leaders.push(leader);

        let c = contact(&state, LocationId(1).into());
        let power = side_power(&state, &c, BattleSide::Attacker);
        assert_eq!(power.command, 200);
        assert_eq!(power.total(), 1200);
    }

    #[test]
    fn test_stage_natural_defense() {
        let mut state = walled_city(0);
        let mut road = Road::land(RoadId(1), LocationId(1), LocationId(2), 2);
        road.stages[1].natural_defense = 300;
        road.stages[1].fortification = 1;
        road.stages[1].works_owner = Some(FactionId(2));
        state.roads.push(road);

        let position = ArmyPosition::AtRoadStage {
            road: RoadId(1),
            stage: 1,
        };
        state.spawn_army(FactionId(2), position, 600);
        let c = contact(&state, position);
        assert_eq!(side_power(&state, &c, BattleSide::Defender).defense, 1300);
    }
}
