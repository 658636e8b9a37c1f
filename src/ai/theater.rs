//! Theaters: connected clusters of a faction's holdings
//!
//! Recomputed from scratch each turn. A theater's border is every
//! non-owned location one road away from one of its members.

use ahash::AHashSet;
use std::collections::VecDeque;

use crate::core::types::{FactionId, LocationId};
use crate::world::{ArmyPosition, GameState, RoadNetwork};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theater {
    pub index: usize,
    /// Owned locations, ascending
    pub locations: Vec<LocationId>,
    /// Adjacent non-owned locations, ascending
    pub border: Vec<LocationId>,
    pub friendly_strength: u32,
    pub enemy_strength: u32,
    pub threatened: bool,
}

impl Theater {
    pub fn contains(&self, location: LocationId) -> bool {
        self.locations.binary_search(&location).is_ok()
    }

    pub fn borders(&self, location: LocationId) -> bool {
        self.border.binary_search(&location).is_ok()
    }
}

/// Partition a faction's locations into road-connected theaters
pub fn build_theaters(state: &GameState, network: &RoadNetwork, faction: FactionId) -> Vec<Theater> {
    let owned: AHashSet<LocationId> = state.controlled_locations(faction).into_iter().collect();
    let mut seen: AHashSet<LocationId> = AHashSet::new();
    let mut theaters = Vec::new();

    for start in state.controlled_locations(faction) {
        if !seen.insert(start) {
            continue;
        }
        let mut members = vec![start];
        let mut border: AHashSet<LocationId> = AHashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in network.neighbors(current) {
                if owned.contains(&next) {
                    if seen.insert(next) {
                        members.push(next);
                        queue.push_back(next);
                    }
                } else {
                    border.insert(next);
                }
            }
        }
        members.sort();
        let mut border: Vec<_> = border.into_iter().collect();
        border.sort();

        let friendly_strength = members
            .iter()
            .map(|l| state.garrison_strength(*l, faction))
            .sum();
        let inside: u32 = members
            .iter()
            .map(|l| state.hostile_strength_at((*l).into(), faction))
            .sum::<u32>()
            + approaching_on_roads(state, &members, faction);
        let outside: u32 = border
            .iter()
            .map(|l| armed_threat_at(state, *l, faction))
            .sum();
        let enemy_strength = inside + outside;
        let threatened = inside > 0 || outside > friendly_strength;

        theaters.push(Theater {
            index: theaters.len(),
            locations: members,
            border,
            friendly_strength,
            enemy_strength,
            threatened,
        });
    }
    theaters
}

/// Hostile strength that can march on `location`, ignoring Neutral garrisons
/// that never leave home
pub fn armed_threat_at(state: &GameState, location: LocationId, faction: FactionId) -> u32 {
    state
        .armies_at(location.into())
        .iter()
        .filter(|a| a.faction != faction && (!a.faction.is_neutral() || a.flags.insurgent))
        .map(|a| a.strength)
        .sum()
}

/// Hostile strength on road stages leading into any of `locations`
fn approaching_on_roads(state: &GameState, locations: &[LocationId], faction: FactionId) -> u32 {
    state
        .armies
        .iter()
        .filter(|a| a.is_alive() && a.faction != faction)
        .filter(|a| match a.position {
            ArmyPosition::AtRoadStage { road, .. } => state
                .road(road)
                .is_some_and(|r| locations.iter().any(|l| r.connects(*l))),
            ArmyPosition::AtLocation { .. } => false,
        })
        .map(|a| a.strength)
        .sum()
}

/// Hostile strength next to a location: neighbors plus roads leading in
pub fn incoming_threat(state: &GameState, network: &RoadNetwork, faction: FactionId, location: LocationId) -> u32 {
    let adjacent: u32 = network
        .neighbors(location)
        .into_iter()
        .map(|n| armed_threat_at(state, n, faction))
        .sum();
    adjacent + approaching_on_roads(state, &[location], faction) + armed_threat_at(state, location, faction)
}

/// Hostile garrison as the faction's intelligence sees it
///
/// With an agent inside the count is exact; otherwise it is rounded up to
/// the next hundred.
pub fn estimate_garrison(state: &GameState, faction: FactionId, location: LocationId) -> u32 {
    let actual = state.hostile_strength_at(location.into(), faction);
    let informed = state.leaders.iter().any(|l| {
        l.faction == faction && l.is_alive() && l.location == Some(location) && l.army.is_none()
    });
    if informed {
        actual
    } else {
        actual.div_ceil(100) * 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::RoadId;
    use crate::world::{Location, LocationKind, Road};

    /// 1-2 owned by F1, 3 owned by F2, 4 owned by F1 but cut off
    fn map() -> GameState {
        let mut state = GameState::new(1, EngineConfig::default());
        for (id, owner) in [(1, 1), (2, 1), (3, 2), (4, 1)] {
            state
                .locations
                .push(Location::new(LocationId(id), "Place", LocationKind::City, FactionId(owner)));
        }
        state.roads.push(Road::land(RoadId(1), LocationId(1), LocationId(2), 1));
        state.roads.push(Road::land(RoadId(2), LocationId(2), LocationId(3), 1));
        state.roads.push(Road::land(RoadId(3), LocationId(3), LocationId(4), 1));
        state
    }

    #[test]
    fn test_two_theaters_split_by_enemy() {
        let state = map();
        let network = state.network();
        let theaters = build_theaters(&state, &network, FactionId(1));
        assert_eq!(theaters.len(), 2);
        assert_eq!(theaters[0].locations, vec![LocationId(1), LocationId(2)]);
        assert_eq!(theaters[0].border, vec![LocationId(3)]);
        assert_eq!(theaters[1].locations, vec![LocationId(4)]);
    }

    #[test]
    fn test_threat_from_border_army() {
        let mut state = map();
        state.spawn_army(FactionId(1), LocationId(2).into(), 300);
        state.spawn_army(FactionId(2), LocationId(3).into(), 900);
        let network = state.network();
        let theaters = build_theaters(&state, &network, FactionId(1));
        assert_eq!(theaters[0].friendly_strength, 300);
        assert_eq!(theaters[0].enemy_strength, 900);
        assert!(theaters[0].threatened);
        assert_eq!(incoming_threat(&state, &network, FactionId(1), LocationId(2)), 900);
        assert_eq!(incoming_threat(&state, &network, FactionId(1), LocationId(1)), 0);
    }

    #[test]
    fn test_garrison_estimate_rounds_without_agent() {
        let mut state = map();
        state.spawn_army(FactionId(2), LocationId(3).into(), 420);
        assert_eq!(estimate_garrison(&state, FactionId(1), LocationId(3)), 500);
        state
            .leaders
            .push(crate::world::Leader::new(crate::core::types::LeaderId(1), "Spy", FactionId(1), LocationId(3)));
        assert_eq!(estimate_garrison(&state, FactionId(1), LocationId(3)), 420);
    }
}
