//! Stamping out insurgent bands in or next to owned territory

use std::collections::BTreeMap;

use crate::ai::context::{Orders, Planner};
use crate::ai::mission::{CounterInsurrectionMission, FactionAiState, Mission, MissionKind, MissionStage, MissionType};
use crate::ai::missions::{age, assigned_strength};
use crate::core::types::LocationId;

/// Turns a mission may go without a single army before giving up
const MAX_UNSTAFFED_TURNS: u32 = 5;

/// Strength sent relative to the insurgents
const OVERMATCH: f64 = 1.2;

/// Insurgent strength of other factions at a location
fn insurgents_at(plan: &Planner, location: LocationId) -> u32 {
    plan.state
        .armies_at(location.into())
        .into_iter()
        .filter(|a| a.flags.insurgent && a.faction != plan.faction)
        .map(|a| a.strength)
        .sum()
}

pub fn generate(plan: &Planner, record: &mut FactionAiState) {
    let cap = plan.config().max_counter_insurrections;
    let open = record.count_open(MissionType::CounterInsurrection);
    if open >= cap {
        return;
    }

    let mut bands: BTreeMap<LocationId, u32> = BTreeMap::new();
    for army in &plan.state.armies {
        if !army.is_alive() || !army.flags.insurgent || army.faction == plan.faction {
            continue;
        }
        let Some(at) = army.location() else {
            continue;
        };
        let near = plan.owns(at) || plan.network.neighbors(at).into_iter().any(|n| plan.owns(n));
        if near {
            *bands.entry(at).or_default() += army.strength;
        }
    }

    let fresh = bands
        .into_iter()
        .filter(|(l, _)| !record.targets(MissionType::CounterInsurrection, *l))
        .take(cap - open)
        .collect::<Vec<_>>();
    for (location, threat) in fresh {
        let id = record.allocate_id();
        tracing::debug!(faction = %plan.faction, mission = %id, location = %location, threat, "counter-insurrection opened");
        record.missions.push(Mission::new(
            id,
            plan.faction,
            MissionKind::CounterInsurrection(CounterInsurrectionMission { location, threat }),
            plan.state.turn,
        ));
    }
}

pub fn execute(plan: &Planner, orders: &mut Orders, mission: &mut Mission) {
    let MissionKind::CounterInsurrection(mut data) = mission.kind.clone() else {
        return;
    };
    step(plan, orders, mission, &mut data);
    mission.kind = MissionKind::CounterInsurrection(data);
}

fn step(plan: &Planner, orders: &mut Orders, mission: &mut Mission, data: &mut CounterInsurrectionMission) {
    let threat = insurgents_at(plan, data.location);
    if threat == 0 {
        mission.complete();
        return;
    }
    data.threat = threat;

    let needed = (threat as f64 * OVERMATCH).ceil() as u32;
    let mut strength = assigned_strength(plan, mission);
    if strength < needed {
        if let Some(theater) = plan.theater_of(data.location) {
            for (_, army) in orders.free_armies_near(plan, theater, data.location) {
                if strength >= needed {
                    break;
                }
                orders.claim(army.id);
                mission.armies.push(army.id);
                strength += army.strength;
            }
        }
    }

    if mission.armies.is_empty() {
        if age(plan, mission) > MAX_UNSTAFFED_TURNS {
            mission.fail();
        }
        return;
    }

    for id in &mission.armies {
        if let Some(army) = plan.state.army(*id) {
            if army.is_idle() {
                orders.march(army, data.location);
            }
        }
    }
    mission.advance(MissionStage::Moving);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::ai::budget::Budget;
    use crate::core::config::EngineConfig;
    use crate::core::types::{FactionId, RoadId};
    use crate::world::{Controller, Faction, GameState, Location, LocationKind, Road};

    fn unrest() -> GameState {
        let mut state = GameState::new(1, EngineConfig::default());
        state.factions.push(Faction::new(FactionId(1), "Order", Controller::Ai));
        state.factions.push(Faction::new(FactionId(2), "Rebels", Controller::Ai));
        for id in 1..=3 {
            state
                .locations
                .push(Location::new(LocationId(id), "Shire", LocationKind::Rural, FactionId(1)));
        }
        state.roads.push(Road::land(RoadId(1), LocationId(1), LocationId(2), 1));
        state.roads.push(Road::land(RoadId(2), LocationId(2), LocationId(3), 1));
        state
    }

    #[test]
    fn test_band_inside_territory_targeted() {
        let mut state = unrest();
        let band = state.spawn_army(FactionId(2), LocationId(3).into(), 300);
        if let Some(army) = state.army_mut(band) {
            army.flags.insurgent = true;
        }
        let plan = Planner::new(&state, FactionId(1));
        let mut record = FactionAiState::new(FactionId(1));
        generate(&plan, &mut record);
        assert!(record.targets(MissionType::CounterInsurrection, LocationId(3)));
    }

    #[test]
    fn test_overmatching_force_sent() {
        let mut state = unrest();
        let band = state.spawn_army(FactionId(2), LocationId(3).into(), 300);
        if let Some(army) = state.army_mut(band) {
            army.flags.insurgent = true;
        }
        let near = state.spawn_army(FactionId(1), LocationId(2).into(), 200);
        let far = state.spawn_army(FactionId(1), LocationId(1).into(), 200);
        let plan = Planner::new(&state, FactionId(1));
        let mut record = FactionAiState::new(FactionId(1));
        generate(&plan, &mut record);
        let mut orders = Orders::new(&record, Budget::default());
        execute(&plan, &mut orders, &mut record.missions[0]);
        assert_eq!(record.missions[0].armies, vec![near, far]);
        assert!(orders.actions.contains(&Action::MoveArmy {
            army: far,
            destination: LocationId(3)
        }));
    }

    #[test]
    fn test_completes_when_band_gone() {
        let state = unrest();
        let plan = Planner::new(&state, FactionId(1));
        let mut record = FactionAiState::new(FactionId(1));
        let id = record.allocate_id();
        let mut mission = Mission::new(
            id,
            FactionId(1),
            MissionKind::CounterInsurrection(CounterInsurrectionMission {
                location: LocationId(3),
                threat: 300,
            }),
            1,
        );
        let mut orders = Orders::new(&record, Budget::default());
        execute(&plan, &mut orders, &mut mission);
        assert!(!mission.is_open());
    }
}
