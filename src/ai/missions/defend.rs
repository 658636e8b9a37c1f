//! Reinforcing holdings that face more hostile strength than they hold

use std::cmp::Reverse;

use crate::ai::context::{Orders, Planner};
use crate::ai::mission::{DefendMission, FactionAiState, Mission, MissionKind, MissionStage, MissionType};
use crate::ai::theater::incoming_threat;
use crate::core::types::LocationId;

/// Farthest (in steps) a reinforcement is drawn from
const MAX_REINFORCE_DISTANCE: u32 = 6;

pub fn generate(plan: &Planner, record: &mut FactionAiState) {
    let cap = plan.config().max_defends;
    let open = record.count_open(MissionType::Defend);
    if open >= cap {
        return;
    }

    let mut exposed: Vec<(u32, LocationId, u32)> = plan
        .theaters
        .iter()
        .filter(|t| t.threatened)
        .flat_map(|t| t.locations.iter().copied())
        .filter(|l| !record.targets(MissionType::Defend, *l))
        .filter_map(|l| {
            let threat = incoming_threat(plan.state, &plan.network, plan.faction, l);
            let garrison = plan.state.garrison_strength(l, plan.faction);
            threat
                .checked_sub(garrison)
                .filter(|deficit| *deficit > 0)
                .map(|deficit| (deficit, l, threat))
        })
        .collect();
    exposed.sort_by_key(|(deficit, l, _)| (Reverse(*deficit), *l));

    for (_, location, threat) in exposed.into_iter().take(cap - open) {
        let id = record.allocate_id();
        tracing::debug!(faction = %plan.faction, mission = %id, location = %location, threat, "defense opened");
        record.missions.push(Mission::new(
            id,
            plan.faction,
            MissionKind::Defend(DefendMission { location, threat }),
            plan.state.turn,
        ));
    }
}

pub fn execute(plan: &Planner, orders: &mut Orders, mission: &mut Mission) {
    let MissionKind::Defend(mut data) = mission.kind.clone() else {
        return;
    };
    step(plan, orders, mission, &mut data);
    mission.kind = MissionKind::Defend(data);
}

fn step(plan: &Planner, orders: &mut Orders, mission: &mut Mission, data: &mut DefendMission) {
    let state = plan.state;
    if state.location(data.location).is_none() {
        return;
    }
    if !plan.owns(data.location) {
        mission.fail();
        return;
    }
    let threat = incoming_threat(state, &plan.network, plan.faction, data.location);
    if threat == 0 {
        mission.complete();
        return;
    }
    data.threat = threat;

    // Troops already standing here count, and are held in place
    let mut strength = state.garrison_strength(data.location, plan.faction);
    for army in orders.free_armies(plan) {
        if army.location() == Some(data.location) {
            orders.claim(army.id);
            mission.armies.push(army.id);
        }
    }
    strength += mission
        .armies
        .iter()
        .filter_map(|id| state.army(*id))
        .filter(|a| a.location() != Some(data.location))
        .map(|a| a.strength)
        .sum::<u32>();

    if strength < threat {
        if let Some(theater) = plan.theater_of(data.location) {
            for (distance, army) in orders.free_armies_near(plan, theater, data.location) {
                if strength >= threat || distance > MAX_REINFORCE_DISTANCE {
                    break;
                }
                orders.claim(army.id);
                mission.armies.push(army.id);
                strength += army.strength;
            }
        }
    }
    if strength < threat {
        orders.recruit(plan, data.location, threat - strength);
    }

    let mut all_home = true;
    for id in &mission.armies {
        let Some(army) = state.army(*id) else {
            continue;
        };
        if army.location() == Some(data.location) {
            orders.hold(army);
        } else {
            all_home = false;
            if army.is_idle() {
                orders.march(army, data.location);
            }
        }
    }
    mission.advance(if all_home {
        MissionStage::Holding
    } else {
        MissionStage::Moving
    });
}
