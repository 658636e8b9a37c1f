//! Mission generators and executors, one module per mission type
//!
//! Generators look at the world and open new missions (respecting the
//! per-type caps). Executors run every open mission once per turn, in a
//! fixed type order, and turn its progress into actions.

pub mod campaign;
pub mod counter_insurrection;
pub mod defend;
pub mod insurrection;
pub mod negotiate;
pub mod road_defense;
pub mod stabilize;

use rand::Rng;

use crate::ai::context::{Orders, Planner};
use crate::ai::mission::{FactionAiState, Mission, MissionType};

/// Order in which executors claim armies and gold
pub const EXECUTION_ORDER: [MissionType; 7] = [
    MissionType::Defend,
    MissionType::CounterInsurrection,
    MissionType::Campaign,
    MissionType::RoadDefense,
    MissionType::Stabilize,
    MissionType::Insurrection,
    MissionType::Negotiate,
];

/// Run every generator against the faction's record
pub fn generate_all(plan: &Planner, record: &mut FactionAiState) {
    defend::generate(plan, record);
    counter_insurrection::generate(plan, record);
    campaign::generate(plan, record);
    road_defense::generate(plan, record);
    stabilize::generate(plan, record);
    insurrection::generate(plan, record);
    negotiate::generate(plan, record);
}

/// Run every open mission's executor once
pub fn execute_all(plan: &Planner, orders: &mut Orders, record: &mut FactionAiState, rng: &mut impl Rng) {
    for mission in record.missions.iter_mut().filter(|m| m.is_open()) {
        prune_armies(plan, mission);
    }

    for kind in EXECUTION_ORDER {
        for mission in record
            .missions
            .iter_mut()
            .filter(|m| m.is_open() && m.mission_type() == kind)
        {
            match kind {
                MissionType::Campaign => campaign::execute(plan, orders, mission, rng),
                MissionType::Defend => defend::execute(plan, orders, mission),
                MissionType::RoadDefense => road_defense::execute(plan, orders, mission),
                MissionType::Insurrection => insurrection::execute(plan, orders, mission),
                MissionType::Negotiate => negotiate::execute(plan, orders, mission),
                MissionType::Stabilize => stabilize::execute(plan, orders, mission),
                MissionType::CounterInsurrection => counter_insurrection::execute(plan, orders, mission),
            }
            if !mission.is_open() {
                orders.release(&mission.armies);
                tracing::debug!(
                    faction = %plan.faction,
                    mission = %mission.id,
                    kind = ?kind,
                    status = ?mission.status,
                    "mission closed"
                );
            }
        }
    }
}

/// Forget assigned armies that died or changed hands
fn prune_armies(plan: &Planner, mission: &mut Mission) {
    mission.armies.retain(|id| {
        plan.state
            .army(*id)
            .is_some_and(|a| a.is_alive() && a.faction == plan.faction)
    });
}

/// Turns a mission has existed
pub(crate) fn age(plan: &Planner, mission: &Mission) -> u32 {
    plan.state.turn.saturating_sub(mission.created_turn)
}

/// Strength of a mission's living armies
pub(crate) fn assigned_strength(plan: &Planner, mission: &Mission) -> u32 {
    mission
        .armies
        .iter()
        .filter_map(|id| plan.state.army(*id))
        .map(|a| a.strength)
        .sum()
}
