//! Posting governors to restless holdings

use crate::actions::Action;
use crate::ai::context::{governor_rank, Orders, Planner};
use crate::ai::mission::{FactionAiState, Mission, MissionKind, MissionStage, MissionType, StabilizeMission};
use crate::core::types::LocationId;
use crate::world::{LeaderAssignment, LeaderStatus};

/// Stability under which a holding asks for a governor
pub const UNREST_THRESHOLD: u32 = 40;

/// Stability at which the holding counts as settled
pub const SETTLED_THRESHOLD: u32 = 60;

pub fn generate(plan: &Planner, record: &mut FactionAiState) {
    let cap = plan.config().max_stabilizes;
    let open = record.count_open(MissionType::Stabilize);
    if open >= cap {
        return;
    }

    let mut restless: Vec<(u32, LocationId)> = plan
        .state
        .locations
        .iter()
        .filter(|l| l.faction == plan.faction && l.stability < UNREST_THRESHOLD)
        .filter(|l| !record.targets(MissionType::Stabilize, l.id))
        .map(|l| (l.stability, l.id))
        .collect();
    restless.sort();

    for (stability, location) in restless.into_iter().take(cap - open) {
        let id = record.allocate_id();
        tracing::debug!(faction = %plan.faction, mission = %id, location = %location, stability, "stabilization opened");
        record.missions.push(Mission::new(
            id,
            plan.faction,
            MissionKind::Stabilize(StabilizeMission {
                location,
                governor: None,
            }),
            plan.state.turn,
        ));
    }
}

pub fn execute(plan: &Planner, orders: &mut Orders, mission: &mut Mission) {
    let MissionKind::Stabilize(mut data) = mission.kind.clone() else {
        return;
    };
    step(plan, orders, mission, &mut data);
    mission.kind = MissionKind::Stabilize(data);
}

fn step(plan: &Planner, orders: &mut Orders, mission: &mut Mission, data: &mut StabilizeMission) {
    let Some(location) = plan.state.location(data.location) else {
        return;
    };
    if location.faction != plan.faction {
        mission.fail();
        return;
    }
    if location.stability >= SETTLED_THRESHOLD {
        mission.complete();
        return;
    }

    if let Some(id) = data.governor {
        let posted = plan.state.leader(id).is_some_and(|l| {
            l.assignment == Some(LeaderAssignment::Governor {
                location: data.location,
            }) && matches!(l.status, LeaderStatus::Governing | LeaderStatus::Moving)
        });
        if posted {
            orders.reserve_leader(id);
            return;
        }
        tracing::debug!(faction = %plan.faction, mission = %mission.id, leader = %id, "governor lost");
        data.governor = None;
        mission.advance(MissionStage::Planning);
    }

    let Some(governor) = orders.free_leaders(plan, governor_rank).first().map(|l| l.id) else {
        return;
    };
    orders.reserve_leader(governor);
    orders.push(Action::SendLeader {
        leader: governor,
        destination: data.location,
        assignment: Some(LeaderAssignment::Governor {
            location: data.location,
        }),
    });
    data.governor = Some(governor);
    mission.advance(MissionStage::Governing);
}
