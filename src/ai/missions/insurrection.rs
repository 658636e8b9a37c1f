//! Sending agents to raise uprisings in hostile holdings
//!
//! Any non-neutral border location of another faction qualifies. The same
//! target is never picked twice inside the cooldown window, and no
//! uprisings are planned while the faction itself is under heavy pressure.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;

use crate::actions::Action;
use crate::ai::context::{agent_rank, Orders, Planner};
use crate::ai::mission::{FactionAiState, InsurrectionMission, Mission, MissionKind, MissionStage, MissionType};
use crate::ai::missions::age;
use crate::world::LeaderAssignment;

/// Subversiveness below which a faction never plots uprisings
const MIN_SUBVERSIVENESS: f64 = 0.1;

/// Turns an unstaffed plot waits for an agent before it is dropped
const MAX_PLANNING_TURNS: u32 = 3;

/// Gold a plot budgets, scaled by subversiveness and rounded to 50
pub fn insurrection_gold(subversiveness: f64) -> u32 {
    let raw = 150.0 + 350.0 * subversiveness.clamp(0.0, 1.0);
    ((raw / 50.0).round() as u32) * 50
}

/// Softer targets score higher; half-loyal ones most of all
pub fn score_target(stability: u32) -> f64 {
    let base = (100.0 - stability.min(100) as f64) / 100.0;
    if (40..=60).contains(&stability) {
        base * 1.5
    } else {
        base
    }
}

/// Enemy strength beyond what the faction can answer
pub fn under_pressure(plan: &Planner) -> bool {
    let own = plan.state.faction_strength(plan.faction) as f64;
    plan.enemy_pressure() as f64 > plan.config().defensive_pressure_ratio * own
}

pub fn generate(plan: &Planner, record: &mut FactionAiState) {
    let config = plan.config();
    if plan.personality.subversiveness <= MIN_SUBVERSIVENESS {
        return;
    }
    if record.count_open(MissionType::Insurrection) >= config.max_insurrections {
        return;
    }
    if under_pressure(plan) {
        tracing::debug!(faction = %plan.faction, "insurrections suppressed under pressure");
        return;
    }
    let has_agent = plan
        .state
        .leaders
        .iter()
        .any(|l| l.faction == plan.faction && l.is_available() && l.location.is_some());
    if !has_agent {
        return;
    }

    let turn = plan.state.turn;
    let best = plan
        .theaters
        .iter()
        .flat_map(|t| t.border.iter().copied())
        .filter_map(|l| plan.state.location(l))
        .filter(|l| !l.faction.is_neutral() && l.faction != plan.faction)
        .filter(|l| record.insurrection_ready(l.id, turn, config.insurrection_cooldown))
        .filter(|l| !record.targets(MissionType::Insurrection, l.id))
        .map(|l| (OrderedFloat(score_target(l.stability)), Reverse(l.id)))
        .max();
    let Some((score, Reverse(target))) = best else {
        return;
    };

    let id = record.allocate_id();
    let gold = insurrection_gold(plan.personality.subversiveness);
    tracing::debug!(faction = %plan.faction, mission = %id, target = %target, score = score.0, gold, "insurrection planned");
    record.insurrection_log.push((target, turn));
    record.missions.push(Mission::new(
        id,
        plan.faction,
        MissionKind::Insurrection(InsurrectionMission {
            target,
            leader: None,
            gold,
        }),
        turn,
    ));
}

pub fn execute(plan: &Planner, orders: &mut Orders, mission: &mut Mission) {
    let MissionKind::Insurrection(mut data) = mission.kind.clone() else {
        return;
    };
    step(plan, orders, mission, &mut data);
    mission.kind = MissionKind::Insurrection(data);
}

fn step(plan: &Planner, orders: &mut Orders, mission: &mut Mission, data: &mut InsurrectionMission) {
    let state = plan.state;
    let Some(target) = state.location(data.target) else {
        return;
    };
    if target.faction == plan.faction {
        mission.complete();
        return;
    }

    match mission.stage {
        MissionStage::Planning => {
            if age(plan, mission) > MAX_PLANNING_TURNS {
                mission.fail();
                return;
            }
            if state.gold(plan.faction) < data.gold {
                return;
            }
            let Some(agent) = orders.free_leaders(plan, agent_rank).first().map(|l| l.id) else {
                return;
            };
            orders.reserve_leader(agent);
            orders.push(Action::SendLeader {
                leader: agent,
                destination: data.target,
                assignment: Some(LeaderAssignment::Insurrection {
                    target: data.target,
                    gold: data.gold,
                }),
            });
            data.leader = Some(agent);
            mission.advance(MissionStage::Infiltrating);
        }
        MissionStage::Infiltrating => {
            let Some(agent) = data.leader.and_then(|id| state.leader(id)) else {
                mission.fail();
                return;
            };
            if !agent.is_alive() {
                mission.fail();
            } else if agent.army.is_some() {
                // Rising launched; the agent now rides with the insurgents
                mission.complete();
            } else if agent.is_available() {
                // The journey was refused or the plot fizzled
                mission.fail();
            }
        }
        _ => {}
    }
}
