//! Army movement: plan one step per army, then commit atomically
//!
//! Candidate steps are computed without touching state. Conflicts are
//! detected over the whole candidate set (see `collision`) and only the
//! surviving steps are committed.

use crate::core::types::{ArmyId, Direction, FactionId, LocationId};
use crate::movement::collision::{detect_conflicts, Blocked};
use crate::movement::leaders::advance_leaders;
use crate::world::{
    Army, ArmyPosition, EventKind, GameState, LogEntry, RoadNetwork, RouteMode, Travel,
};

/// One planned step for an army
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub army: ArmyId,
    pub faction: FactionId,
    pub from: ArmyPosition,
    pub to: ArmyPosition,
    pub travel: Option<Travel>,
    /// Location reached by this step, if any
    pub arrives: Option<LocationId>,
    /// Steps still left to the destination after this one
    pub turns_left: u32,
}

/// Compute the next step for an army without mutating anything
pub fn next_step(state: &GameState, network: &RoadNetwork, army: &Army) -> Option<Step> {
    match army.position {
        ArmyPosition::AtRoadStage { road, stage } => {
            let road_ref = state.road(road)?;
            let travel = match army.travel {
                Some(travel) if travel.road == road => travel,
                // Parked on a stage: head for whichever end is closer to the goal
                _ => {
                    let goal = army.destination?;
                    let direction = [Direction::Forward, Direction::Backward]
                        .into_iter()
                        .min_by_key(|dir| {
                            let end = road_ref.destination(*dir);
                            road_ref
                                .steps_remaining(stage, *dir)
                                .saturating_add(network.distance(end, goal).unwrap_or(u32::MAX / 2))
                        })?;
                    Travel { road, direction }
                }
            };

            let turns_left = army.turns_until_arrival.saturating_sub(1);
            match road_ref.next_stage(stage, travel.direction) {
                Some(next) => Some(Step {
                    army: army.id,
                    faction: army.faction,
                    from: army.position,
                    to: ArmyPosition::AtRoadStage { road, stage: next },
                    travel: Some(travel),
                    arrives: None,
                    turns_left,
                }),
                None => {
                    let end = road_ref.destination(travel.direction);
                    Some(Step {
                        army: army.id,
                        faction: army.faction,
                        from: army.position,
                        to: end.into(),
                        travel: None,
                        arrives: Some(end),
                        turns_left,
                    })
                }
            }
        }
        ArmyPosition::AtLocation { id: current } => {
            let goal = army.destination?;
            if goal == current {
                return None;
            }
            let route = network.find_route(current, goal, RouteMode::Land)?;
            let road = state.road(route.first_road()?)?;
            let direction = road.direction_from(current)?;
            let turns_left = route.steps.saturating_sub(1);

            match road.entry_stage(direction) {
                None => {
                    let end = road.destination(direction);
                    Some(Step {
                        army: army.id,
                        faction: army.faction,
                        from: army.position,
                        to: end.into(),
                        travel: None,
                        arrives: Some(end),
                        turns_left,
                    })
                }
                Some(entry) => Some(Step {
                    army: army.id,
                    faction: army.faction,
                    from: army.position,
                    to: ArmyPosition::AtRoadStage {
                        road: road.id,
                        stage: entry,
                    },
                    travel: Some(Travel {
                        road: road.id,
                        direction,
                    }),
                    arrives: None,
                    turns_left,
                }),
            }
        }
    }
}

/// Candidate steps for every army eligible to move, ascending by army id
pub fn plan_steps(state: &GameState, network: &RoadNetwork) -> Vec<Step> {
    let mut armies: Vec<&Army> = state.armies.iter().filter(|a| a.can_move()).collect();
    armies.sort_by_key(|a| a.id);
    armies
        .into_iter()
        .filter_map(|a| next_step(state, network, a))
        .collect()
}

/// Commit one step; returns an arrival event when the destination is reached
pub fn apply_step(state: &mut GameState, step: &Step) -> Option<LogEntry> {
    let turn = state.turn;
    let supply = step
        .arrives
        .and_then(|l| state.location(l))
        .map(|l| l.supply_source());

    let army = state.army_mut(step.army)?;
    army.last_safe_position = Some(step.from);
    army.position = step.to;
    army.travel = step.travel;
    army.turns_until_arrival = step.turns_left;
    army.flags.just_moved = true;

    let arrived_at = step.arrives?;
    if supply.is_some() {
        army.food_source = supply;
    }
    if army.destination == Some(arrived_at) {
        army.clear_orders();
        return Some(
            LogEntry::new(
                turn,
                EventKind::ArmyArrived {
                    army: army.id,
                    location: arrived_at,
                },
            )
            .for_faction(army.faction)
            .at(arrived_at),
        );
    }
    None
}

/// Orders that already point at the army's own location are finished
fn settle_arrived_orders(state: &mut GameState) {
    for army in state.armies.iter_mut() {
        if army.travel.is_none() && army.destination.is_some() && army.destination == army.location() {
            army.clear_orders();
        }
    }
}

/// Advance all armies and independent leaders by one step
///
/// Armies already flagged `just_moved` are skipped, so running this twice
/// in a turn never moves an army twice.
pub fn resolve_movement(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let network = state.network();
    settle_arrived_orders(state);

    let steps = plan_steps(state, &network);
    let blocked = detect_conflicts(state, &steps);

    let mut events: Vec<LogEntry> = blocked
        .iter()
        .map(|Blocked { army, reason }| {
            let faction = state.army(*army).map(|a| a.faction);
            let entry = LogEntry::new(
                turn,
                EventKind::MovementBlocked {
                    army: *army,
                    reason: *reason,
                },
            );
            match faction {
                Some(f) => entry.for_faction(f),
                None => entry,
            }
        })
        .collect();

    let mut moved = 0usize;
    for step in &steps {
        if blocked.iter().any(|b| b.army == step.army) {
            continue;
        }
        moved += 1;
        if let Some(event) = apply_step(state, step) {
            events.push(event);
        }
    }

    tracing::debug!(turn, moved, blocked = blocked.len(), "movement resolved");

    events.extend(advance_leaders(state));
    events
}

/// Let an interrupted army take the step it was denied
///
/// Used for victorious defenders that were marching when attacked. Armies
/// that already moved this turn stay put.
pub fn continue_march(state: &mut GameState, army: ArmyId) -> Option<LogEntry> {
    let network = state.network();
    let candidate = state.army(army)?;
    if !candidate.is_marching() || candidate.flags.just_moved || candidate.flags.sieging {
        return None;
    }
    let step = next_step(state, &network, candidate)?;
    apply_step(state, &step)
}
