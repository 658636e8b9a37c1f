//! Leader travel, one step per turn alongside the army resolver

use crate::core::types::LocationId;
use crate::world::{EventKind, GameState, LeaderAssignment, LeaderStatus, LogEntry};

/// Sync attached leaders with their armies and advance independent travellers
pub fn advance_leaders(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;

    // Attached leaders mirror their army
    let placements: Vec<(usize, Option<LocationId>, bool)> = state
        .leaders
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_alive())
        .filter_map(|(i, l)| {
            let army = state.army(l.army?)?;
            Some((i, army.location(), army.position.is_on_road()))
        })
        .collect();
    for (i, location, on_road) in placements {
        let leader = &mut state.leaders[i];
        leader.location = location;
        leader.status = if on_road {
            LeaderStatus::Moving
        } else {
            LeaderStatus::Available
        };
    }

    // Independent travellers arriving this turn
    let mut arrivals: Vec<usize> = Vec::new();
    for (i, leader) in state.leaders.iter_mut().enumerate() {
        if !leader.is_travelling_alone() {
            continue;
        }
        leader.turns_until_arrival = leader.turns_until_arrival.saturating_sub(1);
        if leader.turns_until_arrival == 0 {
            arrivals.push(i);
        }
    }

    let mut events = Vec::new();
    for i in arrivals {
        let (id, faction, assignment) = {
            let l = &state.leaders[i];
            (l.id, l.faction, l.assignment)
        };
        let Some(destination) = state.leaders[i].destination else {
            continue;
        };
        let friendly = state
            .location(destination)
            .is_some_and(|l| l.is_controlled_by(faction));

        let (status, assignment) = match (friendly, assignment) {
            (true, Some(a @ LeaderAssignment::Governor { location })) if location == destination => {
                (LeaderStatus::Governing, Some(a))
            }
            (true, _) => (LeaderStatus::Available, None),
            (false, Some(a @ LeaderAssignment::Insurrection { .. })) => (LeaderStatus::OnMission, Some(a)),
            (false, _) if state.has_undercover_agent(faction, destination, id) => {
                (LeaderStatus::Available, None)
            }
            (false, _) => (
                LeaderStatus::Undercover,
                Some(LeaderAssignment::Undercover {
                    location: destination,
                }),
            ),
        };

        let leader = &mut state.leaders[i];
        leader.location = Some(destination);
        leader.destination = None;
        leader.status = status;
        leader.assignment = assignment;

        tracing::debug!(turn, leader = %id, location = %destination, ?status, "leader arrived");
        events.push(
            LogEntry::new(
                turn,
                EventKind::LeaderArrived {
                    leader: id,
                    location: destination,
                    status,
                },
            )
            .for_faction(faction)
            .at(destination),
        );
    }
    events
}
