//! Construction progress and uncontested captures

use std::collections::BTreeMap;

use crate::combat::resolution::release_governors;
use crate::core::types::{FactionId, LocationId, RoadId};
use crate::world::{ArmyPosition, EventKind, GameState, LogEntry};

enum Progress {
    Interrupted,
    Completed(u8),
    Continuing,
}

/// Advance every fortification project by one turn
///
/// A project stops when its builder lost the site or hostile troops stand
/// on it.
pub fn advance_construction(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let mut events = Vec::new();

    // Locations
    let verdicts: Vec<(LocationId, Progress)> = state
        .locations
        .iter()
        .filter_map(|loc| {
            let project = loc.construction.as_ref()?;
            let contested = loc.faction != project.faction
                || state.hostile_strength_at(loc.id.into(), project.faction) > 0;
            Some((loc.id, judge(contested, project.turns_remaining, project.target_level)))
        })
        .collect();
    for (id, verdict) in verdicts {
        let Some(loc) = state.location_mut(id) else {
            continue;
        };
        match verdict {
            Progress::Interrupted => {
                loc.construction = None;
                tracing::debug!(turn, location = %id, "construction interrupted");
                events.push(LogEntry::new(turn, EventKind::ConstructionInterrupted { location: id }).at(id));
            }
            Progress::Completed(level) => {
                let faction = loc.faction;
                loc.construction = None;
                loc.fortification = level;
                tracing::info!(turn, location = %id, level, "fortification completed");
                events.push(
                    LogEntry::new(turn, EventKind::ConstructionCompleted { location: id, level })
                        .for_faction(faction)
                        .at(id),
                );
            }
            Progress::Continuing => {
                if let Some(project) = loc.construction.as_mut() {
                    project.turns_remaining -= 1;
                }
            }
        }
    }

    // Road stages
    let mut stage_verdicts: Vec<(RoadId, usize, FactionId, Progress)> = Vec::new();
    for road in &state.roads {
        for stage in &road.stages {
            let Some(project) = stage.construction.as_ref() else {
                continue;
            };
            let position = ArmyPosition::AtRoadStage {
                road: road.id,
                stage: stage.index,
            };
            let contested = state.hostile_strength_at(position, project.faction) > 0;
            stage_verdicts.push((
                road.id,
                stage.index,
                project.faction,
                judge(contested, project.turns_remaining, project.target_level),
            ));
        }
    }
    for (road, index, faction, verdict) in stage_verdicts {
        let Some(stage) = state.road_mut(road).and_then(|r| r.stages.get_mut(index)) else {
            continue;
        };
        match verdict {
            Progress::Interrupted => {
                stage.construction = None;
                events.push(
                    LogEntry::new(turn, EventKind::StageConstructionInterrupted { road, stage: index })
                        .for_faction(faction),
                );
            }
            Progress::Completed(level) => {
                stage.construction = None;
                stage.fortification = level;
                stage.works_owner = Some(faction);
                events.push(
                    LogEntry::new(
                        turn,
                        EventKind::StageConstructionCompleted {
                            road,
                            stage: index,
                            level,
                        },
                    )
                    .for_faction(faction),
                );
            }
            Progress::Continuing => {
                if let Some(project) = stage.construction.as_mut() {
                    project.turns_remaining -= 1;
                }
            }
        }
    }
    events
}

fn judge(contested: bool, turns_remaining: u32, target_level: u8) -> Progress {
    if contested {
        Progress::Interrupted
    } else if turns_remaining <= 1 {
        Progress::Completed(target_level)
    } else {
        Progress::Continuing
    }
}

/// Locations occupied by a single foreign faction change hands
pub fn capture_uncontested(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let floor = state.config.insurgent_stability_floor;

    // location -> (factions present, all insurgent)
    let mut occupants: BTreeMap<LocationId, (Vec<FactionId>, bool)> = BTreeMap::new();
    for army in state.armies.iter().filter(|a| a.is_alive()) {
        let Some(at) = army.location() else {
            continue;
        };
        let entry = occupants.entry(at).or_insert_with(|| (Vec::new(), true));
        if !entry.0.contains(&army.faction) {
            entry.0.push(army.faction);
        }
        entry.1 &= army.flags.insurgent;
    }

    let mut events = Vec::new();
    for (id, (factions, insurgent)) in occupants {
        let &[occupier] = factions.as_slice() else {
            continue;
        };
        let Some(loc) = state.location_mut(id) else {
            continue;
        };
        let from = loc.faction;
        if from == occupier {
            continue;
        }
        let interrupted = loc.construction.is_some();
        loc.transfer_control(occupier);
        if insurgent && loc.stability < floor {
            loc.stability = floor;
        }
        tracing::info!(turn, location = %id, from = %from, to = %occupier, "uncontested capture");
        release_governors(state, id, from);

        events.push(
            LogEntry::new(
                turn,
                EventKind::LocationCaptured {
                    location: id,
                    from,
                    to: occupier,
                },
            )
            .for_faction(occupier)
            .at(id),
        );
        if interrupted {
            events.push(LogEntry::new(turn, EventKind::ConstructionInterrupted { location: id }).at(id));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::world::{ConstructionProject, Controller, Faction, Location, LocationKind, Road};

    fn site() -> GameState {
        let mut state = GameState::new(1, EngineConfig::default());
        state.factions.push(Faction::new(FactionId(1), "Masons", Controller::Ai));
        state.factions.push(Faction::new(FactionId(2), "Raiders", Controller::Ai));
        let mut loc = Location::new(LocationId(1), "Quarry", LocationKind::City, FactionId(1));
        loc.construction = Some(ConstructionProject {
            faction: FactionId(1),
            target_level: 1,
            turns_remaining: 2,
        });
        state.locations.push(loc);
        state
            .locations
            .push(Location::new(LocationId(2), "Field", LocationKind::Rural, FactionId(1)));
        state
    }

    #[test]
    fn test_project_completes_on_schedule() {
        let mut state = site();
        assert!(advance_construction(&mut state).is_empty());
        let events = advance_construction(&mut state);
        assert!(matches!(
            events[0].kind,
            EventKind::ConstructionCompleted { level: 1, .. }
        ));
        assert_eq!(state.locations[0].fortification, 1);
        assert!(state.locations[0].construction.is_none());
    }

    #[test]
    fn test_hostile_presence_interrupts() {
        let mut state = site();
        state.spawn_army(FactionId(2), LocationId(1).into(), 100);
        let events = advance_construction(&mut state);
        assert!(matches!(events[0].kind, EventKind::ConstructionInterrupted { .. }));
        assert_eq!(state.locations[0].fortification, 0);
    }

    #[test]
    fn test_stage_works_complete() {
        let mut state = site();
        let mut road = Road::land(RoadId(1), LocationId(1), LocationId(2), 2);
        road.stages[0].construction = Some(ConstructionProject {
            faction: FactionId(1),
            target_level: 1,
            turns_remaining: 1,
        });
        state.roads.push(road);
        state.locations[0].construction = None;
        let events = advance_construction(&mut state);
        assert_eq!(events.len(), 1);
        assert_eq!(state.roads[0].stages[0].fortification, 1);
        assert_eq!(state.roads[0].stages[0].works_owner, Some(FactionId(1)));
    }

    #[test]
    fn test_empty_holding_taken() {
        let mut state = site();
        state.spawn_army(FactionId(2), LocationId(2).into(), 100);
        state.spawn_army(FactionId(2), LocationId(1).into(), 100);
        state.spawn_army(FactionId(1), LocationId(1).into(), 100);
        let events = capture_uncontested(&mut state);
        assert_eq!(events.len(), 1);
        assert_eq!(state.locations[1].faction, FactionId(2));
        // Contested location stays put
        assert_eq!(state.locations[0].faction, FactionId(1));
    }
}
