//! Turning structured events into prompt text

use crate::core::types::{ArmyId, FactionId, LeaderId, LocationId};
use crate::world::{ArmyPosition, BattleSide, EventKind, GameState, LogEntry};

pub const SYSTEM_PROMPT: &str = "You are the chronicler of a war between rival realms. \
Given the events of one season, write a short dispatch of two to four sentences in a \
grounded, period voice. Mention places and leaders by name. Do not invent events.";

fn location_name(state: &GameState, id: LocationId) -> String {
    state
        .location(id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("location {id}"))
}

pub fn faction_name(state: &GameState, id: FactionId) -> String {
    state
        .faction(id)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| format!("faction {id}"))
}

fn leader_name(state: &GameState, id: LeaderId) -> String {
    state
        .leader(id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("leader {id}"))
}

fn army_name(state: &GameState, id: ArmyId) -> String {
    state
        .army(id)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| format!("army {id}"))
}

fn position_name(state: &GameState, position: ArmyPosition) -> String {
    match position {
        ArmyPosition::AtLocation { id } => location_name(state, id),
        ArmyPosition::AtRoadStage { road, stage } => match state.road(road) {
            Some(r) => format!(
                "the road between {} and {} (stage {})",
                location_name(state, r.from),
                location_name(state, r.to),
                stage + 1
            ),
            None => format!("road {road}"),
        },
    }
}

/// One sentence for an event, or None for bookkeeping not worth telling
pub fn describe_event(state: &GameState, entry: &LogEntry) -> Option<String> {
    let text = match &entry.kind {
        EventKind::BattleFought {
            position,
            attacker,
            defender,
            winner,
            death_toll,
            ..
        } => {
            let (won, lost) = match winner {
                BattleSide::Attacker => (attacker, defender),
                BattleSide::Defender => (defender, attacker),
            };
            format!(
                "{} defeated {} at {}; {} fell.",
                faction_name(state, *won),
                faction_name(state, *lost),
                position_name(state, *position),
                death_toll
            )
        }
        EventKind::LocationCaptured { location, from, to } => format!(
            "{} took {} from {}.",
            faction_name(state, *to),
            location_name(state, *location),
            faction_name(state, *from)
        ),
        EventKind::SiegeStarted {
            location, besieger, ..
        } => format!(
            "{} laid siege to {}.",
            faction_name(state, *besieger),
            location_name(state, *location)
        ),
        EventKind::Retreated { army, to } => format!(
            "{} fell back to {}.",
            army_name(state, *army),
            position_name(state, *to)
        ),
        EventKind::LeaderKilled { leader } => format!("{} was slain.", leader_name(state, *leader)),
        EventKind::LeaderEscaped { leader, to } => format!(
            "{} escaped to {}.",
            leader_name(state, *leader),
            location_name(state, *to)
        ),
        EventKind::InsurrectionLaunched {
            leader,
            location,
            strength,
        } => format!(
            "{} raised {} rebels in {}.",
            leader_name(state, *leader),
            strength,
            location_name(state, *location)
        ),
        EventKind::SpontaneousUprising { location, strength } => format!(
            "{} rose in revolt with {} rebels.",
            location_name(state, *location),
            strength
        ),
        EventKind::ConstructionCompleted { location, level } => format!(
            "The walls of {} now stand at level {}.",
            location_name(state, *location),
            level
        ),
        EventKind::Famine {
            location,
            population_lost,
        } => format!(
            "Famine struck {}, claiming {} souls.",
            location_name(state, *location),
            population_lost
        ),
        EventKind::NegotiationSucceeded { location } => {
            format!("{} agreed to terms.", location_name(state, *location))
        }
        EventKind::ConvoyLost { location, .. } => {
            format!("A convoy bound for {} was lost.", location_name(state, *location))
        }
        EventKind::Victory { faction } => {
            format!("{} now rules every land.", faction_name(state, *faction))
        }
        _ => return None,
    };
    Some(text)
}

/// Sentences for every notable event of the turn, in order
pub fn describe_events(state: &GameState, events: &[LogEntry]) -> Vec<String> {
    events.iter().filter_map(|e| describe_event(state, e)).collect()
}

/// User prompt for a turn, optionally from one realm's point of view
pub fn build_prompt(turn: u32, perspective: Option<&str>, lines: &[String]) -> String {
    let mut prompt = format!("Season {turn}.\n");
    if let Some(realm) = perspective {
        prompt.push_str(&format!("Write for the court of {realm}.\n"));
    }
    if lines.is_empty() {
        prompt.push_str("Nothing of note happened.\n");
    } else {
        prompt.push_str("Events:\n");
        for line in lines {
            prompt.push_str("- ");
            prompt.push_str(line);
            prompt.push('\n');
        }
    }
    prompt
}
