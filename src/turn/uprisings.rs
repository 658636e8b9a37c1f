//! Uprisings: agent-led insurrections and spontaneous unrest

use rand::Rng;

use crate::core::types::{FactionId, LeaderId, LocationId};
use crate::world::{Ability, ArmyPosition, EventKind, GameState, LeaderAssignment, LeaderStatus, LogEntry};

/// Troops an agent raises from `gold` at a location of `stability`
pub fn insurrection_strength(
    gold: u32,
    per_gold: u32,
    clandestine: u32,
    agitator: bool,
    stability: u32,
    population: u32,
) -> u32 {
    let mut strength = gold as f64 * per_gold as f64 * (1.0 + 0.2 * clandestine as f64);
    strength *= (100 - stability.min(100)) as f64 / 100.0;
    if agitator {
        strength *= 1.25;
    }
    (strength.floor() as u32).min(population / 10)
}

/// Troops a spontaneous uprising raises
pub fn uprising_strength(stability: u32, population: u32) -> u32 {
    let margin = 50u64.saturating_sub(u64::from(stability));
    (margin * u64::from(population) / 10_000) as u32
}

struct Plot {
    leader: LeaderId,
    faction: FactionId,
    target: LocationId,
    gold: u32,
    clandestine: u32,
    agitator: bool,
}

/// Agents on station raise their insurgents
///
/// The gold promised when the agent was sent is paid now, as far as the
/// treasury allows. An agent who cannot raise anyone stands down.
pub fn launch_insurrections(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let plots: Vec<Plot> = state
        .leaders
        .iter()
        .filter(|l| l.status == LeaderStatus::OnMission && l.army.is_none())
        .filter_map(|l| match l.assignment {
            Some(LeaderAssignment::Insurrection { target, gold }) if l.location == Some(target) => Some(Plot {
                leader: l.id,
                faction: l.faction,
                target,
                gold,
                clandestine: l.stats.clandestine,
                agitator: l.stats.has(Ability::Agitator),
            }),
            _ => None,
        })
        .collect();

    let mut events = Vec::new();
    for plot in plots {
        let Some(location) = state.location(plot.target) else {
            continue;
        };
        let paid = plot.gold.min(state.gold(plot.faction));
        let strength = if location.faction == plot.faction {
            0
        } else {
            insurrection_strength(
                paid,
                state.config.insurgents_per_gold,
                plot.clandestine,
                plot.agitator,
                location.stability,
                location.population,
            )
        };

        if strength == 0 {
            tracing::debug!(turn, leader = %plot.leader, location = %plot.target, "insurrection fizzled");
            if let Some(leader) = state.leader_mut(plot.leader) {
                leader.status = LeaderStatus::Available;
                leader.assignment = None;
            }
            continue;
        }

        if let Some(faction) = state.faction_mut(plot.faction) {
            faction.gold -= paid;
        }
        let army = state.spawn_army(plot.faction, ArmyPosition::AtLocation { id: plot.target }, strength);
        if let Some(raised) = state.army_mut(army) {
            raised.flags.insurgent = true;
        }
        if let Some(leader) = state.leader_mut(plot.leader) {
            leader.army = Some(army);
            leader.status = LeaderStatus::Available;
            leader.assignment = None;
        }
        tracing::info!(turn, faction = %plot.faction, location = %plot.target, strength, paid, "insurrection launched");
        events.push(
            LogEntry::new(
                turn,
                EventKind::InsurrectionLaunched {
                    leader: plot.leader,
                    location: plot.target,
                    strength,
                },
            )
            .for_faction(plot.faction)
            .at(plot.target),
        );
    }
    events
}

/// Restless holdings may rise on their own
///
/// Only locations held by a real faction and without insurgents already
/// present roll. The rebels belong to Neutral and are drawn from the
/// population.
pub fn spontaneous_uprisings(state: &mut GameState, rng: &mut impl Rng) -> Vec<LogEntry> {
    let turn = state.turn;
    let mut candidates: Vec<LocationId> = state
        .locations
        .iter()
        .filter(|l| !l.faction.is_neutral())
        .map(|l| l.id)
        .collect();
    candidates.sort();

    let mut events = Vec::new();
    for id in candidates {
        let Some(location) = state.location(id) else {
            continue;
        };
        let unrest = state
            .armies_at(id.into())
            .iter()
            .any(|a| a.flags.insurgent);
        if unrest {
            continue;
        }
        let chance = state.config.uprising_chance(location.stability).clamp(0.0, 1.0);
        if chance <= 0.0 || !rng.gen_bool(chance) {
            continue;
        }
        let strength = uprising_strength(location.stability, location.population);
        if strength == 0 {
            continue;
        }

        let owner = location.faction;
        let army = state.spawn_army(FactionId::NEUTRAL, ArmyPosition::AtLocation { id }, strength);
        if let Some(rebels) = state.army_mut(army) {
            rebels.flags.insurgent = true;
        }
        if let Some(location) = state.location_mut(id) {
            location.population = location.population.saturating_sub(strength);
        }
        tracing::info!(turn, location = %id, owner = %owner, strength, "spontaneous uprising");
        events.push(LogEntry::new(turn, EventKind::SpontaneousUprising { location: id, strength }).at(id));
    }
    events
}
