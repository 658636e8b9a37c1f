//! Resolve a contact by fight, retreat, retreat-to-city or siege
//!
//! Every branch validates before it mutates: a rejected choice leaves the
//! state untouched. Armies reduced to zero strength are removed before the
//! function returns.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::power::side_power;
use crate::combat::Contact;
use crate::core::error::{ActionError, ActionResult};
use crate::core::types::{ArmyId, Direction, FactionId, LocationId};
use crate::movement::continue_march;
use crate::world::{
    Ability, ArmyPosition, BattleSide, EventKind, GameState, LeaderStatus, LocationKind, LogEntry,
};

/// How a side answers a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatChoice {
    Fight,
    Retreat,
    /// Defender only: fall back from a rural area into its paired city
    RetreatToCity,
    /// Attacker only: pay to wear down the walls instead of assaulting
    Siege,
}

/// Resolve `contact` with `choice` made by `side`
pub fn resolve_combat(
    state: &mut GameState,
    contact: &Contact,
    side: BattleSide,
    choice: CombatChoice,
    rng: &mut impl Rng,
) -> ActionResult<Vec<LogEntry>> {
    let contact = contact.refreshed(state);
    if contact.is_empty() {
        return Ok(Vec::new());
    }

    let events = match (choice, side) {
        (CombatChoice::Fight, _) => fight(state, &contact, rng),
        (CombatChoice::Retreat, _) => retreat(state, &contact, side, rng),
        (CombatChoice::RetreatToCity, BattleSide::Defender) => retreat_to_city(state, &contact)?,
        (CombatChoice::Siege, BattleSide::Attacker) => siege(state, &contact)?,
        (CombatChoice::RetreatToCity, BattleSide::Attacker) => {
            return Err(ActionError::InvalidChoice("only the defender can retreat to a city".into()))
        }
        (CombatChoice::Siege, BattleSide::Defender) => {
            return Err(ActionError::InvalidChoice("only the attacker can lay siege".into()))
        }
    };

    state.remove_dead_armies();
    Ok(events)
}

// === FIGHT ===

fn fight(state: &mut GameState, contact: &Contact, rng: &mut impl Rng) -> Vec<LogEntry> {
    let turn = state.turn;
    let attack = side_power(state, contact, BattleSide::Attacker);
    let defend = side_power(state, contact, BattleSide::Defender);

    // Ties hold the ground
    let winner = if attack.total() > defend.total() {
        BattleSide::Attacker
    } else {
        BattleSide::Defender
    };
    let (winner_armies, loser_armies, loser_power) = match winner {
        BattleSide::Attacker => (&contact.attacker_armies, &contact.defender_armies, defend.total()),
        BattleSide::Defender => (&contact.defender_armies, &contact.attacker_armies, attack.total()),
    };
    let loser_faction = match winner {
        BattleSide::Attacker => contact.defender,
        BattleSide::Defender => contact.attacker,
    };

    let mut events = Vec::new();

    // Commanders on the losing side roll before their armies vanish
    let exclude = match (winner, contact.location) {
        (BattleSide::Attacker, Some(l)) => Some(l),
        _ => None,
    };
    events.extend(resolve_leader_fates(state, loser_armies, loser_faction, contact.position, exclude, rng));

    let mut loser_raw = 0;
    for id in loser_armies {
        if let Some(army) = state.army_mut(*id) {
            loser_raw += army.strength;
            army.strength = 0;
        }
    }

    let (absorbed, pyrrhic) = absorb_losses(state, winner_armies, loser_power);
    let floor = if pyrrhic { state.config.pyrrhic_floor } else { 0 };
    let death_toll = (loser_raw + absorbed).saturating_sub(floor);

    tracing::debug!(
        turn,
        position = ?contact.position,
        attacker_power = attack.total(),
        defender_power = defend.total(),
        ?winner,
        death_toll,
        pyrrhic,
        "battle fought"
    );
    let mut fought = LogEntry::new(
        turn,
        EventKind::BattleFought {
            position: contact.position,
            attacker: contact.attacker,
            defender: contact.defender,
            attacker_power: attack.total(),
            defender_power: defend.total(),
            winner,
            death_toll,
            pyrrhic,
        },
    )
    .for_faction(contact.attacker);
    if let Some(location) = contact.location {
        fought = fought.at(location);
    }
    events.push(fought);

    match winner {
        BattleSide::Attacker => {
            if let Some(location) = contact.location {
                events.extend(capture_after_victory(state, contact, location));
            }
        }
        BattleSide::Defender => {
            // Interrupted marchers carry on
            for id in &contact.defender_armies {
                if let Some(event) = continue_march(state, *id) {
                    events.push(event);
                }
            }
        }
    }

    for id in contact.attacker_armies.iter().chain(&contact.defender_armies) {
        if let Some(army) = state.army_mut(*id) {
            army.flags.spent = true;
        }
    }
    events
}

/// Spread `losses` over the winning armies from largest to smallest
///
/// Returns the strength actually removed and whether the last-survivor
/// floor was applied.
fn absorb_losses(state: &mut GameState, armies: &[ArmyId], losses: u32) -> (u32, bool) {
    let mut order: Vec<(u32, ArmyId)> = armies
        .iter()
        .filter_map(|id| state.army(*id).map(|a| (a.strength, a.id)))
        .collect();
    order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let total: u32 = order.iter().map(|(s, _)| *s).sum();
    let mut remaining = losses.min(total);
    let absorbed = remaining;
    for (_, id) in &order {
        if remaining == 0 {
            break;
        }
        if let Some(army) = state.army_mut(*id) {
            let hit = remaining.min(army.strength);
            army.strength -= hit;
            remaining -= hit;
        }
    }

    let wiped = total > 0 && absorbed == total;
    if wiped {
        let floor = state.config.pyrrhic_floor;
        if let Some(army) = order.first().and_then(|(_, id)| state.army_mut(*id)) {
            army.strength = floor;
        }
    }
    (absorbed, wiped)
}

fn capture_after_victory(state: &mut GameState, contact: &Contact, location: LocationId) -> Vec<LogEntry> {
    let turn = state.turn;
    let floor = state.config.insurgent_stability_floor;
    let Some(loc) = state.location_mut(location) else {
        return Vec::new();
    };
    if loc.faction != contact.defender {
        return Vec::new();
    }

    let from = loc.faction;
    let interrupted = loc.construction.is_some();
    loc.transfer_control(contact.attacker);
    loc.lower_fortification();
    if contact.insurgent && loc.stability < floor {
        loc.stability = floor;
    }
    tracing::info!(turn, location = %location, from = %from, to = %contact.attacker, "location captured");

    release_governors(state, location, from);

    let mut events = vec![LogEntry::new(
        turn,
        EventKind::LocationCaptured {
            location,
            from,
            to: contact.attacker,
        },
    )
    .for_faction(contact.attacker)
    .at(location)];
    if interrupted {
        events.push(LogEntry::new(turn, EventKind::ConstructionInterrupted { location }).at(location));
    }
    events
}

/// Governors of the former owner lose their post
pub(crate) fn release_governors(state: &mut GameState, location: LocationId, former: FactionId) {
    for leader in state.leaders.iter_mut() {
        if leader.faction == former && leader.status == LeaderStatus::Governing && leader.location == Some(location) {
            leader.status = LeaderStatus::Available;
            leader.assignment = None;
        }
    }
}

// === LEADER SURVIVAL ===

fn escape_chance(state: &GameState, ghost: bool, clandestine: u32) -> f64 {
    let config = &state.config;
    if ghost {
        return config.leader_escape_ghost;
    }
    (config.leader_escape_base + config.leader_escape_per_clandestine * clandestine as f64).min(config.leader_escape_cap)
}

/// Nearest location a faction still controls, measured from a position
fn nearest_refuge(
    state: &GameState,
    position: ArmyPosition,
    faction: FactionId,
    exclude: Option<LocationId>,
) -> Option<LocationId> {
    let network = state.network();
    let anchors: Vec<(LocationId, u32)> = match position {
        ArmyPosition::AtLocation { id } => vec![(id, 0)],
        ArmyPosition::AtRoadStage { road, stage } => match state.road(road) {
            Some(r) => vec![
                (r.to, r.steps_remaining(stage, Direction::Forward)),
                (r.from, r.steps_remaining(stage, Direction::Backward)),
            ],
            None => Vec::new(),
        },
    };

    state
        .controlled_locations(faction)
        .into_iter()
        .filter(|l| Some(*l) != exclude)
        .filter_map(|candidate| {
            anchors
                .iter()
                .filter_map(|(anchor, offset)| network.distance(*anchor, candidate).map(|d| d + offset))
                .min()
                .map(|d| (d, candidate))
        })
        .min()
        .map(|(_, l)| l)
}

fn resolve_leader_fates(
    state: &mut GameState,
    armies: &[ArmyId],
    faction: FactionId,
    position: ArmyPosition,
    exclude: Option<LocationId>,
    rng: &mut impl Rng,
) -> Vec<LogEntry> {
    let turn = state.turn;
    let mut commanders: Vec<_> = state
        .leaders
        .iter()
        .filter(|l| l.is_alive() && l.army.is_some_and(|a| armies.contains(&a)))
        .map(|l| (l.id, l.stats.has(Ability::Ghost), l.stats.clandestine))
        .collect();
    commanders.sort_by_key(|(id, _, _)| *id);

    let refuge = nearest_refuge(state, position, faction, exclude);
    let mut events = Vec::new();
    for (id, ghost, clandestine) in commanders {
        let chance = escape_chance(state, ghost, clandestine);
        let escaped = rng.gen::<f64>() < chance;
        let Some(leader) = state.leader_mut(id) else {
            continue;
        };
        match (escaped, refuge) {
            (true, Some(to)) => {
                leader.army = None;
                leader.location = Some(to);
                leader.status = LeaderStatus::Available;
                leader.destination = None;
                leader.assignment = None;
                events.push(LogEntry::new(turn, EventKind::LeaderEscaped { leader: id, to }).for_faction(faction));
            }
            _ => {
                leader.kill();
                tracing::debug!(turn, leader = %id, "leader killed");
                events.push(LogEntry::new(turn, EventKind::LeaderKilled { leader: id }).for_faction(faction));
            }
        }
    }
    events
}

// === RETREAT ===

/// Where an army falls back to when leaving a contact
fn retreat_target(state: &GameState, army: ArmyId) -> Option<ArmyPosition> {
    let army = state.army(army)?;
    let hostile_free = |p: ArmyPosition| state.hostile_strength_at(p, army.faction) == 0;

    if let Some(safe) = army.last_safe_position {
        if safe != army.position && hostile_free(safe) {
            return Some(safe);
        }
    }
    match army.position {
        ArmyPosition::AtRoadStage { road, .. } => {
            let road = state.road(road)?;
            let back = army
                .travel
                .map(|t| road.origin(t.direction))
                .or(army.trip_origin)
                .unwrap_or(road.from);
            Some(back.into())
        }
        ArmyPosition::AtLocation { id } => {
            if let Some(origin) = army.trip_origin.filter(|o| *o != id) {
                return Some(origin.into());
            }
            let network = state.network();
            network
                .neighbors(id)
                .into_iter()
                .find(|n| {
                    state.location(*n).is_some_and(|l| l.faction == army.faction) && hostile_free((*n).into())
                })
                .map(Into::into)
        }
    }
}

fn retreat(state: &mut GameState, contact: &Contact, side: BattleSide, rng: &mut impl Rng) -> Vec<LogEntry> {
    let turn = state.turn;
    let faction = contact.faction(side);
    let mut events = Vec::new();

    for id in contact.armies(side) {
        let Some(target) = retreat_target(state, *id) else {
            continue;
        };
        let Some(army) = state.army_mut(*id) else {
            continue;
        };
        army.position = target;
        army.clear_orders();
        army.flags.spent = true;
        army.flags.garrisoned = false;
        if target.location().is_some() {
            army.last_safe_position = Some(target);
        }
        events.push(LogEntry::new(turn, EventKind::Retreated { army: *id, to: target }).for_faction(faction));
    }
    refresh_supply(state, contact.armies(side));

    // Whoever had nowhere to go stands and fights
    let remaining = contact.refreshed(state);
    if !remaining.is_empty() {
        events.extend(fight(state, &remaining, rng));
    } else {
        let other = match side {
            BattleSide::Attacker => &contact.defender_armies,
            BattleSide::Defender => &contact.attacker_armies,
        };
        for id in other {
            if let Some(army) = state.army_mut(*id) {
                army.flags.spent = true;
            }
        }
    }
    events
}

fn refresh_supply(state: &mut GameState, armies: &[ArmyId]) {
    for id in armies {
        let source = state
            .army(*id)
            .and_then(|a| a.location())
            .and_then(|l| state.location(l))
            .map(|l| l.supply_source());
        if let (Some(source), Some(army)) = (source, state.army_mut(*id)) {
            army.food_source = Some(source);
        }
    }
}

fn retreat_to_city(state: &mut GameState, contact: &Contact) -> ActionResult<Vec<LogEntry>> {
    let turn = state.turn;
    let rural_id = contact
        .location
        .ok_or_else(|| ActionError::IllegalTarget("no city to fall back to on a road".into()))?;
    let rural = state.location(rural_id).ok_or(ActionError::LocationNotFound(rural_id))?;
    if rural.kind != LocationKind::Rural {
        return Err(ActionError::IllegalTarget(format!("{} is not a rural area", rural.name)));
    }
    let city_id = rural
        .linked
        .ok_or_else(|| ActionError::IllegalTarget(format!("{} has no paired city", rural.name)))?;
    let city = state.location(city_id).ok_or(ActionError::LocationNotFound(city_id))?;
    if city.faction != contact.defender {
        return Err(ActionError::NotOwner);
    }

    let mut events = Vec::new();
    for id in &contact.defender_armies {
        if let Some(army) = state.army_mut(*id) {
            army.position = city_id.into();
            army.last_safe_position = Some(city_id.into());
            army.clear_orders();
            army.flags.spent = true;
            army.flags.garrisoned = true;
            events.push(
                LogEntry::new(
                    turn,
                    EventKind::Retreated {
                        army: *id,
                        to: city_id.into(),
                    },
                )
                .for_faction(contact.defender),
            );
        }
    }
    refresh_supply(state, &contact.defender_armies);

    // The open field goes to the attacker without a battle
    let surrendered = match state.location_mut(rural_id) {
        Some(loc) if loc.faction == contact.defender => {
            loc.transfer_control(contact.attacker);
            true
        }
        _ => false,
    };
    if surrendered {
        let from = contact.defender;
        release_governors(state, rural_id, from);
        events.push(
            LogEntry::new(
                turn,
                EventKind::LocationCaptured {
                    location: rural_id,
                    from,
                    to: contact.attacker,
                },
            )
            .for_faction(contact.attacker)
            .at(rural_id),
        );
    }
    for id in &contact.attacker_armies {
        if let Some(army) = state.army_mut(*id) {
            army.flags.spent = true;
        }
    }
    Ok(events)
}

// === SIEGE ===

fn siege(state: &mut GameState, contact: &Contact) -> ActionResult<Vec<LogEntry>> {
    let turn = state.turn;
    let location_id = contact
        .location
        .ok_or_else(|| ActionError::IllegalTarget("sieges need a location".into()))?;
    let location = state
        .location(location_id)
        .ok_or(ActionError::LocationNotFound(location_id))?;
    let level = location.fortification;
    if level == 0 {
        return Err(ActionError::IllegalTarget(format!("{} has no walls to besiege", location.name)));
    }

    let required = state.config.siege_requirement(level);
    let troops: u32 = contact
        .attacker_armies
        .iter()
        .filter_map(|id| state.army(*id))
        .map(|a| a.strength)
        .sum();
    if troops < required {
        return Err(ActionError::InsufficientTroops {
            needed: required,
            available: troops,
        });
    }

    let cost = state.config.siege_cost(level);
    let available = state.gold(contact.attacker);
    if available < cost {
        return Err(ActionError::InsufficientGold { needed: cost, available });
    }

    // Validation done; mutate from here on
    if let Some(faction) = state.faction_mut(contact.attacker) {
        faction.gold -= cost;
    }

    let mut order: Vec<(u32, ArmyId)> = contact
        .attacker_armies
        .iter()
        .filter_map(|id| state.army(*id).map(|a| (a.strength, a.id)))
        .collect();
    order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut committed = 0u32;
    let mut besiegers = Vec::new();
    let mut withdrawing = Vec::new();
    for (strength, id) in order {
        if committed >= required {
            withdrawing.push(id);
            continue;
        }
        let needed = required - committed;
        if strength > needed {
            // Split: the excess becomes a new army that withdraws
            let excess = strength - needed;
            let safe = state.army(id).and_then(|a| a.last_safe_position);
            if let Some(army) = state.army_mut(id) {
                army.strength = needed;
            }
            let remainder = state.spawn_army(contact.attacker, contact.position, excess);
            if let Some(army) = state.army_mut(remainder) {
                army.last_safe_position = safe;
            }
            withdrawing.push(remainder);
            committed += needed;
        } else {
            committed += strength;
        }
        besiegers.push(id);
    }

    for id in &besiegers {
        if let Some(army) = state.army_mut(*id) {
            army.clear_orders();
            army.flags.sieging = true;
            army.flags.garrisoned = true;
            army.flags.spent = true;
        }
    }

    let mut events = Vec::new();
    for id in withdrawing {
        let target = retreat_target(state, id);
        let Some(army) = state.army_mut(id) else {
            continue;
        };
        army.clear_orders();
        army.flags.spent = true;
        if let Some(target) = target {
            army.position = target;
            events.push(
                LogEntry::new(turn, EventKind::Retreated { army: id, to: target }).for_faction(contact.attacker),
            );
        }
    }

    let new_level = match state.location_mut(location_id) {
        Some(loc) => {
            loc.lower_fortification();
            loc.fortification
        }
        None => level,
    };
    for id in &contact.defender_armies {
        if let Some(army) = state.army_mut(*id) {
            army.flags.spent = true;
        }
    }

    tracing::info!(turn, location = %location_id, besieger = %contact.attacker, troops = committed, cost, "siege laid");
    events.insert(
        0,
        LogEntry::new(
            turn,
            EventKind::SiegeStarted {
                location: location_id,
                besieger: contact.attacker,
                troops: committed,
                fortification: new_level,
                cost,
            },
        )
        .for_faction(contact.attacker)
        .at(location_id),
    );
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::{CombatId, LeaderId, RoadId};
    use crate::world::{Controller, Faction, Leader, Location, Road};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn battlefield() -> GameState {
        let mut state = GameState::new(3, EngineConfig::default());
        state.factions.push(Faction::new(FactionId(1), "North", Controller::Ai).with_gold(1000));
        state.factions.push(Faction::new(FactionId(2), "South", Controller::Ai).with_gold(1000));
        state.locations.push(Location::new(LocationId(1), "Camp", LocationKind::City, FactionId(1)));
        state.locations.push(
            Location::new(LocationId(2), "Bastion", LocationKind::City, FactionId(2))
                .with_fortification(3)
                .with_link(LocationId(3)),
        );
        state.locations.push(
            Location::new(LocationId(3), "Fields", LocationKind::Rural, FactionId(2)).with_link(LocationId(2)),
        );
        state.roads.push(Road::land(RoadId(1), LocationId(1), LocationId(2), 1));
        state.roads.push(Road::local(RoadId(2), LocationId(2), LocationId(3)));
        state
    }

    fn contact_at(state: &mut GameState, location: LocationId) -> Contact {
        let position: ArmyPosition = location.into();
        let pick = |f: FactionId| -> Vec<ArmyId> {
            state
                .armies_at(position)
                .iter()
                .filter(|a| a.faction == f)
                .map(|a| a.id)
                .collect()
        };
        Contact {
            id: CombatId(1),
            position,
            location: Some(location),
            attacker: FactionId(1),
            defender: FactionId(2),
            attacker_armies: pick(FactionId(1)),
            defender_armies: pick(FactionId(2)),
            insurgent: false,
        }
    }

    fn invade(state: &mut GameState, strength: u32, target: LocationId) -> ArmyId {
        let id = state.spawn_army(FactionId(1), target.into(), strength);
        state.army_mut(id).unwrap().last_safe_position = Some(LocationId(1).into());
        id
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn test_attacker_victory_captures() {
        let mut state = battlefield();
        state.location_mut(LocationId(2)).unwrap().fortification = 1;
        let a = invade(&mut state, 3000, LocationId(2));
        state.spawn_army(FactionId(2), LocationId(2).into(), 400);
        let contact = contact_at(&mut state, LocationId(2));

        let events = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();

        let loc = state.location(LocationId(2)).unwrap();
        assert_eq!(loc.faction, FactionId(1));
        assert_eq!(loc.fortification, 0);
        // 400 defenders (walls ignored below 500) cost the winner 400
        assert_eq!(state.army(a).unwrap().strength, 2600);
        assert_eq!(state.armies.len(), 1);
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, EventKind::LocationCaptured { .. })));
    }

    #[test]
    fn test_tie_goes_to_defender() {
        let mut state = battlefield();
        state.location_mut(LocationId(2)).unwrap().fortification = 0;
        invade(&mut state, 500, LocationId(2));
        let d = state.spawn_army(FactionId(2), LocationId(2).into(), 500);
        let contact = contact_at(&mut state, LocationId(2));

        let events = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();

        // Defender would be wiped by equal losses: last survivor keeps 1
        assert_eq!(state.army(d).unwrap().strength, 1);
        let fought = events
            .iter()
            .find_map(|e| match e.kind {
                EventKind::BattleFought {
                    winner, death_toll, pyrrhic, ..
                } => Some((winner, death_toll, pyrrhic)),
                _ => None,
            })
            .unwrap();
        assert_eq!(fought, (BattleSide::Defender, 999, true));
        assert_eq!(state.location(LocationId(2)).unwrap().faction, FactionId(2));
    }

    #[test]
    fn test_losses_hit_largest_army_first() {
        let mut state = battlefield();
        state.location_mut(LocationId(2)).unwrap().fortification = 0;
        let big = invade(&mut state, 1000, LocationId(2));
        let small = invade(&mut state, 400, LocationId(2));
        state.spawn_army(FactionId(2), LocationId(2).into(), 1100);
        let contact = contact_at(&mut state, LocationId(2));

        resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();

        assert!(state.army(big).is_none());
        assert_eq!(state.army(small).unwrap().strength, 300);
    }

    #[test]
    fn test_siege_exact_requirement() {
        let mut state = battlefield();
        let a = invade(&mut state, 1000, LocationId(2));
        state.spawn_army(FactionId(2), LocationId(2).into(), 800);
        let contact = contact_at(&mut state, LocationId(2));

        resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Siege, &mut rng()).unwrap();

        assert_eq!(state.location(LocationId(2)).unwrap().fortification, 2);
        assert_eq!(state.gold(FactionId(1)), 700);
        let army = state.army(a).unwrap();
        assert!(army.flags.sieging && army.flags.garrisoned);
        assert_eq!(army.strength, 1000);
    }

    #[test]
    fn test_siege_short_by_one_rejected() {
        let mut state = battlefield();
        invade(&mut state, 999, LocationId(2));
        state.spawn_army(FactionId(2), LocationId(2).into(), 800);
        let contact = contact_at(&mut state, LocationId(2));

        let err = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Siege, &mut rng()).unwrap_err();

        assert_eq!(
            err,
            ActionError::InsufficientTroops {
                needed: 1000,
                available: 999
            }
        );
        assert_eq!(state.gold(FactionId(1)), 1000);
        assert_eq!(state.location(LocationId(2)).unwrap().fortification, 3);
    }

    #[test]
    fn test_siege_splits_and_withdraws_remainder() {
        let mut state = battlefield();
        let a = invade(&mut state, 1600, LocationId(2));
        state.army_mut(a).unwrap().order_move_to(LocationId(2));
        state.spawn_army(FactionId(2), LocationId(2).into(), 800);
        let contact = contact_at(&mut state, LocationId(2));

        resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Siege, &mut rng()).unwrap();

        assert_eq!(state.army(a).unwrap().strength, 1000);
        let remainder = state
            .armies
            .iter()
            .find(|x| x.faction == FactionId(1) && x.id != a)
            .unwrap();
        assert_eq!(remainder.strength, 600);
        assert_eq!(remainder.location(), Some(LocationId(1)));
        assert!(remainder.destination.is_none());
    }

    #[test]
    fn test_siege_without_gold_rejected() {
        let mut state = battlefield();
        state.faction_mut(FactionId(1)).unwrap().gold = 10;
        invade(&mut state, 1200, LocationId(2));
        state.spawn_army(FactionId(2), LocationId(2).into(), 800);
        let contact = contact_at(&mut state, LocationId(2));

        let err = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Siege, &mut rng()).unwrap_err();
        assert!(matches!(err, ActionError::InsufficientGold { needed: 300, .. }));
        assert_eq!(state.location(LocationId(2)).unwrap().fortification, 3);
    }

    #[test]
    fn test_retreat_to_city_surrenders_fields() {
        let mut state = battlefield();
        invade(&mut state, 2000, LocationId(3));
        let d = state.spawn_army(FactionId(2), LocationId(3).into(), 300);
        let contact = contact_at(&mut state, LocationId(3));

        resolve_combat(&mut state, &contact, BattleSide::Defender, CombatChoice::RetreatToCity, &mut rng()).unwrap();

        assert_eq!(state.army(d).unwrap().location(), Some(LocationId(2)));
        assert_eq!(state.army(d).unwrap().strength, 300);
        assert_eq!(state.location(LocationId(3)).unwrap().faction, FactionId(1));
    }

    #[test]
    fn test_role_restricted_choices() {
        let mut state = battlefield();
        invade(&mut state, 2000, LocationId(3));
        state.spawn_army(FactionId(2), LocationId(3).into(), 300);
        let contact = contact_at(&mut state, LocationId(3));

        let err = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::RetreatToCity, &mut rng());
        assert!(matches!(err, Err(ActionError::InvalidChoice(_))));
        let err = resolve_combat(&mut state, &contact, BattleSide::Defender, CombatChoice::Siege, &mut rng());
        assert!(matches!(err, Err(ActionError::InvalidChoice(_))));
    }

    #[test]
    fn test_retreat_returns_to_safe_position() {
        let mut state = battlefield();
        let a = invade(&mut state, 300, LocationId(2));
        state.spawn_army(FactionId(2), LocationId(2).into(), 2000);
        let contact = contact_at(&mut state, LocationId(2));

        resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Retreat, &mut rng()).unwrap();

        let army = state.army(a).unwrap();
        assert_eq!(army.location(), Some(LocationId(1)));
        assert_eq!(army.strength, 300);
        assert!(army.flags.spent);
    }

    #[test]
    fn test_empty_side_is_noop() {
        let mut state = battlefield();
        state.spawn_army(FactionId(2), LocationId(2).into(), 800);
        let contact = contact_at(&mut state, LocationId(2));
        let events = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();
        assert!(events.is_empty());
        assert_eq!(state.armies[0].strength, 800);
    }

    #[test]
    fn test_losing_commander_dies_or_escapes() {
        let mut state = battlefield();
        state.location_mut(LocationId(2)).unwrap().fortification = 0;
        let a = invade(&mut state, 200, LocationId(2));
        let mut leader = Leader::new(LeaderId(1), "Oren", FactionId(1), LocationId(2));
        leader.army = Some(a);
        state.leaders.push(leader);
        state.spawn_army(FactionId(2), LocationId(2).into(), 2000);
        let contact = contact_at(&mut state, LocationId(2));

        let events = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();

        let leader = state.leader(LeaderId(1)).unwrap();
        assert!(leader.army.is_none());
        match leader.status {
            LeaderStatus::Dead => assert!(events
                .iter()
                .any(|e| matches!(e.kind, EventKind::LeaderKilled { .. }))),
            LeaderStatus::Available => assert_eq!(leader.location, Some(LocationId(1))),
            other => panic!("unexpected status {:?}", other),
        }
    }
}
