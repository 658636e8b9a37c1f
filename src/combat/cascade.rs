//! Automatic resolution of contacts no human needs to decide

use rand::Rng;

use crate::combat::detection::detect_contacts;
use crate::combat::power::side_power;
use crate::combat::resolution::{resolve_combat, CombatChoice};
use crate::combat::Contact;
use crate::world::{BattleSide, EventKind, GameState, LocationKind, LogEntry};

/// Attacker's choice when nobody is asked
pub fn choose_attacker(state: &GameState, contact: &Contact) -> CombatChoice {
    let attack = side_power(state, contact, BattleSide::Attacker);
    let defend = side_power(state, contact, BattleSide::Defender);
    if attack.total() > defend.total() {
        return CombatChoice::Fight;
    }

    let can_siege = contact
        .location
        .and_then(|l| state.location(l))
        .filter(|l| l.faction == contact.defender && l.fortification > 0)
        .is_some_and(|l| {
            attack.raw >= state.config.siege_requirement(l.fortification)
                && state.gold(contact.attacker) >= state.config.siege_cost(l.fortification)
        });
    if can_siege {
        CombatChoice::Siege
    } else {
        CombatChoice::Retreat
    }
}

/// Defender's answer to the attacker's choice
pub fn choose_defender(state: &GameState, contact: &Contact, attacker_choice: CombatChoice) -> CombatChoice {
    if attacker_choice != CombatChoice::Fight {
        return attacker_choice;
    }
    let attack = side_power(state, contact, BattleSide::Attacker);
    let defend = side_power(state, contact, BattleSide::Defender);
    if defend.total().saturating_mul(2) >= attack.total() {
        return CombatChoice::Fight;
    }

    let paired_city = contact
        .location
        .and_then(|l| state.location(l))
        .filter(|l| l.kind == LocationKind::Rural)
        .and_then(|l| l.linked)
        .and_then(|c| state.location(c))
        .is_some_and(|c| c.faction == contact.defender);
    if paired_city {
        CombatChoice::RetreatToCity
    } else {
        CombatChoice::Retreat
    }
}

/// Resolve a contact with both sides' automatic choices
///
/// A choice that is rejected (say, a siege the treasury cannot cover after
/// an earlier battle in the cascade) falls back to a fight.
pub fn auto_resolve(state: &mut GameState, contact: &Contact, rng: &mut impl Rng) -> Vec<LogEntry> {
    let attacker_choice = choose_attacker(state, contact);
    let defender_choice = choose_defender(state, contact, attacker_choice);
    let (side, choice) = match defender_choice {
        CombatChoice::Retreat | CombatChoice::RetreatToCity if attacker_choice == CombatChoice::Fight => {
            (BattleSide::Defender, defender_choice)
        }
        _ => (BattleSide::Attacker, attacker_choice),
    };

    match resolve_combat(state, contact, side, choice, rng) {
        Ok(events) => events,
        Err(err) => {
            tracing::debug!(combat = %contact.id, ?choice, %err, "automatic choice rejected, fighting instead");
            resolve_combat(state, contact, BattleSide::Attacker, CombatChoice::Fight, rng).unwrap_or_default()
        }
    }
}

/// Detect and resolve contacts until none between non-human factions remain
///
/// Contacts involving a human faction are queued on the state instead.
pub fn run_cascade(state: &mut GameState, rng: &mut impl Rng) -> Vec<LogEntry> {
    let turn = state.turn;
    let mut events = Vec::new();

    for round in 0..state.config.max_cascade_rounds {
        let contacts = detect_contacts(state);
        if contacts.is_empty() {
            break;
        }
        let mut resolved = 0usize;
        for contact in contacts {
            events.push(
                LogEntry::new(
                    turn,
                    EventKind::CombatDetected {
                        combat: contact.id,
                        position: contact.position,
                        attacker: contact.attacker,
                        defender: contact.defender,
                    },
                )
                .for_faction(contact.attacker),
            );
            if contact.involves_human(state) {
                tracing::debug!(turn, combat = %contact.id, "combat awaiting player choice");
                state.pending_combats.push(contact);
                continue;
            }
            events.extend(auto_resolve(state, &contact, rng));
            resolved += 1;
        }
        tracing::debug!(turn, round, resolved, "cascade round");
        if resolved == 0 {
            break;
        }
    }
    events
}

/// Contacts left undecided from the previous turn are fought out
pub fn resolve_stale_pending(state: &mut GameState, rng: &mut impl Rng) -> Vec<LogEntry> {
    let stale = std::mem::take(&mut state.pending_combats);
    let mut events = Vec::new();
    for contact in stale {
        tracing::debug!(combat = %contact.id, "auto-resolving stale combat");
        match resolve_combat(state, &contact, BattleSide::Attacker, CombatChoice::Fight, rng) {
            Ok(batch) => events.extend(batch),
            Err(err) => tracing::debug!(combat = %contact.id, %err, "stale combat skipped"),
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::{FactionId, LocationId};
    use crate::world::{Controller, Faction, Location};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn state(human_defender: bool) -> GameState {
        let mut state = GameState::new(5, EngineConfig::default());
        state.factions.push(Faction::new(FactionId(1), "North", Controller::Ai).with_gold(500));
        let controller = if human_defender { Controller::Human } else { Controller::Ai };
        state.factions.push(Faction::new(FactionId(2), "South", controller));
        state.locations.push(
            Location::new(LocationId(1), "Gate", LocationKind::City, FactionId(2)).with_fortification(2),
        );
        state.locations.push(Location::new(LocationId(2), "March", LocationKind::City, FactionId(1)));
        state.roads.push(crate::world::Road::land(
            crate::core::types::RoadId(1),
            LocationId(1),
            LocationId(2),
            1,
        ));
        state
    }

    #[test]
    fn test_cascade_resolves_ai_contacts() {
        let mut state = state(false);
        state.spawn_army(FactionId(1), LocationId(1).into(), 5000);
        state.spawn_army(FactionId(2), LocationId(1).into(), 600);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let events = run_cascade(&mut state, &mut rng);

        assert!(state.pending_combats.is_empty());
        assert_eq!(state.location(LocationId(1)).unwrap().faction, FactionId(1));
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, EventKind::BattleFought { .. })));
    }

    #[test]
    fn test_human_contacts_are_queued() {
        let mut state = state(true);
        state.spawn_army(FactionId(1), LocationId(1).into(), 5000);
        state.spawn_army(FactionId(2), LocationId(1).into(), 600);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        run_cascade(&mut state, &mut rng);
        assert_eq!(state.pending_combats.len(), 1);

        // Running again does not queue a duplicate
        run_cascade(&mut state, &mut rng);
        assert_eq!(state.pending_combats.len(), 1);

        resolve_stale_pending(&mut state, &mut rng);
        assert!(state.pending_combats.is_empty());
        assert_eq!(state.location(LocationId(1)).unwrap().faction, FactionId(1));
    }

    #[test]
    fn test_outmatched_attacker_sieges_when_affordable() {
        let mut state = state(false);
        state.spawn_army(FactionId(1), LocationId(1).into(), 600);
        state.spawn_army(FactionId(2), LocationId(1).into(), 600);
        let contacts = detect_contacts(&mut state);
        assert_eq!(choose_attacker(&state, &contacts[0]), CombatChoice::Siege);

        state.faction_mut(FactionId(1)).unwrap().gold = 0;
        assert_eq!(choose_attacker(&state, &contacts[0]), CombatChoice::Retreat);
    }

    #[test]
    fn test_weak_defender_retreats() {
        let mut state = state(false);
        state.location_mut(LocationId(1)).unwrap().fortification = 0;
        state.spawn_army(FactionId(1), LocationId(1).into(), 5000);
        let d = state.spawn_army(FactionId(2), LocationId(1).into(), 600);
        state.army_mut(d).unwrap().last_safe_position = None;
        let contacts = detect_contacts(&mut state);
        assert_eq!(
            choose_defender(&state, &contacts[0], CombatChoice::Fight),
            CombatChoice::Retreat
        );
    }
}
