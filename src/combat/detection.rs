//! Find co-located hostile armies and turn them into contacts

use std::collections::BTreeMap;

use crate::combat::Contact;
use crate::core::types::{ArmyId, CombatId, FactionId};
use crate::world::{Army, ArmyPosition, GameState};

/// Detect every new engagement, ascending by position
///
/// Positions that already carry a pending combat are skipped, as are
/// positions where every attacking army is already besieging.
pub fn detect_contacts(state: &mut GameState) -> Vec<Contact> {
    let mut by_position: BTreeMap<ArmyPosition, Vec<&Army>> = BTreeMap::new();
    for army in state.armies.iter().filter(|a| a.is_alive()) {
        by_position.entry(army.position).or_default().push(army);
    }

    let mut found = Vec::new();
    for (position, mut armies) in by_position {
        if state.pending_combats.iter().any(|c| c.position == position) {
            continue;
        }
        armies.sort_by_key(|a| a.id);
        let Some(contact) = classify(state, position, &armies) else {
            continue;
        };
        found.push(contact);
    }

    for contact in found.iter_mut() {
        contact.id = state.allocate_combat_id();
    }
    found
}

/// Pick defender and attacker for a tile, or None when nobody is hostile
fn classify(state: &GameState, position: ArmyPosition, armies: &[&Army]) -> Option<Contact> {
    let mut strength: BTreeMap<FactionId, u32> = BTreeMap::new();
    for army in armies {
        *strength.entry(army.faction).or_default() += army.strength;
    }
    if strength.len() < 2 {
        return None;
    }

    let location = position.location();
    let owner = location.and_then(|l| state.location(l)).map(|l| l.faction);

    // Owner holds the field; otherwise whoever was there first; otherwise lowest id
    let defender = owner
        .filter(|f| strength.contains_key(f))
        .or_else(|| armies.iter().find(|a| !a.flags.just_moved).map(|a| a.faction))
        .or_else(|| strength.keys().next().copied())?;

    // Strongest remaining faction attacks; BTreeMap order breaks ties by id
    let attacker = strength
        .iter()
        .filter(|(f, _)| **f != defender)
        .fold(None::<(FactionId, u32)>, |best, (f, s)| match best {
            Some((_, bs)) if bs >= *s => best,
            _ => Some((*f, *s)),
        })
        .map(|(f, _)| f)?;

    let side = |faction: FactionId| -> Vec<ArmyId> {
        armies
            .iter()
            .filter(|a| a.faction == faction)
            .map(|a| a.id)
            .collect()
    };
    let attacker_armies = side(attacker);
    let defender_armies = side(defender);

    let all_sieging = armies
        .iter()
        .filter(|a| a.faction == attacker)
        .all(|a| a.flags.sieging);
    if all_sieging {
        return None;
    }

    let insurgent = armies
        .iter()
        .any(|a| a.faction == attacker && a.flags.insurgent);

    Some(Contact {
        id: CombatId(0),
        position,
        location,
        attacker,
        defender,
        attacker_armies,
        defender_armies,
        insurgent,
    })
}
