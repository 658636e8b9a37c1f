//! Conflict detection over a set of candidate steps
//!
//! Three conflict classes are checked before anything is committed:
//! head-on swaps, hostile armies already sharing a tile, and zone of
//! control exerted by stationary hostile armies. Every tie-break goes by
//! ascending army id so the same input always blocks the same army.

use ahash::AHashMap;
use std::collections::BTreeMap;

use crate::core::types::{ArmyId, FactionId};
use crate::movement::resolver::Step;
use crate::world::{ArmyPosition, BlockReason, GameState};

/// An army denied its step this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocked {
    pub army: ArmyId,
    pub reason: BlockReason,
}

/// Return the armies that must not move, ascending by id
pub fn detect_conflicts(state: &GameState, steps: &[Step]) -> Vec<Blocked> {
    let mut blocked: BTreeMap<ArmyId, BlockReason> = BTreeMap::new();

    let mut ordered: Vec<&Step> = steps.iter().collect();
    ordered.sort_by_key(|s| s.army);

    // 1. Head-on swaps: the lower id advances, the other waits on its tile
    for (i, a) in ordered.iter().enumerate() {
        for b in ordered.iter().skip(i + 1) {
            if a.faction.is_hostile_to(b.faction) && a.to == b.from && b.to == a.from {
                blocked.entry(b.army).or_insert(BlockReason::HeadOnSwap);
            }
        }
    }

    // 2. Contact engagement: hostile armies already sharing a tile; the
    //    lower id is held, and zone of control then holds the other
    for (i, a) in ordered.iter().enumerate() {
        for b in ordered.iter().skip(i + 1) {
            if a.from == b.from
                && a.faction.is_hostile_to(b.faction)
                && !blocked.contains_key(&a.army)
                && !blocked.contains_key(&b.army)
            {
                blocked.insert(a.army, BlockReason::ContactEngagement);
            }
        }
    }

    // 3. Zone of control, iterated until no new army is held
    let movers: AHashMap<ArmyId, &Step> = ordered.iter().map(|s| (s.army, *s)).collect();
    loop {
        let stationary = stationary_by_position(state, &movers, &blocked);
        let mut changed = false;
        for step in &ordered {
            if blocked.contains_key(&step.army) {
                continue;
            }
            let pinned = stationary
                .get(&step.from)
                .is_some_and(|factions| factions.iter().any(|f| f.is_hostile_to(step.faction)));
            if pinned {
                blocked.insert(step.army, BlockReason::ZoneOfControl);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    blocked
        .into_iter()
        .map(|(army, reason)| Blocked { army, reason })
        .collect()
}

/// Factions with an army that will not move this turn, per position
fn stationary_by_position(
    state: &GameState,
    movers: &AHashMap<ArmyId, &Step>,
    blocked: &BTreeMap<ArmyId, BlockReason>,
) -> AHashMap<ArmyPosition, Vec<FactionId>> {
    let mut out: AHashMap<ArmyPosition, Vec<FactionId>> = AHashMap::new();
    for army in state.armies.iter().filter(|a| a.is_alive()) {
        let moving = movers.contains_key(&army.id) && !blocked.contains_key(&army.id);
        if !moving {
            out.entry(army.position).or_default().push(army.faction);
        }
    }
    out
}
