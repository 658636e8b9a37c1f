//! Buying the allegiance of Neutral locations

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, LocationId};
use crate::world::{Ability, EventKind, GameState, LogEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiation {
    pub faction: FactionId,
    pub target: LocationId,
    /// Gold already paid up front
    pub offer: u32,
    pub turns_remaining: u32,
}

/// Gold a Neutral location asks to join `faction`
pub fn negotiation_price(state: &GameState, faction: FactionId, target: LocationId) -> Option<u32> {
    let location = state.location(target)?;
    let base = location.population / 100;
    let negotiator = state
        .leaders
        .iter()
        .any(|l| l.faction == faction && l.is_alive() && l.stats.has(Ability::Negotiator));
    Some(if negotiator {
        (base as f64 * 0.75).ceil() as u32
    } else {
        base
    })
}

/// Settle negotiations whose time is up
pub fn settle_negotiations(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let mut events = Vec::new();
    let mut due = Vec::new();

    for negotiation in state.negotiations.iter_mut() {
        negotiation.turns_remaining = negotiation.turns_remaining.saturating_sub(1);
        if negotiation.turns_remaining == 0 {
            due.push(negotiation.clone());
        }
    }
    state.negotiations.retain(|n| n.turns_remaining > 0);

    for negotiation in due {
        let price = negotiation_price(state, negotiation.faction, negotiation.target);
        let still_neutral = state
            .location(negotiation.target)
            .is_some_and(|l| l.faction.is_neutral());
        let accepted = still_neutral && price.is_some_and(|p| negotiation.offer >= p);

        let kind = if accepted {
            if let Some(loc) = state.location_mut(negotiation.target) {
                loc.transfer_control(negotiation.faction);
            }
            // Neutral garrisons stand down and join
            for army in state.armies.iter_mut() {
                if army.faction.is_neutral() && army.location() == Some(negotiation.target) {
                    army.faction = negotiation.faction;
                    army.flags.insurgent = false;
                }
            }
            tracing::info!(turn, faction = %negotiation.faction, location = %negotiation.target, "negotiation accepted");
            EventKind::NegotiationSucceeded {
                location: negotiation.target,
            }
        } else {
            EventKind::NegotiationFailed {
                location: negotiation.target,
            }
        };
        events.push(
            LogEntry::new(turn, kind)
                .for_faction(negotiation.faction)
                .at(negotiation.target),
        );
    }
    events
}
