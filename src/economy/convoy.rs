//! Food convoys between a faction's locations

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::core::types::{ConvoyId, FactionId, LocationId};
use crate::economy::food_consumption;
use crate::world::{EventKind, GameState, LogEntry, RouteMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convoy {
    pub id: ConvoyId,
    pub faction: FactionId,
    pub from: LocationId,
    pub to: LocationId,
    pub food: u32,
    pub turns_remaining: u32,
    pub naval: bool,
}

/// Move every convoy one turn closer; deliver or lose those that arrive
pub fn advance_convoys(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let mut events = Vec::new();
    let mut arrived = Vec::new();

    for convoy in state.convoys.iter_mut() {
        convoy.turns_remaining = convoy.turns_remaining.saturating_sub(1);
        if convoy.turns_remaining == 0 {
            arrived.push(convoy.clone());
        }
    }
    state.convoys.retain(|c| c.turns_remaining > 0);

    for convoy in arrived {
        let delivered = match state.location_mut(convoy.to) {
            Some(loc) if loc.faction == convoy.faction => {
                loc.food_stock += convoy.food;
                true
            }
            _ => false,
        };
        let kind = if delivered {
            EventKind::ConvoyDelivered {
                convoy: convoy.id,
                location: convoy.to,
                food: convoy.food,
            }
        } else {
            tracing::debug!(turn, convoy = %convoy.id, "convoy lost, destination changed hands");
            EventKind::ConvoyLost {
                convoy: convoy.id,
                location: convoy.to,
            }
        };
        events.push(LogEntry::new(turn, kind).for_faction(convoy.faction).at(convoy.to));
    }
    events
}

/// Convoys a non-human faction sends to locations running short of food
pub fn plan_convoys(state: &GameState, faction: FactionId) -> Vec<Action> {
    let network = state.network();
    let owned = state.controlled_locations(faction);
    let mut actions = Vec::new();
    let mut donors_used = Vec::new();

    for target in &owned {
        let Some(loc) = state.location(*target) else {
            continue;
        };
        let need = food_consumption(state, *target);
        if need == 0 || loc.food_stock >= need * 2 {
            continue;
        }
        if state.convoys.iter().any(|c| c.faction == faction && c.to == *target) {
            continue;
        }

        let donor = owned
            .iter()
            .filter(|d| *d != target && !donors_used.contains(*d))
            .filter_map(|d| {
                let donor = state.location(*d)?;
                let keep = food_consumption(state, *d) * 4;
                let surplus = donor.food_stock.saturating_sub(keep);
                let steps = network.find_route(*d, *target, RouteMode::Land)?.steps;
                (surplus >= need).then_some((steps, *d, surplus))
            })
            .min_by_key(|(steps, id, _)| (*steps, *id));

        if let Some((_, from, surplus)) = donor {
            donors_used.push(from);
            actions.push(Action::SendConvoy {
                from,
                to: *target,
                food: surplus / 2,
                naval: false,
            });
        }
    }
    actions
}
