//! Buying neutral border holdings with gold

use crate::actions::Action;
use crate::ai::budget::BudgetCategory;
use crate::ai::context::{Orders, Planner};
use crate::ai::mission::{FactionAiState, Mission, MissionKind, MissionStage, MissionType, NegotiateMission};
use crate::ai::missions::age;
use crate::core::types::LocationId;
use crate::economy::negotiation_price;

/// Turns an offer may wait on the diplomacy budget
const MAX_PLANNING_TURNS: u32 = 4;

pub fn generate(plan: &Planner, record: &mut FactionAiState) {
    let cap = plan.config().max_negotiations;
    let open = record.count_open(MissionType::Negotiate);
    if open >= cap {
        return;
    }
    let treasury = plan.state.gold(plan.faction);

    let mut offers: Vec<(u32, LocationId)> = plan
        .theaters
        .iter()
        .flat_map(|t| t.border.iter().copied())
        .filter(|l| plan.state.location(*l).is_some_and(|loc| loc.faction.is_neutral()))
        .filter(|l| !record.targets(MissionType::Negotiate, *l))
        .filter(|l| {
            !plan
                .state
                .negotiations
                .iter()
                .any(|n| n.faction == plan.faction && n.target == *l)
        })
        .filter_map(|l| {
            let price = negotiation_price(plan.state, plan.faction, l)?;
            (price > 0 && price <= treasury / 2).then_some((price, l))
        })
        .collect();
    offers.sort();
    offers.dedup_by_key(|(_, l)| *l);

    for (offer, target) in offers.into_iter().take(cap - open) {
        let id = record.allocate_id();
        tracing::debug!(faction = %plan.faction, mission = %id, target = %target, offer, "negotiation planned");
        record.missions.push(Mission::new(
            id,
            plan.faction,
            MissionKind::Negotiate(NegotiateMission { target, offer }),
            plan.state.turn,
        ));
    }
}

pub fn execute(plan: &Planner, orders: &mut Orders, mission: &mut Mission) {
    let MissionKind::Negotiate(data) = &mission.kind else {
        return;
    };
    let (target, offer) = (data.target, data.offer);
    let Some(location) = plan.state.location(target) else {
        return;
    };
    if location.faction == plan.faction {
        mission.complete();
        return;
    }
    if !location.faction.is_neutral() {
        // Someone else got there first
        mission.fail();
        return;
    }

    match mission.stage {
        MissionStage::Negotiating => {
            let pending = plan
                .state
                .negotiations
                .iter()
                .any(|n| n.faction == plan.faction && n.target == target);
            if !pending {
                // Settled and refused
                mission.fail();
            }
        }
        _ => {
            if age(plan, mission) > MAX_PLANNING_TURNS {
                mission.fail();
                return;
            }
            if orders.budget.spend(BudgetCategory::Diplomacy, offer) {
                orders.push(Action::Negotiate { target, gold: offer });
                mission.advance(MissionStage::Negotiating);
            }
        }
    }
}
