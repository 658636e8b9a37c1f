//! Spending what the missions left in the budget
//!
//! Threatened theaters put walls up at their most exposed frontier holding.
//! Leftover recruitment gold raises troops at the most populous holding.

use std::cmp::Reverse;

use crate::actions::Action;
use crate::ai::budget::BudgetCategory;
use crate::ai::context::{Orders, Planner};
use crate::ai::theater::incoming_threat;
use crate::core::types::LocationId;
use crate::world::location::MAX_FORTIFICATION;

pub fn spend_remaining(plan: &Planner, orders: &mut Orders) {
    fortify_frontiers(plan, orders);
    recruit_reserves(plan, orders);
}

fn fortify_frontiers(plan: &Planner, orders: &mut Orders) {
    let state = plan.state;
    for theater in plan.theaters.iter().filter(|t| t.threatened) {
        let mut frontier: Vec<(u32, LocationId)> = theater
            .locations
            .iter()
            .copied()
            .filter(|l| {
                plan.network
                    .neighbors(*l)
                    .into_iter()
                    .any(|n| theater.borders(n))
            })
            .filter(|l| {
                state.location(*l).is_some_and(|loc| {
                    loc.construction.is_none() && loc.fortification < MAX_FORTIFICATION
                })
            })
            .filter(|l| state.hostile_strength_at((*l).into(), plan.faction) == 0)
            .map(|l| (incoming_threat(state, &plan.network, plan.faction, l), l))
            .collect();
        frontier.sort_by_key(|(threat, l)| (Reverse(*threat), *l));

        let Some((threat, location)) = frontier.first().copied() else {
            continue;
        };
        let Some(cost) = state
            .location(location)
            .and_then(|loc| plan.config().fortify_cost_from(loc.fortification))
        else {
            continue;
        };
        if orders.budget.spend(BudgetCategory::Fortification, cost) {
            tracing::debug!(faction = %plan.faction, location = %location, threat, cost, "frontier fortified");
            orders.push(Action::Fortify { location });
        }
    }
}

fn recruit_reserves(plan: &Planner, orders: &mut Orders) {
    let leftover = orders.budget.remaining(BudgetCategory::Recruitment);
    if leftover == 0 {
        return;
    }
    let best = plan
        .state
        .locations
        .iter()
        .filter(|l| l.faction == plan.faction)
        .filter(|l| plan.state.hostile_strength_at(l.id.into(), plan.faction) == 0)
        .max_by_key(|l| (l.population, Reverse(l.id)));
    let Some(best) = best else {
        return;
    };
    let per_100 = plan.config().recruit_cost_per_100.max(1);
    let wanted = leftover / per_100 * 100;
    let raised = orders.recruit(plan, best.id, wanted);
    if raised > 0 {
        tracing::debug!(faction = %plan.faction, location = %best.id, raised, "reserves raised");
    }
}
