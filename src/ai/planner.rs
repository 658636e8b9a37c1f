//! One faction's planning pass
//!
//! The record from the previous turn goes in, an updated record and the
//! turn's orders come out. Nothing here touches the state; the orchestrator
//! applies the actions afterwards.

use rand::Rng;

use crate::actions::Action;
use crate::ai::budget::compute_budget;
use crate::ai::context::{Orders, Planner};
use crate::ai::mission::FactionAiState;
use crate::ai::missions::{execute_all, generate_all};
use crate::ai::spending::spend_remaining;
use crate::core::types::FactionId;
use crate::economy::{optimize_taxes, plan_convoys};
use crate::world::GameState;

/// Plan a turn for `faction`
///
/// Returned actions come in application order: tax changes, convoys, then
/// whatever the missions and leftover spending decided.
pub fn plan_faction(
    state: &GameState,
    prior: FactionAiState,
    faction: FactionId,
    rng: &mut impl Rng,
) -> (FactionAiState, Vec<Action>) {
    let mut record = prior;
    record.retire(state.turn, state.config.insurrection_cooldown);

    let plan = Planner::new(state, faction);
    generate_all(&plan, &mut record);

    let mut actions = optimize_taxes(state, faction);
    actions.extend(plan_convoys(state, faction));

    let budget = compute_budget(state, faction, &plan.theaters, &record, plan.cheapest_siege());
    tracing::debug!(
        faction = %faction,
        theaters = plan.theaters.len(),
        missions = record.missions.len(),
        available = budget.available(),
        "planning"
    );

    let mut orders = Orders::new(&record, budget);
    execute_all(&plan, &mut orders, &mut record, rng);
    spend_remaining(&plan, &mut orders);

    actions.extend(orders.actions);
    (record, actions)
}
