//! Economic & logistics pass
//!
//! Runs once per turn after insurrections and construction: convoys land,
//! income is collected, food is eaten, famine strikes, stability drifts and
//! negotiations settle.

pub mod convoy;
pub mod negotiation;
pub mod tax;

pub use convoy::{advance_convoys, plan_convoys, Convoy};
pub use negotiation::{negotiation_price, settle_negotiations, Negotiation};
pub use tax::{choose_tax_level, optimize_taxes};

use ahash::AHashMap;

use crate::core::types::{FactionId, LocationId};
use crate::world::{Ability, EventKind, GameState, LeaderStatus, LogEntry};

/// Population fed by one unit of food
const POPULATION_PER_FOOD: u32 = 10_000;

/// Troops fed by one unit of food
const TROOPS_PER_FOOD: u32 = 100;

/// Food a location must supply this turn: its people plus the armies drawing on it
pub fn food_consumption(state: &GameState, location: LocationId) -> u32 {
    let Some(loc) = state.location(location) else {
        return 0;
    };
    let upkeep: u32 = state
        .armies
        .iter()
        .filter(|a| a.is_alive() && a.food_source == Some(location))
        .map(|a| a.strength / TROOPS_PER_FOOD)
        .sum();
    loc.population / POPULATION_PER_FOOD + upkeep
}

/// Gold income for every non-neutral faction, after tax multipliers
pub fn collect_income(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let mut income: AHashMap<FactionId, u32> = AHashMap::new();
    for loc in state.locations.iter().filter(|l| !l.faction.is_neutral()) {
        let gold = (loc.gold_income as f64 * loc.tax_level.income_multiplier()).floor() as u32;
        *income.entry(loc.faction).or_default() += gold;
    }

    let mut factions: Vec<_> = income.into_iter().collect();
    factions.sort();
    let mut events = Vec::new();
    for (faction, gold) in factions {
        if let Some(f) = state.faction_mut(faction) {
            f.gold += gold;
            events.push(LogEntry::new(turn, EventKind::IncomeCollected { gold }).for_faction(faction));
        }
    }
    events
}

/// Produce and consume food; locations that run dry suffer famine
pub fn feed_locations(state: &mut GameState) -> Vec<LogEntry> {
    let turn = state.turn;
    let needs: Vec<(LocationId, u32)> = state
        .locations
        .iter()
        .map(|l| (l.id, food_consumption(state, l.id)))
        .collect();
    let penalty = state.config.famine_stability_penalty as i32;
    let loss_rate = state.config.famine_population_loss;

    let mut events = Vec::new();
    for (id, need) in needs {
        let Some(loc) = state.location_mut(id) else {
            continue;
        };
        loc.food_stock += loc.food_income;
        if loc.food_stock >= need {
            loc.food_stock -= need;
            continue;
        }
        loc.food_stock = 0;
        loc.adjust_stability(-penalty);
        let lost = (loc.population as f64 * loss_rate).floor() as u32;
        loc.population -= lost;
        let owner = loc.faction;
        tracing::debug!(turn, location = %id, lost, "famine");
        events.push(
            LogEntry::new(turn, EventKind::Famine { location: id, population_lost: lost })
                .for_faction(owner)
                .at(id),
        );
    }
    events
}

/// Tax drift plus governor bonus
pub fn adjust_stability(state: &mut GameState) {
    let bonuses: Vec<(LocationId, i32)> = state
        .leaders
        .iter()
        .filter(|l| l.status == LeaderStatus::Governing)
        .filter_map(|l| {
            let location = l.location?;
            let owner = state.location(location)?.faction;
            if owner != l.faction {
                return None;
            }
            let extra = if l.stats.has(Ability::Administrator) { 2 } else { 0 };
            Some((location, l.stats.stability as i32 + extra))
        })
        .collect();

    for loc in state.locations.iter_mut() {
        let drift = loc.tax_level.stability_drift();
        loc.adjust_stability(drift);
    }
    for (location, bonus) in bonuses {
        if let Some(loc) = state.location_mut(location) {
            loc.adjust_stability(bonus);
        }
    }
}

/// The whole logistics phase in its fixed order
pub fn run_logistics(state: &mut GameState) -> Vec<LogEntry> {
    let mut events = advance_convoys(state);
    events.extend(collect_income(state));
    events.extend(feed_locations(state));
    adjust_stability(state);
    events.extend(settle_negotiations(state));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::LeaderId;
    use crate::world::{Controller, Faction, Leader, LeaderAssignment, Location, LocationKind, TaxLevel};

    fn state() -> GameState {
        let mut state = GameState::new(1, EngineConfig::default());
        state.factions.push(Faction::new(FactionId(1), "Realm", Controller::Ai));
        state.locations.push(
            Location::new(LocationId(1), "Capital", LocationKind::City, FactionId(1))
                .with_population(100_000)
                .with_income(100, 5),
        );
        state
    }

    #[test]
    fn test_income_scaled_by_tax() {
        let mut state = state();
        state.location_mut(LocationId(1)).unwrap().tax_level = TaxLevel::High;
        collect_income(&mut state);
        assert_eq!(state.gold(FactionId(1)), 150);
    }

    #[test]
    fn test_famine_when_food_runs_out() {
        let mut state = state();
        state.spawn_army(FactionId(1), LocationId(1).into(), 1000);
        // needs 10 + 10, produces 5, stock 0
        let events = feed_locations(&mut state);
        assert_eq!(events.len(), 1);
        let loc = state.location(LocationId(1)).unwrap();
        assert_eq!(loc.population, 98_000);
        assert_eq!(loc.stability, 50);
        assert_eq!(loc.food_stock, 0);
    }

    #[test]
    fn test_fed_location_draws_down_stock() {
        let mut state = state();
        state.location_mut(LocationId(1)).unwrap().food_stock = 20;
        assert!(feed_locations(&mut state).is_empty());
        assert_eq!(state.location(LocationId(1)).unwrap().food_stock, 15);
    }

    #[test]
    fn test_governor_and_tax_drift() {
        let mut state = state();
        state.location_mut(LocationId(1)).unwrap().tax_level = TaxLevel::VeryHigh;
        let mut governor = Leader::new(LeaderId(1), "Reeve", FactionId(1), LocationId(1));
        governor.status = LeaderStatus::Governing;
        governor.assignment = Some(LeaderAssignment::Governor { location: LocationId(1) });
        governor.stats.stability = 3;
        state.leaders.push(governor);

        adjust_stability(&mut state);
        assert_eq!(state.location(LocationId(1)).unwrap().stability, 58);
    }
}
