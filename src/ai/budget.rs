//! Turn budget: how a faction splits its treasury
//!
//! A reserve is withheld first. What remains is split across recruitment,
//! fortification, diplomacy and siege by personality weights, then
//! corrected so recruitment is not starved by subversion spending and so a
//! siege against the cheapest reachable walls is affordable.

use crate::ai::mission::FactionAiState;
use crate::ai::theater::Theater;
use crate::core::types::FactionId;
use crate::world::GameState;

/// Minimum share of spendable gold kept for recruitment
const MIN_RECRUITMENT_SHARE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCategory {
    Recruitment,
    Fortification,
    Diplomacy,
    Siege,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    pub treasury: u32,
    pub reserved: u32,
    /// Earmarked for insurrections already planned
    pub committed: u32,
    pub recruitment: u32,
    pub fortification: u32,
    pub diplomacy: u32,
    pub siege: u32,
}

impl Budget {
    /// Gold split across the four categories
    pub fn available(&self) -> u32 {
        self.recruitment + self.fortification + self.diplomacy + self.siege
    }

    pub fn remaining(&self, category: BudgetCategory) -> u32 {
        match category {
            BudgetCategory::Recruitment => self.recruitment,
            BudgetCategory::Fortification => self.fortification,
            BudgetCategory::Diplomacy => self.diplomacy,
            BudgetCategory::Siege => self.siege,
        }
    }

    fn slot(&mut self, category: BudgetCategory) -> &mut u32 {
        match category {
            BudgetCategory::Recruitment => &mut self.recruitment,
            BudgetCategory::Fortification => &mut self.fortification,
            BudgetCategory::Diplomacy => &mut self.diplomacy,
            BudgetCategory::Siege => &mut self.siege,
        }
    }

    /// Take `amount` from a category; false (and no change) if it cannot cover it
    pub fn spend(&mut self, category: BudgetCategory, amount: u32) -> bool {
        let slot = self.slot(category);
        if *slot < amount {
            return false;
        }
        *slot -= amount;
        true
    }

    /// Move up to `amount` between categories, returning what moved
    fn shift(&mut self, from: BudgetCategory, to: BudgetCategory, amount: u32) -> u32 {
        let moved = amount.min(self.remaining(from));
        *self.slot(from) -= moved;
        *self.slot(to) += moved;
        moved
    }
}

/// Compute this turn's budget for a faction
///
/// `cheapest_siege` is the siege cost of the cheapest fortified target the
/// faction can currently reach, if any.
pub fn compute_budget(
    state: &GameState,
    faction: FactionId,
    theaters: &[Theater],
    record: &FactionAiState,
    cheapest_siege: Option<u32>,
) -> Budget {
    let config = &state.config;
    let treasury = state.gold(faction);
    let personality = state
        .faction(faction)
        .map(|f| f.personality.clone())
        .unwrap_or_default();

    let threatened = theaters.iter().any(|t| t.threatened);
    let reserve_fraction = if threatened {
        config.reserve_fraction_threatened
    } else {
        config.reserve_fraction_quiet
    };
    let reserved = (treasury as f64 * reserve_fraction).floor() as u32;
    let spendable = treasury - reserved;
    let committed = record.committed_insurrection_gold().min(spendable);
    let available = spendable - committed;

    // Personality weights
    let defensive_pull = if threatened { 1.5 } else { 0.5 };
    let weights = [
        1.0 + personality.aggressiveness,
        personality.defensiveness * defensive_pull,
        personality.subversiveness,
        personality.aggressiveness * 0.5,
    ];
    let total_weight: f64 = weights.iter().sum();
    let share = |w: f64| -> u32 {
        if total_weight <= 0.0 {
            0
        } else {
            (available as f64 * w / total_weight).floor() as u32
        }
    };

    let fortification = share(weights[1]);
    let diplomacy = share(weights[2]);
    let siege = share(weights[3]);
    let mut budget = Budget {
        treasury,
        reserved,
        committed,
        // Rounding leftovers go to recruitment so the split sums exactly
        recruitment: available - fortification - diplomacy - siege,
        fortification,
        diplomacy,
        siege,
    };

    // Balanced recruitment, measured against gross spendable gold
    let floor = ((spendable as f64 * MIN_RECRUITMENT_SHARE).floor() as u32).min(available);
    if budget.recruitment < floor {
        let mut deficit = floor - budget.recruitment;
        for from in [BudgetCategory::Diplomacy, BudgetCategory::Fortification, BudgetCategory::Siege] {
            deficit -= budget.shift(from, BudgetCategory::Recruitment, deficit);
        }
    }

    // Siege carve-out sized to the cheapest reachable walls
    match cheapest_siege {
        Some(cost) if budget.siege < cost && budget.available() >= cost => {
            let mut deficit = cost - budget.siege;
            for from in [
                BudgetCategory::Fortification,
                BudgetCategory::Diplomacy,
                BudgetCategory::Recruitment,
            ] {
                deficit -= budget.shift(from, BudgetCategory::Siege, deficit);
            }
        }
        Some(_) => {}
        None => {
            let idle = budget.siege;
            budget.shift(BudgetCategory::Siege, BudgetCategory::Recruitment, idle);
        }
    }

    tracing::debug!(
        faction = %faction,
        treasury,
        reserved,
        committed,
        recruitment = budget.recruitment,
        fortification = budget.fortification,
        diplomacy = budget.diplomacy,
        siege = budget.siege,
        "budget computed"
    );
    budget
}
