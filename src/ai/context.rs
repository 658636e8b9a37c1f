//! Shared context for one faction's planning pass
//!
//! `Planner` is the read-only view every generator and executor works
//! from. `Orders` accumulates what the pass decides: the actions to apply,
//! which armies and leaders are spoken for, and what is left of the budget.

use ahash::AHashSet;

use crate::actions::Action;
use crate::ai::budget::{Budget, BudgetCategory};
use crate::ai::mission::{FactionAiState, MissionKind};
use crate::ai::theater::{build_theaters, Theater};
use crate::core::config::EngineConfig;
use crate::core::types::{ArmyId, FactionId, LeaderId, LocationId};
use crate::world::{Ability, Army, GameState, Leader, Personality, RoadNetwork};

pub struct Planner<'a> {
    pub state: &'a GameState,
    pub faction: FactionId,
    pub network: RoadNetwork,
    pub theaters: Vec<Theater>,
    pub personality: Personality,
}

impl<'a> Planner<'a> {
    pub fn new(state: &'a GameState, faction: FactionId) -> Self {
        let network = state.network();
        let theaters = build_theaters(state, &network, faction);
        let personality = state
            .faction(faction)
            .map(|f| f.personality.clone())
            .unwrap_or_default();
        Self {
            state,
            faction,
            network,
            theaters,
            personality,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    pub fn owns(&self, location: LocationId) -> bool {
        self.state
            .location(location)
            .is_some_and(|l| l.faction == self.faction)
    }

    /// Theater holding `location`, or else the first one bordering it
    pub fn theater_of(&self, location: LocationId) -> Option<&Theater> {
        self.theaters
            .iter()
            .find(|t| t.contains(location))
            .or_else(|| self.theaters.iter().find(|t| t.borders(location)))
    }

    pub fn distance(&self, from: LocationId, to: LocationId) -> Option<u32> {
        self.network.distance(from, to)
    }

    /// Hostile strength inside or around all theaters
    pub fn enemy_pressure(&self) -> u32 {
        self.theaters.iter().map(|t| t.enemy_strength).sum()
    }

    /// Cheapest siege against a walled location on any border
    pub fn cheapest_siege(&self) -> Option<u32> {
        self.theaters
            .iter()
            .flat_map(|t| t.border.iter())
            .filter_map(|l| self.state.location(*l))
            .filter(|l| l.fortification > 0)
            .map(|l| self.config().siege_cost(l.fortification))
            .min()
    }
}

/// Decisions accumulated over the planning pass
#[derive(Debug, Clone)]
pub struct Orders {
    pub budget: Budget,
    pub actions: Vec<Action>,
    assigned: AHashSet<ArmyId>,
    busy_leaders: AHashSet<LeaderId>,
    recruited: AHashSet<LocationId>,
}

impl Orders {
    /// Start from the commitments of the faction's open missions
    pub fn new(record: &FactionAiState, budget: Budget) -> Self {
        let mut assigned = AHashSet::new();
        let mut busy_leaders = AHashSet::new();
        for mission in record.open_missions() {
            assigned.extend(mission.armies.iter().copied());
            match &mission.kind {
                MissionKind::Insurrection(m) => busy_leaders.extend(m.leader),
                MissionKind::Stabilize(m) => busy_leaders.extend(m.governor),
                _ => {}
            }
        }
        Self {
            budget,
            actions: Vec::new(),
            assigned,
            busy_leaders,
            recruited: AHashSet::new(),
        }
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn is_assigned(&self, army: ArmyId) -> bool {
        self.assigned.contains(&army)
    }

    pub fn claim(&mut self, army: ArmyId) {
        self.assigned.insert(army);
    }

    pub fn release(&mut self, armies: &[ArmyId]) {
        for army in armies {
            self.assigned.remove(army);
        }
    }

    pub fn reserve_leader(&mut self, leader: LeaderId) {
        self.busy_leaders.insert(leader);
    }

    /// Idle armies of the faction no mission has claimed, ascending by id
    pub fn free_armies<'a>(&self, plan: &Planner<'a>) -> Vec<&'a Army> {
        let state: &'a GameState = plan.state;
        let mut out: Vec<&'a Army> = state
            .armies
            .iter()
            .filter(|a| a.faction == plan.faction && a.is_idle() && !self.assigned.contains(&a.id))
            .collect();
        out.sort_by_key(|a| a.id);
        out
    }

    /// Free armies inside a theater, nearest to `target` first
    pub fn free_armies_near<'a>(&self, plan: &Planner<'a>, theater: &Theater, target: LocationId) -> Vec<(u32, &'a Army)> {
        let mut out: Vec<(u32, &'a Army)> = self
            .free_armies(plan)
            .into_iter()
            .filter_map(|a| {
                let at = a.location()?;
                if !theater.contains(at) {
                    return None;
                }
                Some((plan.distance(at, target)?, a))
            })
            .collect();
        out.sort_by_key(|(d, a)| (*d, a.id));
        out
    }

    /// Available leaders no mission has reserved, best first by `rank`
    pub fn free_leaders<'a, K: Ord>(&self, plan: &Planner<'a>, rank: impl Fn(&Leader) -> K) -> Vec<&'a Leader> {
        let state: &'a GameState = plan.state;
        let mut out: Vec<&'a Leader> = state
            .leaders
            .iter()
            .filter(|l| l.faction == plan.faction && l.is_available() && l.location.is_some())
            .filter(|l| !self.busy_leaders.contains(&l.id))
            .collect();
        out.sort_by_key(|l| (rank(*l), l.id));
        out
    }

    /// Order an army toward `destination` unless it is already headed there
    pub fn march(&mut self, army: &Army, destination: LocationId) {
        if army.location() == Some(destination) || army.destination == Some(destination) {
            return;
        }
        self.push(Action::MoveArmy {
            army: army.id,
            destination,
        });
    }

    pub fn hold(&mut self, army: &Army) {
        if army.flags.garrisoned || army.location().is_none() {
            return;
        }
        self.push(Action::HoldArmy { army: army.id });
    }

    /// Recruit up to `wanted` troops at an owned location within budget
    ///
    /// Returns the troops ordered. At most one recruitment per location per
    /// turn, and never more than a tenth of its population.
    pub fn recruit(&mut self, plan: &Planner, location: LocationId, wanted: u32) -> u32 {
        if wanted == 0 || self.recruited.contains(&location) {
            return 0;
        }
        let Some(loc) = plan.state.location(location) else {
            return 0;
        };
        if loc.faction != plan.faction || loc.counters.recruits > 0 {
            return 0;
        }
        let per_100 = plan.config().recruit_cost_per_100.max(1);
        let affordable = self.budget.remaining(BudgetCategory::Recruitment) / per_100 * 100;
        let cap = loc.population / 10 / 100 * 100;
        let strength = (wanted.div_ceil(100) * 100).min(affordable).min(cap);
        if strength == 0 {
            return 0;
        }
        let cost = plan.config().recruit_cost(strength);
        if !self.budget.spend(BudgetCategory::Recruitment, cost) {
            return 0;
        }
        self.recruited.insert(location);
        self.push(Action::Recruit { location, strength });
        strength
    }
}

/// Ranking key for governors: administrators first, then stability skill
pub fn governor_rank(leader: &Leader) -> (bool, std::cmp::Reverse<u32>) {
    (
        !leader.stats.has(Ability::Administrator),
        std::cmp::Reverse(leader.stats.stability),
    )
}

/// Ranking key for agents: most clandestine first
pub fn agent_rank(leader: &Leader) -> std::cmp::Reverse<u32> {
    std::cmp::Reverse(leader.stats.clandestine)
}
