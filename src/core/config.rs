//! Engine configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};

/// Tunable rules for the turn engine
///
/// A scenario may override any field; unspecified fields keep their
/// defaults. The engine never writes back to this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === COMBAT ===
    /// Minimum raw defending strength before walls count
    ///
    /// Below this, a token garrison gets no fortification bonus. The AI
    /// planner mirrors this threshold when scoring opportunities.
    pub fortification_threshold: u32,

    /// Troop-equivalent defense bonus per fortification level (0..=4)
    pub fortification_bonus: [u32; 5],

    /// Strength left on a winning side that would otherwise be wiped out
    pub pyrrhic_floor: u32,

    /// Base chance for a commander on the losing side to escape
    pub leader_escape_base: f64,

    /// Added escape chance per clandestine point
    pub leader_escape_per_clandestine: f64,

    /// Ceiling for escape chance without the Ghost ability
    pub leader_escape_cap: f64,

    /// Escape chance with the Ghost ability
    pub leader_escape_ghost: f64,

    // === SIEGE ===
    /// Troops needed to besiege below `siege_heavy_level`
    pub siege_min_troops: u32,

    /// Troops needed to besiege at or above `siege_heavy_level`
    pub siege_heavy_troops: u32,

    /// Fortification level from which the heavy requirement applies
    pub siege_heavy_level: u8,

    /// Gold per fortification level charged when a siege starts
    pub siege_cost_per_level: u32,

    // === RECRUITMENT & CONSTRUCTION ===
    /// Gold per 100 recruited troops
    pub recruit_cost_per_100: u32,

    /// Gold to raise fortification to level 1..=4
    pub fortify_cost: [u32; 4],

    /// Base turns for a fortification project (plus current level)
    pub fortify_base_turns: u32,

    // === INSURRECTION ===
    /// Turns before the same faction may target the same location again
    pub insurrection_cooldown: u32,

    /// Stability at or above which spontaneous uprisings never happen
    pub uprising_stability_ceiling: u32,

    /// (upper stability bound exclusive, probability) bands, ascending
    pub uprising_bands: Vec<(u32, f64)>,

    /// Stability floor after an insurgent victory at a location
    pub insurgent_stability_floor: u32,

    /// Insurgent troops per gold invested by a scripted uprising
    pub insurgents_per_gold: u32,

    // === ECONOMY ===
    /// Stability lost when a location runs out of food
    pub famine_stability_penalty: u32,

    /// Population fraction lost to famine
    pub famine_population_loss: f64,

    /// Turns a negotiation takes before settlement
    pub negotiation_turns: u32,

    /// Turns a naval convoy spends at sea
    pub naval_convoy_turns: u32,

    // === AI PLANNER ===
    /// Reserve fraction when some theater is threatened
    pub reserve_fraction_threatened: f64,

    /// Reserve fraction when every theater is quiet
    pub reserve_fraction_quiet: f64,

    /// Enemy/own strength ratio above which insurrections are suppressed
    pub defensive_pressure_ratio: f64,

    /// Enemy garrison / available troops ratio at which a siege is skipped
    pub sortie_risk_ratio: f64,

    /// Treasury needed before the AI considers a level-4 target
    pub wealth_gate_top_tier: u32,

    /// Minimum troops each staging point needs for a convergent campaign
    pub convergence_min_staging: u32,

    /// Fraction of the requirement convergent staging must cover
    pub convergence_coverage: f64,

    /// Turns a convergent campaign waits for stragglers
    pub convergence_max_wait: u32,

    /// Maximum concurrent missions of each type
    pub max_campaigns: usize,
    pub max_defends: usize,
    pub max_road_defenses: usize,
    pub max_insurrections: usize,
    pub max_negotiations: usize,
    pub max_stabilizes: usize,
    pub max_counter_insurrections: usize,

    // === NARRATIVE ===
    /// Milliseconds to wait for the narrative collaborator
    pub narrative_timeout_ms: u64,

    /// Safety bound on combat cascade iterations per turn
    pub max_cascade_rounds: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Combat
            fortification_threshold: 500,
            fortification_bonus: [0, 1000, 2500, 4000, 6000],
            pyrrhic_floor: 1,
            leader_escape_base: 0.4,
            leader_escape_per_clandestine: 0.1,
            leader_escape_cap: 0.9,
            leader_escape_ghost: 0.95,

            // Siege
            siege_min_troops: 500,
            siege_heavy_troops: 1000,
            siege_heavy_level: 3,
            siege_cost_per_level: 100,

            // Recruitment & construction
            recruit_cost_per_100: 50,
            fortify_cost: [200, 400, 700, 1100],
            fortify_base_turns: 2,

            // Insurrection (stability bands mirror the uprising table)
            insurrection_cooldown: 4,
            uprising_stability_ceiling: 50,
            uprising_bands: vec![(10, 0.75), (20, 0.60), (30, 0.45), (50, 0.33)],
            insurgent_stability_floor: 49,
            insurgents_per_gold: 2,

            // Economy
            famine_stability_penalty: 10,
            famine_population_loss: 0.02,
            negotiation_turns: 2,
            naval_convoy_turns: 2,

            // AI planner
            reserve_fraction_threatened: 0.10,
            reserve_fraction_quiet: 0.30,
            defensive_pressure_ratio: 1.2,
            sortie_risk_ratio: 2.0,
            wealth_gate_top_tier: 1500,
            convergence_min_staging: 500,
            convergence_coverage: 0.8,
            convergence_max_wait: 3,
            max_campaigns: 2,
            max_defends: 3,
            max_road_defenses: 1,
            max_insurrections: 2,
            max_negotiations: 1,
            max_stabilizes: 2,
            max_counter_insurrections: 2,

            // Narrative
            narrative_timeout_ms: 5_000,
            max_cascade_rounds: 64,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defense bonus for a fortification level, clamped to the table
    pub fn fortification_bonus_for(&self, level: u8) -> u32 {
        let idx = (level as usize).min(self.fortification_bonus.len() - 1);
        self.fortification_bonus[idx]
    }

    /// Troops a besieging force needs against this fortification level
    pub fn siege_requirement(&self, level: u8) -> u32 {
        if level >= self.siege_heavy_level {
            self.siege_heavy_troops
        } else {
            self.siege_min_troops
        }
    }

    /// Gold charged when a siege starts
    pub fn siege_cost(&self, level: u8) -> u32 {
        self.siege_cost_per_level * u32::from(level.max(1))
    }

    /// Gold to raise fortification from `current` by one level
    pub fn fortify_cost_from(&self, current: u8) -> Option<u32> {
        self.fortify_cost.get(current as usize).copied()
    }

    /// Gold to recruit `strength` troops (rounded up to whole hundreds)
    pub fn recruit_cost(&self, strength: u32) -> u32 {
        strength.div_ceil(100) * self.recruit_cost_per_100
    }

    /// Spontaneous uprising probability for a stability value
    pub fn uprising_chance(&self, stability: u32) -> f64 {
        if stability >= self.uprising_stability_ceiling {
            return 0.0;
        }
        self.uprising_bands
            .iter()
            .find(|(upper, _)| stability < *upper)
            .map(|(_, chance)| *chance)
            .unwrap_or(0.0)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.siege_heavy_troops < self.siege_min_troops {
            return Err(format!(
                "siege_heavy_troops ({}) should be >= siege_min_troops ({})",
                self.siege_heavy_troops, self.siege_min_troops
            ));
        }

        if self.fortification_bonus.windows(2).any(|w| w[0] > w[1]) {
            return Err("fortification_bonus must be non-decreasing".into());
        }

        if !self.uprising_bands.windows(2).all(|w| w[0].0 < w[1].0) {
            return Err("uprising_bands must be sorted by stability".into());
        }

        if self
            .uprising_bands
            .iter()
            .any(|(_, p)| !(0.0..=1.0).contains(p))
        {
            return Err("uprising probabilities must be within [0, 1]".into());
        }

        if self.reserve_fraction_quiet >= 1.0 || self.reserve_fraction_threatened >= 1.0 {
            return Err("reserve fractions must be below 1.0".into());
        }

        if self.pyrrhic_floor == 0 {
            return Err("pyrrhic_floor must be at least 1".into());
        }

        Ok(())
    }
}
