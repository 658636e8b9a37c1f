//! Location - a place on the campaign map
//!
//! Locations are the nodes in the road graph. They have a controller
//! (faction that owns them) and economic and defensive properties.

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, LocationId};

/// Maximum fortification level
pub const MAX_FORTIFICATION: u8 = 4;

/// Maximum stability
pub const MAX_STABILITY: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    City,
    Rural,
}

/// Tax pressure applied to a location's income
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum TaxLevel {
    None,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

impl TaxLevel {
    /// Multiplier applied to base gold income
    pub fn income_multiplier(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Low => 0.5,
            Self::Normal => 1.0,
            Self::High => 1.5,
            Self::VeryHigh => 2.0,
        }
    }

    /// Stability change per turn at this tax level
    pub fn stability_drift(&self) -> i32 {
        match self {
            Self::None => 2,
            Self::Low => 1,
            Self::Normal => 0,
            Self::High => -2,
            Self::VeryHigh => -5,
        }
    }

    pub fn raised(&self) -> Self {
        match self {
            Self::None => Self::Low,
            Self::Low => Self::Normal,
            Self::Normal => Self::High,
            Self::High | Self::VeryHigh => Self::VeryHigh,
        }
    }

    pub fn lowered(&self) -> Self {
        match self {
            Self::VeryHigh => Self::High,
            Self::High => Self::Normal,
            Self::Normal => Self::Low,
            Self::Low | Self::None => Self::None,
        }
    }
}

/// Actions already taken at a location this turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounters {
    pub recruits: u32,
    pub seizes: u32,
    pub incites: u32,
}

/// A fortification project in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionProject {
    pub faction: FactionId,
    pub target_level: u8,
    pub turns_remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
    pub faction: FactionId,
    pub population: u32,
    pub stability: u32,
    pub fortification: u8,
    pub gold_income: u32,
    pub food_income: u32,
    pub food_stock: u32,
    #[serde(default)]
    pub tax_level: TaxLevel,
    /// City <-> rural hinterland pairing
    #[serde(default)]
    pub linked: Option<LocationId>,
    #[serde(default)]
    pub coastal: bool,
    #[serde(default)]
    pub strategic: bool,
    #[serde(default)]
    pub counters: ActionCounters,
    #[serde(default)]
    pub construction: Option<ConstructionProject>,
}

impl Location {
    pub fn new(id: LocationId, name: &str, kind: LocationKind, faction: FactionId) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            faction,
            population: 0,
            stability: 60,
            fortification: 0,
            gold_income: 0,
            food_income: 0,
            food_stock: 0,
            tax_level: TaxLevel::Normal,
            linked: None,
            coastal: false,
            strategic: false,
            counters: ActionCounters::default(),
            construction: None,
        }
    }

    pub fn with_population(mut self, population: u32) -> Self {
        self.population = population;
        self
    }

    pub fn with_stability(mut self, stability: u32) -> Self {
        self.stability = stability.min(MAX_STABILITY);
        self
    }

    pub fn with_fortification(mut self, level: u8) -> Self {
        self.fortification = level.min(MAX_FORTIFICATION);
        self
    }

    pub fn with_income(mut self, gold: u32, food: u32) -> Self {
        self.gold_income = gold;
        self.food_income = food;
        self
    }

    pub fn with_link(mut self, linked: LocationId) -> Self {
        self.linked = Some(linked);
        self
    }

    pub fn is_city(&self) -> bool {
        self.kind == LocationKind::City
    }

    /// Check if controlled by a specific faction
    pub fn is_controlled_by(&self, faction: FactionId) -> bool {
        self.faction == faction
    }

    /// Transfer control to a new faction; any works in progress are lost
    pub fn transfer_control(&mut self, new_faction: FactionId) {
        self.faction = new_faction;
        self.construction = None;
    }

    /// Location whose food stock feeds armies stationed here
    pub fn supply_source(&self) -> LocationId {
        match (self.kind, self.linked) {
            (LocationKind::City, Some(rural)) => rural,
            _ => self.id,
        }
    }

    /// Apply a signed stability change, clamped to [0, 100]
    pub fn adjust_stability(&mut self, delta: i32) {
        let next = self.stability as i64 + delta as i64;
        self.stability = next.clamp(0, MAX_STABILITY as i64) as u32;
    }

    pub fn lower_fortification(&mut self) {
        self.fortification = self.fortification.saturating_sub(1);
    }
}
