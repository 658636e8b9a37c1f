//! Factions and their AI personalities

use serde::{Deserialize, Serialize};

use crate::core::types::FactionId;

/// Who issues a faction's orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    Human,
    Ai,
    /// Non-playing owner of unclaimed territory
    Neutral,
}

/// Preferred campaign target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetPreference {
    Cities,
    Rural,
    #[default]
    Balanced,
}

/// Weights steering a non-human faction's planner (each in 0.0..=1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub aggressiveness: f64,
    pub subversiveness: f64,
    pub defensiveness: f64,
    #[serde(default)]
    pub target_preference: TargetPreference,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            aggressiveness: 0.5,
            subversiveness: 0.3,
            defensiveness: 0.5,
            target_preference: TargetPreference::Balanced,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub controller: Controller,
    pub gold: u32,
    #[serde(default)]
    pub personality: Personality,
}

impl Faction {
    pub fn new(id: FactionId, name: &str, controller: Controller) -> Self {
        Self {
            id,
            name: name.to_string(),
            controller,
            gold: 0,
            personality: Personality::default(),
        }
    }

    pub fn neutral() -> Self {
        Self::new(FactionId::NEUTRAL, "Neutral", Controller::Neutral)
    }

    pub fn with_gold(mut self, gold: u32) -> Self {
        self.gold = gold;
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn is_human(&self) -> bool {
        self.controller == Controller::Human
    }

    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }

    /// Deduct gold if the treasury covers it
    pub fn try_spend(&mut self, amount: u32) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }
}
