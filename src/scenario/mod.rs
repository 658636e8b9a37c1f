//! Scenario files: the static map, rosters and personalities a game starts from
//!
//! Scenarios are TOML documents deserialized into plain definition structs and
//! checked for dangling references before any [`GameState`] is built from
//! them. The engine never writes back to a loaded scenario.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{FactionId, LeaderId, LocationId, RoadId};
use crate::world::location::{MAX_FORTIFICATION, MAX_STABILITY};
use crate::world::{
    Controller, Faction, GameState, Leader, LeaderStats, Location, LocationKind, Personality, Road,
    RoadKind, TaxLevel,
};

/// The built-in three-realm demo map
pub const DEMO_SCENARIO: &str = include_str!("../../data/scenarios/border_war.toml");

fn default_controller() -> Controller {
    Controller::Ai
}

fn default_faction() -> FactionId {
    FactionId::NEUTRAL
}

fn default_stability() -> u32 {
    60
}

fn default_stages() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionDef {
    pub id: FactionId,
    pub name: String,
    #[serde(default = "default_controller")]
    pub controller: Controller,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub personality: Personality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDef {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
    /// Owner at game start; omitted means Neutral
    #[serde(default = "default_faction")]
    pub faction: FactionId,
    #[serde(default)]
    pub population: u32,
    #[serde(default = "default_stability")]
    pub stability: u32,
    #[serde(default)]
    pub fortification: u8,
    #[serde(default)]
    pub gold_income: u32,
    #[serde(default)]
    pub food_income: u32,
    #[serde(default)]
    pub food_stock: u32,
    #[serde(default)]
    pub tax_level: TaxLevel,
    #[serde(default)]
    pub linked: Option<LocationId>,
    #[serde(default)]
    pub coastal: bool,
    #[serde(default)]
    pub strategic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadDef {
    pub id: RoadId,
    pub from: LocationId,
    pub to: LocationId,
    pub kind: RoadKind,
    /// Stage count for land roads; ignored for local links
    #[serde(default = "default_stages")]
    pub stages: usize,
    #[serde(default)]
    pub naval: bool,
    /// Stage indices worth holding
    #[serde(default)]
    pub strategic_stages: Vec<usize>,
    /// Terrain defense per stage, in stage order; missing entries are 0
    #[serde(default)]
    pub natural_defense: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmyDef {
    pub faction: FactionId,
    pub location: LocationId,
    pub strength: u32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderDef {
    pub id: LeaderId,
    pub name: String,
    pub faction: FactionId,
    pub location: LocationId,
    #[serde(default)]
    pub stats: LeaderStats,
    /// Index into the scenario's army list of the army this leader rides with
    #[serde(default)]
    pub army: Option<usize>,
}

/// A complete starting setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seed: u64,
    /// Rule overrides; unspecified fields keep their defaults
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub factions: Vec<FactionDef>,
    #[serde(default)]
    pub locations: Vec<LocationDef>,
    #[serde(default)]
    pub roads: Vec<RoadDef>,
    #[serde(default)]
    pub armies: Vec<ArmyDef>,
    #[serde(default)]
    pub leaders: Vec<LeaderDef>,
}

fn invalid(message: String) -> EngineError {
    EngineError::Scenario(message)
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn demo() -> Result<Self> {
        Self::from_toml_str(DEMO_SCENARIO)
    }

    /// Check every cross reference
    pub fn validate(&self) -> Result<()> {
        self.config.validate().map_err(EngineError::Config)?;

        let mut factions = BTreeSet::from([FactionId::NEUTRAL]);
        for faction in &self.factions {
            if faction.id.is_neutral() || faction.controller == Controller::Neutral {
                return Err(invalid(format!(
                    "faction {} ({}) may not take the neutral slot",
                    faction.id, faction.name
                )));
            }
            if !factions.insert(faction.id) {
                return Err(invalid(format!("duplicate faction id {}", faction.id)));
            }
        }

        let mut locations = BTreeSet::new();
        for location in &self.locations {
            if !locations.insert(location.id) {
                return Err(invalid(format!("duplicate location id {}", location.id)));
            }
            if !factions.contains(&location.faction) {
                return Err(invalid(format!(
                    "location {} owned by unknown faction {}",
                    location.name, location.faction
                )));
            }
            if location.stability > MAX_STABILITY {
                return Err(invalid(format!("location {} stability above 100", location.name)));
            }
            if location.fortification > MAX_FORTIFICATION {
                return Err(invalid(format!("location {} fortification above max", location.name)));
            }
        }
        for location in &self.locations {
            if let Some(linked) = location.linked {
                if linked == location.id || !locations.contains(&linked) {
                    return Err(invalid(format!(
                        "location {} linked to unknown location {}",
                        location.name, linked
                    )));
                }
            }
        }

        let mut roads = BTreeSet::new();
        for road in &self.roads {
            if !roads.insert(road.id) {
                return Err(invalid(format!("duplicate road id {}", road.id)));
            }
            if road.from == road.to {
                return Err(invalid(format!("road {} loops on {}", road.id, road.from)));
            }
            for end in [road.from, road.to] {
                if !locations.contains(&end) {
                    return Err(invalid(format!("road {} ends at unknown location {}", road.id, end)));
                }
            }
            if road.kind == RoadKind::Land {
                if road.stages == 0 {
                    return Err(invalid(format!("land road {} needs at least one stage", road.id)));
                }
                if let Some(bad) = road.strategic_stages.iter().find(|&&s| s >= road.stages) {
                    return Err(invalid(format!("road {} has no stage {}", road.id, bad)));
                }
            }
        }

        for (index, army) in self.armies.iter().enumerate() {
            if !factions.contains(&army.faction) {
                return Err(invalid(format!("army #{index} belongs to unknown faction {}", army.faction)));
            }
            if !locations.contains(&army.location) {
                return Err(invalid(format!("army #{index} placed at unknown location {}", army.location)));
            }
            if army.strength == 0 {
                return Err(invalid(format!("army #{index} has no troops")));
            }
        }

        let mut leaders = BTreeSet::new();
        for leader in &self.leaders {
            if !leaders.insert(leader.id) {
                return Err(invalid(format!("duplicate leader id {}", leader.id)));
            }
            if leader.faction.is_neutral() || !factions.contains(&leader.faction) {
                return Err(invalid(format!("leader {} serves unknown faction {}", leader.name, leader.faction)));
            }
            if !locations.contains(&leader.location) {
                return Err(invalid(format!("leader {} placed at unknown location {}", leader.name, leader.location)));
            }
            if let Some(index) = leader.army {
                let Some(army) = self.armies.get(index) else {
                    return Err(invalid(format!("leader {} rides with missing army #{index}", leader.name)));
                };
                if army.faction != leader.faction || army.location != leader.location {
                    return Err(invalid(format!(
                        "leader {} cannot join army #{index} of another faction or place",
                        leader.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build the opening state, optionally overriding the scenario's seed
    pub fn initial_state(&self, seed: Option<u64>) -> Result<GameState> {
        self.validate()?;
        let mut state = GameState::new(seed.unwrap_or(self.seed), self.config.clone());

        for def in &self.factions {
            state.factions.push(
                Faction::new(def.id, &def.name, def.controller)
                    .with_gold(def.gold)
                    .with_personality(def.personality.clone()),
            );
        }

        for def in &self.locations {
            let mut location = Location::new(def.id, &def.name, def.kind, def.faction)
                .with_population(def.population)
                .with_stability(def.stability)
                .with_fortification(def.fortification)
                .with_income(def.gold_income, def.food_income);
            location.food_stock = def.food_stock;
            location.tax_level = def.tax_level;
            location.linked = def.linked;
            location.coastal = def.coastal;
            location.strategic = def.strategic;
            state.locations.push(location);
        }

        for def in &self.roads {
            let mut road = match def.kind {
                RoadKind::Local => Road::local(def.id, def.from, def.to),
                RoadKind::Land => Road::land(def.id, def.from, def.to, def.stages),
            };
            road.naval = def.naval;
            for stage in road.stages.iter_mut() {
                stage.strategic = def.strategic_stages.contains(&stage.index);
                stage.natural_defense = def.natural_defense.get(stage.index).copied().unwrap_or(0);
            }
            state.roads.push(road);
        }

        let mut spawned = Vec::with_capacity(self.armies.len());
        for def in &self.armies {
            let id = state.spawn_army(def.faction, def.location.into(), def.strength);
            if let (Some(name), Some(army)) = (&def.name, state.army_mut(id)) {
                army.name = name.clone();
            }
            spawned.push(id);
        }

        for def in &self.leaders {
            let mut leader = Leader::new(def.id, &def.name, def.faction, def.location).with_stats(def.stats.clone());
            leader.army = def.army.and_then(|index| spawned.get(index).copied());
            state.leaders.push(leader);
        }

        tracing::info!(
            scenario = %self.name,
            seed = state.seed,
            factions = self.factions.len(),
            locations = self.locations.len(),
            armies = state.armies.len(),
            "scenario loaded"
        );
        Ok(state)
    }
}

/// Read and validate a scenario file
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    Scenario::from_toml_str(&content).map_err(|e| match e {
        EngineError::TomlError(err) => invalid(format!("{}: {}", path.display(), err)),
        other => other,
    })
}

/// Opening state of the built-in demo map
pub fn demo_state(seed: Option<u64>) -> Result<GameState> {
    Scenario::demo()?.initial_state(seed)
}
