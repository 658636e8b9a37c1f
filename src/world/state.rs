//! GameState - the complete world state advanced by the turn engine

use serde::{Deserialize, Serialize};

use crate::ai::FactionAiState;
use crate::combat::Contact;
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{
    ArmyId, CombatId, ConvoyId, FactionId, LeaderId, LocationId, RoadId, Turn,
};
use crate::economy::{Convoy, Negotiation};
use crate::world::army::{Army, ArmyPosition};
use crate::world::events::EventLog;
use crate::world::faction::Faction;
use crate::world::graph::RoadNetwork;
use crate::world::leader::{Leader, LeaderStatus};
use crate::world::location::Location;
use crate::world::road::{Road, RoadStage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub turn: Turn,
    pub seed: u64,
    #[serde(default)]
    pub config: EngineConfig,
    pub factions: Vec<Faction>,
    pub locations: Vec<Location>,
    pub roads: Vec<Road>,
    pub armies: Vec<Army>,
    pub leaders: Vec<Leader>,
    #[serde(default)]
    pub ai: Vec<FactionAiState>,
    #[serde(default)]
    pub convoys: Vec<Convoy>,
    #[serde(default)]
    pub negotiations: Vec<Negotiation>,
    #[serde(default)]
    pub pending_combats: Vec<Contact>,
    /// Faction allowed to act when turns are taken one faction at a time
    #[serde(default)]
    pub current_player: Option<FactionId>,
    #[serde(default)]
    pub victory: Option<FactionId>,
    #[serde(default)]
    pub log: EventLog,
    #[serde(default)]
    next_army_id: u32,
    #[serde(default)]
    next_convoy_id: u32,
    #[serde(default)]
    next_combat_id: u32,
}

impl GameState {
    pub fn new(seed: u64, config: EngineConfig) -> Self {
        Self {
            turn: 1,
            seed,
            config,
            factions: vec![Faction::neutral()],
            locations: Vec::new(),
            roads: Vec::new(),
            armies: Vec::new(),
            leaders: Vec::new(),
            ai: Vec::new(),
            convoys: Vec::new(),
            negotiations: Vec::new(),
            pending_combats: Vec::new(),
            current_player: None,
            victory: None,
            log: EventLog::new(),
            next_army_id: 1,
            next_convoy_id: 1,
            next_combat_id: 1,
        }
    }

    // === LOOKUPS ===

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.iter().find(|f| f.id == id)
    }

    pub fn faction_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.iter_mut().find(|f| f.id == id)
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn location_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| l.id == id)
    }

    pub fn road(&self, id: RoadId) -> Option<&Road> {
        self.roads.iter().find(|r| r.id == id)
    }

    pub fn road_mut(&mut self, id: RoadId) -> Option<&mut Road> {
        self.roads.iter_mut().find(|r| r.id == id)
    }

    pub fn stage(&self, road: RoadId, stage: usize) -> Option<&RoadStage> {
        self.road(road).and_then(|r| r.stage(stage))
    }

    pub fn army(&self, id: ArmyId) -> Option<&Army> {
        self.armies.iter().find(|a| a.id == id)
    }

    pub fn army_mut(&mut self, id: ArmyId) -> Option<&mut Army> {
        self.armies.iter_mut().find(|a| a.id == id)
    }

    pub fn leader(&self, id: LeaderId) -> Option<&Leader> {
        self.leaders.iter().find(|l| l.id == id)
    }

    pub fn leader_mut(&mut self, id: LeaderId) -> Option<&mut Leader> {
        self.leaders.iter_mut().find(|l| l.id == id)
    }

    pub fn ai_state(&self, faction: FactionId) -> Option<&FactionAiState> {
        self.ai.iter().find(|s| s.faction == faction)
    }

    /// Replace (or insert) a faction's persisted planner record
    pub fn set_ai_state(&mut self, record: FactionAiState) {
        match self.ai.iter_mut().find(|s| s.faction == record.faction) {
            Some(slot) => *slot = record,
            None => self.ai.push(record),
        }
    }

    pub fn is_human(&self, faction: FactionId) -> bool {
        self.faction(faction).is_some_and(|f| f.is_human())
    }

    pub fn gold(&self, faction: FactionId) -> u32 {
        self.faction(faction).map(|f| f.gold).unwrap_or(0)
    }

    pub fn network(&self) -> RoadNetwork {
        RoadNetwork::new(&self.roads)
    }

    // === QUERIES ===

    /// Living armies at a position, ascending by id
    pub fn armies_at(&self, position: ArmyPosition) -> Vec<&Army> {
        let mut out: Vec<_> = self
            .armies
            .iter()
            .filter(|a| a.is_alive() && a.position == position)
            .collect();
        out.sort_by_key(|a| a.id);
        out
    }

    /// Total strength of a faction's armies at a location
    pub fn garrison_strength(&self, location: LocationId, faction: FactionId) -> u32 {
        self.armies_at(location.into())
            .iter()
            .filter(|a| a.faction == faction)
            .map(|a| a.strength)
            .sum()
    }

    /// Total strength at a location hostile to `faction`
    pub fn hostile_strength_at(&self, position: ArmyPosition, faction: FactionId) -> u32 {
        self.armies_at(position)
            .iter()
            .filter(|a| a.faction.is_hostile_to(faction))
            .map(|a| a.strength)
            .sum()
    }

    pub fn faction_strength(&self, faction: FactionId) -> u32 {
        self.armies
            .iter()
            .filter(|a| a.faction == faction)
            .map(|a| a.strength)
            .sum()
    }

    /// Living leaders riding with an army
    pub fn attached_leaders(&self, army: ArmyId) -> Vec<&Leader> {
        self.leaders
            .iter()
            .filter(|l| l.is_alive() && l.army == Some(army))
            .collect()
    }

    /// Locations controlled by a faction, ascending by id
    pub fn controlled_locations(&self, faction: FactionId) -> Vec<LocationId> {
        let mut out: Vec<_> = self
            .locations
            .iter()
            .filter(|l| l.faction == faction)
            .map(|l| l.id)
            .collect();
        out.sort();
        out
    }

    /// Another agent of the faction is already embedded at a location
    pub fn has_undercover_agent(&self, faction: FactionId, location: LocationId, except: LeaderId) -> bool {
        self.leaders.iter().any(|l| {
            l.id != except
                && l.faction == faction
                && l.status == LeaderStatus::Undercover
                && l.location == Some(location)
        })
    }

    // === MUTATION HELPERS ===

    fn allocate_army_id(&mut self) -> ArmyId {
        let floor = self.armies.iter().map(|a| a.id.0).max().unwrap_or(0) + 1;
        let id = self.next_army_id.max(floor);
        self.next_army_id = id + 1;
        ArmyId(id)
    }

    pub fn allocate_convoy_id(&mut self) -> ConvoyId {
        let floor = self.convoys.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        let id = self.next_convoy_id.max(floor);
        self.next_convoy_id = id + 1;
        ConvoyId(id)
    }

    pub fn allocate_combat_id(&mut self) -> CombatId {
        let floor = self
            .pending_combats
            .iter()
            .map(|c| c.id.0)
            .max()
            .unwrap_or(0)
            + 1;
        let id = self.next_combat_id.max(floor);
        self.next_combat_id = id + 1;
        CombatId(id)
    }

    /// Spawn a new army and return its id
    pub fn spawn_army(&mut self, faction: FactionId, position: ArmyPosition, strength: u32) -> ArmyId {
        let id = self.allocate_army_id();
        let mut army = Army::new(id, faction, position, strength);
        if let Some(location) = position.location().and_then(|l| self.location(l)) {
            army.food_source = Some(location.supply_source());
        }
        self.armies.push(army);
        id
    }

    /// Drop armies with no strength left; leaders riding with them stay
    /// behind at the army's last location
    pub fn remove_dead_armies(&mut self) {
        let dead: Vec<(ArmyId, Option<LocationId>)> = self
            .armies
            .iter()
            .filter(|a| !a.is_alive())
            .map(|a| (a.id, a.location().or(a.trip_origin)))
            .collect();
        if dead.is_empty() {
            return;
        }
        for leader in self.leaders.iter_mut() {
            if let Some((_, location)) = dead.iter().find(|(id, _)| leader.army == Some(*id)) {
                leader.army = None;
                leader.location = *location;
                if leader.is_alive() {
                    leader.status = LeaderStatus::Available;
                }
            }
        }
        self.armies.retain(|a| a.is_alive());
    }

    // === SNAPSHOTS ===

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
