//! Persistent AI missions and the per-faction planner record

use serde::{Deserialize, Serialize};

use crate::core::types::{ArmyId, FactionId, LeaderId, LocationId, MissionId, RoadId, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    Planning,
    Active,
    Completed,
    Failed,
}

/// Progress tag within a mission's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStage {
    Planning,
    Gathering,
    Moving,
    Sieging,
    Assaulting,
    Holding,
    Building,
    Infiltrating,
    Negotiating,
    Governing,
    Done,
}

/// Offensive against a single target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMission {
    pub target: LocationId,
    /// Estimated strength needed to take the target
    pub required_strength: u32,
    /// Owned locations the force gathers at before marching
    pub staging: Vec<LocationId>,
    /// Several staging points march at once
    pub convergent: bool,
    /// Troops still to be raised before the siege can start
    pub recruit_needed: u32,
    /// Turns spent gathering
    pub waited: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefendMission {
    pub location: LocationId,
    /// Hostile strength last seen approaching
    pub threat: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadDefenseMission {
    pub road: RoadId,
    pub stage: usize,
    /// Works level the mission is building toward
    pub target_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurrectionMission {
    pub target: LocationId,
    pub leader: Option<LeaderId>,
    /// Gold earmarked for the uprising, spent at launch
    pub gold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiateMission {
    pub target: LocationId,
    pub offer: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizeMission {
    pub location: LocationId,
    pub governor: Option<LeaderId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterInsurrectionMission {
    pub location: LocationId,
    /// Insurgent strength last seen at or next to the location
    pub threat: u32,
}

/// Mission payload, one variant per mission type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissionKind {
    Campaign(CampaignMission),
    Defend(DefendMission),
    RoadDefense(RoadDefenseMission),
    Insurrection(InsurrectionMission),
    Negotiate(NegotiateMission),
    Stabilize(StabilizeMission),
    CounterInsurrection(CounterInsurrectionMission),
}

/// Discriminant of `MissionKind`, for caps and lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionType {
    Campaign,
    Defend,
    RoadDefense,
    Insurrection,
    Negotiate,
    Stabilize,
    CounterInsurrection,
}

impl MissionKind {
    pub fn mission_type(&self) -> MissionType {
        match self {
            Self::Campaign(_) => MissionType::Campaign,
            Self::Defend(_) => MissionType::Defend,
            Self::RoadDefense(_) => MissionType::RoadDefense,
            Self::Insurrection(_) => MissionType::Insurrection,
            Self::Negotiate(_) => MissionType::Negotiate,
            Self::Stabilize(_) => MissionType::Stabilize,
            Self::CounterInsurrection(_) => MissionType::CounterInsurrection,
        }
    }

    /// Location the mission is about, if it has one
    pub fn target_location(&self) -> Option<LocationId> {
        match self {
            Self::Campaign(m) => Some(m.target),
            Self::Defend(m) => Some(m.location),
            Self::RoadDefense(_) => None,
            Self::Insurrection(m) => Some(m.target),
            Self::Negotiate(m) => Some(m.target),
            Self::Stabilize(m) => Some(m.location),
            Self::CounterInsurrection(m) => Some(m.location),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub faction: FactionId,
    pub status: MissionStatus,
    pub stage: MissionStage,
    pub kind: MissionKind,
    pub armies: Vec<ArmyId>,
    pub created_turn: Turn,
}

impl Mission {
    pub fn new(id: MissionId, faction: FactionId, kind: MissionKind, turn: Turn) -> Self {
        Self {
            id,
            faction,
            status: MissionStatus::Planning,
            stage: MissionStage::Planning,
            kind,
            armies: Vec::new(),
            created_turn: turn,
        }
    }

    pub fn mission_type(&self) -> MissionType {
        self.kind.mission_type()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, MissionStatus::Planning | MissionStatus::Active)
    }

    pub fn complete(&mut self) {
        self.status = MissionStatus::Completed;
        self.stage = MissionStage::Done;
    }

    pub fn fail(&mut self) {
        self.status = MissionStatus::Failed;
        self.stage = MissionStage::Done;
    }

    pub fn advance(&mut self, stage: MissionStage) {
        self.status = MissionStatus::Active;
        self.stage = stage;
    }
}

/// Everything the planner carries from one turn to the next for a faction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionAiState {
    pub faction: FactionId,
    pub missions: Vec<Mission>,
    /// (target, turn) of every insurrection mission created
    #[serde(default)]
    pub insurrection_log: Vec<(LocationId, Turn)>,
    pub next_mission_id: u32,
}

impl FactionAiState {
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            missions: Vec::new(),
            insurrection_log: Vec::new(),
            next_mission_id: 1,
        }
    }

    pub fn allocate_id(&mut self) -> MissionId {
        let id = MissionId(self.next_mission_id);
        self.next_mission_id += 1;
        id
    }

    pub fn open_missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter().filter(|m| m.is_open())
    }

    pub fn count_open(&self, kind: MissionType) -> usize {
        self.open_missions().filter(|m| m.mission_type() == kind).count()
    }

    /// An open mission of this type already covers the location
    pub fn targets(&self, kind: MissionType, location: LocationId) -> bool {
        self.open_missions()
            .any(|m| m.mission_type() == kind && m.kind.target_location() == Some(location))
    }

    /// Whether the cooldown since the last insurrection against `target` has elapsed
    pub fn insurrection_ready(&self, target: LocationId, turn: Turn, cooldown: u32) -> bool {
        !self
            .insurrection_log
            .iter()
            .any(|(t, at)| *t == target && turn < at + cooldown)
    }

    /// Gold promised to insurrections that have not launched yet
    pub fn committed_insurrection_gold(&self) -> u32 {
        self.open_missions()
            .filter_map(|m| match &m.kind {
                MissionKind::Insurrection(i) => Some(i.gold),
                _ => None,
            })
            .sum()
    }

    /// Drop finished missions and forget expired cooldowns
    pub fn retire(&mut self, turn: Turn, cooldown: u32) {
        self.missions.retain(|m| m.is_open());
        self.insurrection_log.retain(|(_, at)| turn < at + cooldown);
    }
}
