//! Theater & mission planner for non-human factions
//!
//! Each turn a faction's holdings are split into theaters, its persistent
//! missions are refreshed and executed against a gold budget, and the
//! result is a list of ordinary player actions.

pub mod budget;
pub mod context;
pub mod mission;
pub mod missions;
pub mod planner;
pub mod siege;
pub mod spending;
pub mod theater;

pub use budget::{compute_budget, Budget, BudgetCategory};
pub use mission::{
    CampaignMission, CounterInsurrectionMission, DefendMission, FactionAiState, InsurrectionMission, Mission,
    MissionKind, MissionStage, MissionStatus, MissionType, NegotiateMission, RoadDefenseMission, StabilizeMission,
};
pub use planner::plan_faction;
pub use siege::{classify_siege, SiegeDecision};
pub use theater::{build_theaters, Theater};
