//! World data model
//!
//! Factions control locations connected by roads; armies and leaders move
//! across that graph. `GameState` owns every entity and is what the turn
//! engine advances.

pub mod army;
pub mod events;
pub mod faction;
pub mod graph;
pub mod leader;
pub mod location;
pub mod road;
pub mod state;

pub use army::{Army, ArmyFlags, ArmyPosition, Travel};
pub use events::{BattleSide, BlockReason, EventKind, EventLog, LogEntry};
pub use faction::{Controller, Faction, Personality, TargetPreference};
pub use graph::{RoadNetwork, Route, RouteMode};
pub use leader::{Ability, Leader, LeaderAssignment, LeaderStats, LeaderStatus};
pub use location::{ConstructionProject, Location, LocationKind, TaxLevel};
pub use road::{Road, RoadKind, RoadStage};
pub use state::GameState;
