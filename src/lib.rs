//! Warfront - deterministic turn engine for a territorial war game
//!
//! Factions hold locations joined by roads, raise armies, send leaders on
//! covert work and fight over the map one turn at a time. Non-human
//! factions are driven by a theater and mission planner. A turn is a pure
//! function of the previous state; the only asynchronous step is the
//! optional narrative text.

pub mod actions;
pub mod ai;
pub mod combat;
pub mod core;
pub mod economy;
pub mod movement;
pub mod narrative;
pub mod scenario;
pub mod turn;
pub mod world;
