//! Movement & collision resolution
//!
//! One step per army per turn. Steps are planned against an immutable
//! view of the world, filtered through the collision rules, then committed.

pub mod collision;
pub mod leaders;
pub mod resolver;

pub use collision::{detect_conflicts, Blocked};
pub use leaders::advance_leaders;
pub use resolver::{continue_march, next_step, plan_steps, resolve_movement, Step};
