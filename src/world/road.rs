//! Roads and their stages
//!
//! A road links two locations. Land roads are split into ordered stages,
//! each one turn of travel; local roads have no stages and are crossed
//! instantly.

use serde::{Deserialize, Serialize};

use crate::core::types::{Direction, FactionId, LocationId, RoadId};
use crate::world::location::ConstructionProject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadKind {
    /// Zero-turn link, typically a city and its rural hinterland
    Local,
    /// Overland road with at least one stage
    Land,
}

/// One turn's worth of road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadStage {
    pub index: usize,
    #[serde(default)]
    pub natural_defense: u32,
    #[serde(default)]
    pub fortification: u8,
    /// Faction that owns the works built on this stage
    #[serde(default)]
    pub works_owner: Option<FactionId>,
    #[serde(default)]
    pub strategic: bool,
    #[serde(default)]
    pub construction: Option<ConstructionProject>,
}

impl RoadStage {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            natural_defense: 0,
            fortification: 0,
            works_owner: None,
            strategic: false,
            construction: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Road {
    pub id: RoadId,
    pub from: LocationId,
    pub to: LocationId,
    pub kind: RoadKind,
    pub stages: Vec<RoadStage>,
    /// Sea lane usable only by naval convoys
    #[serde(default)]
    pub naval: bool,
}

impl Road {
    pub fn local(id: RoadId, from: LocationId, to: LocationId) -> Self {
        Self {
            id,
            from,
            to,
            kind: RoadKind::Local,
            stages: Vec::new(),
            naval: false,
        }
    }

    pub fn land(id: RoadId, from: LocationId, to: LocationId, stage_count: usize) -> Self {
        Self {
            id,
            from,
            to,
            kind: RoadKind::Land,
            stages: (0..stage_count.max(1)).map(RoadStage::new).collect(),
            naval: false,
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind == RoadKind::Local || self.stages.is_empty()
    }

    pub fn connects(&self, location: LocationId) -> bool {
        self.from == location || self.to == location
    }

    /// Endpoint opposite to `location`
    pub fn other_end(&self, location: LocationId) -> Option<LocationId> {
        if self.from == location {
            Some(self.to)
        } else if self.to == location {
            Some(self.from)
        } else {
            None
        }
    }

    /// Direction of travel when leaving `origin`
    pub fn direction_from(&self, origin: LocationId) -> Option<Direction> {
        if self.from == origin {
            Some(Direction::Forward)
        } else if self.to == origin {
            Some(Direction::Backward)
        } else {
            None
        }
    }

    /// Location reached when travelling in `direction`
    pub fn destination(&self, direction: Direction) -> LocationId {
        match direction {
            Direction::Forward => self.to,
            Direction::Backward => self.from,
        }
    }

    /// Location left behind when travelling in `direction`
    pub fn origin(&self, direction: Direction) -> LocationId {
        self.destination(direction.reversed())
    }

    /// First stage entered when leaving along `direction`
    pub fn entry_stage(&self, direction: Direction) -> Option<usize> {
        if self.is_local() {
            return None;
        }
        match direction {
            Direction::Forward => Some(0),
            Direction::Backward => Some(self.stages.len() - 1),
        }
    }

    /// Stage after `stage` in `direction`, or None when the next step
    /// arrives at the endpoint
    pub fn next_stage(&self, stage: usize, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward if stage + 1 < self.stages.len() => Some(stage + 1),
            Direction::Backward if stage > 0 => Some(stage - 1),
            _ => None,
        }
    }

    /// Steps left to reach the end of the road from `stage`
    pub fn steps_remaining(&self, stage: usize, direction: Direction) -> u32 {
        let stages_ahead = match direction {
            Direction::Forward => self.stages.len().saturating_sub(stage + 1),
            Direction::Backward => stage,
        };
        stages_ahead as u32 + 1
    }

    /// Steps to cross the whole road (0 for local links)
    pub fn travel_steps(&self) -> u32 {
        if self.is_local() {
            0
        } else {
            self.stages.len() as u32 + 1
        }
    }

    pub fn stage(&self, index: usize) -> Option<&RoadStage> {
        self.stages.get(index)
    }

    pub fn stage_mut(&mut self, index: usize) -> Option<&mut RoadStage> {
        self.stages.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_indices_contiguous() {
        let road = Road::land(RoadId(1), LocationId(1), LocationId(2), 3);
        let indices: Vec<_> = road.stages.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_forward_traversal() {
        let road = Road::land(RoadId(1), LocationId(1), LocationId(2), 3);
        assert_eq!(road.entry_stage(Direction::Forward), Some(0));
        assert_eq!(road.next_stage(0, Direction::Forward), Some(1));
        assert_eq!(road.next_stage(2, Direction::Forward), None);
        assert_eq!(road.steps_remaining(0, Direction::Forward), 3);
        assert_eq!(road.steps_remaining(2, Direction::Forward), 1);
    }

    #[test]
    fn test_backward_traversal() {
        let road = Road::land(RoadId(1), LocationId(1), LocationId(2), 3);
        let dir = road.direction_from(LocationId(2)).unwrap();
        assert_eq!(dir, Direction::Backward);
        assert_eq!(road.entry_stage(dir), Some(2));
        assert_eq!(road.next_stage(0, dir), None);
        assert_eq!(road.destination(dir), LocationId(1));
        assert_eq!(road.steps_remaining(2, dir), 3);
    }

    #[test]
    fn test_local_road() {
        let road = Road::local(RoadId(1), LocationId(1), LocationId(2));
        assert!(road.is_local());
        assert_eq!(road.travel_steps(), 0);
        assert_eq!(road.entry_stage(Direction::Forward), None);
        assert_eq!(road.other_end(LocationId(2)), Some(LocationId(1)));
        assert_eq!(road.other_end(LocationId(3)), None);
    }
}
