//! Road network queries: adjacency and shortest routes

use ahash::AHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::core::types::{LocationId, RoadId};
use crate::world::road::Road;

/// Which roads a traveller may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    /// Armies, leaders and land convoys
    Land,
    /// Naval convoys: sea lanes only
    Sea,
}

/// A shortest route between two locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Roads in travel order
    pub roads: Vec<RoadId>,
    /// Locations visited after each road, in order
    pub waypoints: Vec<LocationId>,
    /// Resolver steps needed (a local link counts as one step)
    pub steps: u32,
}

impl Route {
    pub fn first_road(&self) -> Option<RoadId> {
        self.roads.first().copied()
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    road: RoadId,
    to: LocationId,
    cost: u32,
}

/// Adjacency index over the road list, built once per phase
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    adjacency: AHashMap<LocationId, Vec<Edge>>,
    sea: AHashMap<LocationId, Vec<Edge>>,
}

impl RoadNetwork {
    pub fn new(roads: &[Road]) -> Self {
        let mut network = Self::default();
        for road in roads {
            let cost = road.travel_steps().max(1);
            let table = if road.naval {
                &mut network.sea
            } else {
                &mut network.adjacency
            };
            table.entry(road.from).or_default().push(Edge {
                road: road.id,
                to: road.to,
                cost,
            });
            table.entry(road.to).or_default().push(Edge {
                road: road.id,
                to: road.from,
                cost,
            });
        }
        for edges in network.adjacency.values_mut().chain(network.sea.values_mut()) {
            edges.sort_by_key(|e| (e.to, e.road));
        }
        network
    }

    fn edges(&self, location: LocationId, mode: RouteMode) -> &[Edge] {
        let table = match mode {
            RouteMode::Land => &self.adjacency,
            RouteMode::Sea => &self.sea,
        };
        table.get(&location).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Locations one road away over land, ascending by id
    pub fn neighbors(&self, location: LocationId) -> Vec<LocationId> {
        let mut out: Vec<_> = self
            .edges(location, RouteMode::Land)
            .iter()
            .map(|e| e.to)
            .collect();
        out.dedup();
        out
    }

    /// Roads leaving a location over land
    pub fn roads_from(&self, location: LocationId) -> Vec<RoadId> {
        self.edges(location, RouteMode::Land)
            .iter()
            .map(|e| e.road)
            .collect()
    }

    pub fn are_adjacent(&self, a: LocationId, b: LocationId) -> bool {
        self.edges(a, RouteMode::Land).iter().any(|e| e.to == b)
    }

    /// Dijkstra over resolver steps; ties resolve toward lower ids
    pub fn find_route(&self, start: LocationId, goal: LocationId, mode: RouteMode) -> Option<Route> {
        if start == goal {
            return Some(Route {
                roads: Vec::new(),
                waypoints: Vec::new(),
                steps: 0,
            });
        }

        let mut best: AHashMap<LocationId, u32> = AHashMap::new();
        let mut came_from: AHashMap<LocationId, (LocationId, RoadId)> = AHashMap::new();
        let mut open = BinaryHeap::new();

        best.insert(start, 0);
        open.push(Reverse((0u32, start)));

        while let Some(Reverse((cost, current))) = open.pop() {
            if current == goal {
                let mut roads = Vec::new();
                let mut waypoints = Vec::new();
                let mut cursor = goal;
                while let Some(&(prev, road)) = came_from.get(&cursor) {
                    roads.push(road);
                    waypoints.push(cursor);
                    cursor = prev;
                }
                roads.reverse();
                waypoints.reverse();
                return Some(Route {
                    roads,
                    waypoints,
                    steps: cost,
                });
            }

            if cost > best.get(&current).copied().unwrap_or(u32::MAX) {
                continue;
            }

            for edge in self.edges(current, mode) {
                let tentative = cost + edge.cost;
                if tentative < best.get(&edge.to).copied().unwrap_or(u32::MAX) {
                    best.insert(edge.to, tentative);
                    came_from.insert(edge.to, (current, edge.road));
                    open.push(Reverse((tentative, edge.to)));
                }
            }
        }

        None
    }

    /// Steps between two locations over land
    pub fn distance(&self, start: LocationId, goal: LocationId) -> Option<u32> {
        self.find_route(start, goal, RouteMode::Land).map(|r| r.steps)
    }

    /// First road to take from `start` toward `goal`
    pub fn next_road(&self, start: LocationId, goal: LocationId) -> Option<RoadId> {
        self.find_route(start, goal, RouteMode::Land)
            .and_then(|r| r.first_road())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_network() -> Vec<Road> {
        // 1 --(2 stages)-- 2 --(local)-- 3 --(1 stage)-- 4
        vec![
            Road::land(RoadId(1), LocationId(1), LocationId(2), 2),
            Road::local(RoadId(2), LocationId(2), LocationId(3)),
            Road::land(RoadId(3), LocationId(3), LocationId(4), 1),
        ]
    }

    #[test]
    fn test_route_steps() {
        let network = RoadNetwork::new(&line_network());
        let route = network
            .find_route(LocationId(1), LocationId(4), RouteMode::Land)
            .unwrap();
        assert_eq!(route.roads, vec![RoadId(1), RoadId(2), RoadId(3)]);
        assert_eq!(route.waypoints, vec![LocationId(2), LocationId(3), LocationId(4)]);
        assert_eq!(route.steps, 3 + 1 + 2);
    }

    #[test]
    fn test_route_to_self() {
        let network = RoadNetwork::new(&line_network());
        let route = network
            .find_route(LocationId(2), LocationId(2), RouteMode::Land)
            .unwrap();
        assert!(route.roads.is_empty());
        assert_eq!(route.steps, 0);
    }

    #[test]
    fn test_neighbors_and_adjacency() {
        let network = RoadNetwork::new(&line_network());
        assert_eq!(network.neighbors(LocationId(2)), vec![LocationId(1), LocationId(3)]);
        assert!(network.are_adjacent(LocationId(3), LocationId(4)));
        assert!(!network.are_adjacent(LocationId(1), LocationId(4)));
    }

    #[test]
    fn test_sea_lanes_separate() {
        let mut roads = line_network();
        let mut lane = Road::land(RoadId(9), LocationId(1), LocationId(4), 1);
        lane.naval = true;
        roads.push(lane);
        let network = RoadNetwork::new(&roads);
        assert_eq!(network.distance(LocationId(1), LocationId(4)), Some(6));
        let sea = network
            .find_route(LocationId(1), LocationId(4), RouteMode::Sea)
            .unwrap();
        assert_eq!(sea.roads, vec![RoadId(9)]);
    }

    #[test]
    fn test_unreachable() {
        let network = RoadNetwork::new(&line_network());
        assert!(network.find_route(LocationId(1), LocationId(99), RouteMode::Land).is_none());
    }
}
