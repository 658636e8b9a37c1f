//! Fortifying strategic road stages on contested frontiers

use crate::actions::Action;
use crate::ai::budget::BudgetCategory;
use crate::ai::context::{Orders, Planner};
use crate::ai::mission::{FactionAiState, Mission, MissionKind, MissionStage, MissionType, RoadDefenseMission};
use crate::core::types::RoadId;
use crate::world::location::MAX_FORTIFICATION;
use crate::world::ArmyPosition;

/// Defensiveness above which quiet frontiers are fortified too
const EAGER_DEFENSIVENESS: f64 = 0.6;

pub fn generate(plan: &Planner, record: &mut FactionAiState) {
    let cap = plan.config().max_road_defenses;
    let open = record.count_open(MissionType::RoadDefense);
    if open >= cap {
        return;
    }
    let threatened = plan.theaters.iter().any(|t| t.threatened);
    if !threatened && plan.personality.defensiveness < EAGER_DEFENSIVENESS {
        return;
    }

    let taken: Vec<(RoadId, usize)> = record
        .open_missions()
        .filter_map(|m| match &m.kind {
            MissionKind::RoadDefense(r) => Some((r.road, r.stage)),
            _ => None,
        })
        .collect();

    let mut candidates = Vec::new();
    for road in &plan.state.roads {
        if road.naval {
            continue;
        }
        // Frontier roads only: one end ours, the other not
        if plan.owns(road.from) == plan.owns(road.to) {
            continue;
        }
        for stage in road.stages.iter().filter(|s| s.strategic) {
            let free = stage.works_owner.map_or(true, |o| o == plan.faction);
            let position = ArmyPosition::AtRoadStage {
                road: road.id,
                stage: stage.index,
            };
            if !free
                || stage.construction.is_some()
                || stage.fortification >= MAX_FORTIFICATION
                || taken.contains(&(road.id, stage.index))
                || plan.state.hostile_strength_at(position, plan.faction) > 0
            {
                continue;
            }
            candidates.push((road.id, stage.index, stage.fortification));
        }
    }
    candidates.sort();

    for (road, stage, level) in candidates.into_iter().take(cap - open) {
        let id = record.allocate_id();
        tracing::debug!(faction = %plan.faction, mission = %id, road = %road, stage, "road defense opened");
        record.missions.push(Mission::new(
            id,
            plan.faction,
            MissionKind::RoadDefense(RoadDefenseMission {
                road,
                stage,
                target_level: level + 1,
            }),
            plan.state.turn,
        ));
    }
}

pub fn execute(plan: &Planner, orders: &mut Orders, mission: &mut Mission) {
    let MissionKind::RoadDefense(data) = &mission.kind else {
        return;
    };
    let (road_id, index, target_level) = (data.road, data.stage, data.target_level);
    let Some(road) = plan.state.road(road_id) else {
        return;
    };
    let Some(stage) = road.stage(index) else {
        return;
    };
    if !plan.owns(road.from) && !plan.owns(road.to) {
        mission.fail();
        return;
    }
    if stage.works_owner.is_some_and(|o| o != plan.faction) {
        mission.fail();
        return;
    }
    if stage.fortification >= target_level {
        mission.complete();
        return;
    }
    if stage.construction.is_some() {
        mission.advance(MissionStage::Building);
        return;
    }
    let Some(cost) = plan.config().fortify_cost_from(stage.fortification) else {
        mission.complete();
        return;
    };
    if orders.budget.spend(BudgetCategory::Fortification, cost) {
        orders.push(Action::FortifyStage {
            road: road_id,
            stage: index,
        });
        mission.advance(MissionStage::Building);
    }
}
