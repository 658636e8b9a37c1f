//! Offensive campaigns against border locations

use ordered_float::OrderedFloat;
use rand::Rng;
use std::cmp::Reverse;

use crate::ai::context::{Orders, Planner};
use crate::ai::mission::{CampaignMission, FactionAiState, Mission, MissionKind, MissionStage, MissionType};
use crate::ai::missions::{age, assigned_strength};
use crate::ai::siege::{classify_siege, SiegeDecision};
use crate::ai::theater::{estimate_garrison, Theater};
use crate::core::config::EngineConfig;
use crate::core::types::LocationId;
use crate::world::{Location, LocationKind, TargetPreference};

/// Smallest force worth sending anywhere
const MIN_CAMPAIGN_STRENGTH: u32 = 200;

// === GENERATION ===

/// Score a target: type, preference, strategic value and opportunity
pub fn score_target(plan: &Planner, target: &Location, garrison: u32) -> f64 {
    let config = plan.config();
    let mut score = match target.kind {
        LocationKind::City => 3.0,
        LocationKind::Rural => 2.0,
    };
    let preferred = matches!(
        (plan.personality.target_preference, target.kind),
        (TargetPreference::Cities, LocationKind::City) | (TargetPreference::Rural, LocationKind::Rural)
    );
    if preferred {
        score *= 1.5;
    }
    if target.strategic {
        score += 1.0;
    }

    // Walls do nothing below the threshold, so thin garrisons are a bargain
    let threshold = config.fortification_threshold as f64;
    let g = garrison as f64;
    let opportunity = if g < threshold {
        3.0 * (1.0 - g / threshold) + 1.0
    } else {
        threshold / g
    };
    score *= opportunity * (0.5 + plan.personality.aggressiveness);

    if target.faction.is_neutral() {
        score *= 0.8;
    }
    score
}

/// Strength a campaign must field to take a target
pub fn required_strength(config: &EngineConfig, decision: SiegeDecision, fortification: u8, garrison: u32) -> u32 {
    let base = (garrison as f64 * 1.2).ceil() as u32;
    let needed = match decision {
        SiegeDecision::Siege | SiegeDecision::RecruitThenSiege => base.max(config.siege_requirement(fortification)),
        SiegeDecision::Capture | SiegeDecision::Skip => base,
    };
    needed.max(MIN_CAMPAIGN_STRENGTH)
}

/// Staging points for an attack on `target` from `theater`
///
/// A convergent attack needs at least two adjacent holdings that each hold
/// enough troops and together cover most of the requirement; otherwise the
/// force gathers at the nearest holding.
pub fn plan_staging(plan: &Planner, theater: &Theater, target: LocationId, required: u32) -> Option<(Vec<LocationId>, bool)> {
    let config = plan.config();
    let points: Vec<(LocationId, u32)> = theater
        .locations
        .iter()
        .filter(|l| plan.network.are_adjacent(**l, target))
        .map(|l| (*l, plan.state.garrison_strength(*l, plan.faction)))
        .filter(|(_, strength)| *strength >= config.convergence_min_staging)
        .collect();
    let combined: u32 = points.iter().map(|(_, s)| s).sum();
    if points.len() >= 2 && combined as f64 >= config.convergence_coverage * required as f64 {
        return Some((points.into_iter().map(|(l, _)| l).collect(), true));
    }

    theater
        .locations
        .iter()
        .filter_map(|l| plan.distance(*l, target).map(|d| (d, *l)))
        .min()
        .map(|(_, l)| (vec![l], false))
}

pub fn generate(plan: &Planner, record: &mut FactionAiState) {
    let config = plan.config();
    let open = record.count_open(MissionType::Campaign);
    if open >= config.max_campaigns {
        return;
    }
    let gold = plan.state.gold(plan.faction);

    let mut candidates = Vec::new();
    for theater in &plan.theaters {
        let troops: u32 = theater
            .locations
            .iter()
            .map(|l| plan.state.garrison_strength(*l, plan.faction))
            .sum();
        if troops == 0 {
            continue;
        }
        for &target in &theater.border {
            if record.targets(MissionType::Campaign, target) {
                continue;
            }
            let Some(loc) = plan.state.location(target) else {
                continue;
            };
            let garrison = estimate_garrison(plan.state, plan.faction, target);
            let decision = classify_siege(config, loc.fortification, garrison, troops, gold);
            if decision == SiegeDecision::Skip {
                continue;
            }
            let required = required_strength(config, decision, loc.fortification, garrison);
            if troops * 2 < required {
                continue;
            }
            let score = score_target(plan, loc, garrison);
            candidates.push((OrderedFloat(score), Reverse(target), theater.index, required, troops));
        }
    }
    candidates.sort_by(|a, b| b.cmp(a));

    let mut chosen: Vec<LocationId> = Vec::new();
    for (score, Reverse(target), index, required, troops) in candidates {
        if open + chosen.len() >= config.max_campaigns {
            break;
        }
        if chosen.contains(&target) {
            continue;
        }
        let Some(theater) = plan.theaters.get(index) else {
            continue;
        };
        let Some((staging, convergent)) = plan_staging(plan, theater, target, required) else {
            continue;
        };
        let id = record.allocate_id();
        let data = CampaignMission {
            target,
            required_strength: required,
            staging,
            convergent,
            recruit_needed: required.saturating_sub(troops),
            waited: 0,
        };
        tracing::debug!(
            faction = %plan.faction,
            mission = %id,
            target = %target,
            score = score.0,
            required,
            convergent,
            "campaign opened"
        );
        record
            .missions
            .push(Mission::new(id, plan.faction, MissionKind::Campaign(data), plan.state.turn));
        chosen.push(target);
    }
}

// === EXECUTION ===

pub fn execute(plan: &Planner, orders: &mut Orders, mission: &mut Mission, rng: &mut impl Rng) {
    let MissionKind::Campaign(mut data) = mission.kind.clone() else {
        return;
    };
    step(plan, orders, mission, &mut data, rng);
    mission.kind = MissionKind::Campaign(data);
}

fn step(plan: &Planner, orders: &mut Orders, mission: &mut Mission, data: &mut CampaignMission, rng: &mut impl Rng) {
    let Some(target) = plan.state.location(data.target) else {
        return;
    };
    if target.faction == plan.faction {
        mission.complete();
        return;
    }
    match mission.stage {
        MissionStage::Planning | MissionStage::Gathering => gather(plan, orders, mission, data, rng),
        MissionStage::Moving | MissionStage::Sieging | MissionStage::Assaulting => {
            if mission.armies.is_empty() {
                mission.fail();
                return;
            }
            press(plan, orders, mission, data.target, target.fortification);
        }
        _ => {}
    }
}

fn gather(plan: &Planner, orders: &mut Orders, mission: &mut Mission, data: &mut CampaignMission, rng: &mut impl Rng) {
    let config = plan.config();
    data.waited += 1;
    let Some(&rally) = data.staging.first() else {
        mission.fail();
        return;
    };
    // Lost the staging ground: nowhere to gather
    if !data.staging.iter().any(|l| plan.owns(*l)) {
        mission.fail();
        return;
    }

    let mut strength = assigned_strength(plan, mission);
    if strength < data.required_strength {
        if let Some(theater) = plan.theater_of(rally) {
            for (_, army) in orders.free_armies_near(plan, theater, data.target) {
                if strength >= data.required_strength {
                    break;
                }
                orders.claim(army.id);
                mission.armies.push(army.id);
                strength += army.strength;
            }
        }
    }
    if strength < data.required_strength {
        let raised = orders.recruit(plan, rally, data.required_strength - strength);
        data.recruit_needed = (data.required_strength - strength).saturating_sub(raised);
    } else {
        data.recruit_needed = 0;
    }

    if mission.armies.is_empty() {
        if data.waited > config.convergence_max_wait * 2 {
            mission.fail();
        }
        return;
    }
    mission.advance(MissionStage::Gathering);

    // Stragglers head for the nearest staging point
    let mut staged = true;
    for id in mission.armies.clone() {
        let Some(army) = plan.state.army(id) else {
            continue;
        };
        let here = army.location();
        if here.is_some_and(|l| data.staging.contains(&l)) {
            continue;
        }
        staged = false;
        let from = here.unwrap_or(rally);
        let point = data
            .staging
            .iter()
            .filter(|l| plan.owns(**l))
            .filter_map(|l| plan.distance(from, *l).map(|d| (d, *l)))
            .min()
            .map(|(_, l)| l)
            .unwrap_or(rally);
        if army.is_idle() {
            orders.march(army, point);
        }
    }

    let required = data.required_strength as f64;
    let covered = strength as f64 >= config.convergence_coverage * required;
    let launch = if strength >= data.required_strength {
        staged || data.convergent
    } else if data.waited >= config.convergence_max_wait && covered {
        // Out of patience: gamble on the odds the force gives
        if data.convergent {
            rng.gen_bool((strength as f64 / required).min(1.0))
        } else {
            staged
        }
    } else {
        false
    };

    if launch {
        for id in &mission.armies {
            if let Some(army) = plan.state.army(*id) {
                orders.march(army, data.target);
            }
        }
        tracing::debug!(
            faction = %plan.faction,
            mission = %mission.id,
            target = %data.target,
            strength,
            "campaign marching"
        );
        mission.advance(MissionStage::Moving);
    } else if data.waited > config.convergence_max_wait * 3 {
        mission.fail();
    }
}

fn press(plan: &Planner, orders: &mut Orders, mission: &mut Mission, target: LocationId, fortification: u8) {
    let mut arrived = false;
    for id in &mission.armies {
        let Some(army) = plan.state.army(*id) else {
            continue;
        };
        if army.location() == Some(target) {
            arrived = true;
        } else if army.is_idle() {
            // Retreated or held up: try again
            orders.march(army, target);
        }
    }
    if arrived {
        let stage = if fortification > 0 {
            MissionStage::Sieging
        } else {
            MissionStage::Assaulting
        };
        mission.advance(stage);
    } else if age(plan, mission) > plan.config().convergence_max_wait * 6 {
        mission.fail();
    }
}
