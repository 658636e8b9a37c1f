//! Validated actions shared by players and the AI planner
//!
//! `apply_action` checks every precondition before touching the state, so
//! a rejected action leaves nothing behind. `process_player_action` wraps
//! it in the copy-on-success contract the transport layer expects.

use serde::{Deserialize, Serialize};

use crate::combat::{resolve_combat, CombatChoice};
use crate::core::error::{ActionError, ActionResult};
use crate::core::types::{ArmyId, CombatId, Direction, FactionId, LeaderId, LocationId, RoadId};
use crate::economy::{Convoy, Negotiation};
use crate::turn::turn_rng;
use crate::world::location::MAX_FORTIFICATION;
use crate::world::{
    ArmyPosition, ConstructionProject, EventKind, GameState, LeaderAssignment, LeaderStatus, LogEntry, RouteMode,
    TaxLevel,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    MoveArmy { army: ArmyId, destination: LocationId },
    HoldArmy { army: ArmyId },
    SplitArmy { army: ArmyId, strength: u32 },
    MergeArmies { target: ArmyId, source: ArmyId },
    Recruit { location: LocationId, strength: u32 },
    Fortify { location: LocationId },
    FortifyStage { road: RoadId, stage: usize },
    SetTax { location: LocationId, level: TaxLevel },
    AttachLeader { leader: LeaderId, army: ArmyId },
    DetachLeader { leader: LeaderId },
    SendLeader {
        leader: LeaderId,
        destination: LocationId,
        assignment: Option<LeaderAssignment>,
    },
    Negotiate { target: LocationId, gold: u32 },
    SendConvoy {
        from: LocationId,
        to: LocationId,
        food: u32,
        naval: bool,
    },
    ResolveCombat { combat: CombatId, choice: CombatChoice },
}

/// Result handed back to the transport layer
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub success: bool,
    pub state: GameState,
    pub error: Option<String>,
    pub events: Vec<LogEntry>,
}

/// Validate and apply one action for `faction`, without turn-order checks
pub fn apply_action(state: &mut GameState, faction: FactionId, action: &Action) -> ActionResult<Vec<LogEntry>> {
    match action {
        Action::MoveArmy { army, destination } => move_army(state, faction, *army, *destination),
        Action::HoldArmy { army } => {
            owned_army(state, faction, *army)?;
            if let Some(a) = state.army_mut(*army) {
                a.order_hold();
            }
            Ok(Vec::new())
        }
        Action::SplitArmy { army, strength } => split_army(state, faction, *army, *strength),
        Action::MergeArmies { target, source } => merge_armies(state, faction, *target, *source),
        Action::Recruit { location, strength } => recruit(state, faction, *location, *strength),
        Action::Fortify { location } => fortify(state, faction, *location),
        Action::FortifyStage { road, stage } => fortify_stage(state, faction, *road, *stage),
        Action::SetTax { location, level } => set_tax(state, faction, *location, *level),
        Action::AttachLeader { leader, army } => attach_leader(state, faction, *leader, *army),
        Action::DetachLeader { leader } => detach_leader(state, faction, *leader),
        Action::SendLeader {
            leader,
            destination,
            assignment,
        } => send_leader(state, faction, *leader, *destination, *assignment),
        Action::Negotiate { target, gold } => negotiate(state, faction, *target, *gold),
        Action::SendConvoy { from, to, food, naval } => send_convoy(state, faction, *from, *to, *food, *naval),
        Action::ResolveCombat { combat, choice } => resolve_pending(state, faction, *combat, *choice),
    }
}

/// Apply a player's action to a copy of the state
///
/// On failure the original state comes back unchanged together with the
/// reason.
pub fn process_player_action(state: &GameState, action: &Action, faction: FactionId) -> ActionOutcome {
    let rejected = |err: ActionError| {
        tracing::debug!(faction = %faction, ?action, %err, "action rejected");
        ActionOutcome {
            success: false,
            state: state.clone(),
            error: Some(err.to_string()),
            events: Vec::new(),
        }
    };

    if state.victory.is_some() {
        return rejected(ActionError::GameOver);
    }
    if state.current_player.is_some_and(|p| p != faction) {
        return rejected(ActionError::NotYourTurn);
    }

    let mut next = state.clone();
    match apply_action(&mut next, faction, action) {
        Ok(events) => {
            next.log.extend(events.iter().cloned());
            ActionOutcome {
                success: true,
                state: next,
                error: None,
                events,
            }
        }
        Err(err) => rejected(err),
    }
}

// === LOOKUP HELPERS ===

fn owned_army(state: &GameState, faction: FactionId, army: ArmyId) -> ActionResult<()> {
    let a = state.army(army).ok_or(ActionError::ArmyNotFound(army))?;
    if a.faction != faction || !a.is_alive() {
        return Err(ActionError::NotOwner);
    }
    Ok(())
}

fn owned_location(state: &GameState, faction: FactionId, location: LocationId) -> ActionResult<()> {
    let loc = state
        .location(location)
        .ok_or(ActionError::LocationNotFound(location))?;
    if loc.faction != faction {
        return Err(ActionError::NotOwner);
    }
    Ok(())
}

fn check_gold(state: &GameState, faction: FactionId, needed: u32) -> ActionResult<()> {
    let available = state.gold(faction);
    if available < needed {
        return Err(ActionError::InsufficientGold { needed, available });
    }
    Ok(())
}

fn pay(state: &mut GameState, faction: FactionId, amount: u32) {
    if let Some(f) = state.faction_mut(faction) {
        f.gold = f.gold.saturating_sub(amount);
    }
}

// === ARMIES ===

fn move_army(state: &mut GameState, faction: FactionId, army: ArmyId, destination: LocationId) -> ActionResult<Vec<LogEntry>> {
    owned_army(state, faction, army)?;
    state
        .location(destination)
        .ok_or(ActionError::LocationNotFound(destination))?;

    let network = state.network();
    let a = state.army(army).ok_or(ActionError::ArmyNotFound(army))?;
    let steps = match a.position {
        ArmyPosition::AtLocation { id } => network
            .find_route(id, destination, RouteMode::Land)
            .map(|r| r.steps),
        ArmyPosition::AtRoadStage { road, stage } => {
            let road = state.road(road).ok_or(ActionError::RoadNotFound(road))?;
            [Direction::Forward, Direction::Backward]
                .into_iter()
                .filter_map(|dir| {
                    network
                        .distance(road.destination(dir), destination)
                        .map(|d| d + road.steps_remaining(stage, dir))
                })
                .min()
        }
    }
    .ok_or_else(|| ActionError::IllegalTarget(format!("no road leads to {}", destination)))?;

    let Some(a) = state.army_mut(army) else {
        return Err(ActionError::ArmyNotFound(army));
    };
    // A new destination may mean turning around on the road
    if a.destination != Some(destination) && a.position.is_on_road() {
        a.travel = None;
    }
    a.order_move_to(destination);
    a.turns_until_arrival = steps;
    Ok(Vec::new())
}

fn split_army(state: &mut GameState, faction: FactionId, army: ArmyId, strength: u32) -> ActionResult<Vec<LogEntry>> {
    owned_army(state, faction, army)?;
    let a = state.army(army).ok_or(ActionError::ArmyNotFound(army))?;
    if a.location().is_none() {
        return Err(ActionError::IllegalTarget("armies split only at a location".into()));
    }
    if strength == 0 || strength >= a.strength {
        return Err(ActionError::InsufficientTroops {
            needed: strength.max(1) + 1,
            available: a.strength,
        });
    }
    let (position, safe, food, flags) = (a.position, a.last_safe_position, a.food_source, a.flags);

    if let Some(a) = state.army_mut(army) {
        a.strength -= strength;
    }
    let new_id = state.spawn_army(faction, position, strength);
    if let Some(detached) = state.army_mut(new_id) {
        detached.last_safe_position = safe;
        detached.food_source = food;
        detached.flags.spent = flags.spent;
        detached.flags.just_moved = flags.just_moved;
    }
    Ok(Vec::new())
}

fn merge_armies(state: &mut GameState, faction: FactionId, target: ArmyId, source: ArmyId) -> ActionResult<Vec<LogEntry>> {
    owned_army(state, faction, target)?;
    owned_army(state, faction, source)?;
    if target == source {
        return Err(ActionError::IllegalTarget("an army cannot merge with itself".into()));
    }
    let (t, s) = match (state.army(target), state.army(source)) {
        (Some(t), Some(s)) => (t, s),
        _ => return Err(ActionError::ArmyNotFound(source)),
    };
    if t.position != s.position || t.location().is_none() {
        return Err(ActionError::IllegalTarget("armies must share a location to merge".into()));
    }
    if s.flags.sieging {
        return Err(ActionError::IllegalTarget("a besieging army cannot merge away".into()));
    }

    let moved = s.strength;
    if let Some(s) = state.army_mut(source) {
        s.strength = 0;
    }
    if let Some(t) = state.army_mut(target) {
        t.strength += moved;
    }
    for leader in state.leaders.iter_mut().filter(|l| l.army == Some(source)) {
        leader.army = Some(target);
    }
    state.remove_dead_armies();
    Ok(Vec::new())
}

fn recruit(state: &mut GameState, faction: FactionId, location: LocationId, strength: u32) -> ActionResult<Vec<LogEntry>> {
    owned_location(state, faction, location)?;
    if strength == 0 || strength % 100 != 0 {
        return Err(ActionError::InvalidChoice("recruits come in multiples of 100".into()));
    }
    let loc = state
        .location(location)
        .ok_or(ActionError::LocationNotFound(location))?;
    if loc.counters.recruits > 0 {
        return Err(ActionError::ActionLimitReached);
    }
    if loc.population < strength {
        return Err(ActionError::InsufficientTroops {
            needed: strength,
            available: loc.population,
        });
    }
    let cost = state.config.recruit_cost(strength);
    check_gold(state, faction, cost)?;

    pay(state, faction, cost);
    if let Some(loc) = state.location_mut(location) {
        loc.population -= strength;
        loc.counters.recruits += 1;
    }

    let idle = state
        .armies_at(location.into())
        .iter()
        .find(|a| a.faction == faction && a.is_idle() && !a.flags.insurgent)
        .map(|a| a.id);
    let army = match idle {
        Some(id) => {
            if let Some(a) = state.army_mut(id) {
                a.strength += strength;
            }
            id
        }
        None => state.spawn_army(faction, location.into(), strength),
    };

    tracing::debug!(faction = %faction, location = %location, strength, cost, "recruited");
    Ok(vec![LogEntry::new(state.turn, EventKind::ArmyRecruited { army, location, strength })
        .for_faction(faction)
        .at(location)])
}

// === CONSTRUCTION ===

fn fortify(state: &mut GameState, faction: FactionId, location: LocationId) -> ActionResult<Vec<LogEntry>> {
    owned_location(state, faction, location)?;
    let loc = state
        .location(location)
        .ok_or(ActionError::LocationNotFound(location))?;
    if loc.construction.is_some() {
        return Err(ActionError::ActionLimitReached);
    }
    if loc.fortification >= MAX_FORTIFICATION {
        return Err(ActionError::IllegalTarget(format!("{} is fully fortified", loc.name)));
    }
    if state.hostile_strength_at(location.into(), faction) > 0 {
        return Err(ActionError::IllegalTarget("cannot build with enemies present".into()));
    }
    let level = loc.fortification;
    let cost = state
        .config
        .fortify_cost_from(level)
        .ok_or_else(|| ActionError::IllegalTarget("no further fortification".into()))?;
    check_gold(state, faction, cost)?;

    let turns = state.config.fortify_base_turns + u32::from(level);
    pay(state, faction, cost);
    if let Some(loc) = state.location_mut(location) {
        loc.construction = Some(ConstructionProject {
            faction,
            target_level: level + 1,
            turns_remaining: turns,
        });
    }
    Ok(vec![LogEntry::new(
        state.turn,
        EventKind::FortificationStarted {
            location,
            target_level: level + 1,
        },
    )
    .for_faction(faction)
    .at(location)])
}

fn fortify_stage(state: &mut GameState, faction: FactionId, road: RoadId, stage: usize) -> ActionResult<Vec<LogEntry>> {
    let r = state.road(road).ok_or(ActionError::RoadNotFound(road))?;
    let held_end = [r.from, r.to]
        .iter()
        .any(|l| state.location(*l).is_some_and(|l| l.faction == faction));
    if !held_end {
        return Err(ActionError::NotOwner);
    }
    let s = r
        .stage(stage)
        .ok_or_else(|| ActionError::IllegalTarget(format!("{} has no stage {}", road, stage)))?;
    if s.works_owner.is_some_and(|o| o != faction) {
        return Err(ActionError::NotOwner);
    }
    if s.construction.is_some() {
        return Err(ActionError::ActionLimitReached);
    }
    if s.fortification >= MAX_FORTIFICATION {
        return Err(ActionError::IllegalTarget("stage is fully fortified".into()));
    }
    let position = ArmyPosition::AtRoadStage { road, stage };
    if state.hostile_strength_at(position, faction) > 0 {
        return Err(ActionError::IllegalTarget("cannot build with enemies present".into()));
    }
    let level = s.fortification;
    let cost = state
        .config
        .fortify_cost_from(level)
        .ok_or_else(|| ActionError::IllegalTarget("no further fortification".into()))?;
    check_gold(state, faction, cost)?;

    let turns = state.config.fortify_base_turns + u32::from(level);
    pay(state, faction, cost);
    if let Some(s) = state.road_mut(road).and_then(|r| r.stage_mut(stage)) {
        s.works_owner = Some(faction);
        s.construction = Some(ConstructionProject {
            faction,
            target_level: level + 1,
            turns_remaining: turns,
        });
    }
    Ok(vec![LogEntry::new(
        state.turn,
        EventKind::StageFortificationStarted {
            road,
            stage,
            target_level: level + 1,
        },
    )
    .for_faction(faction)])
}

fn set_tax(state: &mut GameState, faction: FactionId, location: LocationId, level: TaxLevel) -> ActionResult<Vec<LogEntry>> {
    owned_location(state, faction, location)?;
    if let Some(loc) = state.location_mut(location) {
        loc.tax_level = level;
    }
    Ok(vec![LogEntry::new(state.turn, EventKind::TaxChanged { location, level })
        .for_faction(faction)
        .at(location)])
}

// === LEADERS ===

fn attach_leader(state: &mut GameState, faction: FactionId, leader: LeaderId, army: ArmyId) -> ActionResult<Vec<LogEntry>> {
    owned_army(state, faction, army)?;
    let l = state.leader(leader).ok_or(ActionError::LeaderNotFound(leader))?;
    if l.faction != faction {
        return Err(ActionError::NotOwner);
    }
    if !l.is_alive() || l.army.is_some() || l.status == LeaderStatus::Moving {
        return Err(ActionError::IllegalTarget(format!("{} cannot take command", l.name)));
    }
    let army_location = state.army(army).and_then(|a| a.location());
    if army_location.is_none() || army_location != l.location {
        return Err(ActionError::IllegalTarget("leader and army must share a location".into()));
    }

    if let Some(l) = state.leader_mut(leader) {
        l.army = Some(army);
        l.status = LeaderStatus::Available;
        l.assignment = None;
        l.destination = None;
    }
    Ok(Vec::new())
}

fn detach_leader(state: &mut GameState, faction: FactionId, leader: LeaderId) -> ActionResult<Vec<LogEntry>> {
    let l = state.leader(leader).ok_or(ActionError::LeaderNotFound(leader))?;
    if l.faction != faction {
        return Err(ActionError::NotOwner);
    }
    let army = l
        .army
        .ok_or_else(|| ActionError::IllegalTarget(format!("{} commands no army", l.name)))?;
    let location = state
        .army(army)
        .and_then(|a| a.location())
        .ok_or_else(|| ActionError::IllegalTarget("cannot leave an army on the road".into()))?;

    if let Some(l) = state.leader_mut(leader) {
        l.army = None;
        l.location = Some(location);
        l.status = LeaderStatus::Available;
    }
    Ok(Vec::new())
}

fn send_leader(
    state: &mut GameState,
    faction: FactionId,
    leader: LeaderId,
    destination: LocationId,
    assignment: Option<LeaderAssignment>,
) -> ActionResult<Vec<LogEntry>> {
    let l = state.leader(leader).ok_or(ActionError::LeaderNotFound(leader))?;
    if l.faction != faction {
        return Err(ActionError::NotOwner);
    }
    if !l.is_alive() || l.army.is_some() || matches!(l.status, LeaderStatus::Moving | LeaderStatus::OnMission) {
        return Err(ActionError::IllegalTarget(format!("{} is not free to travel", l.name)));
    }
    let origin = l
        .location
        .ok_or_else(|| ActionError::IllegalTarget(format!("{} has no known whereabouts", l.name)))?;
    let target = state
        .location(destination)
        .ok_or(ActionError::LocationNotFound(destination))?;
    let friendly = target.faction == faction;

    match assignment {
        Some(LeaderAssignment::Governor { location }) if location != destination || !friendly => {
            return Err(ActionError::IllegalTarget("governors serve in their own territory".into()));
        }
        Some(LeaderAssignment::Undercover { location }) if location != destination || friendly => {
            return Err(ActionError::IllegalTarget("agents infiltrate hostile territory".into()));
        }
        Some(LeaderAssignment::Insurrection { target, gold }) => {
            if target != destination || friendly {
                return Err(ActionError::IllegalTarget("uprisings target hostile territory".into()));
            }
            check_gold(state, faction, gold)?;
        }
        _ => {}
    }

    let steps = state
        .network()
        .distance(origin, destination)
        .ok_or_else(|| ActionError::IllegalTarget(format!("no road leads to {}", destination)))?;

    if let Some(l) = state.leader_mut(leader) {
        l.status = LeaderStatus::Moving;
        l.destination = Some(destination);
        l.turns_until_arrival = steps.max(1);
        l.location = None;
        l.assignment = assignment;
    }
    Ok(Vec::new())
}

// === DIPLOMACY & LOGISTICS ===

fn negotiate(state: &mut GameState, faction: FactionId, target: LocationId, gold: u32) -> ActionResult<Vec<LogEntry>> {
    let loc = state.location(target).ok_or(ActionError::LocationNotFound(target))?;
    if !loc.faction.is_neutral() {
        return Err(ActionError::IllegalTarget(format!("{} is not neutral", loc.name)));
    }
    if state
        .negotiations
        .iter()
        .any(|n| n.faction == faction && n.target == target)
    {
        return Err(ActionError::ActionLimitReached);
    }
    if gold == 0 {
        return Err(ActionError::InvalidChoice("an offer needs gold".into()));
    }
    let network = state.network();
    let bordering = network
        .neighbors(target)
        .into_iter()
        .any(|n| state.location(n).is_some_and(|l| l.faction == faction));
    if !bordering {
        return Err(ActionError::IllegalTarget("negotiations need a shared border".into()));
    }
    check_gold(state, faction, gold)?;

    pay(state, faction, gold);
    let turns = state.config.negotiation_turns;
    state.negotiations.push(Negotiation {
        faction,
        target,
        offer: gold,
        turns_remaining: turns,
    });
    Ok(vec![LogEntry::new(state.turn, EventKind::NegotiationStarted { location: target, offer: gold })
        .for_faction(faction)
        .at(target)])
}

fn send_convoy(
    state: &mut GameState,
    faction: FactionId,
    from: LocationId,
    to: LocationId,
    food: u32,
    naval: bool,
) -> ActionResult<Vec<LogEntry>> {
    owned_location(state, faction, from)?;
    owned_location(state, faction, to)?;
    if from == to || food == 0 {
        return Err(ActionError::InvalidChoice("a convoy needs food and somewhere to go".into()));
    }
    let (origin, destination) = match (state.location(from), state.location(to)) {
        (Some(o), Some(d)) => (o, d),
        _ => return Err(ActionError::LocationNotFound(to)),
    };
    if origin.food_stock < food {
        return Err(ActionError::InsufficientFood {
            needed: food,
            available: origin.food_stock,
        });
    }
    let network = state.network();
    let turns = if naval {
        if !origin.coastal || !destination.coastal {
            return Err(ActionError::IllegalTarget("naval convoys sail between coastal locations".into()));
        }
        network
            .find_route(from, to, RouteMode::Sea)
            .ok_or_else(|| ActionError::IllegalTarget("no sea lane".into()))?;
        state.config.naval_convoy_turns
    } else {
        network
            .find_route(from, to, RouteMode::Land)
            .ok_or_else(|| ActionError::IllegalTarget(format!("no road leads to {}", to)))?
            .steps
            .max(1)
    };

    if let Some(o) = state.location_mut(from) {
        o.food_stock -= food;
    }
    let id = state.allocate_convoy_id();
    state.convoys.push(Convoy {
        id,
        faction,
        from,
        to,
        food,
        turns_remaining: turns,
        naval,
    });
    Ok(vec![LogEntry::new(state.turn, EventKind::ConvoyDispatched { convoy: id, to, food })
        .for_faction(faction)
        .at(from)])
}

fn resolve_pending(
    state: &mut GameState,
    faction: FactionId,
    combat: CombatId,
    choice: CombatChoice,
) -> ActionResult<Vec<LogEntry>> {
    let index = state
        .pending_combats
        .iter()
        .position(|c| c.id == combat)
        .ok_or(ActionError::CombatNotFound(combat))?;
    let contact = state.pending_combats[index].clone();
    let side = contact.side_of(faction).ok_or(ActionError::NotOwner)?;

    let mut rng = turn_rng(state, u64::from(combat.0));
    let events = resolve_combat(state, &contact, side, choice, &mut rng)?;
    state.pending_combats.retain(|c| c.id != combat);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Contact;
    use crate::core::config::EngineConfig;
    use crate::world::{BattleSide, Controller, Faction, Leader, Location, LocationKind, Road};

    fn state() -> GameState {
        let mut state = GameState::new(9, EngineConfig::default());
        state.factions.push(Faction::new(FactionId(1), "Player", Controller::Human).with_gold(1000));
        state.factions.push(Faction::new(FactionId(2), "Rival", Controller::Ai).with_gold(1000));
        state.locations.push(
            Location::new(LocationId(1), "Home", LocationKind::City, FactionId(1))
                .with_population(50_000)
                .with_income(100, 10),
        );
        state.locations.push(Location::new(LocationId(2), "Border", LocationKind::City, FactionId(2)));
        state.locations.push(
            Location::new(LocationId(3), "Wilds", LocationKind::Rural, FactionId::NEUTRAL).with_population(30_000),
        );
        state.roads.push(Road::land(RoadId(1), LocationId(1), LocationId(2), 2));
        state.roads.push(Road::land(RoadId(2), LocationId(1), LocationId(3), 1));
        state
    }

    #[test]
    fn test_move_order_sets_destination() {
        let mut state = state();
        let army = state.spawn_army(FactionId(1), LocationId(1).into(), 500);
        let outcome = process_player_action(
            &state,
            &Action::MoveArmy {
                army,
                destination: LocationId(2),
            },
            FactionId(1),
        );
        assert!(outcome.success);
        let moved = outcome.state.army(army).unwrap();
        assert_eq!(moved.destination, Some(LocationId(2)));
        assert_eq!(moved.turns_until_arrival, 3);
    }

    #[test]
    fn test_not_your_turn() {
        let mut state = state();
        state.current_player = Some(FactionId(2));
        let outcome = process_player_action(
            &state,
            &Action::SetTax {
                location: LocationId(1),
                level: TaxLevel::High,
            },
            FactionId(1),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Not your turn"));
        assert_eq!(outcome.state.location(LocationId(1)).unwrap().tax_level, TaxLevel::Normal);
    }

    #[test]
    fn test_foreign_army_rejected() {
        let mut state = state();
        let army = state.spawn_army(FactionId(2), LocationId(2).into(), 500);
        let outcome = process_player_action(&state, &Action::HoldArmy { army }, FactionId(1));
        assert!(!outcome.success);
    }

    #[test]
    fn test_recruit_once_per_turn() {
        let mut state = state();
        let action = Action::Recruit {
            location: LocationId(1),
            strength: 300,
        };
        let events = apply_action(&mut state, FactionId(1), &action).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(state.gold(FactionId(1)), 850);
        assert_eq!(state.location(LocationId(1)).unwrap().population, 49_700);
        assert_eq!(apply_action(&mut state, FactionId(1), &action), Err(ActionError::ActionLimitReached));
    }

    #[test]
    fn test_recruit_merges_into_idle_army() {
        let mut state = state();
        let army = state.spawn_army(FactionId(1), LocationId(1).into(), 500);
        apply_action(
            &mut state,
            FactionId(1),
            &Action::Recruit {
                location: LocationId(1),
                strength: 200,
            },
        )
        .unwrap();
        assert_eq!(state.armies.len(), 1);
        assert_eq!(state.army(army).unwrap().strength, 700);
    }

    #[test]
    fn test_recruit_rejects_odd_amounts() {
        let mut state = state();
        let err = apply_action(
            &mut state,
            FactionId(1),
            &Action::Recruit {
                location: LocationId(1),
                strength: 150,
            },
        );
        assert!(matches!(err, Err(ActionError::InvalidChoice(_))));
    }

    #[test]
    fn test_fortify_starts_project() {
        let mut state = state();
        apply_action(&mut state, FactionId(1), &Action::Fortify { location: LocationId(1) }).unwrap();
        let loc = state.location(LocationId(1)).unwrap();
        let project = loc.construction.as_ref().unwrap();
        assert_eq!(project.target_level, 1);
        assert_eq!(project.turns_remaining, 2);
        assert_eq!(state.gold(FactionId(1)), 800);
        assert_eq!(
            apply_action(&mut state, FactionId(1), &Action::Fortify { location: LocationId(1) }),
            Err(ActionError::ActionLimitReached)
        );
    }

    #[test]
    fn test_insufficient_gold_leaves_state() {
        let mut state = state();
        state.faction_mut(FactionId(1)).unwrap().gold = 100;
        let before = state.location(LocationId(1)).unwrap().construction.clone();
        let err = apply_action(&mut state, FactionId(1), &Action::Fortify { location: LocationId(1) });
        assert_eq!(
            err,
            Err(ActionError::InsufficientGold {
                needed: 200,
                available: 100
            })
        );
        assert_eq!(state.location(LocationId(1)).unwrap().construction, before);
        assert_eq!(state.gold(FactionId(1)), 100);
    }

    #[test]
    fn test_split_and_merge() {
        let mut state = state();
        let army = state.spawn_army(FactionId(1), LocationId(1).into(), 900);
        apply_action(&mut state, FactionId(1), &Action::SplitArmy { army, strength: 400 }).unwrap();
        assert_eq!(state.armies.len(), 2);
        let other = state.armies.iter().find(|a| a.id != army).unwrap().id;
        assert_eq!(state.army(army).unwrap().strength, 500);

        apply_action(&mut state, FactionId(1), &Action::MergeArmies { target: army, source: other }).unwrap();
        assert_eq!(state.armies.len(), 1);
        assert_eq!(state.army(army).unwrap().strength, 900);
    }

    #[test]
    fn test_send_leader_undercover() {
        let mut state = state();
        state
            .leaders
            .push(Leader::new(LeaderId(1), "Shade", FactionId(1), LocationId(1)));
        apply_action(
            &mut state,
            FactionId(1),
            &Action::SendLeader {
                leader: LeaderId(1),
                destination: LocationId(2),
                assignment: Some(LeaderAssignment::Undercover {
                    location: LocationId(2),
                }),
            },
        )
        .unwrap();
        let l = state.leader(LeaderId(1)).unwrap();
        assert_eq!(l.status, LeaderStatus::Moving);
        assert_eq!(l.turns_until_arrival, 3);

        let err = apply_action(
            &mut state,
            FactionId(1),
            &Action::SendLeader {
                leader: LeaderId(1),
                destination: LocationId(1),
                assignment: None,
            },
        );
        assert!(matches!(err, Err(ActionError::IllegalTarget(_))));
    }

    #[test]
    fn test_negotiate_needs_neutral_neighbor() {
        let mut state = state();
        apply_action(
            &mut state,
            FactionId(1),
            &Action::Negotiate {
                target: LocationId(3),
                gold: 300,
            },
        )
        .unwrap();
        assert_eq!(state.gold(FactionId(1)), 700);
        assert_eq!(state.negotiations.len(), 1);

        let err = apply_action(
            &mut state,
            FactionId(1),
            &Action::Negotiate {
                target: LocationId(2),
                gold: 300,
            },
        );
        assert!(matches!(err, Err(ActionError::IllegalTarget(_))));
    }

    #[test]
    fn test_convoy_needs_food() {
        let mut state = state();
        state.locations.push(Location::new(LocationId(4), "Depot", LocationKind::City, FactionId(1)));
        state.roads.push(Road::local(RoadId(3), LocationId(1), LocationId(4)));
        let action = Action::SendConvoy {
            from: LocationId(1),
            to: LocationId(4),
            food: 5,
            naval: false,
        };
        assert_eq!(
            apply_action(&mut state, FactionId(1), &action),
            Err(ActionError::InsufficientFood { needed: 5, available: 0 })
        );
        state.location_mut(LocationId(1)).unwrap().food_stock = 5;
        apply_action(&mut state, FactionId(1), &action).unwrap();
        assert_eq!(state.convoys[0].turns_remaining, 1);
    }

    #[test]
    fn test_resolve_pending_combat() {
        let mut state = state();
        let mine = state.spawn_army(FactionId(1), LocationId(2).into(), 2000);
        let theirs = state.spawn_army(FactionId(2), LocationId(2).into(), 300);
        state.pending_combats.push(Contact {
            id: CombatId(7),
            position: LocationId(2).into(),
            location: Some(LocationId(2)),
            attacker: FactionId(1),
            defender: FactionId(2),
            attacker_armies: vec![mine],
            defender_armies: vec![theirs],
            insurgent: false,
        });

        let outcome = process_player_action(
            &state,
            &Action::ResolveCombat {
                combat: CombatId(7),
                choice: CombatChoice::Fight,
            },
            FactionId(1),
        );
        assert!(outcome.success);
        assert!(outcome.state.pending_combats.is_empty());
        assert_eq!(outcome.state.location(LocationId(2)).unwrap().faction, FactionId(1));
        assert_eq!(
            state.pending_combats[0].side_of(FactionId(2)),
            Some(BattleSide::Defender)
        );
    }
}
