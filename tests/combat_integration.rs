//! Combat integration tests
//!
//! Contacts are detected and resolved through the public API: the player
//! path through `process_player_action` and the automatic cascade that
//! settles fights between AI factions.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use warfront::actions::{process_player_action, Action};
use warfront::combat::{detect_contacts, resolve_combat, run_cascade, side_power, CombatChoice};
use warfront::core::config::EngineConfig;
use warfront::core::types::{FactionId, LocationId, RoadId};
use warfront::world::{
    ArmyPosition, BattleSide, Controller, EventKind, Faction, GameState, Location, LocationKind, Road,
};

const PLAYER: FactionId = FactionId(1);
const RIVAL: FactionId = FactionId(2);

/// A player camp and a rival city behind walls of `level`
fn walled_front(level: u8) -> GameState {
    let mut state = GameState::new(5, EngineConfig::default());
    state
        .factions
        .push(Faction::new(PLAYER, "Player", Controller::Human).with_gold(1000));
    state
        .factions
        .push(Faction::new(RIVAL, "Rival", Controller::Ai).with_gold(1000));
    state
        .locations
        .push(Location::new(LocationId(1), "Camp", LocationKind::City, PLAYER));
    state.locations.push(
        Location::new(LocationId(2), "Bastion", LocationKind::City, RIVAL)
            .with_population(80_000)
            .with_fortification(level),
    );
    state
        .roads
        .push(Road::land(RoadId(1), LocationId(1), LocationId(2), 2));
    state
}

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

fn total_strength(state: &GameState) -> u32 {
    state.armies.iter().map(|a| a.strength).sum()
}

/// Queue the contact at the bastion as a pending human combat
fn queue_contact(state: &mut GameState) -> Action {
    let contacts = detect_contacts(state);
    assert_eq!(contacts.len(), 1);
    let contact = contacts[0].clone();
    assert_eq!(contact.attacker, PLAYER);
    assert_eq!(contact.defender, RIVAL);
    state.pending_combats.push(contact.clone());
    Action::ResolveCombat {
        combat: contact.id,
        choice: CombatChoice::Siege,
    }
}

#[test]
fn test_siege_with_exact_requirement_succeeds() {
    let mut state = walled_front(3);
    state.spawn_army(PLAYER, LocationId(2).into(), 1000);
    state.spawn_army(RIVAL, LocationId(2).into(), 3000);
    let action = queue_contact(&mut state);

    let outcome = process_player_action(&state, &action, PLAYER);
    assert!(outcome.success, "{:?}", outcome.error);

    let after = outcome.state;
    assert_eq!(after.location(LocationId(2)).unwrap().fortification, 2);
    assert_eq!(after.gold(PLAYER), 1000 - after.config.siege_cost(3));
    assert!(after.pending_combats.is_empty());
    // Besiegers stay pinned at the walls
    assert!(after
        .armies_at(LocationId(2).into())
        .iter()
        .filter(|a| a.faction == PLAYER)
        .all(|a| a.flags.sieging));
}

#[test]
fn test_siege_one_short_rejected_without_cost() {
    let mut state = walled_front(3);
    state.spawn_army(PLAYER, LocationId(2).into(), 999);
    state.spawn_army(RIVAL, LocationId(2).into(), 3000);
    let action = queue_contact(&mut state);

    let outcome = process_player_action(&state, &action, PLAYER);
    assert!(!outcome.success);
    assert!(outcome.error.is_some());
    assert_eq!(outcome.state.gold(PLAYER), 1000);
    assert_eq!(outcome.state.location(LocationId(2)).unwrap().fortification, 3);
    assert_eq!(outcome.state.pending_combats.len(), 1);
}

#[test]
fn test_lower_tier_walls_need_only_five_hundred() {
    let mut state = walled_front(2);
    state.spawn_army(PLAYER, LocationId(2).into(), 500);
    state.spawn_army(RIVAL, LocationId(2).into(), 3000);
    let action = queue_contact(&mut state);

    let outcome = process_player_action(&state, &action, PLAYER);
    assert!(outcome.success);
    assert_eq!(outcome.state.location(LocationId(2)).unwrap().fortification, 1);
}

#[test]
fn test_token_garrison_gets_no_walls() {
    let mut state = walled_front(4);
    state.spawn_army(RIVAL, LocationId(2).into(), 499);
    state.spawn_army(PLAYER, LocationId(2).into(), 1000);
    let contact = detect_contacts(&mut state).remove(0);

    let defense = side_power(&state, &contact, BattleSide::Defender);
    assert_eq!(defense.defense, 0);

    let events = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::LocationCaptured { to: PLAYER, .. })));
    let bastion = state.location(LocationId(2)).unwrap();
    assert_eq!(bastion.faction, PLAYER);
    assert_eq!(bastion.fortification, 3);
}

#[test]
fn test_threshold_garrison_holds_behind_walls() {
    let mut state = walled_front(4);
    state.spawn_army(RIVAL, LocationId(2).into(), 500);
    state.spawn_army(PLAYER, LocationId(2).into(), 1000);
    let contact = detect_contacts(&mut state).remove(0);

    resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();
    assert_eq!(state.location(LocationId(2)).unwrap().faction, RIVAL);
    assert!(state.armies.iter().all(|a| a.faction == RIVAL));
}

#[test]
fn test_pyrrhic_victory_leaves_one_survivor() {
    let mut state = walled_front(0);
    let stage = ArmyPosition::AtRoadStage {
        road: RoadId(1),
        stage: 0,
    };
    // The first army on the stage holds it and wins the tie
    let holder = state.spawn_army(PLAYER, stage, 600);
    state.spawn_army(RIVAL, stage, 600);
    let before = total_strength(&state);

    let contact = detect_contacts(&mut state).remove(0);
    assert_eq!(contact.defender, PLAYER);
    let events = resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();

    let Some(EventKind::BattleFought {
        winner,
        death_toll,
        pyrrhic,
        ..
    }) = events.iter().map(|e| e.kind.clone()).find(|k| matches!(k, EventKind::BattleFought { .. }))
    else {
        panic!("no battle recorded");
    };
    assert_eq!(winner, BattleSide::Defender);
    assert!(pyrrhic);
    assert_eq!(death_toll, 1199);
    assert_eq!(state.army(holder).unwrap().strength, 1);
    assert_eq!(before - total_strength(&state), death_toll);
}

#[test]
fn test_cascade_settles_three_way_melee() {
    let mut state = walled_front(0);
    state.factions[1].controller = Controller::Ai;
    state
        .factions
        .push(Faction::new(FactionId(3), "Third", Controller::Ai).with_gold(200));
    state.spawn_army(RIVAL, LocationId(2).into(), 800);
    state.spawn_army(PLAYER, LocationId(2).into(), 1500);
    state.spawn_army(FactionId(3), LocationId(2).into(), 400);

    let events = run_cascade(&mut state, &mut rng());
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::BattleFought { .. })));
    assert!(state.pending_combats.is_empty());
    assert!(state.armies.iter().all(|a| a.strength > 0));
    // Nothing left to fight over
    assert!(detect_contacts(&mut state).is_empty());
}

#[test]
fn test_insurgent_capture_floors_stability() {
    let mut state = walled_front(0);
    state.location_mut(LocationId(2)).unwrap().stability = 20;
    state.spawn_army(RIVAL, LocationId(2).into(), 100);
    let rebels = state.spawn_army(FactionId::NEUTRAL, LocationId(2).into(), 1000);
    state.army_mut(rebels).unwrap().flags.insurgent = true;

    let contact = detect_contacts(&mut state).remove(0);
    assert!(contact.insurgent);
    assert_eq!(contact.attacker, FactionId::NEUTRAL);
    resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();

    let town = state.location(LocationId(2)).unwrap();
    assert_eq!(town.faction, FactionId::NEUTRAL);
    assert_eq!(town.stability, state.config.insurgent_stability_floor);
}

#[test]
fn test_victorious_marching_defender_presses_on() {
    let mut state = walled_front(0);
    state.roads[0] = Road::land(RoadId(1), LocationId(1), LocationId(2), 3);
    let column = state.spawn_army(RIVAL, stage_of(1), 800);
    state.army_mut(column).unwrap().order_move_to(LocationId(2));
    state.spawn_army(PLAYER, stage_of(1), 300);

    let contact = detect_contacts(&mut state).remove(0);
    assert_eq!(contact.defender, RIVAL);
    resolve_combat(&mut state, &contact, BattleSide::Attacker, CombatChoice::Fight, &mut rng()).unwrap();

    let survivor = state.army(column).unwrap();
    assert_eq!(survivor.strength, 500);
    assert_eq!(survivor.position, stage_of(2));
    assert!(state.armies.iter().all(|a| a.faction == RIVAL));
}

fn stage_of(index: usize) -> ArmyPosition {
    ArmyPosition::AtRoadStage {
        road: RoadId(1),
        stage: index,
    }
}
