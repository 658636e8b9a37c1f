//! Turn orchestrator
//!
//! One turn runs fixed phases, each exactly once:
//! 1. per-turn flags reset, then every AI faction plans and acts in id order
//! 2. turn counter advances, action counters and siege flags reset
//! 3. movement and collision
//! 4. uprisings, construction, uncontested captures
//! 5. logistics
//! 6. the automatic combat cascade
//! 7. victory check, then narrative text
//!
//! Phases 1-7 minus narrative are synchronous and pure over a cloned
//! state. The narrative call is the only await point and is bounded by a
//! timeout.

pub mod construction;
pub mod uprisings;

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::actions::apply_action;
use crate::ai::{plan_faction, FactionAiState};
use crate::combat::{resolve_stale_pending, run_cascade};
use crate::core::types::FactionId;
use crate::economy::run_logistics;
use crate::movement::resolve_movement;
use crate::narrative::{describe_events, faction_name, NarrativeRequest, Narrator, FALLBACK_NARRATIVE};
use crate::world::{EventKind, GameState, LogEntry};

pub use construction::{advance_construction, capture_uncontested};
pub use uprisings::{launch_insurrections, spontaneous_uprisings};

/// Deterministic random source for one turn of one game
///
/// `salt` separates independent consumers within the same turn.
pub fn turn_rng(state: &GameState, salt: u64) -> ChaCha8Rng {
    let turn = u64::from(state.turn).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ChaCha8Rng::seed_from_u64(state.seed ^ turn ^ salt.rotate_left(32))
}

/// Run phases 1-6 and the victory check on `state`
///
/// Returns every event the turn produced, in phase order, all stamped with
/// the new turn number. The state's own log is left to the caller.
pub fn advance_world(state: &mut GameState, rng: &mut ChaCha8Rng) -> Vec<LogEntry> {
    let mut events = Vec::new();

    // Phase 1: planning
    for army in state.armies.iter_mut() {
        army.flags.just_moved = false;
    }
    events.extend(resolve_stale_pending(state, rng));
    state.remove_dead_armies();
    events.extend(run_ai_factions(state, rng));
    tracing::debug!(turn = state.turn, "planning done");

    // Phase 2: new turn; planning belongs to the turn it shapes
    state.turn += 1;
    for entry in events.iter_mut() {
        entry.turn = state.turn;
    }
    for location in state.locations.iter_mut() {
        location.counters = Default::default();
    }
    for army in state.armies.iter_mut() {
        army.flags.spent = false;
        army.flags.sieging = false;
    }

    // Phase 3
    events.extend(resolve_movement(state));
    tracing::debug!(turn = state.turn, "movement done");

    // Phase 4
    events.extend(launch_insurrections(state));
    events.extend(spontaneous_uprisings(state, rng));
    events.extend(advance_construction(state));
    events.extend(capture_uncontested(state));
    tracing::debug!(turn = state.turn, "uprisings and construction done");

    // Phase 5
    events.extend(run_logistics(state));
    tracing::debug!(turn = state.turn, "logistics done");

    // Phase 6
    events.extend(run_cascade(state, rng));
    state.remove_dead_armies();
    tracing::debug!(turn = state.turn, pending = state.pending_combats.len(), "cascade done");

    // Phase 7
    events.extend(check_victory(state));
    events
}

fn run_ai_factions(state: &mut GameState, rng: &mut ChaCha8Rng) -> Vec<LogEntry> {
    let mut planners: Vec<FactionId> = state
        .factions
        .iter()
        .filter(|f| f.is_ai())
        .map(|f| f.id)
        .collect();
    planners.sort();

    let mut events = Vec::new();
    for faction in planners {
        let prior = state
            .ai_state(faction)
            .cloned()
            .unwrap_or_else(|| FactionAiState::new(faction));
        let (record, actions) = plan_faction(state, prior, faction, rng);
        let mut applied = 0usize;
        for action in &actions {
            match apply_action(state, faction, action) {
                Ok(batch) => {
                    applied += 1;
                    events.extend(batch);
                }
                Err(err) => tracing::debug!(faction = %faction, ?action, %err, "ai action skipped"),
            }
        }
        tracing::debug!(faction = %faction, planned = actions.len(), applied, "faction acted");
        state.set_ai_state(record);
    }
    events
}

/// Declare a winner once one faction holds every location
///
/// Does nothing if a winner is already recorded.
pub fn check_victory(state: &mut GameState) -> Option<LogEntry> {
    if state.victory.is_some() {
        return None;
    }
    let owner = state.locations.first()?.faction;
    if owner.is_neutral() || state.locations.iter().any(|l| l.faction != owner) {
        return None;
    }
    state.victory = Some(owner);
    tracing::info!(turn = state.turn, faction = %owner, "victory");
    Some(LogEntry::new(state.turn, EventKind::Victory { faction: owner }).for_faction(owner))
}

/// Advance a turn without narrative
///
/// The synchronous core of [`TurnEngine::process_turn`]. A finished game
/// comes back unchanged.
pub fn simulate_turn(state: &GameState) -> (GameState, Vec<LogEntry>) {
    let mut next = state.clone();
    if next.victory.is_some() {
        return (next, Vec::new());
    }
    let mut rng = turn_rng(&next, 0);
    let events = advance_world(&mut next, &mut rng);
    next.log.extend(events.iter().cloned());
    (next, events)
}

/// Everything a processed turn hands back
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub state: GameState,
    pub events: Vec<LogEntry>,
    pub narrative: String,
}

/// Drives turns and consults a narrator for each
pub struct TurnEngine<N: Narrator> {
    narrator: N,
}

impl<N: Narrator> TurnEngine<N> {
    pub fn new(narrator: N) -> Self {
        Self { narrator }
    }

    /// Process one full turn
    ///
    /// Never fails: a slow or broken narrator only costs the turn its
    /// prose.
    pub async fn process_turn(&self, state: &GameState) -> TurnReport {
        let (next, events) = simulate_turn(state);
        if state.victory.is_some() {
            return TurnReport {
                state: next,
                events,
                narrative: String::new(),
            };
        }
        let narrative = self.narrate(&next, &events).await;
        TurnReport {
            state: next,
            events,
            narrative,
        }
    }

    async fn narrate(&self, state: &GameState, events: &[LogEntry]) -> String {
        let faction = state.factions.iter().find(|f| f.is_human()).map(|f| f.id);
        let request = NarrativeRequest {
            turn: state.turn,
            faction,
            faction_name: faction.map(|f| faction_name(state, f)),
            lines: describe_events(state, events),
        };
        let limit = Duration::from_millis(state.config.narrative_timeout_ms);
        match tokio::time::timeout(limit, self.narrator.generate(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                tracing::warn!(turn = state.turn, %err, "narrative failed; using fallback");
                FALLBACK_NARRATIVE.to_string()
            }
            Err(_) => {
                tracing::warn!(turn = state.turn, timeout_ms = state.config.narrative_timeout_ms, "narrative timed out; using fallback");
                FALLBACK_NARRATIVE.to_string()
            }
        }
    }
}
