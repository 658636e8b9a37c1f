//! Turn narrative collaborator
//!
//! The engine hands each finished turn's events to a [`Narrator`] and waits
//! a bounded time for prose back. Narrators may fail; the orchestrator
//! substitutes [`FALLBACK_NARRATIVE`].

pub mod llm;
pub mod prompt;

use std::future::Future;

use crate::core::error::Result;
use crate::core::types::{FactionId, Turn};

pub use llm::{ApiFormat, LlmNarrator};
pub use prompt::{build_prompt, describe_event, describe_events, faction_name, SYSTEM_PROMPT};

/// Text used when no narrative could be produced
pub const FALLBACK_NARRATIVE: &str = "The chroniclers record nothing of note this season.";

/// What a narrator is asked to write about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeRequest {
    pub turn: Turn,
    /// Faction whose point of view the text should take, if any
    pub faction: Option<FactionId>,
    pub faction_name: Option<String>,
    /// The turn's events, one plain sentence each
    pub lines: Vec<String>,
}

pub trait Narrator {
    fn generate(&self, request: &NarrativeRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Offline narrator: lists the turn's first few events
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticNarrator;

/// Events quoted by the static narrator
const STATIC_LINES: usize = 5;

impl Narrator for StaticNarrator {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        if request.lines.is_empty() {
            return Ok(format!("Turn {}: {}", request.turn, FALLBACK_NARRATIVE));
        }
        let mut text = format!("Turn {}.", request.turn);
        for line in request.lines.iter().take(STATIC_LINES) {
            text.push(' ');
            text.push_str(line);
        }
        if request.lines.len() > STATIC_LINES {
            text.push_str(&format!(" And {} more.", request.lines.len() - STATIC_LINES));
        }
        Ok(text)
    }
}
