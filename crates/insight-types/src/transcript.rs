//! Append-only interview transcript.

use serde::{Deserialize, Serialize};

use crate::{Speaker, Turn};

/// Ordered history of turns for one interview.
///
/// There is no way to remove or reorder turns: insertion order is both the
/// LLM context order and the order of the exported report body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a transcript from persisted turns, preserving their order.
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns spoken by the interview subject.
    pub fn user_turn_count(&self) -> u32 {
        self.turns
            .iter()
            .filter(|turn| turn.speaker == Speaker::User)
            .count() as u32
    }

    /// Renders the transcript as `User: …` / `Agent: …` lines, one per turn,
    /// in chronological order. Each line ends with a newline.
    pub fn render_context(&self) -> String {
        let mut context = String::new();
        for turn in &self.turns {
            context.push_str(turn.speaker.context_prefix());
            context.push_str(": ");
            context.push_str(&turn.text);
            context.push('\n');
        }
        context
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
