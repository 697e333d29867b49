//! Ordered conversation history shared with the chat-completion service.

use serde::Serialize;

/// Speaker of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Append-only transcript, alternating user/assistant and starting with user.
///
/// Mutation goes through [`ChatSession`](crate::io::chat::ChatSession), which
/// maintains the alternation across failed exchanges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn expected_role(&self) -> Role {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => Role::Assistant,
            _ => Role::User,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        debug_assert_eq!(self.expected_role(), Role::User);
        self.turns.push(Turn {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        debug_assert_eq!(self.expected_role(), Role::Assistant);
        self.turns.push(Turn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// Drop the most recent turn. Used to roll back a failed exchange.
    pub fn pop(&mut self) -> Option<Turn> {
        self.turns.pop()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
