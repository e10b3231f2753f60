use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// What the voice assistant is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
    Error,
}

impl AssistantMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssistantMode::Idle => "idle",
            AssistantMode::Listening => "listening",
            AssistantMode::Thinking => "thinking",
            AssistantMode::Speaking => "speaking",
            AssistantMode::Error => "error",
        }
    }

    /// A request is outstanding in these modes.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, AssistantMode::Thinking | AssistantMode::Speaking)
    }
}

impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation with the coach or the tutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Rolling window of the most recent turns sent back as coach context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationHistory {
    pub const DEFAULT_CAPACITY: usize = 10;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Append a completed user/assistant exchange.
    pub fn record_exchange(&mut self, user: impl Into<String>, reply: impl Into<String>) {
        self.push(ConversationTurn::user(user));
        self.push(ConversationTurn::assistant(reply));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_keeps_last_ten_entries() {
        let mut history = ConversationHistory::new();
        for i in 0..7 {
            history.record_exchange(format!("q{i}"), format!("a{i}"));
        }

        assert_eq!(history.len(), 10);
        let first = history.iter().next().unwrap();
        assert_eq!(first, &ConversationTurn::user("q2"));
        let last = history.iter().last().unwrap();
        assert_eq!(last, &ConversationTurn::assistant("a6"));
    }

    #[test]
    fn turns_serialize_with_lowercase_roles() {
        let json = serde_json::to_string(&ConversationTurn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn busy_modes() {
        assert!(AssistantMode::Thinking.is_busy());
        assert!(AssistantMode::Speaking.is_busy());
        assert!(!AssistantMode::Listening.is_busy());
    }
}
