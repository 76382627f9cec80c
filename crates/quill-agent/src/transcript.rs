//! Append-only turn log plus the busy flag that gates submission

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the transcript. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    id: Uuid,
    role: Role,
    content: String,
    timestamp: i64,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            // v7 ids sort in generation order
            id: Uuid::now_v7(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Creation time in Unix milliseconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Ordered turn log shared between the orchestrator and readers.
///
/// Only the orchestrator appends or toggles the busy flag; everyone else
/// reads through [`snapshot`](Self::snapshot) and [`is_busy`](Self::is_busy).
#[derive(Debug, Default)]
pub struct TranscriptStore {
    turns: RwLock<Vec<Turn>>,
    busy: AtomicBool,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a turn at the end
    pub fn append(&self, turn: Turn) {
        self.turns.write().push(turn);
    }

    /// Current ordered sequence of turns
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.read().clone()
    }

    pub fn len(&self) -> usize {
        self.turns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().is_empty()
    }

    /// Most recent turn, if any
    pub fn last(&self) -> Option<Turn> {
        self.turns.read().last().cloned()
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Atomically flip the busy flag from false to true.
    ///
    /// Returns `false` if a request was already in flight.
    pub fn try_begin(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
