//! Session lifecycle and transcript tracking.
//!
//! A [`Session`] exists per downstream connection and walks a one-way state
//! machine: `Connecting → Active → {ClosingDownstream | ClosingUpstream} →
//! Closed`. There is no transition back to `Active`.
//!
//! The [`Transcript`] is append-only and single-writer: only the
//! upstream→downstream forwarding loop mutates it. Sidecar tasks receive a
//! [`Transcript::snapshot`] taken at trigger time, so concurrent analysis
//! never observes later growth.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Speaker of a captured turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One captured utterance with its transcribed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// Append-only ordered sequence of turns for one session.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn in receipt order.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Copy of the transcript as of now, safe to hand to a concurrent task.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Downstream accepted, upstream connection being established
    Connecting,
    /// Both legs connected, forwarding loops running
    Active,
    /// Downstream leg ended first; tearing down
    ClosingDownstream,
    /// Upstream leg ended first; tearing down
    ClosingUpstream,
    /// Session fully torn down
    Closed,
}

impl SessionState {
    /// Ordering rank; transitions must be strictly increasing, with the two
    /// closing states sharing a rank (exactly one is ever entered).
    fn rank(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Active => 1,
            Self::ClosingDownstream | Self::ClosingUpstream => 2,
            Self::Closed => 3,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::ClosingDownstream => "closing_downstream",
            Self::ClosingUpstream => "closing_upstream",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// One end-to-end relay instance.
///
/// Sidecar tasks are keyed to a session only by holding its downstream
/// sender; they are not part of this state machine and are never awaited
/// before `Closed` is reached.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(SessionState::Connecting),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Advance the lifecycle state. Backward transitions are ignored (the
    /// state machine is one-way), which makes teardown paths idempotent.
    pub fn advance(&self, next: SessionState) {
        let mut state = self.state.lock();
        if next.rank() > state.rank() {
            tracing::debug!(session_id = %self.id, from = %*state, to = %next, "session state transition");
            *state = next;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
