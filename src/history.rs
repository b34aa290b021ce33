//! Bounded, linear undo/redo history over task store snapshots.
//!
//! The log is a window of at most `max_states` snapshots with a pointer to
//! the one that matches the live store:
//!
//! ```text
//! [S0 baseline] [S1] [S2] [S3]      current = 2
//!                      ^            undo -> S1, redo -> S3
//! ```
//!
//! Recording while the pointer is not at the tail drops everything after
//! it first, so history never branches. When the window is full the oldest
//! snapshot is evicted and the pointer shifts with it. Undo and redo only
//! move the pointer and install the snapshot it lands on.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{min_next_id, Task, TaskStore};

pub const DEFAULT_MAX_HISTORY_STATES: usize = 20;

const SESSION_SCHEMA_VERSION: &str = "tk.session.v1";

/// Immutable copy of the store state at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub tasks: Vec<Task>,
    pub next_id: u64,
    pub timestamp: DateTime<Utc>,
}

impl HistorySnapshot {
    /// Compare task data, ignoring when the snapshot was taken.
    pub fn same_state(&self, other: &HistorySnapshot) -> bool {
        self.next_id == other.next_id && self.tasks == other.tasks
    }
}

/// Serialized form of a history log, used to carry undo/redo across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySession {
    pub schema_version: String,
    pub current_index: usize,
    pub snapshots: Vec<HistorySnapshot>,
}

/// One row of `tk history`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub tasks: usize,
    pub completed: usize,
    pub next_id: u64,
    pub current: bool,
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: VecDeque<HistorySnapshot>,
    current_index: Option<usize>,
    max_states: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY_STATES)
    }
}

impl HistoryManager {
    /// Create an empty log. `max_states` is clamped to at least 1.
    pub fn new(max_states: usize) -> Self {
        let max_states = max_states.max(1);
        Self {
            snapshots: VecDeque::with_capacity(max_states),
            current_index: None,
            max_states,
        }
    }

    pub fn max_states(&self) -> usize {
        self.max_states
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Pointer into the log; `None` only while the log is empty.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.current_index.and_then(|index| self.snapshots.get(index))
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.snapshots.iter()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.current_index, Some(index) if index > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.current_index, Some(index) if index + 1 < self.snapshots.len())
    }

    /// Append the store's current state, dropping any redo branch.
    pub fn record_state(&mut self, store: &TaskStore) {
        let snapshot = store.snapshot_state();

        if let Some(index) = self.current_index {
            let discarded = self.snapshots.len() - (index + 1);
            if discarded > 0 {
                tracing::debug!(discarded, "dropping redo branch");
            }
            self.snapshots.truncate(index + 1);
        } else {
            self.snapshots.clear();
        }

        self.snapshots.push_back(snapshot);
        let mut index = self.snapshots.len() - 1;

        if self.snapshots.len() > self.max_states {
            self.snapshots.pop_front();
            index -= 1;
            tracing::debug!(max_states = self.max_states, "evicted oldest snapshot");
        }

        self.current_index = Some(index);
        tracing::debug!(index, len = self.snapshots.len(), "recorded snapshot");
    }

    pub fn undo(&mut self, store: &mut TaskStore) -> Result<()> {
        let index = match self.current_index {
            Some(index) if index > 0 => index - 1,
            _ => return Err(Error::NoPriorState),
        };
        self.move_to(index, store);
        Ok(())
    }

    pub fn redo(&mut self, store: &mut TaskStore) -> Result<()> {
        let index = match self.current_index {
            Some(index) if index + 1 < self.snapshots.len() => index + 1,
            _ => return Err(Error::NoFutureState),
        };
        self.move_to(index, store);
        Ok(())
    }

    /// Discard the whole log and record `store` as the new baseline.
    pub fn reset(&mut self, store: &TaskStore) {
        self.snapshots.clear();
        self.current_index = None;
        self.record_state(store);
    }

    /// Install the snapshot under the pointer into `store`.
    pub fn restore_current(&self, store: &mut TaskStore) -> Result<()> {
        let snapshot = self
            .current()
            .ok_or_else(|| Error::StorageFailed("history session is empty".to_string()))?;
        store.restore_state(snapshot);
        Ok(())
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.snapshots
            .iter()
            .enumerate()
            .map(|(index, snapshot)| HistoryEntry {
                index,
                timestamp: snapshot.timestamp,
                tasks: snapshot.tasks.len(),
                completed: snapshot.tasks.iter().filter(|task| task.completed).count(),
                next_id: snapshot.next_id,
                current: self.current_index == Some(index),
            })
            .collect()
    }

    pub fn to_session(&self) -> HistorySession {
        HistorySession {
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            current_index: self.current_index.unwrap_or(0),
            snapshots: self.snapshots.iter().cloned().collect(),
        }
    }

    /// Rebuild a log from a saved session.
    ///
    /// A session longer than `max_states` is cut down to a window that still
    /// contains the current snapshot, preferring to keep the newest entries.
    pub fn from_session(session: HistorySession, max_states: usize) -> Result<Self> {
        if session.schema_version != SESSION_SCHEMA_VERSION {
            return Err(Error::StorageFailed(format!(
                "unsupported session schema '{}'",
                session.schema_version
            )));
        }
        if session.snapshots.is_empty() {
            return Err(Error::StorageFailed("history session is empty".to_string()));
        }
        if session.current_index >= session.snapshots.len() {
            return Err(Error::StorageFailed(format!(
                "history pointer {} is out of range for {} snapshots",
                session.current_index,
                session.snapshots.len()
            )));
        }

        for (index, snapshot) in session.snapshots.iter().enumerate() {
            let min_next_id = min_next_id(&snapshot.tasks).map_err(|err| match err {
                Error::StorageFailed(message) => {
                    Error::StorageFailed(format!("history snapshot {index}: {message}"))
                }
                other => other,
            })?;
            if snapshot.next_id < min_next_id {
                return Err(Error::StorageFailed(format!(
                    "history snapshot {index}: next id {} would reuse an existing task id",
                    snapshot.next_id
                )));
            }
        }

        let mut history = Self::new(max_states);
        let len = session.snapshots.len();
        let start = len
            .saturating_sub(history.max_states)
            .min(session.current_index);
        let end = (start + history.max_states).min(len);

        history.snapshots = session
            .snapshots
            .into_iter()
            .skip(start)
            .take(end - start)
            .collect();
        history.current_index = Some(session.current_index - start);
        Ok(history)
    }

    fn move_to(&mut self, index: usize, store: &mut TaskStore) {
        self.current_index = Some(index);
        store.restore_state(&self.snapshots[index]);
        tracing::debug!(index, len = self.snapshots.len(), "moved history pointer");
    }
}
