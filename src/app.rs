//! Command surface composing the task store, history, and storage.
//!
//! Every state-changing command follows the same path: validate and apply
//! through `TaskStore`, record one snapshot, then write the session and
//! (when autosave is on) the task data. Commands that fail, or that leave
//! the state as it was, record nothing. Storage failures after a successful
//! change are reported as warnings; the in-memory state stays authoritative.

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::{HistoryEntry, HistoryManager};
use crate::storage::Storage;
use crate::task::{Task, TaskFields, TaskStore};

/// Current state handed to the presentation layer after each command.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StateView {
    pub tasks: Vec<Task>,
    pub next_id: u64,
    pub pending: usize,
    pub completed: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Result of a command plus the fresh state to render.
#[derive(Debug, Clone)]
pub struct CommandOutcome<T> {
    pub value: T,
    pub changed: bool,
    pub state: StateView,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub max_states: usize,
    pub current_index: Option<usize>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug)]
pub struct TodoApp {
    store: TaskStore,
    history: HistoryManager,
    storage: Option<Storage>,
    config: Config,
    warnings: Vec<String>,
}

impl TodoApp {
    /// An app with no storage behind it, baselined on an empty store.
    pub fn in_memory(config: Config) -> Self {
        let store = TaskStore::new(config.tasks.clone());
        let mut history = HistoryManager::new(config.history.max_states);
        history.reset(&store);
        Self {
            store,
            history,
            storage: None,
            config,
            warnings: Vec::new(),
        }
    }

    /// Open the app on a data directory.
    ///
    /// A saved session is resumed when history persistence is on and the
    /// session is valid; otherwise the store is loaded from saved task data
    /// and baselined. Corrupt files are reported as warnings, never errors.
    pub fn open(storage: Storage, config: Config) -> Self {
        let mut app = Self::in_memory(config);
        if app.config.history.persist && app.resume_session(&storage) {
            app.storage = Some(storage);
            return app;
        }

        let loaded = storage.load_tasks().and_then(|stored| match stored {
            Some(stored) => app.store.load_state(stored),
            None => Ok(()),
        });
        if let Err(err) = loaded {
            tracing::warn!(error = %err, "saved task data unreadable; starting empty");
            app.warnings
                .push(format!("saved task data could not be read ({err}); starting empty"));
        }
        app.history.reset(&app.store);
        app.storage = Some(storage);
        app
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    pub fn state(&self) -> StateView {
        StateView {
            tasks: self.store.tasks().to_vec(),
            next_id: self.store.next_id(),
            pending: self.store.pending().count(),
            completed: self.store.completed().count(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    pub fn history_view(&self) -> HistoryView {
        HistoryView {
            max_states: self.history.max_states(),
            current_index: self.history.current_index(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            entries: self.history.entries(),
        }
    }

    /// Queue a warning for the next command outcome.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Read-only outcome, carrying any warnings raised while opening.
    pub fn view(&mut self) -> CommandOutcome<()> {
        self.outcome((), false)
    }

    pub fn get_task(&self, id: u64) -> Result<Task> {
        self.store.get(id).cloned().ok_or(Error::TaskNotFound(id))
    }

    pub fn add_task(&mut self, fields: &TaskFields) -> Result<CommandOutcome<Task>> {
        let task = self.store.add(fields)?;
        tracing::debug!(id = task.id, "task added");
        Ok(self.commit(task, true))
    }

    pub fn complete_task(&mut self, id: u64) -> Result<CommandOutcome<Task>> {
        let changed = self.store.complete(id)?;
        let task = self.get_task(id)?;
        Ok(self.commit(task, changed))
    }

    pub fn edit_task(&mut self, id: u64, fields: &TaskFields) -> Result<CommandOutcome<Task>> {
        let changed = self.store.edit(id, fields)?;
        let task = self.get_task(id)?;
        Ok(self.commit(task, changed))
    }

    pub fn delete_task(&mut self, id: u64) -> Result<CommandOutcome<Task>> {
        let task = self.store.delete(id)?;
        Ok(self.commit(task, true))
    }

    /// Remove all completed tasks; the value is how many were removed.
    pub fn delete_completed_tasks(&mut self) -> Result<CommandOutcome<usize>> {
        let removed = self.store.delete_completed();
        Ok(self.commit(removed, removed > 0))
    }

    pub fn undo(&mut self) -> Result<CommandOutcome<()>> {
        self.history.undo(&mut self.store)?;
        let mut warnings = self.persist_session();
        warnings.extend(self.autosave());
        Ok(self.finish((), true, warnings))
    }

    pub fn redo(&mut self) -> Result<CommandOutcome<()>> {
        self.history.redo(&mut self.store)?;
        let mut warnings = self.persist_session();
        warnings.extend(self.autosave());
        Ok(self.finish((), true, warnings))
    }

    /// Wipe saved data, reset the store, and start a fresh history.
    pub fn clear_all(&mut self) -> Result<CommandOutcome<()>> {
        let mut warnings = Vec::new();
        if let Some(storage) = &self.storage {
            if let Err(err) = storage.clear_tasks() {
                tracing::warn!(error = %err, "failed to remove saved task data");
                warnings.push(format!("saved task data could not be removed: {err}"));
            }
        }
        self.store.reset();
        self.history.reset(&self.store);
        warnings.extend(self.persist_session());
        Ok(self.finish((), true, warnings))
    }

    /// Explicitly write the current tasks to storage.
    pub fn save(&mut self) -> Result<CommandOutcome<()>> {
        let storage = self.require_storage()?;
        storage.save_tasks(&self.store.to_stored())?;
        Ok(self.outcome((), false))
    }

    /// Replace the live tasks with the saved data, as an undoable action.
    ///
    /// The value is `false` when there was no saved data to load.
    pub fn load(&mut self) -> Result<CommandOutcome<bool>> {
        let storage = self.require_storage()?;
        let Some(stored) = storage.load_tasks()? else {
            let mut outcome = self.outcome(false, false);
            outcome.warnings.push("no saved task data found".to_string());
            return Ok(outcome);
        };

        let before = self.store.snapshot_state();
        self.store.load_state(stored)?;
        let changed = !self.store.snapshot_state().same_state(&before);
        if changed {
            self.history.record_state(&self.store);
        }
        let warnings = if changed {
            self.persist_session()
        } else {
            Vec::new()
        };
        Ok(self.finish(true, changed, warnings))
    }

    fn resume_session(&mut self, storage: &Storage) -> bool {
        let session = match storage.load_session() {
            Ok(Some(session)) => session,
            Ok(None) => return false,
            Err(err) => {
                self.discard_session(storage, &err);
                return false;
            }
        };

        let history = HistoryManager::from_session(session, self.config.history.max_states)
            .and_then(|history| {
                history.restore_current(&mut self.store)?;
                Ok(history)
            });
        match history {
            Ok(history) => {
                self.history = history;
                true
            }
            Err(err) => {
                self.discard_session(storage, &err);
                false
            }
        }
    }

    fn discard_session(&mut self, storage: &Storage, err: &Error) {
        tracing::warn!(error = %err, "discarding unreadable history session");
        self.warnings.push(format!(
            "undo history could not be restored ({err}); starting a new one"
        ));
        if let Err(err) = storage.clear_session() {
            tracing::warn!(error = %err, "failed to remove history session");
        }
    }

    fn require_storage(&self) -> Result<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| Error::StorageFailed("no storage configured".to_string()))
    }

    fn commit<T>(&mut self, value: T, changed: bool) -> CommandOutcome<T> {
        if !changed {
            return self.outcome(value, false);
        }
        self.history.record_state(&self.store);
        let mut warnings = self.persist_session();
        warnings.extend(self.autosave());
        self.finish(value, true, warnings)
    }

    fn persist_session(&self) -> Vec<String> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };
        if !self.config.history.persist {
            return Vec::new();
        }
        match storage.save_session(&self.history.to_session()) {
            Ok(()) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to write history session");
                vec![format!("undo history could not be saved: {err}")]
            }
        }
    }

    fn autosave(&self) -> Vec<String> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };
        if !self.config.storage.autosave {
            return Vec::new();
        }
        match storage.save_tasks(&self.store.to_stored()) {
            Ok(()) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "autosave failed");
                vec![format!("tasks could not be saved: {err}; changes kept in memory")]
            }
        }
    }

    fn outcome<T>(&mut self, value: T, changed: bool) -> CommandOutcome<T> {
        self.finish(value, changed, Vec::new())
    }

    fn finish<T>(&mut self, value: T, changed: bool, warnings: Vec<String>) -> CommandOutcome<T> {
        let mut all = std::mem::take(&mut self.warnings);
        all.extend(warnings);
        CommandOutcome {
            value,
            changed,
            state: self.state(),
            warnings: all,
        }
    }
}
