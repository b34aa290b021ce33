//! Storage layer for tk
//!
//! All state lives in one data directory:
//!
//! ```text
//! <data-dir>/
//!   tk.toml          # Configuration
//!   tasks.json       # Saved task data {schema_version, tasks, next_id}
//!   session.json     # Undo/redo session carried across invocations
//!   tk.lock          # Held by the running command
//! ```
//!
//! The directory comes from `--data-dir` / `TK_DATA_DIR`, then the platform
//! data directory, then `./.tk`.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::CONFIG_FILE;
use crate::error::{Error, Result};
use crate::history::HistorySession;
use crate::lock::{self, FileLock};
use crate::task::Task;

/// Fallback data directory when no platform directory is available
pub const LOCAL_DIR: &str = ".tk";

const TASKS_FILE: &str = "tasks.json";
const SESSION_FILE: &str = "session.json";
const LOCK_FILE: &str = "tk.lock";
const TASKS_SCHEMA_VERSION: &str = "tk.tasks.v1";

fn default_tasks_schema() -> String {
    TASKS_SCHEMA_VERSION.to_string()
}

/// Task data as written to `tasks.json`.
///
/// `next_id` is optional so hand-written or older files still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredState {
    #[serde(default = "default_tasks_schema")]
    pub schema_version: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u64>,
}

impl StoredState {
    pub fn new(tasks: Vec<Task>, next_id: u64) -> Self {
        Self {
            schema_version: default_tasks_schema(),
            tasks,
            next_id: Some(next_id),
        }
    }
}

/// Storage manager for one tk data directory
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Resolve the data directory from an explicit path or platform defaults.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        if let Some(dir) = explicit {
            return Self::new(dir);
        }
        match ProjectDirs::from("", "", "tk") {
            Some(dirs) => Self::new(dirs.data_dir().to_path_buf()),
            None => Self::new(PathBuf::from(LOCAL_DIR)),
        }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    pub fn session_file(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    // =========================================================================
    // Setup
    // =========================================================================

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Take the data directory lock for the duration of a command.
    pub fn lock(&self, timeout_ms: u64) -> Result<FileLock> {
        self.init()?;
        FileLock::acquire(self.lock_file(), timeout_ms)
    }

    // =========================================================================
    // Task data
    // =========================================================================

    /// Read saved task data. `Ok(None)` when nothing has been saved yet.
    pub fn load_tasks(&self) -> Result<Option<StoredState>> {
        let path = self.tasks_file();
        if !path.exists() {
            return Ok(None);
        }
        let state: StoredState = self.read_json(&path)?;
        if state.schema_version != TASKS_SCHEMA_VERSION {
            return Err(Error::StorageFailed(format!(
                "unsupported task data schema '{}' in {}",
                state.schema_version,
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), tasks = state.tasks.len(), "loaded task data");
        Ok(Some(state))
    }

    pub fn save_tasks(&self, state: &StoredState) -> Result<()> {
        let path = self.tasks_file();
        self.write_json(&path, state)?;
        tracing::debug!(path = %path.display(), tasks = state.tasks.len(), "saved task data");
        Ok(())
    }

    /// Remove saved task data. Returns whether a file was removed.
    pub fn clear_tasks(&self) -> Result<bool> {
        remove_if_exists(&self.tasks_file())
    }

    // =========================================================================
    // Undo/redo session
    // =========================================================================

    pub fn load_session(&self) -> Result<Option<HistorySession>> {
        let path = self.session_file();
        if !path.exists() {
            return Ok(None);
        }
        let session: HistorySession = self.read_json(&path)?;
        tracing::debug!(
            path = %path.display(),
            snapshots = session.snapshots.len(),
            current = session.current_index,
            "loaded history session"
        );
        Ok(Some(session))
    }

    pub fn save_session(&self, session: &HistorySession) -> Result<()> {
        self.write_json(&self.session_file(), session)
    }

    pub fn clear_session(&self) -> Result<bool> {
        remove_if_exists(&self.session_file())
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic_str(path, &json)
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(Error::Io(err)),
    }
}
