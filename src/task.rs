//! Task records and the live task store.
//!
//! `TaskStore` owns the ordered task list and the id counter. Ids are handed
//! out from `next_id`, which always stays above every id in the list, so
//! deleting a task never frees its id for reuse. History snapshots are produced and installed here, but only
//! `HistoryManager` decides when a snapshot is installed.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::history::HistorySnapshot;
use crate::storage::StoredState;

/// Date format accepted on input and used in storage (`2024-01-31`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(from = "String", into = "&'static str")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    Unset,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Unset => "unset",
        }
    }

    /// Display label for listings.
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Unset => "Unset",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            "unset" | "" => Ok(Priority::Unset),
            other => Err(Error::Validation(format!(
                "invalid priority '{other}': must be high, medium, low, or unset"
            ))),
        }
    }
}

// Stored data may carry priorities written by older tools; anything
// unrecognized loads as unset instead of failing the whole file.
impl From<String> for Priority {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<Priority> for &'static str {
    fn from(value: Priority) -> Self {
        value.as_str()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub responsible: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub observations: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Editable task fields as entered by the user.
///
/// Dates are optional here so a missing value is reported by validation
/// rather than by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub responsible: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: Priority,
    pub description: String,
    pub observations: String,
}

impl From<&Task> for TaskFields {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            responsible: task.responsible.clone(),
            start_date: Some(task.start_date),
            end_date: Some(task.end_date),
            priority: task.priority,
            description: task.description.clone(),
            observations: task.observations.clone(),
        }
    }
}

/// Fields that passed validation; applying them cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ValidFields {
    title: String,
    responsible: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    priority: Priority,
    description: String,
    observations: String,
}

impl ValidFields {
    fn matches(&self, task: &Task) -> bool {
        self.title == task.title
            && self.responsible == task.responsible
            && self.start_date == task.start_date
            && self.end_date == task.end_date
            && self.priority == task.priority
            && self.description == task.description
            && self.observations == task.observations
    }

    fn apply(self, task: &mut Task) {
        task.title = self.title;
        task.responsible = self.responsible;
        task.start_date = self.start_date;
        task.end_date = self.end_date;
        task.priority = self.priority;
        task.description = self.description;
        task.observations = self.observations;
    }
}

pub fn parse_date(label: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| {
        Error::Validation(format!(
            "invalid {label} '{}': {err} (expected YYYY-MM-DD)",
            value.trim()
        ))
    })
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
    config: TasksConfig,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(TasksConfig::default())
    }
}

impl TaskStore {
    pub fn new(config: TasksConfig) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| !task.completed)
    }

    pub fn completed(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| task.completed)
    }

    /// Validate `fields` and append a new pending task.
    pub fn add(&mut self, fields: &TaskFields) -> Result<Task> {
        let valid = self.validate(fields)?;
        if self.next_id == u64::MAX {
            return Err(Error::StorageFailed("task id counter exhausted".to_string()));
        }
        let task = Task {
            id: self.next_id,
            title: valid.title,
            responsible: valid.responsible,
            start_date: valid.start_date,
            end_date: valid.end_date,
            priority: valid.priority,
            description: valid.description,
            observations: valid.observations,
            completed: false,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Mark a task completed. Returns `false` when it already was.
    pub fn complete(&mut self, id: u64) -> Result<bool> {
        let task = self.find_mut(id)?;
        if task.completed {
            return Ok(false);
        }
        task.completed = true;
        Ok(true)
    }

    /// Replace the editable fields of a task. Returns `false` when the new
    /// values equal the current ones.
    pub fn edit(&mut self, id: u64, fields: &TaskFields) -> Result<bool> {
        if self.get(id).is_none() {
            return Err(Error::TaskNotFound(id));
        }
        let valid = self.validate(fields)?;
        let task = self.find_mut(id)?;
        if valid.matches(task) {
            return Ok(false);
        }
        valid.apply(task);
        Ok(true)
    }

    pub fn delete(&mut self, id: u64) -> Result<Task> {
        let position = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        Ok(self.tasks.remove(position))
    }

    /// Remove every completed task, keeping the order of the rest.
    pub fn delete_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed);
        before - self.tasks.len()
    }

    pub fn reset(&mut self) {
        self.tasks.clear();
        self.next_id = 1;
    }

    /// Install task data read from storage.
    ///
    /// A missing counter falls back to `len + 1`; the counter is always
    /// raised past the largest stored id so ids stay unique. Data with
    /// duplicate ids, or with no room left for another id, is rejected and
    /// the store is left as it was.
    pub fn load_state(&mut self, stored: StoredState) -> Result<()> {
        let min_next_id = min_next_id(&stored.tasks)?;
        let fallback = stored.tasks.len() as u64 + 1;
        let next_id = stored.next_id.unwrap_or(fallback).max(min_next_id);
        self.tasks = stored.tasks;
        self.next_id = next_id;
        Ok(())
    }

    pub fn to_stored(&self) -> StoredState {
        StoredState::new(self.tasks.clone(), self.next_id)
    }

    pub fn snapshot_state(&self) -> HistorySnapshot {
        HistorySnapshot {
            tasks: self.tasks.iter().cloned().collect(),
            next_id: self.next_id,
            timestamp: Utc::now(),
        }
    }

    pub fn restore_state(&mut self, snapshot: &HistorySnapshot) {
        self.tasks = snapshot.tasks.iter().cloned().collect();
        self.next_id = snapshot.next_id;
    }

    fn find_mut(&mut self, id: u64) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(Error::TaskNotFound(id))
    }

    fn validate(&self, fields: &TaskFields) -> Result<ValidFields> {
        let title = required_text("title", &fields.title, self.config.max_title_len)?;
        let responsible =
            required_text("responsible", &fields.responsible, self.config.max_responsible_len)?;
        let start_date = fields
            .start_date
            .ok_or_else(|| Error::Validation("start date is required".to_string()))?;
        let end_date = fields
            .end_date
            .ok_or_else(|| Error::Validation("end date is required".to_string()))?;
        if end_date < start_date {
            return Err(Error::Validation(format!(
                "end date {end_date} is before start date {start_date}"
            )));
        }

        Ok(ValidFields {
            title,
            responsible,
            start_date,
            end_date,
            priority: fields.priority,
            description: fields.description.trim().to_string(),
            observations: fields.observations.trim().to_string(),
        })
    }
}

/// Smallest counter value that cannot collide with `tasks`.
///
/// Fails on duplicate ids and on an id of `u64::MAX`.
pub(crate) fn min_next_id(tasks: &[Task]) -> Result<u64> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id) {
            return Err(Error::StorageFailed(format!("duplicate task id {}", task.id)));
        }
    }
    let max_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
    max_id
        .checked_add(1)
        .ok_or_else(|| Error::StorageFailed(format!("task id {max_id} is out of range")))
}

fn required_text(label: &str, value: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{label} cannot be empty")));
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(Error::Validation(format!(
            "{label} is {len} characters; the limit is {max_len}"
        )));
    }
    Ok(trimmed.to_string())
}
