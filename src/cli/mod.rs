//! Command-line interface for tk
//!
//! This module defines the CLI structure using clap derive macros.
//! Commands are grouped by concern in submodules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app::{StateView, TodoApp};
use crate::config::Config;
use crate::error::Result;
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::output::HumanOutput;
use crate::storage::Storage;
use crate::task::Task;

mod data;
mod history;
mod task;

/// tk - task tracker with undo/redo
///
/// Add, edit, complete and delete tasks; every change can be undone and
/// redone, within a bounded history.
#[derive(Parser, Debug)]
#[command(name = "tk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = "TK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Editable task fields shared by `add` and `edit`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TaskArgs {
    /// Task title
    #[arg(long)]
    pub title: Option<String>,

    /// Person responsible for the task
    #[arg(long)]
    pub responsible: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD), not before the start date
    #[arg(long)]
    pub end: Option<String>,

    /// Priority: high, medium, low (empty to unset)
    #[arg(long)]
    pub priority: Option<String>,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// Free-text observations
    #[arg(long)]
    pub observations: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        #[command(flatten)]
        fields: TaskArgs,
    },

    /// Mark a task as completed
    Complete {
        /// Task id
        id: u64,
    },

    /// Edit a task; omitted fields keep their current value
    Edit {
        /// Task id
        id: u64,

        #[command(flatten)]
        fields: TaskArgs,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: u64,
    },

    /// Delete every completed task
    ClearCompleted,

    /// Undo the last change
    Undo,

    /// Redo the last undone change
    Redo,

    /// Delete all tasks and saved data, and start a new history
    Clear,

    /// List tasks grouped by status
    List {
        /// Only pending tasks
        #[arg(long, conflicts_with = "completed")]
        pending: bool,

        /// Only completed tasks
        #[arg(long)]
        completed: bool,
    },

    /// Show one task
    Show {
        /// Task id
        id: u64,
    },

    /// Write the current tasks to the data directory
    Save,

    /// Replace the current tasks with the saved ones (undoable)
    Load,

    /// Show the undo/redo history
    History,

    /// Show the effective configuration
    Config,
}

/// An opened data directory: the app plus the lock held for the command.
pub(crate) struct Session {
    pub app: TodoApp,
    _lock: FileLock,
}

impl Session {
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let storage = Storage::resolve(data_dir);
        let lock = storage.lock(DEFAULT_LOCK_TIMEOUT_MS)?;
        let (config, config_error) = Config::load_from_dir(storage.dir());
        tracing::debug!(dir = %storage.dir().display(), "opened data directory");

        let mut app = TodoApp::open(storage, config);
        if let Some(err) = config_error {
            app.add_warning(format!("{err}; using default configuration"));
        }
        Ok(Self { app, _lock: lock })
    }
}

pub(crate) fn task_line(task: &Task) -> String {
    let mut line = format!(
        "#{} {} | {} | {} to {} | {}",
        task.id,
        task.title,
        task.responsible,
        task.start_date,
        task.end_date,
        task.priority.label()
    );
    if task.completed {
        line.push_str(" | done");
    }
    line
}

pub(crate) fn task_lines<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<String> {
    tasks.into_iter().map(task_line).collect()
}

/// Render the pending and completed groups plus undo/redo availability.
pub(crate) fn push_state(human: &mut HumanOutput, state: &StateView) {
    let pending = state.tasks.iter().filter(|task| !task.completed);
    let completed = state.tasks.iter().filter(|task| task.completed);
    human.push_group(format!("Pending ({})", state.pending), task_lines(pending));
    human.push_group(format!("Completed ({})", state.completed), task_lines(completed));
    human.push_summary("can undo", yes_no(state.can_undo));
    human.push_summary("can redo", yes_no(state.can_redo));
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Add { fields } => task::run_add(task::AddOptions {
                fields,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Complete { id } => task::run_complete(task::IdOptions {
                id,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Edit { id, fields } => task::run_edit(task::EditOptions {
                id,
                fields,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Delete { id } => task::run_delete(task::IdOptions {
                id,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::ClearCompleted => task::run_clear_completed(task::BaseOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List { pending, completed } => task::run_list(task::ListOptions {
                pending,
                completed,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Show { id } => task::run_show(task::IdOptions {
                id,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Undo => history::run_undo(history::HistoryOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Redo => history::run_redo(history::HistoryOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::History => history::run_history(history::HistoryOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Clear => data::run_clear(data::DataOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Save => data::run_save(data::DataOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Load => data::run_load(data::DataOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Config => data::run_config(data::DataOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}
