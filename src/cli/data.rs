//! tk data commands: save, load, clear, config.

use std::path::PathBuf;

use serde::Serialize;

use crate::app::StateView;
use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::{push_state, Session};

/// Options for data commands
pub struct DataOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct SaveReport {
    path: PathBuf,
    tasks: usize,
    next_id: u64,
}

#[derive(Serialize)]
struct LoadReport {
    loaded: bool,
    changed: bool,
    state: StateView,
}

#[derive(Serialize)]
struct ClearReport {
    state: StateView,
}

#[derive(Serialize)]
struct ConfigReport {
    data_dir: PathBuf,
    config_file: PathBuf,
    config_file_exists: bool,
    config: Config,
}

/// Run the save command
pub fn run_save(options: DataOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir.clone())?;
    let outcome = session.app.save()?;
    let path = session
        .app
        .storage()
        .map(|storage| storage.tasks_file())
        .unwrap_or_default();

    let mut human = HumanOutput::new("Tasks saved");
    human.push_summary("file", path.display().to_string());
    human.push_summary("tasks", outcome.state.tasks.len().to_string());
    human.extend_warnings(outcome.warnings);

    let report = SaveReport {
        path,
        tasks: outcome.state.tasks.len(),
        next_id: outcome.state.next_id,
    };
    emit_success(output_options(&options), "save", &report, Some(&human))
}

/// Run the load command
pub fn run_load(options: DataOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir.clone())?;
    let outcome = session.app.load()?;

    let header = match (outcome.value, outcome.changed) {
        (false, _) => "Nothing to load",
        (true, true) => "Loaded saved tasks",
        (true, false) => "Saved tasks already loaded",
    };
    let mut human = HumanOutput::new(header);
    human.extend_warnings(outcome.warnings);
    if outcome.changed {
        human.push_next_step("tk undo");
    }
    push_state(&mut human, &outcome.state);

    let report = LoadReport {
        loaded: outcome.value,
        changed: outcome.changed,
        state: outcome.state,
    };
    emit_success(output_options(&options), "load", &report, Some(&human))
}

/// Run the clear command
pub fn run_clear(options: DataOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir.clone())?;
    let outcome = session.app.clear_all()?;

    let mut human = HumanOutput::new("Cleared all tasks and history");
    human.extend_warnings(outcome.warnings);
    push_state(&mut human, &outcome.state);

    let report = ClearReport {
        state: outcome.state,
    };
    emit_success(output_options(&options), "clear", &report, Some(&human))
}

/// Run the config command
pub fn run_config(options: DataOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir.clone())?;
    let warnings = session.app.view().warnings;
    let config = session.app.config().clone();
    let (data_dir, config_file) = match session.app.storage() {
        Some(storage) => (storage.dir().to_path_buf(), storage.config_file()),
        None => (PathBuf::new(), PathBuf::new()),
    };
    let config_file_exists = config_file.exists();

    let mut human = HumanOutput::new("Configuration");
    human.push_summary("data dir", data_dir.display().to_string());
    human.push_summary(
        "config file",
        if config_file_exists {
            config_file.display().to_string()
        } else {
            format!("{} (not present, using defaults)", config_file.display())
        },
    );
    human.push_summary("history.max_states", config.history.max_states.to_string());
    human.push_summary("history.persist", config.history.persist.to_string());
    human.push_summary("storage.autosave", config.storage.autosave.to_string());
    human.push_summary("tasks.max_title_len", config.tasks.max_title_len.to_string());
    human.push_summary(
        "tasks.max_responsible_len",
        config.tasks.max_responsible_len.to_string(),
    );
    human.extend_warnings(warnings);

    let report = ConfigReport {
        data_dir,
        config_file,
        config_file_exists,
        config,
    };
    emit_success(output_options(&options), "config", &report, Some(&human))
}

fn output_options(options: &DataOptions) -> OutputOptions {
    OutputOptions {
        json: options.json,
        quiet: options.quiet,
    }
}
