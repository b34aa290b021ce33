//! tk undo, redo and history commands.

use std::path::PathBuf;

use serde::Serialize;

use crate::app::StateView;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::{push_state, Session};

/// Options for history commands
pub struct HistoryOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct MoveReport {
    history_index: Option<usize>,
    history_len: usize,
    state: StateView,
}

/// Run the undo command
pub fn run_undo(options: HistoryOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let outcome = session.app.undo()?;
    let output = options_of(options.json, options.quiet);
    emit_move(output, "undo", "Undid last change", &session, outcome.state, outcome.warnings)
}

/// Run the redo command
pub fn run_redo(options: HistoryOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let outcome = session.app.redo()?;
    let output = options_of(options.json, options.quiet);
    emit_move(output, "redo", "Redid last change", &session, outcome.state, outcome.warnings)
}

/// Run the history command
pub fn run_history(options: HistoryOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let warnings = session.app.view().warnings;
    let view = session.app.history_view();

    let mut human = HumanOutput::new("History");
    human.push_summary("entries", format!("{} of {}", view.entries.len(), view.max_states));
    if let Some(index) = view.current_index {
        human.push_summary("current", index.to_string());
    }
    let lines: Vec<String> = view
        .entries
        .iter()
        .map(|entry| {
            format!(
                "{} {} {} tasks ({} completed), next id {}{}",
                if entry.current { "*" } else { " " },
                entry.index,
                entry.tasks,
                entry.completed,
                entry.next_id,
                if entry.index == 0 { ", oldest" } else { "" }
            )
        })
        .collect();
    human.push_group("Snapshots", lines);
    human.extend_warnings(warnings);

    emit_success(options_of(options.json, options.quiet), "history", &view, Some(&human))
}

fn emit_move(
    output: OutputOptions,
    command: &str,
    header: &str,
    session: &Session,
    state: StateView,
    warnings: Vec<String>,
) -> Result<()> {
    let history = session.app.history();
    let mut human = HumanOutput::new(header);
    human.extend_warnings(warnings);
    push_state(&mut human, &state);

    let report = MoveReport {
        history_index: history.current_index(),
        history_len: history.len(),
        state,
    };
    emit_success(output, command, &report, Some(&human))
}

fn options_of(json: bool, quiet: bool) -> OutputOptions {
    OutputOptions { json, quiet }
}
