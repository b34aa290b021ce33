//! tk task subcommand implementations
//!
//! Provides add, complete, edit, delete, clear-completed, list and show.

use std::path::PathBuf;

use serde::Serialize;

use crate::app::StateView;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{parse_date, Task, TaskFields};

use super::{push_state, task_line, task_lines, Session, TaskArgs};

/// Options shared by commands that take no arguments
pub struct BaseOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for the add command
pub struct AddOptions {
    pub fields: TaskArgs,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for the edit command
pub struct EditOptions {
    pub id: u64,
    pub fields: TaskArgs,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for commands addressing one task
pub struct IdOptions {
    pub id: u64,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for the list command
pub struct ListOptions {
    pub pending: bool,
    pub completed: bool,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct TaskReport {
    task: Task,
    changed: bool,
    state: StateView,
}

#[derive(Serialize)]
struct ClearCompletedReport {
    removed: usize,
    state: StateView,
}

#[derive(Serialize)]
struct ListReport {
    filter: &'static str,
    tasks: Vec<Task>,
    pending: usize,
    completed: usize,
    can_undo: bool,
    can_redo: bool,
}

/// Run the add command
pub fn run_add(options: AddOptions) -> Result<()> {
    let fields = merge_fields(TaskFields::default(), &options.fields)?;
    let mut session = Session::open(options.data_dir)?;
    let outcome = session.app.add_task(&fields)?;

    let mut human = HumanOutput::new(format!("Added task #{}", outcome.value.id));
    human.push_detail(task_line(&outcome.value));
    human.extend_warnings(outcome.warnings);
    human.push_next_step(format!("tk complete {}", outcome.value.id));
    push_state(&mut human, &outcome.state);

    let report = TaskReport {
        task: outcome.value,
        changed: outcome.changed,
        state: outcome.state,
    };
    emit_success(output_options(options.json, options.quiet), "add", &report, Some(&human))
}

/// Run the complete command
pub fn run_complete(options: IdOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let outcome = session.app.complete_task(options.id)?;

    let header = if outcome.changed {
        format!("Completed task #{}", options.id)
    } else {
        format!("Task #{} was already completed", options.id)
    };
    let mut human = HumanOutput::new(header);
    human.extend_warnings(outcome.warnings);
    push_state(&mut human, &outcome.state);

    let report = TaskReport {
        task: outcome.value,
        changed: outcome.changed,
        state: outcome.state,
    };
    emit_success(
        output_options(options.json, options.quiet),
        "complete",
        &report,
        Some(&human),
    )
}

/// Run the edit command
///
/// Omitted flags keep the task's current values; the merged fields are then
/// validated as a whole.
pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let current = session.app.get_task(options.id)?;
    let fields = merge_fields(TaskFields::from(&current), &options.fields)?;
    let outcome = session.app.edit_task(options.id, &fields)?;

    let header = if outcome.changed {
        format!("Edited task #{}", options.id)
    } else {
        format!("Task #{} unchanged", options.id)
    };
    let mut human = HumanOutput::new(header);
    human.push_detail(task_line(&outcome.value));
    human.extend_warnings(outcome.warnings);
    push_state(&mut human, &outcome.state);

    let report = TaskReport {
        task: outcome.value,
        changed: outcome.changed,
        state: outcome.state,
    };
    emit_success(output_options(options.json, options.quiet), "edit", &report, Some(&human))
}

/// Run the delete command
pub fn run_delete(options: IdOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let outcome = session.app.delete_task(options.id)?;

    let mut human = HumanOutput::new(format!("Deleted task #{}", options.id));
    human.push_detail(task_line(&outcome.value));
    human.extend_warnings(outcome.warnings);
    human.push_next_step("tk undo");
    push_state(&mut human, &outcome.state);

    let report = TaskReport {
        task: outcome.value,
        changed: outcome.changed,
        state: outcome.state,
    };
    emit_success(
        output_options(options.json, options.quiet),
        "delete",
        &report,
        Some(&human),
    )
}

/// Run the clear-completed command
pub fn run_clear_completed(options: BaseOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let outcome = session.app.delete_completed_tasks()?;

    let header = match outcome.value {
        0 => "No completed tasks to delete".to_string(),
        1 => "Deleted 1 completed task".to_string(),
        n => format!("Deleted {n} completed tasks"),
    };
    let mut human = HumanOutput::new(header);
    human.extend_warnings(outcome.warnings);
    push_state(&mut human, &outcome.state);

    let report = ClearCompletedReport {
        removed: outcome.value,
        state: outcome.state,
    };
    emit_success(
        output_options(options.json, options.quiet),
        "clear-completed",
        &report,
        Some(&human),
    )
}

/// Run the list command
pub fn run_list(options: ListOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let outcome = session.app.view();
    let state = outcome.state;

    let filter = if options.pending {
        "pending"
    } else if options.completed {
        "completed"
    } else {
        "all"
    };
    let tasks: Vec<Task> = state
        .tasks
        .iter()
        .filter(|task| match filter {
            "pending" => !task.completed,
            "completed" => task.completed,
            _ => true,
        })
        .cloned()
        .collect();

    let mut human = HumanOutput::new("Tasks");
    human.extend_warnings(outcome.warnings);
    if filter != "completed" {
        let pending = state.tasks.iter().filter(|task| !task.completed);
        human.push_group(format!("Pending ({})", state.pending), task_lines(pending));
    }
    if filter != "pending" {
        let completed = state.tasks.iter().filter(|task| task.completed);
        human.push_group(format!("Completed ({})", state.completed), task_lines(completed));
    }
    if state.tasks.is_empty() {
        human.push_next_step("tk add --title ... --responsible ... --start ... --end ...");
    }

    let report = ListReport {
        filter,
        tasks,
        pending: state.pending,
        completed: state.completed,
        can_undo: state.can_undo,
        can_redo: state.can_redo,
    };
    emit_success(output_options(options.json, options.quiet), "list", &report, Some(&human))
}

/// Run the show command
pub fn run_show(options: IdOptions) -> Result<()> {
    let mut session = Session::open(options.data_dir)?;
    let task = session.app.get_task(options.id)?;
    let warnings = session.app.view().warnings;

    let mut human = HumanOutput::new(format!("Task #{}: {}", task.id, task.title));
    human.push_summary("responsible", task.responsible.clone());
    human.push_summary("dates", format!("{} to {}", task.start_date, task.end_date));
    human.push_summary("priority", task.priority.label());
    human.push_summary("status", if task.completed { "completed" } else { "pending" });
    human.push_summary("created", task.created_at.to_rfc3339());
    if !task.description.is_empty() {
        human.push_summary("description", task.description.clone());
    }
    if !task.observations.is_empty() {
        human.push_summary("observations", task.observations.clone());
    }
    human.extend_warnings(warnings);

    emit_success(output_options(options.json, options.quiet), "show", &task, Some(&human))
}

/// Overlay the flags that were given onto `base`.
fn merge_fields(mut base: TaskFields, args: &TaskArgs) -> Result<TaskFields> {
    if let Some(title) = &args.title {
        base.title = title.clone();
    }
    if let Some(responsible) = &args.responsible {
        base.responsible = responsible.clone();
    }
    if let Some(start) = &args.start {
        base.start_date = Some(parse_date("start date", start)?);
    }
    if let Some(end) = &args.end {
        base.end_date = Some(parse_date("end date", end)?);
    }
    if let Some(priority) = &args.priority {
        base.priority = priority.parse()?;
    }
    if let Some(description) = &args.description {
        base.description = description.clone();
    }
    if let Some(observations) = &args.observations {
        base.observations = observations.clone();
    }
    Ok(base)
}

fn output_options(json: bool, quiet: bool) -> OutputOptions {
    OutputOptions { json, quiet }
}
