use tk::app::TodoApp;
use tk::config::Config;
use tk::error::Error;
use tk::task::{parse_date, TaskFields};

fn fields(title: &str) -> TaskFields {
    TaskFields {
        title: title.to_string(),
        responsible: "Ana".to_string(),
        start_date: Some(parse_date("start", "2024-05-01").expect("date")),
        end_date: Some(parse_date("end", "2024-05-02").expect("date")),
        ..TaskFields::default()
    }
}

fn app_with_max(max_states: usize) -> TodoApp {
    let mut config = Config::default();
    config.history.max_states = max_states;
    TodoApp::in_memory(config)
}

#[test]
fn log_length_tracks_accepted_commands() {
    let mut app = app_with_max(20);
    for n in 1..=30usize {
        app.add_task(&fields(&format!("T{n}"))).expect("add");
        assert_eq!(app.history().len(), (n + 1).min(20));
    }
}

#[test]
fn add_undo_redo_scenario() {
    let mut app = app_with_max(20);

    let added = app.add_task(&fields("A")).expect("add");
    assert_eq!(app.history().len(), 2);
    assert_eq!(app.history().current_index(), Some(1));
    assert_eq!(added.state.next_id, 2);

    let undone = app.undo().expect("undo");
    assert!(undone.state.tasks.is_empty());
    assert_eq!(undone.state.next_id, 1);
    assert!(undone.state.can_redo);

    let redone = app.redo().expect("redo");
    assert_eq!(redone.state.tasks.len(), 1);
    assert_eq!(redone.state.tasks[0].id, 1);
    assert_eq!(redone.state.tasks, added.state.tasks);
}

#[test]
fn undo_undo_add_clears_redo() {
    let mut app = app_with_max(20);
    app.add_task(&fields("A")).expect("add");
    app.add_task(&fields("B")).expect("add");
    app.undo().expect("undo");
    app.undo().expect("undo");

    let outcome = app.add_task(&fields("C")).expect("add");
    assert!(!outcome.state.can_redo);
    assert!(matches!(app.redo(), Err(Error::NoFutureState)));
}

#[test]
fn eviction_keeps_most_recent_window() {
    let mut app = app_with_max(20);
    for n in 1..=25 {
        app.add_task(&fields(&format!("T{n}"))).expect("add");
    }
    assert_eq!(app.history().len(), 20);

    let oldest = app.history().snapshots().next().expect("oldest");
    assert_eq!(oldest.tasks.len(), 6);
    assert_eq!(oldest.next_id, 7);

    for _ in 0..19 {
        app.undo().expect("undo");
    }
    assert_eq!(app.store().tasks().len(), 6);
    assert!(matches!(app.undo(), Err(Error::NoPriorState)));
    assert_eq!(app.store().tasks().len(), 6);
}

#[test]
fn restored_state_is_independent_of_log() {
    let mut app = app_with_max(20);
    app.add_task(&fields("A")).expect("add");
    app.add_task(&fields("B")).expect("add");
    app.undo().expect("undo");

    app.complete_task(1).expect("complete");
    app.undo().expect("undo");
    assert!(!app.store().tasks()[0].completed);

    let completed: Vec<bool> = app
        .history()
        .snapshots()
        .map(|snapshot| snapshot.tasks.iter().any(|task| task.completed))
        .collect();
    assert_eq!(completed, vec![false, false, true]);
}

#[test]
fn failed_commands_leave_state_and_log_untouched() {
    let mut app = app_with_max(20);
    app.add_task(&fields("A")).expect("add");
    let before = app.state();

    let mut empty_title = fields("");
    empty_title.title = "   ".to_string();
    assert!(matches!(app.add_task(&empty_title), Err(Error::Validation(_))));
    assert!(matches!(app.edit_task(1, &empty_title), Err(Error::Validation(_))));
    assert!(matches!(app.delete_task(9), Err(Error::TaskNotFound(9))));

    assert_eq!(app.state(), before);
    assert_eq!(app.history().len(), 2);
}
