//! tk - task tracker library
//!
//! This library provides the core of the tk CLI: a task store with a
//! bounded, linear undo/redo history.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled work items with a responsible party, a date range,
//!   a priority and a completed flag
//! - **Snapshots**: owned copies of the whole task list plus the id counter
//! - **History**: a bounded log of snapshots with a current position;
//!   recording after an undo discards the redo branch
//!
//! # Module Organization
//!
//! - `app`: Command surface composing store, history and storage
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `tk.toml`
//! - `error`: Error types and result aliases
//! - `history`: Undo/redo log of snapshots
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output formatting
//! - `storage`: Data directory layout and JSON persistence
//! - `task`: Task records, validation and the task store

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod lock;
pub mod output;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
