#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway tk data directory.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.file("tk.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// A `tk` command pointed at this data directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = tk_cmd();
        cmd.env_remove("RUST_LOG");
        cmd.arg("--data-dir").arg(self.path());
        cmd
    }

    /// Run a command with `--json` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().arg("--json").args(args).output().expect("run tk");
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }

    /// Add a task with valid defaults and the given title.
    pub fn add(&self, title: &str) {
        self.cmd()
            .args([
                "add",
                "--title",
                title,
                "--responsible",
                "Ana",
                "--start",
                "2024-05-01",
                "--end",
                "2024-05-03",
            ])
            .assert()
            .success();
    }
}

pub fn tk_cmd() -> Command {
    Command::cargo_bin("tk").expect("binary")
}

/// Task ids from a state view.
pub fn ids(state: &Value) -> Vec<u64> {
    state["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|task| task["id"].as_u64().expect("id"))
        .collect()
}
