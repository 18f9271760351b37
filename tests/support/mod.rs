#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn plugin_align_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_plugin-align"))
}

// Runs the CLI against `root` with a clean logging environment.
pub fn run_cli(root: &Path, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(plugin_align_binary());
    cmd.arg("--root").arg(root).args(args);
    cmd.env_remove("RUST_LOG")
        .env_remove("PLUGIN_ALIGN_ROOT")
        .env_remove("PLUGIN_ALIGN_MAX_YAML_NODES")
        .env_remove("PLUGIN_ALIGN_MAX_YAML_DEPTH")
        .env_remove("PLUGIN_ALIGN_MAX_FILE_BYTES");
    cmd.output()
        .with_context(|| format!("running plugin-align against {}", root.display()))
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
