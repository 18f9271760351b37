//! Run configuration.
//!
//! Defaults are safe for CI use; environment variables can widen or tighten
//! the resource caps without code changes, and the CLI layers its flags on top.

use crate::registry::DEFAULT_REGISTRY_PATH;
use crate::safe_yaml::YamlLimits;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const ENV_ROOT: &str = "PLUGIN_ALIGN_ROOT";
pub const ENV_MAX_YAML_NODES: &str = "PLUGIN_ALIGN_MAX_YAML_NODES";
pub const ENV_MAX_YAML_DEPTH: &str = "PLUGIN_ALIGN_MAX_YAML_DEPTH";
pub const ENV_MAX_FILE_BYTES: &str = "PLUGIN_ALIGN_MAX_FILE_BYTES";

/// Component files larger than this are rejected before YAML parsing.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Registry location. Relative paths are confined to the plugin root;
    /// absolute paths are operator-supplied and used as given.
    pub registry: PathBuf,
    pub yaml_limits: YamlLimits,
    pub max_file_bytes: u64,
    /// Walk kind directories on separate threads.
    pub parallel_scan: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            registry: PathBuf::from(DEFAULT_REGISTRY_PATH),
            yaml_limits: YamlLimits::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            parallel_scan: true,
        }
    }
}

impl ValidateOptions {
    /// Defaults overridden by any `PLUGIN_ALIGN_*` limit variables.
    ///
    /// Unparseable or zero values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(nodes) = env_limit::<usize>(ENV_MAX_YAML_NODES) {
            options.yaml_limits.max_nodes = nodes;
        }
        if let Some(depth) = env_limit::<usize>(ENV_MAX_YAML_DEPTH) {
            options.yaml_limits.max_depth = depth;
        }
        if let Some(bytes) = env_limit::<u64>(ENV_MAX_FILE_BYTES) {
            options.max_file_bytes = bytes;
        }
        options
    }
}

fn env_limit<T>(name: &str) -> Option<T>
where
    T: FromStr + PartialEq + Default,
{
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Some(value),
        _ => {
            warn!(variable = name, value = %raw, "ignoring invalid limit override");
            None
        }
    }
}
