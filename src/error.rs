//! Error types for the validation core.
//!
//! File-scoped failures (`PathSecurityError`, `FrontmatterError`) are turned
//! into violations by the caller. `RegistryError` and `ValidateError` are the
//! only errors that abort a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathSecurityError {
    #[error("path is empty")]
    Empty,
    #[error("root {0} is not an absolute path")]
    RelativeRoot(PathBuf),
    #[error("path contains a parent-directory sequence")]
    Traversal,
    #[error("path contains a malformed percent escape")]
    MalformedEscape,
    #[error("percent-decoded path is not valid UTF-8")]
    InvalidEncoding,
    #[error("path contains a NUL byte")]
    NulByte,
    #[error("path resolves outside the root")]
    EscapesRoot,
    #[error("symbolic links are not followed")]
    Symlink,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YamlError {
    #[error("malformed YAML: {0}")]
    Yaml(String),
    #[error("explicit tag {tag} is not allowed")]
    ForbiddenTag { tag: String },
    #[error("mapping keys must be scalars")]
    NonScalarKey,
    #[error("merge key must reference a mapping or a sequence of mappings")]
    InvalidMerge,
    #[error("document exceeds {limit} {what}")]
    LimitExceeded { what: &'static str, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    #[error("no frontmatter block")]
    NoFrontmatter,
    #[error("frontmatter block is not terminated")]
    Unterminated,
    #[error("reading file: {0}")]
    Io(String),
    #[error("file is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error(transparent)]
    Yaml(#[from] YamlError),
    #[error("frontmatter does not match the component schema: {0}")]
    Schema(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("reading registry {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing registry {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: YamlError,
    },
    #[error("registry {path} failed schema validation:\n{details}")]
    Schema { path: PathBuf, details: String },
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("unable to locate a plugin root; pass --root or set PLUGIN_ALIGN_ROOT")]
    RootNotFound,
    #[error("plugin root {0} does not exist or is not a directory")]
    MissingRoot(PathBuf),
    #[error("resolving plugin root {path}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("registry path {path} is not usable: {source}")]
    RegistryPath {
        path: String,
        #[source]
        source: PathSecurityError,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
