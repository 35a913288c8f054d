//! Error types for the catalog, selector, and system integrations

use std::path::PathBuf;

use thiserror::Error;

/// Manifest loading failures. Both mean "no categories available".
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("error reading manifest {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Selection parsing failures. Recoverable: the caller re-prompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("invalid selection '{0}': enter numbers separated by commas")]
    InvalidSelectionSyntax(String),

    #[error("selection matched no items")]
    EmptySelection,
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot back up {} to {}: {source}", .from.display(), .to.display())]
    Backup {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed: {0}")]
    Command(String),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported script type: {}", .0.display())]
    UnsupportedScript(PathBuf),

    #[error("cannot make {} executable: {source}", .path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with an error", .0.display())]
    Failed(PathBuf),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
