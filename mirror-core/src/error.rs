//! Error types for repository mirroring

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for mirroring operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mirroring operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A command was aimed at a directory that does not exist
    #[error("Working directory does not exist: {}", dir.display())]
    WorkingDirectory { dir: PathBuf },

    /// An external program ran and exited unsuccessfully
    #[error("`{command}` failed in {} ({status}): {stderr}", dir.display())]
    CommandFailed {
        command: String,
        dir: PathBuf,
        status: String,
        stderr: String,
    },

    /// Identity selection was attempted with no configured committers
    #[error("No committer identities configured; add at least one entry to Users")]
    NoCommitters,

    /// Copying or cleaning a working tree failed
    #[error("Mirror error: {0}")]
    Mirror(String),

    /// Failure while preparing or inspecting a repository
    #[error("Repository {repo}: {source}")]
    Repository {
        repo: String,
        #[source]
        source: Box<Error>,
    },

    /// Failure while synchronizing one branch
    #[error("Repository {repo}, branch {branch}: {source}")]
    Branch {
        repo: String,
        branch: String,
        #[source]
        source: Box<Error>,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach repository context to an error
    pub fn in_repository(self, repo: impl Into<String>) -> Self {
        Error::Repository {
            repo: repo.into(),
            source: Box::new(self),
        }
    }

    /// Attach repository and branch context to an error
    pub fn in_branch(self, repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Error::Branch {
            repo: repo.into(),
            branch: branch.into(),
            source: Box::new(self),
        }
    }
}
