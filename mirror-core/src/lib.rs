//! Mirror Core - mirror git repositories from one host to another
//!
//! For every configured repository this crate keeps a local clone of the
//! origin and of the destination, replays each origin branch's tree onto the
//! destination branch, and pushes the result under a randomly chosen
//! committer identity.

pub mod config;
pub mod error;
pub mod git;
pub mod identity;
pub mod process;
pub mod repo;
pub mod sync;
pub mod tree;

pub use config::{CommitterIdentity, Config, RepoEntry, SyncSettings};
pub use error::{Error, Result};
pub use git::{parse_remote_branches, GitClient};
pub use identity::IdentityPicker;
pub use process::{CommandOutput, CommandRunner, Invocation, RetryPolicy, SystemRunner};
pub use repo::{destination_locator, repo_name, LocalClone, RepositoryPair};
pub use sync::{BranchOutcome, BranchReport, CloneStatus, Mirror, RepoReport, RunReport};
pub use tree::{NativeTreeSync, TreeSync};
