//! Git operations for repository mirroring
//!
//! This module provides the git command-line client and branch discovery.

mod branch;
mod client;

pub use branch::parse_remote_branches;
pub use client::GitClient;
