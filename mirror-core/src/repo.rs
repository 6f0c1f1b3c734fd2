//! Repository naming and local clone layout
//!
//! Every configured repository maps to two local clones: one under the pull
//! root (origin) and one under the push root (destination). Both paths are
//! derived from the locator alone, so a clone left behind by a previous run
//! is found again and reused.

use std::path::{Path, PathBuf};

use crate::config::RepoEntry;
use crate::{Error, Result};

/// Derive the repository name from a locator
///
/// Takes the last path segment and strips a `.git` suffix:
/// - `git@github.com:owner/repo.git` -> `repo`
/// - `https://github.com/owner/repo` -> `repo`
/// - `/srv/git/repo.git/` -> `repo`
pub fn repo_name(locator: &str) -> Result<String> {
    let locator = locator.trim();

    let segment = match url::Url::parse(locator) {
        Ok(url) if url.has_host() || url.scheme() == "file" => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        _ => locator
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .map(str::to_string),
    };

    let name = segment
        .as_deref()
        .map(|s| s.strip_suffix(".git").unwrap_or(s))
        .unwrap_or("")
        .to_string();

    if name.is_empty() {
        return Err(Error::Config(format!(
            "Cannot derive a repository name from locator: {:?}",
            locator
        )));
    }

    Ok(name)
}

/// Destination locator for a repository: push base + name + `.git`
pub fn destination_locator(push_base: &str, name: &str) -> String {
    format!("{}{}.git", push_base, name)
}

/// An on-disk working copy of a remote repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalClone {
    /// Locator the clone was (or will be) created from
    pub locator: String,
    /// Working directory of the clone
    pub path: PathBuf,
}

impl LocalClone {
    pub fn new(locator: impl Into<String>, root: &Path, name: &str) -> Self {
        Self {
            locator: locator.into(),
            path: root.join(name),
        }
    }

    /// Whether something already occupies the clone path
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// One logical repository mirrored from origin to destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPair {
    /// Name shared by both sides
    pub name: String,
    /// Clone of the origin repository under the pull root
    pub origin: LocalClone,
    /// Clone of the destination repository under the push root
    pub destination: LocalClone,
    /// Key reference from the config entry, if any
    pub key: Option<String>,
}

impl RepositoryPair {
    pub fn new(
        entry: &RepoEntry,
        push_base: &str,
        pull_root: &Path,
        push_root: &Path,
    ) -> Result<Self> {
        let name = repo_name(&entry.ssh)?;
        let destination = destination_locator(push_base, &name);

        Ok(Self {
            origin: LocalClone::new(entry.ssh.trim(), pull_root, &name),
            destination: LocalClone::new(destination, push_root, &name),
            key: entry.key.clone(),
            name,
        })
    }
}
