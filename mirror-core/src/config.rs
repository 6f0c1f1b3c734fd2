//! Configuration management for repository mirroring
//!
//! The config file is looked up in the following order:
//! 1. An explicit path (`--config` / `MIRROR_CONFIG`)
//! 2. `config.json` in the current directory
//! 3. `~/.config/repo-mirror/config.toml`
//!
//! Keys use PascalCase (`PushFolder`, `Users`, ...) with snake_case aliases,
//! so both the JSON layout and a more conventional TOML layout parse.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::process::RetryPolicy;
use crate::repo::RepositoryPair;
use crate::{Error, Result};

/// Config file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "config.json";

/// A (name, email) pair used to author mirror commits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommitterIdentity {
    #[serde(alias = "name")]
    pub name: String,

    #[serde(alias = "email")]
    pub email: String,
}

impl CommitterIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// One configured origin repository
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepoEntry {
    /// Origin locator (ssh or https URL, or a local path)
    #[serde(alias = "ssh")]
    pub ssh: String,

    /// Key reference; carried through but credentials are left to the git client
    #[serde(alias = "key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Tuning for the sync pipeline
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SyncSettings {
    /// Message used for every mirror commit
    #[serde(alias = "commit_message")]
    pub commit_message: String,

    /// Remote name used for branch discovery, pull and push
    #[serde(alias = "remote")]
    pub remote: String,

    /// Attempts for network-facing git commands (clone, fetch, pull, push)
    #[serde(alias = "attempts")]
    pub attempts: u32,

    /// Delay between attempts
    #[serde(alias = "retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            commit_message: "Update".to_string(),
            remote: "origin".to_string(),
            attempts: 1,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl SyncSettings {
    /// Retry policy for network-facing commands
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, self.retry_delay)
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Root directory holding destination clones
    #[serde(alias = "push_folder")]
    pub push_folder: PathBuf,

    /// Root directory holding origin clones
    #[serde(alias = "pull_folder")]
    pub pull_folder: PathBuf,

    /// Prefix used to derive destination locators
    #[serde(alias = "ssh_push_base")]
    pub ssh_push_base: String,

    /// Candidate committer identities
    #[serde(alias = "users", default)]
    pub users: Vec<CommitterIdentity>,

    /// Repositories to mirror, processed in order
    #[serde(alias = "repos", default)]
    pub repos: Vec<RepoEntry>,

    #[serde(alias = "sync", default)]
    pub sync: SyncSettings,
}

impl Config {
    /// Resolve which config file to use
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }

        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Ok(path);
            }
        }

        Err(Error::Config(format!(
            "No config file found. Pass --config, or create ./{} or {}",
            LOCAL_CONFIG_FILE,
            Self::default_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "~/.config/repo-mirror/config.toml".to_string())
        )))
    }

    /// Locate and load the config file
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = Self::locate(explicit)?;
        let config = Self::load_from_file(&path)?;
        Ok((config, path))
    }

    /// Load configuration from a specific file
    ///
    /// `.toml` files are parsed as TOML, everything else as JSON.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
        }
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/repo-mirror/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("repo-mirror").join("config.toml"))
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        pull_folder: Option<PathBuf>,
        push_folder: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = pull_folder {
            self.pull_folder = path;
        }

        if let Some(path) = push_folder {
            self.push_folder = path;
        }

        self
    }

    /// Check the fields the pipeline cannot run without
    ///
    /// An empty `Users` list is accepted here; it only fails once a branch
    /// actually needs a committer.
    pub fn validate(&self) -> Result<()> {
        if self.pull_folder.as_os_str().is_empty() {
            return Err(Error::Config("PullFolder must not be empty".to_string()));
        }

        if self.push_folder.as_os_str().is_empty() {
            return Err(Error::Config("PushFolder must not be empty".to_string()));
        }

        if self.pull_folder == self.push_folder {
            return Err(Error::Config(
                "PullFolder and PushFolder must be different directories".to_string(),
            ));
        }

        if self.ssh_push_base.trim().is_empty() {
            return Err(Error::Config("SshPushBase must not be empty".to_string()));
        }

        for (index, repo) in self.repos.iter().enumerate() {
            if repo.ssh.trim().is_empty() {
                return Err(Error::Config(format!("Repos[{}] has an empty locator", index)));
            }
        }

        Ok(())
    }

    /// Build the origin/destination pair for every configured repository
    pub fn pairs(&self) -> Result<Vec<RepositoryPair>> {
        self.repos
            .iter()
            .map(|entry| {
                RepositoryPair::new(
                    entry,
                    &self.ssh_push_base,
                    &self.pull_folder,
                    &self.push_folder,
                )
            })
            .collect()
    }
}
