//! The mirroring pipeline
//!
//! A run prepares both local roots, then walks every configured repository
//! in order and every origin branch in listing order. The first failure
//! stops the run; nothing after it is touched. Local clones survive between
//! runs, so a failed run can simply be started again.

use std::fs;

use rand::Rng;

use crate::config::{CommitterIdentity, Config};
use crate::git::{parse_remote_branches, GitClient};
use crate::identity::IdentityPicker;
use crate::process::CommandRunner;
use crate::repo::{LocalClone, RepositoryPair};
use crate::tree::TreeSync;
use crate::{Error, Result};

/// Whether a local clone had to be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStatus {
    /// Cloned during this run
    Cloned,
    /// Already present on disk and reused
    Existing,
}

/// What happened to one branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOutcome {
    /// A mirror commit was created and pushed
    Pushed,
    /// The branch was new to the destination and was pushed without a new commit
    Published,
    /// Destination already matched the origin; nothing committed or pushed
    Unchanged,
}

/// Result of synchronizing one branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchReport {
    pub branch: String,
    pub outcome: BranchOutcome,
    /// Whether the branch had to be created in the destination clone
    pub created: bool,
    /// Identity the destination clone was configured with
    pub committer: CommitterIdentity,
}

/// Result of synchronizing one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReport {
    pub name: String,
    pub origin: CloneStatus,
    pub destination: CloneStatus,
    pub branches: Vec<BranchReport>,
}

/// Result of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub repos: Vec<RepoReport>,
}

impl RunReport {
    fn count(&self, outcome: BranchOutcome) -> usize {
        self.repos
            .iter()
            .flat_map(|r| &r.branches)
            .filter(|b| b.outcome == outcome)
            .count()
    }

    /// Branches that received a new mirror commit
    pub fn pushed(&self) -> usize {
        self.count(BranchOutcome::Pushed)
    }

    /// Branches pushed to the destination for the first time without a new commit
    pub fn published(&self) -> usize {
        self.count(BranchOutcome::Published)
    }

    /// Branches that were already up to date
    pub fn unchanged(&self) -> usize {
        self.count(BranchOutcome::Unchanged)
    }
}

/// Orchestrates mirroring of every configured repository
pub struct Mirror<'a, R, T, G>
where
    R: CommandRunner + ?Sized,
    T: TreeSync + ?Sized,
    G: Rng,
{
    config: &'a Config,
    git: GitClient<'a, R>,
    tree: &'a T,
    picker: IdentityPicker<G>,
}

impl<R, T, G> std::fmt::Debug for Mirror<'_, R, T, G>
where
    R: CommandRunner + ?Sized,
    T: TreeSync + ?Sized,
    G: Rng,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("pull_folder", &self.config.pull_folder)
            .field("push_folder", &self.config.push_folder)
            .field("repos", &self.config.repos.len())
            .finish_non_exhaustive()
    }
}

impl<'a, R, T, G> Mirror<'a, R, T, G>
where
    R: CommandRunner + ?Sized,
    T: TreeSync + ?Sized,
    G: Rng,
{
    pub fn new(config: &'a Config, runner: &'a R, tree: &'a T, picker: IdentityPicker<G>) -> Self {
        Self {
            config,
            git: GitClient::new(runner).with_retry(config.sync.retry_policy()),
            tree,
            picker,
        }
    }

    fn remote(&self) -> &'a str {
        &self.config.sync.remote
    }

    /// Run the whole pipeline
    ///
    /// With `fresh`, both roots are removed first so every clone is redone.
    pub async fn run(&mut self, fresh: bool) -> Result<RunReport> {
        self.config.validate()?;
        let pairs = self.config.pairs()?;

        self.prepare_roots(fresh)?;

        let mut report = RunReport::default();
        for pair in &pairs {
            report.repos.push(self.sync_repository(pair).await?);
        }

        tracing::info!(
            repos = report.repos.len(),
            pushed = report.pushed(),
            published = report.published(),
            unchanged = report.unchanged(),
            "Mirror run complete"
        );
        Ok(report)
    }

    /// Create both root directories, keeping whatever they already contain
    pub fn prepare_roots(&self, fresh: bool) -> Result<()> {
        for root in [&self.config.push_folder, &self.config.pull_folder] {
            if fresh && root.exists() {
                tracing::warn!(path = %root.display(), "Removing local root");
                fs::remove_dir_all(root)?;
            }
            fs::create_dir_all(root)?;
        }
        Ok(())
    }

    /// Clone unless something already exists at the clone path
    pub async fn ensure_clone(&self, clone: &LocalClone) -> Result<CloneStatus> {
        if clone.exists() {
            tracing::info!(path = %clone.path.display(), "Repository already initialized");
            return Ok(CloneStatus::Existing);
        }

        tracing::info!(locator = %clone.locator, path = %clone.path.display(), "Initializing repository");
        self.git.clone_into(&clone.locator, &clone.path).await?;
        Ok(CloneStatus::Cloned)
    }

    /// Bring every branch of one destination repository in line with its origin
    pub async fn sync_repository(&mut self, pair: &RepositoryPair) -> Result<RepoReport> {
        tracing::info!(repo = %pair.name, origin = %pair.origin.locator, "Syncing repository");

        let (origin, destination, branches) = self
            .prepare_repository(pair)
            .await
            .map_err(|e| e.in_repository(&pair.name))?;

        tracing::info!(repo = %pair.name, branches = branches.len(), "Found origin branches");

        let mut report = RepoReport {
            name: pair.name.clone(),
            origin,
            destination,
            branches: Vec::with_capacity(branches.len()),
        };

        for branch in &branches {
            let branch_report = self
                .sync_branch(pair, branch)
                .await
                .map_err(|e| e.in_branch(&pair.name, branch))?;
            report.branches.push(branch_report);
        }

        Ok(report)
    }

    async fn prepare_repository(
        &self,
        pair: &RepositoryPair,
    ) -> Result<(CloneStatus, CloneStatus, Vec<String>)> {
        let origin = self.ensure_clone(&pair.origin).await?;
        let destination = self.ensure_clone(&pair.destination).await?;

        self.git.fetch_all(&pair.origin.path).await?;
        self.git.fetch_all(&pair.destination.path).await?;

        let listing = self.git.list_branches(&pair.origin.path).await?;
        Ok((origin, destination, parse_remote_branches(&listing, self.remote())))
    }

    /// Mirror one origin branch into the destination and publish it
    pub async fn sync_branch(&mut self, pair: &RepositoryPair, branch: &str) -> Result<BranchReport> {
        let remote = self.remote();
        let origin_dir = pair.origin.path.as_path();
        let dest_dir = pair.destination.path.as_path();

        let config = self.config;
        let committer = self.picker.pick(&config.users)?.clone();
        tracing::info!(
            repo = %pair.name,
            branch,
            name = %committer.name,
            email = %committer.email,
            "Chosen committer"
        );
        self.git.set_identity(dest_dir, &committer).await?;

        tracing::info!(repo = %pair.name, branch, "Updating origin branch");
        self.git.checkout_existing(origin_dir, branch).await?;
        self.git.pull(origin_dir, remote, branch).await?;

        let created = if self.git.checkout(dest_dir, branch).await? {
            tracing::info!(repo = %pair.name, branch, "Pulling destination branch");
            self.git.pull(dest_dir, remote, branch).await?;
            false
        } else {
            tracing::info!(repo = %pair.name, branch, "Creating destination branch");
            self.git.checkout_new(dest_dir, branch).await?;
            true
        };

        tracing::info!(repo = %pair.name, branch, "Copying files");
        if dest_dir.exists() {
            self.tree.clean_stale(dest_dir)?;
        }
        self.tree.mirror(origin_dir, dest_dir)?;

        self.git.stage_all(dest_dir).await?;
        let outcome = if self.git.has_changes(dest_dir).await? {
            tracing::info!(repo = %pair.name, branch, "Pushing changes");
            self.git.commit(dest_dir, &config.sync.commit_message).await?;
            self.git.push(dest_dir, remote, branch).await?;
            BranchOutcome::Pushed
        } else if created {
            tracing::info!(repo = %pair.name, branch, "No changes; publishing new branch");
            self.git.push(dest_dir, remote, branch).await?;
            BranchOutcome::Published
        } else {
            tracing::info!(repo = %pair.name, branch, "No changes");
            BranchOutcome::Unchanged
        };

        Ok(BranchReport {
            branch: branch.to_string(),
            outcome,
            created,
            committer,
        })
    }
}
