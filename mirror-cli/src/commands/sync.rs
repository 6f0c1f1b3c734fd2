//! Sync command - mirror every configured repository

use clap::Args;
use mirror_core::{BranchOutcome, Config, IdentityPicker, Mirror, NativeTreeSync, SystemRunner};

/// Arguments for the sync command
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Delete both local roots before syncing, forcing fresh clones
    #[arg(long)]
    pub fresh: bool,

    /// Seed for committer selection (random by default)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        config.validate()?;

        let picker = match self.seed {
            Some(seed) => IdentityPicker::seeded(seed),
            None => IdentityPicker::from_entropy(),
        };

        let runner = SystemRunner::new();
        let tree = NativeTreeSync::new();
        let mut mirror = Mirror::new(config, &runner, &tree, picker);

        let report = mirror.run(self.fresh).await.map_err(|e| {
            tracing::error!("{}", e);
            e
        })?;

        println!();
        println!("Mirror Summary");
        println!("==============");
        for repo in &report.repos {
            println!("{}", repo.name);
            if repo.branches.is_empty() {
                println!("  (no branches)");
            }
            for branch in &repo.branches {
                let outcome = match branch.outcome {
                    BranchOutcome::Pushed => "pushed",
                    BranchOutcome::Published => "published",
                    BranchOutcome::Unchanged => "unchanged",
                };
                let created = if branch.created { " (new)" } else { "" };
                println!(
                    "  {}{}: {} as {} <{}>",
                    branch.branch, created, outcome, branch.committer.name, branch.committer.email
                );
            }
        }
        println!();
        println!(
            "{} repositories, {} pushed, {} published, {} unchanged",
            report.repos.len(),
            report.pushed(),
            report.published(),
            report.unchanged()
        );

        Ok(())
    }
}
