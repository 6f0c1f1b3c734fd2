//! List command - show the derived origin/destination pairs

use clap::Args;
use mirror_core::Config;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Also show the local clone paths
    #[arg(short, long)]
    pub paths: bool,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        config.validate()?;
        let pairs = config.pairs()?;

        if pairs.is_empty() {
            println!("No repositories configured");
            return Ok(());
        }

        for pair in &pairs {
            println!("{}", pair.name);
            println!("  origin:      {}", pair.origin.locator);
            println!("  destination: {}", pair.destination.locator);
            if pair.key.is_some() {
                println!("  key:         (configured)");
            }

            if self.paths {
                let state = |exists: bool| if exists { "cloned" } else { "not cloned" };
                println!(
                    "  pull clone:  {} ({})",
                    pair.origin.path.display(),
                    state(pair.origin.exists())
                );
                println!(
                    "  push clone:  {} ({})",
                    pair.destination.path.display(),
                    state(pair.destination.exists())
                );
            }
        }

        Ok(())
    }
}
