//! repo-mirror CLI - mirror git repositories branch by branch
//!
//! Reads the mirror configuration, then clones, updates and pushes every
//! configured repository. Any failure ends the process with a non-zero exit
//! status.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mirror_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ListArgs, SyncArgs};

/// Mirror git repositories from one host to another
#[derive(Parser, Debug)]
#[command(name = "repo-mirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (JSON, or TOML with a .toml extension)
    #[arg(short, long, global = true, env = "MIRROR_CONFIG")]
    config: Option<PathBuf>,

    /// Root directory for origin clones (overrides config)
    #[arg(long, global = true, env = "MIRROR_PULL_FOLDER")]
    pull_folder: Option<PathBuf>,

    /// Root directory for destination clones (overrides config)
    #[arg(long, global = true, env = "MIRROR_PUSH_FOLDER")]
    push_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Mirror every configured repository (default)
    #[command(visible_alias = "s")]
    Sync(SyncArgs),

    /// Show the origin/destination pairs that would be mirrored
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show current configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let command = cli
        .command
        .take()
        .unwrap_or_else(|| Commands::Sync(SyncArgs::default()));

    match command {
        Commands::Version => {
            println!("repo-mirror {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Sync(args) => {
            let (config, _) = load_config(&cli)?;
            args.execute(&config).await?;
        }
        Commands::List(args) => {
            let (config, _) = load_config(&cli)?;
            args.execute(&config)?;
        }
        Commands::Config => {
            let (config, config_path) = load_config(&cli)?;
            println!("Mirror Configuration");
            println!("====================");
            println!();
            println!("Config file: {}", config_path.display());
            println!();
            println!("Folders:");
            println!("  pull: {}", config.pull_folder.display());
            println!("  push: {}", config.push_folder.display());
            println!("  push base: {}", config.ssh_push_base);
            println!();
            println!("Sync Settings:");
            println!("  remote: {}", config.sync.remote);
            println!("  commit message: {}", config.sync.commit_message);
            println!("  attempts: {}", config.sync.attempts.max(1));
            println!("  retry delay: {:?}", config.sync.retry_delay);
            println!();
            println!("Committers ({}):", config.users.len());
            for user in &config.users {
                println!("  {} <{}>", user.name, user.email);
            }
            println!();
            println!("Repositories: {}", config.repos.len());
        }
    }

    Ok(())
}

/// Load the config file and apply folder overrides from flags or env
fn load_config(cli: &Cli) -> anyhow::Result<(Config, PathBuf)> {
    let (config, config_path) = Config::load(cli.config.as_deref())?;
    let config = config.with_cli_overrides(cli.pull_folder.clone(), cli.push_folder.clone());

    tracing::debug!(
        path = %config_path.display(),
        repos = config.repos.len(),
        users = config.users.len(),
        "Configuration loaded"
    );
    Ok((config, config_path))
}
