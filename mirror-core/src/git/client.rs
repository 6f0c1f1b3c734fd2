//! Thin wrapper over the `git` command line
//!
//! Each method is one independent `git` invocation in a given clone. Commands
//! that reach a remote (clone, fetch, pull, push) go through the retry policy.

use std::path::Path;

use crate::config::CommitterIdentity;
use crate::process::{run_checked, CommandRunner, Invocation, RetryPolicy};
use crate::{Error, Result};

/// Git command-line client bound to a runner
#[derive(Debug)]
pub struct GitClient<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    retry: RetryPolicy,
    program: String,
}

impl<'a, R: CommandRunner + ?Sized> GitClient<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self {
            runner,
            retry: RetryPolicy::once(),
            program: "git".to_string(),
        }
    }

    /// Set the retry policy for network-facing commands
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn git(&self, dir: &Path) -> Invocation {
        Invocation::new(dir, self.program.as_str())
    }

    /// Clone `locator` into `target`
    ///
    /// Runs from the parent of `target`, which must already exist, and passes
    /// only the final path component so relative roots resolve once.
    pub async fn clone_into(&self, locator: &str, target: &Path) -> Result<()> {
        let (parent, name) = match (target.parent(), target.file_name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => {
                return Err(Error::Other(format!(
                    "Clone target has no parent: {}",
                    target.display()
                )))
            }
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };

        let invocation = self
            .git(parent)
            .arg("clone")
            .arg(locator)
            .arg(name.to_string_lossy());
        self.retry.run(self.runner, &invocation).await?;
        Ok(())
    }

    /// Fetch every remote
    pub async fn fetch_all(&self, dir: &Path) -> Result<()> {
        let invocation = self.git(dir).args(["fetch", "--all"]);
        self.retry.run(self.runner, &invocation).await?;
        Ok(())
    }

    /// Raw `git branch -a` output
    pub async fn list_branches(&self, dir: &Path) -> Result<String> {
        let invocation = self.git(dir).args(["branch", "-a"]);
        Ok(run_checked(self.runner, &invocation).await?.stdout)
    }

    /// Check out an existing branch
    ///
    /// Returns `false` when git refuses (typically: no such branch).
    pub async fn checkout(&self, dir: &Path, branch: &str) -> Result<bool> {
        let invocation = self.git(dir).arg("checkout").arg(branch);
        let output = self.runner.run(&invocation).await?;

        if !output.success() {
            tracing::debug!(
                branch,
                dir = %dir.display(),
                "checkout refused: {}",
                output.stderr.trim()
            );
        }

        Ok(output.success())
    }

    /// Check out an existing branch, failing if it cannot be checked out
    pub async fn checkout_existing(&self, dir: &Path, branch: &str) -> Result<()> {
        let invocation = self.git(dir).arg("checkout").arg(branch);
        run_checked(self.runner, &invocation).await?;
        Ok(())
    }

    /// Create a branch at the current position and check it out
    pub async fn checkout_new(&self, dir: &Path, branch: &str) -> Result<()> {
        let invocation = self.git(dir).args(["checkout", "-b"]).arg(branch);
        run_checked(self.runner, &invocation).await?;
        Ok(())
    }

    /// Pull `branch` from `remote` into the current branch
    pub async fn pull(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        let invocation = self.git(dir).arg("pull").arg(remote).arg(branch);
        self.retry.run(self.runner, &invocation).await?;
        Ok(())
    }

    /// Set the clone-local commit identity
    pub async fn set_identity(&self, dir: &Path, identity: &CommitterIdentity) -> Result<()> {
        let email = self
            .git(dir)
            .args(["config", "user.email"])
            .arg(identity.email.as_str());
        run_checked(self.runner, &email).await?;

        let name = self
            .git(dir)
            .args(["config", "user.name"])
            .arg(identity.name.as_str());
        run_checked(self.runner, &name).await?;
        Ok(())
    }

    /// Stage every change, including deletions
    pub async fn stage_all(&self, dir: &Path) -> Result<()> {
        let invocation = self.git(dir).args(["add", "--all"]);
        run_checked(self.runner, &invocation).await?;
        Ok(())
    }

    /// Whether the working tree differs from HEAD
    pub async fn has_changes(&self, dir: &Path) -> Result<bool> {
        let invocation = self.git(dir).args(["status", "--porcelain"]);
        let output = run_checked(self.runner, &invocation).await?;
        Ok(!output.stdout.trim().is_empty())
    }

    pub async fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        let invocation = self.git(dir).args(["commit", "-m"]).arg(message);
        run_checked(self.runner, &invocation).await?;
        Ok(())
    }

    /// Push `branch` to `remote`
    pub async fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        let invocation = self.git(dir).arg("push").arg(remote).arg(branch);
        self.retry.run(self.runner, &invocation).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records invocations and answers from a fixed script
    struct Script {
        calls: Mutex<Vec<Invocation>>,
        reply: fn(&Invocation) -> CommandOutput,
    }

    impl Script {
        fn new(reply: fn(&Invocation) -> CommandOutput) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn commands(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|i| i.to_string()).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for Script {
        async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            Ok((self.reply)(invocation))
        }
    }

    #[tokio::test]
    async fn test_clone_runs_in_parent_dir() {
        let runner = Script::new(|_| CommandOutput::ok());
        let git = GitClient::new(&runner);
        git.clone_into("git@host:a/widget.git", Path::new("/data/pull/widget"))
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].dir, Path::new("/data/pull"));
        assert_eq!(
            calls[0].args,
            vec!["clone", "git@host:a/widget.git", "widget"]
        );
    }

    #[tokio::test]
    async fn test_clone_relative_target_is_not_joined_twice() {
        let runner = Script::new(|_| CommandOutput::ok());
        let git = GitClient::new(&runner);
        git.clone_into("git@host:a/widget.git", Path::new("pull/widget"))
            .await
            .unwrap();
        git.clone_into("git@host:a/gadget.git", Path::new("gadget"))
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].dir, Path::new("pull"));
        assert_eq!(calls[0].args[2], "widget");
        assert_eq!(calls[0].dir.join(&calls[0].args[2]), Path::new("pull/widget"));
        assert_eq!(calls[1].dir, Path::new("."));
        assert_eq!(calls[1].args[2], "gadget");
    }

    #[tokio::test]
    async fn test_checkout_reports_refusal() {
        let runner = Script::new(|_| {
            CommandOutput::failed(1, "error: pathspec 'dev' did not match any file(s) known to git")
        });
        let git = GitClient::new(&runner);
        assert!(!git.checkout(Path::new("/repo"), "dev").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_identity_writes_email_then_name() {
        let runner = Script::new(|_| CommandOutput::ok());
        let git = GitClient::new(&runner);
        let identity = CommitterIdentity::new("Ada Lovelace", "ada@example.com");
        git.set_identity(Path::new("/repo"), &identity).await.unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "git config user.email ada@example.com",
                "git config user.name Ada Lovelace",
            ]
        );
        // the name is passed as a single argument
        assert_eq!(runner.calls.lock().unwrap()[1].args.len(), 3);
    }

    #[tokio::test]
    async fn test_has_changes_reads_porcelain_status() {
        let clean = Script::new(|_| CommandOutput::with_stdout("\n"));
        assert!(!GitClient::new(&clean).has_changes(Path::new("/repo")).await.unwrap());

        let dirty = Script::new(|_| CommandOutput::with_stdout("M  README.md\nD  old.txt\n"));
        assert!(GitClient::new(&dirty).has_changes(Path::new("/repo")).await.unwrap());
    }

    #[tokio::test]
    async fn test_status_failure_is_not_treated_as_clean() {
        let runner = Script::new(|_| CommandOutput::failed(128, "fatal: not a git repository"));
        let err = GitClient::new(&runner)
            .has_changes(Path::new("/repo"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_push_is_retried() {
        let runner = Script::new(|_| CommandOutput::failed(1, "connection reset"));
        let git = GitClient::new(&runner).with_retry(RetryPolicy::new(3, std::time::Duration::ZERO));
        assert!(git.push(Path::new("/repo"), "origin", "main").await.is_err());
        assert_eq!(runner.commands(), vec!["git push origin main"; 3]);
    }
}
