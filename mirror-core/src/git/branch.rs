//! Branch discovery from `git branch -a` output

use std::collections::HashSet;

/// Extract bare remote branch names from `git branch -a` output
///
/// Keeps only lines of the form `remotes/<remote>/<name>` and strips that
/// prefix. The current-branch marker, local branches and symbolic entries
/// such as `remotes/origin/HEAD -> origin/main` are dropped. Each name
/// appears once, in listing order.
pub fn parse_remote_branches(listing: &str, remote: &str) -> Vec<String> {
    let prefix = format!("remotes/{}/", remote);
    let mut seen = HashSet::new();
    let mut branches = Vec::new();

    for line in listing.lines() {
        let line = line.trim_start();
        let line = line.strip_prefix('*').unwrap_or(line).trim();

        if line.is_empty() || line.contains(char::is_whitespace) {
            continue;
        }

        if let Some(name) = line.strip_prefix(&prefix) {
            if !name.is_empty() && seen.insert(name) {
                branches.push(name.to_string());
            }
        }
    }

    branches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typical_listing() {
        let listing = "* main\n  remotes/origin/main\n  remotes/origin/feature-x\n  remotes/origin/HEAD -> origin/main\n";
        assert_eq!(parse_remote_branches(listing, "origin"), vec!["main", "feature-x"]);
    }

    #[test]
    fn test_parse_ignores_local_and_other_remotes() {
        let listing = "  develop\n* main\n  remotes/upstream/main\n  remotes/origin/release/1.0\n";
        assert_eq!(parse_remote_branches(listing, "origin"), vec!["release/1.0"]);
        assert_eq!(parse_remote_branches(listing, "upstream"), vec!["main"]);
    }

    #[test]
    fn test_parse_requires_exact_prefix() {
        // a local branch whose name merely contains the prefix is not remote
        let listing = "  backup/remotes/origin/main\n  remotes/origin/\n  remotes/origin/ok\n";
        assert_eq!(parse_remote_branches(listing, "origin"), vec!["ok"]);
    }

    #[test]
    fn test_parse_detached_head_and_blank_lines() {
        let listing = "* (HEAD detached at 1a2b3c4)\n\n   \n  remotes/origin/main\n";
        assert_eq!(parse_remote_branches(listing, "origin"), vec!["main"]);
    }

    #[test]
    fn test_parse_deduplicates() {
        let listing = "  remotes/origin/main\n  remotes/origin/main\r\n  remotes/origin/dev\n";
        assert_eq!(parse_remote_branches(listing, "origin"), vec!["main", "dev"]);
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_remote_branches("", "origin").is_empty());
    }
}
