/// Version-control collaborator: first-parent history walk and checkouts.
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::shell::{require_success, CommandRunner, Invocation};

/// One step of the first-parent walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedCommit {
    pub id: String,
    /// `None` for the oldest commit of the walk.
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub parent: Option<String>,
    pub author: String,
    pub message: String,
    /// (tracked path, diff against the first parent)
    pub diffs: Vec<(String, String)>,
}

impl Commit {
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: &Path) -> Self {
        Git {
            root: root.to_path_buf(),
        }
    }

    fn git(&self) -> Invocation {
        Invocation::new("git").arg("-C").arg(self.root.to_string_lossy())
    }

    fn query<R: CommandRunner>(&self, runner: &mut R, inv: Invocation) -> Result<String> {
        Ok(require_success(runner, &inv.captured())?.stdout)
    }

    /// First-parent history of `reference`, newest first.
    pub fn history<R: CommandRunner>(
        &self,
        runner: &mut R,
        reference: &str,
    ) -> Result<Vec<WalkedCommit>> {
        let inv = self
            .git()
            .args(["rev-list", "--first-parent", "--parents", reference]);
        let out = self.query(runner, inv.clone())?;

        let mut commits = out
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| {
                let mut hashes = line.split_whitespace();
                let id = hashes.next().ok_or_else(|| Error::UnexpectedOutput {
                    command: inv.to_string(),
                    detail: format!("empty line in '{out}'"),
                })?;
                Ok(WalkedCommit {
                    id: id.to_string(),
                    parent: hashes.next().map(str::to_string),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Nothing older than the walk is diffed against.
        if let Some(oldest) = commits.last_mut() {
            oldest.parent = None;
        }

        Ok(commits)
    }

    /// (author, full message)
    pub fn metadata<R: CommandRunner>(&self, runner: &mut R, id: &str) -> Result<(String, String)> {
        let inv = self.git().args(["log", "-1", "--format=%an%n%B", id]);
        let out = self.query(runner, inv.clone())?;
        let (author, message) = out.split_once('\n').ok_or_else(|| Error::UnexpectedOutput {
            command: inv.to_string(),
            detail: format!("no author line in '{out}'"),
        })?;
        Ok((author.to_string(), message.trim_end().to_string()))
    }

    /// Diff of `path` between `commit` and its first parent. Empty for a parentless commit.
    pub fn diff<R: CommandRunner>(
        &self,
        runner: &mut R,
        commit: &WalkedCommit,
        path: &str,
    ) -> Result<String> {
        match &commit.parent {
            None => Ok(String::new()),
            Some(parent) => {
                let inv = self
                    .git()
                    .args(["diff", parent.as_str(), commit.id.as_str(), "--", path]);
                self.query(runner, inv)
            }
        }
    }

    pub fn commit<R: CommandRunner>(
        &self,
        runner: &mut R,
        walked: &WalkedCommit,
        tracked: &[String],
    ) -> Result<Commit> {
        let (author, message) = self.metadata(runner, &walked.id)?;
        let diffs = tracked
            .iter()
            .map(|path| Ok((path.clone(), self.diff(runner, walked, path)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Commit {
            id: walked.id.clone(),
            parent: walked.parent.clone(),
            author,
            message,
            diffs,
        })
    }

    /// Destructive: overwrites the working tree.
    pub fn checkout<R: CommandRunner>(&self, runner: &mut R, id: &str) -> Result<()> {
        info!(commit = id, "checkout");
        require_success(runner, &self.git().args(["checkout", id]))?;
        Ok(())
    }

    pub fn remote_url<R: CommandRunner>(&self, runner: &mut R, name: &str) -> Result<String> {
        let out = self.query(runner, self.git().args(["remote", "get-url", name]))?;
        Ok(out.trim().to_string())
    }
}

/// `https://host/owner/repo/commit/` for an https or scp-style ssh remote.
pub fn commit_link_base(remote: &str) -> Option<String> {
    let remote = remote.trim();
    let path = if let Some(rest) = remote
        .strip_prefix("https://")
        .or_else(|| remote.strip_prefix("http://"))
    {
        rest.to_string()
    } else if let Some(rest) = remote.strip_prefix("ssh://") {
        let rest = rest.split_once('@').map_or(rest, |(_, r)| r);
        rest.to_string()
    } else {
        let (user_host, repo) = remote.split_once(':')?;
        let host = user_host.split_once('@').map_or(user_host, |(_, h)| h);
        format!("{host}/{repo}")
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if path.split('/').filter(|s| !s.is_empty()).count() < 3 {
        return None;
    }
    Some(format!("https://{path}/commit/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_base_from_https_remote() {
        assert_eq!(
            commit_link_base("https://github.com/acme/solver.git"),
            Some("https://github.com/acme/solver/commit/".to_string())
        );
    }

    #[test]
    fn link_base_from_scp_remote() {
        assert_eq!(
            commit_link_base("git@github.com:acme/solver.git\n"),
            Some("https://github.com/acme/solver/commit/".to_string())
        );
        assert_eq!(
            commit_link_base("ssh://git@gitlab.com/acme/solver"),
            Some("https://gitlab.com/acme/solver/commit/".to_string())
        );
    }

    #[test]
    fn local_remote_has_no_link_base() {
        assert_eq!(commit_link_base("/srv/git/solver"), None);
        assert_eq!(commit_link_base("https://example.com"), None);
    }

    #[test]
    fn first_line_of_message() {
        let commit = Commit {
            id: "abc".to_string(),
            parent: None,
            author: "A".to_string(),
            message: "Fix solver\n\nLonger body".to_string(),
            diffs: vec![],
        };
        assert_eq!(commit.first_line(), "Fix solver");
    }
}
