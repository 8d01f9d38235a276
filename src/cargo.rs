/// The build driver: cargo invocations and workspace discovery.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::shell::{require_success, CommandRunner, Invocation};

#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord)]
pub enum BuildOp {
    Check,
    Build,
    Test,
    BuildTests,
}

impl BuildOp {
    /// Operations timed per source unit in the iteration-health run.
    pub const ITERATION: [BuildOp; 3] = [BuildOp::Check, BuildOp::Build, BuildOp::BuildTests];

    pub fn label(&self) -> &'static str {
        match self {
            BuildOp::Check => "check",
            BuildOp::Build => "build",
            BuildOp::Test => "test",
            BuildOp::BuildTests => "build_tests",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            BuildOp::Check => "cargo check",
            BuildOp::Build => "cargo build",
            BuildOp::Test => "cargo test",
            BuildOp::BuildTests => "cargo build --tests",
        }
    }

    fn args(&self) -> &'static [&'static str] {
        match self {
            BuildOp::Check => &["check"],
            BuildOp::Build => &["build"],
            BuildOp::Test => &["test"],
            BuildOp::BuildTests => &["build", "--tests"],
        }
    }
}

/// Entry-point source file of one build target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceTarget {
    pub path: PathBuf,
    /// Path relative to the workspace root, for display.
    pub relative: PathBuf,
}

impl SourceTarget {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        SourceTarget { path, relative }
    }
}

#[derive(Deserialize)]
struct Metadata {
    workspace_root: PathBuf,
    packages: Vec<Package>,
}

#[derive(Deserialize)]
struct Package {
    targets: Vec<Target>,
}

#[derive(Deserialize)]
struct Target {
    src_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Cargo {
    root: PathBuf,
    offline: bool,
    workspace: bool,
}

impl Cargo {
    /// Invocations for checking out old commits: no network, default members.
    pub fn historical(root: &Path) -> Self {
        Cargo {
            root: root.to_path_buf(),
            offline: true,
            workspace: false,
        }
    }

    /// Invocations for the current checkout: every workspace member.
    pub fn workspace(root: &Path) -> Self {
        Cargo {
            root: root.to_path_buf(),
            offline: false,
            workspace: true,
        }
    }

    fn base(&self) -> Invocation {
        Invocation::new("cargo").current_dir(&self.root)
    }

    pub fn invocation(&self, op: BuildOp) -> Invocation {
        let mut inv = self.base().args(op.args());
        if self.workspace {
            inv = inv.arg("--workspace");
        }
        if self.offline {
            inv = inv.arg("--offline");
        }
        inv
    }

    /// Removes every build artifact. A failing clean is logged and tolerated.
    pub fn clean<R: CommandRunner>(&self, runner: &mut R) -> Result<()> {
        let outcome = runner.run(&self.base().arg("clean"))?;
        if !outcome.succeeded {
            warn!(code = ?outcome.exit_code, "cargo clean failed");
        }
        Ok(())
    }

    pub fn fetch_locked<R: CommandRunner>(&self, runner: &mut R) -> Result<()> {
        info!("fetching dependencies");
        require_success(runner, &self.base().arg("fetch").arg("--locked"))?;
        Ok(())
    }

    /// Entry points of every target of every workspace member, in manifest order.
    pub fn discover_targets<R: CommandRunner>(&self, runner: &mut R) -> Result<Vec<SourceTarget>> {
        let inv = self
            .base()
            .args(["metadata", "--no-deps", "--format-version=1"])
            .captured();
        let outcome = require_success(runner, &inv)?;
        let metadata: Metadata =
            serde_json::from_str(&outcome.stdout).map_err(|e| Error::UnexpectedOutput {
                command: inv.to_string(),
                detail: e.to_string(),
            })?;

        let mut targets: Vec<SourceTarget> = vec![];
        for target in metadata.packages.into_iter().flat_map(|p| p.targets) {
            if targets.iter().all(|t| t.path != target.src_path) {
                targets.push(SourceTarget::new(&metadata.workspace_root, target.src_path));
            }
        }
        Ok(targets)
    }
}
