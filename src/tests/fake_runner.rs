use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::shell::{CommandRunner, Invocation, Outcome};

/// A cargo build operation as seen by `FakeRunner`.
#[derive(Debug, Clone)]
pub struct TimedCall {
    /// Commit checked out at the time, if any
    pub commit: Option<String>,
    pub invocation: Invocation,
    /// Build operations since the last checkout
    pub nth_since_checkout: usize,
    /// Build operations since the runner was created
    pub nth_overall: usize,
}

type FailRule = Box<dyn FnMut(&TimedCall) -> bool>;

/// Simulated git + cargo. Build durations are drawn from a seeded normal distribution.
pub struct FakeRunner {
    /// Newest first, like `git rev-list`
    commits: Vec<String>,
    diffs: HashMap<(String, String), String>,
    metadata: String,
    checked_out: Option<String>,
    since_checkout: usize,
    overall: usize,
    fail_when: FailRule,
    fail_fetch_on: Option<String>,
    rng: StdRng,
    runtime: Normal<f64>,
    pub log: Vec<Invocation>,
}

impl FakeRunner {
    pub fn new(commits: &[&str], seed: u64) -> Self {
        FakeRunner {
            commits: commits.iter().map(|c| c.to_string()).collect(),
            diffs: HashMap::new(),
            metadata: String::new(),
            checked_out: None,
            since_checkout: 0,
            overall: 0,
            fail_when: Box::new(|_| false),
            fail_fetch_on: None,
            rng: StdRng::seed_from_u64(seed),
            runtime: Normal::new(2.0, 0.5).unwrap(),
            log: vec![],
        }
    }

    pub fn with_diff(mut self, commit: &str, path: &str, diff: &str) -> Self {
        self.diffs
            .insert((commit.to_string(), path.to_string()), diff.to_string());
        self
    }

    /// `cargo metadata` output listing `sources` (relative to `root`) as one package.
    pub fn with_workspace(mut self, root: &Path, sources: &[&str]) -> Self {
        let targets: Vec<_> = sources
            .iter()
            .map(|s| serde_json::json!({ "src_path": root.join(s) }))
            .collect();
        self.metadata = serde_json::json!({
            "workspace_root": root,
            "packages": [{ "name": "ws", "targets": targets }],
        })
        .to_string();
        self
    }

    pub fn failing(mut self, rule: impl FnMut(&TimedCall) -> bool + 'static) -> Self {
        self.fail_when = Box::new(rule);
        self
    }

    pub fn failing_fetch_on(&mut self, commit: Option<&str>) {
        self.fail_fetch_on = commit.map(str::to_string);
    }

    /// Invocations of `program` whose first argument after any `-C <dir>` is `subcommand`.
    pub fn count(&self, program: &str, subcommand: &str) -> usize {
        self.log
            .iter()
            .filter(|inv| inv.program == program && strip_dir(inv).first() == Some(&subcommand))
            .count()
    }

    fn outcome(&self, succeeded: bool, elapsed: Duration, stdout: String) -> Outcome {
        Outcome {
            succeeded,
            exit_code: Some(if succeeded { 0 } else { 1 }),
            elapsed,
            stdout,
            stderr: if succeeded {
                String::new()
            } else {
                "simulated failure".to_string()
            },
        }
    }

    fn ok(&self, stdout: String) -> Result<Outcome> {
        Ok(self.outcome(true, Duration::ZERO, stdout))
    }

    fn git(&mut self, args: &[&str]) -> Result<Outcome> {
        match args {
            ["rev-list", ..] => {
                let lines: Vec<String> = self
                    .commits
                    .iter()
                    .enumerate()
                    .map(|(i, c)| match self.commits.get(i + 1) {
                        Some(parent) => format!("{c} {parent}"),
                        None => c.clone(),
                    })
                    .collect();
                self.ok(lines.join("\n") + "\n")
            }
            ["log", .., id] => self.ok(format!("Author {id}\nMessage of {id}\n\nDetails.\n")),
            ["diff", parent, id, "--", path] => {
                assert!(
                    self.commits.iter().any(|c| c == parent),
                    "diff against unknown parent {parent}"
                );
                let diff = self
                    .diffs
                    .get(&(id.to_string(), path.to_string()))
                    .cloned()
                    .unwrap_or_default();
                self.ok(diff)
            }
            ["checkout", id] => {
                if self.commits.iter().any(|c| c == id) {
                    self.checked_out = Some(id.to_string());
                    self.since_checkout = 0;
                    self.ok(String::new())
                } else {
                    Ok(self.outcome(false, Duration::ZERO, String::new()))
                }
            }
            ["remote", "get-url", _] => self.ok("git@github.com:acme/solver.git\n".to_string()),
            other => panic!("unexpected git invocation {other:?}"),
        }
    }

    fn cargo(&mut self, invocation: &Invocation, args: &[&str]) -> Result<Outcome> {
        match args.first().copied() {
            Some("clean") => self.ok(String::new()),
            Some("fetch") => {
                let fails = self.fail_fetch_on.is_some() && self.fail_fetch_on == self.checked_out;
                Ok(self.outcome(!fails, Duration::ZERO, String::new()))
            }
            Some("metadata") => self.ok(self.metadata.clone()),
            Some("check") | Some("build") | Some("test") => {
                let call = TimedCall {
                    commit: self.checked_out.clone(),
                    invocation: invocation.clone(),
                    nth_since_checkout: self.since_checkout,
                    nth_overall: self.overall,
                };
                self.since_checkout += 1;
                self.overall += 1;

                let secs = self.runtime.sample(&mut self.rng).max(0.001);
                let failed = (self.fail_when)(&call);
                Ok(self.outcome(!failed, Duration::from_secs_f64(secs), String::new()))
            }
            other => panic!("unexpected cargo invocation {other:?}"),
        }
    }
}

fn strip_dir(inv: &Invocation) -> Vec<&str> {
    let args: Vec<&str> = inv.args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["-C", _, rest @ ..] => rest.to_vec(),
        _ => args,
    }
}

impl CommandRunner for FakeRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<Outcome> {
        self.log.push(invocation.clone());
        let args = strip_dir(invocation);
        match invocation.program.as_str() {
            "git" => self.git(&args),
            "cargo" => self.cargo(invocation, &args),
            _ => Err(Error::Spawn {
                command: invocation.to_string(),
                source: std::io::ErrorKind::NotFound.into(),
            }),
        }
    }
}
