/// Typed process invocation. Nothing here goes through `sh -c`.
use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::{Duration, Instant},
};

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Collect stdout/stderr instead of streaming them to the console.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Invocation {
            program: program.to_string(),
            args: vec![],
            cwd: None,
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

/// For log lines only.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub succeeded: bool,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandRunner {
    /// Runs to completion. `Err` only if the process could not be started or waited on;
    /// a non-zero exit is reported through `Outcome::succeeded`.
    fn run(&mut self, invocation: &Invocation) -> Result<Outcome>;
}

#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<Outcome> {
        debug!(command = %invocation, "running");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let spawn_err = |source| Error::Spawn {
            command: invocation.to_string(),
            source,
        };

        let start = Instant::now();
        if invocation.capture {
            let output = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .map_err(spawn_err)?;
            let elapsed = start.elapsed();

            Ok(Outcome {
                succeeded: output.status.success(),
                exit_code: output.status.code(),
                elapsed,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd
                .stdin(Stdio::null())
                .status()
                .map_err(spawn_err)?;
            let elapsed = start.elapsed();

            Ok(Outcome {
                succeeded: status.success(),
                exit_code: status.code(),
                elapsed,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }
}

/// Runs a step the harness cannot continue without.
pub fn require_success<R: CommandRunner>(
    runner: &mut R,
    invocation: &Invocation,
) -> Result<Outcome> {
    let outcome = runner.run(invocation)?;
    if !outcome.succeeded {
        return Err(Error::Collaborator {
            command: invocation.to_string(),
            code: outcome.exit_code,
            stderr: outcome.stderr,
        });
    }
    Ok(outcome)
}
