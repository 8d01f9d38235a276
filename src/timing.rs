use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::shell::{CommandRunner, Invocation};

/// Result of one timed build-driver invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Succeeded(Duration),
    Failed,
    #[default]
    NotAttempted,
}

impl Timing {
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Timing::Succeeded(d) => Some(*d),
            Timing::Failed | Timing::NotAttempted => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Timing::Succeeded(_))
    }

    pub fn seconds(&self) -> Option<f64> {
        self.duration().map(|d| d.as_secs_f64())
    }
}

/// Times one build. A build that exits non-zero is `Timing::Failed`, not an error.
pub fn run_timed<R: CommandRunner>(runner: &mut R, invocation: &Invocation) -> Result<Timing> {
    let outcome = runner.run(invocation)?;

    if outcome.succeeded {
        info!(
            command = %invocation,
            seconds = outcome.elapsed.as_secs_f64(),
            "timed"
        );
        Ok(Timing::Succeeded(outcome.elapsed))
    } else {
        warn!(command = %invocation, code = ?outcome.exit_code, "build failed");
        Ok(Timing::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::Outcome;

    struct Canned(Outcome);

    impl CommandRunner for Canned {
        fn run(&mut self, _: &Invocation) -> Result<Outcome> {
            Ok(self.0.clone())
        }
    }

    fn outcome(succeeded: bool) -> Outcome {
        Outcome {
            succeeded,
            exit_code: Some(if succeeded { 0 } else { 101 }),
            elapsed: Duration::from_millis(1500),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    #[test]
    fn success_reports_elapsed() {
        let timing = run_timed(&mut Canned(outcome(true)), &Invocation::new("cargo")).unwrap();
        assert_eq!(timing, Timing::Succeeded(Duration::from_millis(1500)));
        assert_eq!(timing.seconds(), Some(1.5));
    }

    #[test]
    fn nonzero_exit_is_not_an_error() {
        let timing = run_timed(&mut Canned(outcome(false)), &Invocation::new("cargo")).unwrap();
        assert_eq!(timing, Timing::Failed);
        assert_eq!(timing.duration(), None);
    }

    #[test]
    fn serde_keeps_all_three_states() {
        let all = vec![
            Timing::Succeeded(Duration::new(3, 250)),
            Timing::Failed,
            Timing::NotAttempted,
        ];
        let json = serde_json::to_string(&all).unwrap();
        let back: Vec<Timing> = serde_json::from_str(&json).unwrap();
        assert_eq!(all, back);
    }
}
