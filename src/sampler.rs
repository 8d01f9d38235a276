/// Randomized (source unit × build operation) timing matrix for the current checkout.
use std::{
    io::{self, Write},
    time::Duration,
};

use tracing::{info, warn};

use crate::cargo::{BuildOp, Cargo, SourceTarget};
use crate::error::Result;
use crate::permute::Permuter;
use crate::shell::{require_success, CommandRunner};
use crate::stats::Summary;
use crate::timing::{run_timed, Timing};
use crate::touch::touch;

/// One timed operation, in the order it was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub round: usize,
    /// Index into `SampleMatrix::targets`
    pub target: usize,
    /// Index into `SampleMatrix::modes`
    pub mode: usize,
}

#[derive(Debug, Clone)]
pub struct SampleMatrix {
    targets: Vec<SourceTarget>,
    modes: Vec<BuildOp>,
    /// Row-major by target, one entry per mode
    attempts: Vec<Vec<Timing>>,
    schedule: Vec<Slot>,
}

impl SampleMatrix {
    pub fn new(targets: &[SourceTarget], modes: &[BuildOp]) -> Self {
        SampleMatrix {
            targets: targets.to_vec(),
            modes: modes.to_vec(),
            attempts: vec![vec![]; targets.len() * modes.len()],
            schedule: vec![],
        }
    }

    fn cell(&self, target: usize, mode: usize) -> usize {
        target * self.modes.len() + mode
    }

    pub fn record(&mut self, slot: Slot, timing: Timing) {
        let cell = self.cell(slot.target, slot.mode);
        self.attempts[cell].push(timing);
        self.schedule.push(slot);
    }

    pub fn targets(&self) -> &[SourceTarget] {
        &self.targets
    }

    pub fn modes(&self) -> &[BuildOp] {
        &self.modes
    }

    /// Number of (target, mode) pairs.
    pub fn entries(&self) -> usize {
        self.attempts.len()
    }

    pub fn attempts(&self, target: usize, mode: usize) -> &[Timing] {
        &self.attempts[self.cell(target, mode)]
    }

    /// Successful timings only; a failed attempt contributes nothing.
    pub fn samples(&self, target: usize, mode: usize) -> Vec<Duration> {
        self.attempts(target, mode)
            .iter()
            .filter_map(Timing::duration)
            .collect()
    }

    pub fn failures(&self, target: usize, mode: usize) -> usize {
        self.attempts(target, mode)
            .iter()
            .filter(|t| matches!(t, Timing::Failed))
            .count()
    }

    pub fn summary(&self, target: usize, mode: usize) -> Option<Summary> {
        Summary::of(&self.samples(target, mode))
    }

    pub fn schedule(&self) -> &[Slot] {
        &self.schedule
    }
}

/// Dot-per-operation progress bar on stderr.
struct Progress {
    enabled: bool,
}

impl Progress {
    fn start(&self, total: usize) {
        if self.enabled {
            eprintln!("[{}]", " ".repeat(total));
            eprint!("[");
            let _ = io::stderr().flush();
        }
    }

    fn tick(&self) {
        if self.enabled {
            eprint!(".");
            let _ = io::stderr().flush();
        }
    }

    fn finish(&self) {
        if self.enabled {
            eprintln!("]");
        }
    }
}

/// Execution order of one round: targets by position, then the mode order of
/// each target, indexed by target.
struct RoundOrder {
    targets: Vec<usize>,
    modes: Vec<Vec<usize>>,
}

pub struct IterationSampler<'a, R: CommandRunner, P: Permuter> {
    runner: &'a mut R,
    cargo: &'a Cargo,
    permuter: P,
    progress: Progress,
}

impl<'a, R: CommandRunner, P: Permuter> IterationSampler<'a, R, P> {
    pub fn new(runner: &'a mut R, cargo: &'a Cargo, permuter: P) -> Self {
        IterationSampler {
            runner,
            cargo,
            permuter,
            progress: Progress { enabled: false },
        }
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress.enabled = enabled;
        self
    }

    /// Untimed pass over every mode so first-ever compilation is not measured.
    pub fn warm_up(&mut self, modes: &[BuildOp]) -> Result<()> {
        for op in modes {
            let inv = self.cargo.invocation(*op);
            info!(command = %inv, "warm-up");
            require_success(&mut *self.runner, &inv)?;
        }
        Ok(())
    }

    /// Orders for one round. Given the first round's orders, every (target, mode)
    /// pair is moved off the position it held there: the target order is
    /// rearranged when there are two or more targets, otherwise the mode order is.
    fn round_order(
        &mut self,
        targets: usize,
        modes: usize,
        first: Option<&RoundOrder>,
    ) -> RoundOrder {
        let target_order = match first {
            Some(first) if targets >= 2 => self.permuter.rearrange(&first.targets),
            _ => self.permuter.permutation(targets),
        };
        let mut mode_orders = Vec::with_capacity(targets);
        for target in 0..targets {
            mode_orders.push(match first {
                Some(first) if targets == 1 => self.permuter.rearrange(&first.modes[target]),
                _ => self.permuter.permutation(modes),
            });
        }
        RoundOrder {
            targets: target_order,
            modes: mode_orders,
        }
    }

    /// Warm up, then for each round touch every target in random order and time
    /// every mode in random order after each touch.
    ///
    /// The second round never puts a pair in the slot it had in the first, so with
    /// two or more rounds no pair keeps one slot throughout. A single (target, mode)
    /// pair has only one slot and is the exception.
    pub fn run(
        &mut self,
        targets: &[SourceTarget],
        modes: &[BuildOp],
        repeats: usize,
    ) -> Result<SampleMatrix> {
        self.warm_up(modes)?;

        let mut matrix = SampleMatrix::new(targets, modes);
        info!(
            targets = targets.len(),
            modes = modes.len(),
            repeats,
            "measuring incremental build times"
        );
        if repeats >= 2 && targets.len() * modes.len() == 1 {
            warn!("only one (target, mode) pair, its slot cannot vary between rounds");
        }
        self.progress.start(repeats * targets.len() * modes.len());

        let mut first: Option<RoundOrder> = None;
        for round in 0..repeats {
            let against = if round == 1 { first.as_ref() } else { None };
            let order = self.round_order(targets.len(), modes.len(), against);

            for &target in &order.targets {
                touch(&targets[target].path)?;

                for &mode in &order.modes[target] {
                    let inv = self.cargo.invocation(modes[mode]).captured();
                    let timing = run_timed(&mut *self.runner, &inv)?;
                    matrix.record(
                        Slot {
                            round,
                            target,
                            mode,
                        },
                        timing,
                    );
                    self.progress.tick();
                }
            }

            if round == 0 {
                first = Some(order);
            }
        }

        self.progress.finish();
        Ok(matrix)
    }
}
