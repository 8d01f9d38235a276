/// Historical mode: cold and incremental build cost of every first-parent commit.
use tracing::{info, warn};

use crate::cargo::{BuildOp, Cargo};
use crate::config::HistoryConfig;
use crate::error::Result;
use crate::git::Git;
use crate::report::HistoryRow;
use crate::shell::CommandRunner;
use crate::store::{MeasurementRecord, ResultStore};
use crate::timing::run_timed;
use crate::touch::touch;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub measured: usize,
    pub skipped: usize,
}

/// Times the currently checked-out tree. Every timing is attempted regardless of
/// earlier failures. A tree without the touch file keeps its cold timings and
/// leaves the incremental pair `NotAttempted`.
pub fn measure_commit<R: CommandRunner>(
    runner: &mut R,
    cargo: &Cargo,
    commit: &str,
    config: &HistoryConfig,
) -> Result<MeasurementRecord> {
    cargo.clean(runner)?;
    cargo.fetch_locked(runner)?;

    let mut record = MeasurementRecord::new(commit);

    info!("check");
    record.check = run_timed(runner, &cargo.invocation(BuildOp::Check))?;
    info!("build");
    record.build = run_timed(runner, &cargo.invocation(BuildOp::Build))?;
    info!("test");
    record.test = run_timed(runner, &cargo.invocation(BuildOp::Test))?;
    info!("test2");
    record.test2 = run_timed(runner, &cargo.invocation(BuildOp::Test))?;

    let touch_file = config.resolve(&config.touch_file);
    if let Err(e) = touch(&touch_file) {
        warn!(
            path = %touch_file.display(),
            error = %e,
            "touch failed, skipping incremental timings"
        );
        return Ok(record);
    }

    info!("check2");
    record.check2 = run_timed(runner, &cargo.invocation(BuildOp::Check))?;
    info!("build2");
    record.build2 = run_timed(runner, &cargo.invocation(BuildOp::Build))?;

    Ok(record)
}

/// Measures every commit of the walk that the store does not know yet.
/// The store is persisted after each commit, so an interrupted walk resumes
/// where it stopped.
pub fn measure_history<R: CommandRunner, S: ResultStore>(
    runner: &mut R,
    store: &mut S,
    config: &HistoryConfig,
) -> Result<WalkSummary> {
    let git = Git::new(&config.root);
    let cargo = Cargo::historical(&config.root);
    let commits = git.history(runner, &config.reference)?;
    let mut summary = WalkSummary::default();

    for (i, commit) in commits.iter().enumerate() {
        info!(index = i, total = commits.len(), commit = %commit.id, "{}", "*".repeat(50));
        if store.contains(&commit.id) {
            info!("skip");
            summary.skipped += 1;
            continue;
        }

        git.checkout(runner, &commit.id)?;
        let record = measure_commit(runner, &cargo, &commit.id, config)?;
        info!(?record, "measured");
        store.append(record)?;
        summary.measured += 1;
    }

    Ok(summary)
}

/// Report rows in walk order, whether or not a commit has been measured.
pub fn history_rows<R: CommandRunner, S: ResultStore>(
    runner: &mut R,
    store: &S,
    config: &HistoryConfig,
) -> Result<Vec<HistoryRow>> {
    let git = Git::new(&config.root);
    git.history(runner, &config.reference)?
        .iter()
        .map(|walked| {
            let commit = git.commit(runner, walked, &config.manifests)?;
            info!(author = %commit.author, "{}", commit.first_line());
            Ok(HistoryRow {
                record: store.get(&commit.id).cloned(),
                commit,
            })
        })
        .collect()
}
