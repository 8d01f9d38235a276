use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use argh::FromArgs;
use build_telemetry::cargo::{BuildOp, Cargo};
use build_telemetry::config::HealthConfig;
use build_telemetry::logging;
use build_telemetry::permute::{FixedPermuter, Permuter, SeededPermuter};
use build_telemetry::report::{health_table, output_path, sample_dump};
use build_telemetry::sampler::{IterationSampler, SampleMatrix};
use build_telemetry::shell::SystemRunner;
use tracing::info;

/**
Incremental rebuild cost of touching each source file of the current checkout
*/
#[derive(FromArgs)]
struct Args {
    /// workspace root
    #[argh(option, short = 'C', default = "PathBuf::from(\".\")")]
    repo_path: PathBuf,

    /// rounds over every (file, build mode) pair
    #[argh(option, short = 'r', default = "3")]
    repeat: usize,

    /// seed for the shuffled schedule
    #[argh(option)]
    seed: Option<u64>,

    /// time files and modes in discovery order instead of shuffling
    #[argh(switch)]
    fixed_order: bool,

    /// directory for the reports, the current directory if it does not exist
    #[argh(option, default = "PathBuf::from(\"outputs\")")]
    output_dir: PathBuf,

    /// no progress bar
    #[argh(switch, short = 'q')]
    quiet: bool,
}

fn sample<P: Permuter>(config: &HealthConfig, permuter: P) -> anyhow::Result<SampleMatrix> {
    let cargo = Cargo::workspace(&config.root);
    let mut runner = SystemRunner;
    let targets = cargo
        .discover_targets(&mut runner)
        .context("discovering workspace targets")?;

    let matrix = IterationSampler::new(&mut runner, &cargo, permuter)
        .with_progress(config.progress)
        .run(&targets, &BuildOp::ITERATION, config.repeats)?;
    Ok(matrix)
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args: Args = argh::from_env();
    let very_start = Instant::now();

    let config = HealthConfig {
        root: args.repo_path,
        repeats: args.repeat,
        seed: args.seed,
        fixed_order: args.fixed_order,
        output_dir: args.output_dir,
        progress: !args.quiet,
        ..HealthConfig::default()
    };

    let seed = config.seed.unwrap_or_else(rand::random);
    let matrix = if config.fixed_order {
        info!("fixed order");
        sample(&config, FixedPermuter)?
    } else {
        info!(seed, "shuffled order");
        sample(&config, SeededPermuter::from_seed(seed))?
    };
    info!(seconds = very_start.elapsed().as_secs_f64(), "it took");

    let dump = sample_dump(&matrix, (!config.fixed_order).then_some(seed), config.repeats);
    let samples_path = output_path(&config.output_dir, &config.samples_file);
    fs::write(&samples_path, serde_json::to_string_pretty(&dump)?)
        .with_context(|| format!("writing {}", samples_path.display()))?;
    eprintln!("see individual measurements in {}", samples_path.display());

    let table = health_table(&matrix);
    let report_path = output_path(&config.output_dir, &config.report_file);
    fs::write(&report_path, &table)
        .with_context(|| format!("writing {}", report_path.display()))?;
    eprintln!();
    print!("{table}");

    Ok(())
}
