use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;
use build_telemetry::config::HistoryConfig;
use build_telemetry::git::{commit_link_base, Git};
use build_telemetry::history::{history_rows, measure_history};
use build_telemetry::logging;
use build_telemetry::report::history_html;
use build_telemetry::shell::SystemRunner;
use build_telemetry::store::JsonFileStore;
use tracing::{info, warn};

/**
Compile times across project history
*/
#[derive(FromArgs)]
struct Args {
    /// workspace root
    #[argh(option, short = 'C', default = "PathBuf::from(\".\")")]
    repo_path: PathBuf,

    /// branch whose first-parent history is walked
    #[argh(option, default = "String::from(\"main\")")]
    reference: String,

    /// result cache, relative to the workspace root
    #[argh(option)]
    cache: Option<PathBuf>,

    #[argh(subcommand)]
    subcommand: SubCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommands {
    Measure(MeasureOptions),
    Render(RenderOptions),
}

#[derive(FromArgs)]
/// time every commit not yet in the cache (checks out each commit; takes a long time)
#[argh(subcommand, name = "measure")]
struct MeasureOptions {
    /// file rewritten before the incremental timings
    #[argh(option)]
    touch: Option<PathBuf>,
}

#[derive(FromArgs)]
/// write the HTML report from the cache
#[argh(subcommand, name = "render")]
struct RenderOptions {
    /// report path, relative to the workspace root
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// url prefix for commit links, e.g. https://github.com/owner/repo/commit/
    #[argh(option)]
    link_base: Option<String>,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args: Args = argh::from_env();

    let mut config = HistoryConfig {
        root: args.repo_path,
        reference: args.reference,
        ..HistoryConfig::default()
    };
    if let Some(cache) = args.cache {
        config.cache_path = cache;
    }
    let cache_path = config.resolve(&config.cache_path);
    let mut runner = SystemRunner;

    match args.subcommand {
        SubCommands::Measure(opts) => {
            if let Some(touch) = opts.touch {
                config.touch_file = touch;
            }
            let mut store = JsonFileStore::load(&cache_path)
                .with_context(|| format!("loading {}", cache_path.display()))?;
            let summary = measure_history(&mut runner, &mut store, &config)?;
            info!(
                measured = summary.measured,
                skipped = summary.skipped,
                cache = %cache_path.display(),
                "done"
            );
        }
        SubCommands::Render(opts) => {
            if let Some(output) = opts.output {
                config.report_path = output;
            }
            config.link_base = match opts.link_base {
                Some(base) => Some(base),
                None => match Git::new(&config.root).remote_url(&mut runner, "origin") {
                    Ok(url) => commit_link_base(&url),
                    Err(e) => {
                        warn!("no origin remote, commit links stay local: {e}");
                        None
                    }
                },
            };

            let store = JsonFileStore::open_existing(&cache_path)?;
            let rows = history_rows(&mut runner, &store, &config)?;
            let html = history_html(&rows, config.link_base.as_deref());

            let report_path = config.resolve(&config.report_path);
            if let Some(dir) = report_path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&report_path, html)
                .with_context(|| format!("writing {}", report_path.display()))?;
            println!("see {}", report_path.display());
        }
    }

    Ok(())
}
