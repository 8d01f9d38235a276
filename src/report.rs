/// Rendering of the historical HTML table and the iteration-health text report.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::git::Commit;
use crate::sampler::SampleMatrix;
use crate::store::MeasurementRecord;
use crate::timing::Timing;

/// Shown for a failed, skipped or missing measurement.
pub const ABSENT: &str = "-";

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub commit: Commit,
    pub record: Option<MeasurementRecord>,
}

const HISTORY_COLUMNS: [&str; 4] = [
    "cargo check from scratch",
    "cargo build",
    "cargo check incremental",
    "cargo build incremental",
];

const STYLE: &str = r#"
    <style>
        table {
            margin-top: 100px;
            border-collapse: collapse;
            font-family: monospace;
        }
        th.diag > div {
            transform: translate(5px, 0px) rotate(-30deg);
            width: 25px;
            white-space: nowrap;
        }
        td.num {
            text-align: right;
            padding: 0 6px;
        }
        td.failed {
            color: #b00;
        }
        td.missing {
            color: #aaa;
        }
    </style>
"#;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn timing_cell(timing: &Timing) -> String {
    match timing {
        Timing::Succeeded(d) => format!("<td class=\"num\">{:.2}</td>", d.as_secs_f64()),
        Timing::Failed => format!("<td class=\"num failed\">{ABSENT}</td>"),
        Timing::NotAttempted => format!("<td class=\"num missing\">{ABSENT}</td>"),
    }
}

/// "Cargo.lock" -> "lock"
fn manifest_marker(path: &str) -> &str {
    Path::new(path)
        .extension()
        .or_else(|| Path::new(path).file_name())
        .and_then(|s| s.to_str())
        .unwrap_or(path)
}

/// One row per walked commit, in walk order.
pub fn history_html(rows: &[HistoryRow], link_base: Option<&str>) -> String {
    let mut s = String::new();
    s.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    s.push_str("<title>Compile times</title>\n");
    s.push_str(STYLE);
    s.push_str("</head>\n<body>\n<table>\n<tr>\n");
    for column in HISTORY_COLUMNS {
        let _ = writeln!(s, "<th class=\"diag\"><div>{column}</div></th>");
    }
    s.push_str("</tr>\n");

    for row in rows {
        let commit = &row.commit;
        let _ = writeln!(s, "<tr id=\"{}\">", escape_html(&commit.id));

        match &row.record {
            Some(r) => {
                for timing in [&r.check, &r.build, &r.check2, &r.build2] {
                    s.push_str(&timing_cell(timing));
                    s.push('\n');
                }
            }
            None => {
                for _ in HISTORY_COLUMNS {
                    s.push_str(&timing_cell(&Timing::NotAttempted));
                    s.push('\n');
                }
            }
        }

        for (path, diff) in &commit.diffs {
            if diff.is_empty() {
                s.push_str("<td></td>\n");
            } else {
                let _ = writeln!(
                    s,
                    "<td title=\"{}\">{}</td>",
                    escape_html(diff),
                    escape_html(manifest_marker(path))
                );
            }
        }

        let href = match link_base {
            Some(base) => format!("{base}{}", commit.id),
            None => format!("#{}", commit.id),
        };
        let _ = writeln!(
            s,
            "<td title=\"{}\"><a href=\"{}\">{}</a></td>",
            escape_html(&commit.message),
            escape_html(&href),
            escape_html(commit.first_line())
        );
        let _ = writeln!(s, "<td>{}</td>", escape_html(&commit.author));
        s.push_str("</tr>\n");
    }

    s.push_str("</table>\n</body>\n</html>\n");
    s
}

/// Column legend followed by one line of per-mode means per source target.
pub fn health_table(matrix: &SampleMatrix) -> String {
    let mut s = String::new();
    let modes = matrix.modes();

    for (i, op) in modes.iter().enumerate() {
        let _ = writeln!(s, "    {},- {}", "|     ".repeat(i), op.describe());
    }
    let _ = writeln!(s, "    {}  after touching...", "|     ".repeat(modes.len()));

    for (t, target) in matrix.targets().iter().enumerate() {
        for m in 0..modes.len() {
            match matrix.summary(t, m) {
                Some(summary) => {
                    let _ = write!(s, "{:>6.1}", summary.mean);
                }
                None => {
                    let _ = write!(s, "{:>6}", "n/a");
                }
            }
        }
        let _ = writeln!(s, "   {}", target.relative.display());
    }
    s
}

#[derive(Debug, Serialize)]
pub struct SampleDump {
    pub seed: Option<u64>,
    pub repeats: usize,
    pub targets: Vec<TargetSamples>,
}

#[derive(Debug, Serialize)]
pub struct TargetSamples {
    pub path: PathBuf,
    pub modes: Vec<ModeSamples>,
}

#[derive(Debug, Serialize)]
pub struct ModeSamples {
    pub mode: String,
    /// Seconds, in execution order
    pub samples: Vec<f64>,
    pub failures: usize,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
}

/// Every raw sample sequence of the run, for later inspection.
pub fn sample_dump(matrix: &SampleMatrix, seed: Option<u64>, repeats: usize) -> SampleDump {
    let targets = matrix
        .targets()
        .iter()
        .enumerate()
        .map(|(t, target)| TargetSamples {
            path: target.relative.clone(),
            modes: matrix
                .modes()
                .iter()
                .enumerate()
                .map(|(m, op)| {
                    let summary = matrix.summary(t, m);
                    ModeSamples {
                        mode: op.label().to_string(),
                        samples: matrix
                            .samples(t, m)
                            .iter()
                            .map(|d| d.as_secs_f64())
                            .collect(),
                        failures: matrix.failures(t, m),
                        mean: summary.map(|s| s.mean),
                        variance: summary.map(|s| s.variance),
                    }
                })
                .collect(),
        })
        .collect();

    SampleDump {
        seed,
        repeats,
        targets,
    }
}

/// `file` inside `preferred` if that directory exists, otherwise in the current directory.
pub fn output_path(preferred: &Path, file: &str) -> PathBuf {
    if preferred.is_dir() {
        preferred.join(file)
    } else {
        PathBuf::from(file)
    }
}
