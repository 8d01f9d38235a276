use std::path::{Path, PathBuf};

/// Settings for walking history. Relative paths are taken from the workspace root.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub root: PathBuf,
    /// Branch or ref whose first-parent history is walked
    pub reference: String,
    pub cache_path: PathBuf,
    pub report_path: PathBuf,
    /// Rewritten between the cold and incremental timings
    pub touch_file: PathBuf,
    /// Files whose diffs are flagged in the report
    pub manifests: Vec<String>,
    /// Prefix a commit id is appended to for report links
    pub link_base: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            root: PathBuf::from("."),
            reference: "main".to_string(),
            cache_path: PathBuf::from("cache/results.json"),
            report_path: PathBuf::from("outputs/compile_times.html"),
            touch_file: PathBuf::from("src/main.rs"),
            manifests: vec!["Cargo.toml".to_string(), "Cargo.lock".to_string()],
            link_base: None,
        }
    }
}

impl HistoryConfig {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub root: PathBuf,
    pub repeats: usize,
    /// Random if not given; the one used is always logged.
    pub seed: Option<u64>,
    /// Time targets and modes in discovery order instead of shuffling.
    pub fixed_order: bool,
    /// Falls back to the current directory if missing
    pub output_dir: PathBuf,
    pub report_file: String,
    pub samples_file: String,
    pub progress: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            root: PathBuf::from("."),
            repeats: 3,
            seed: None,
            fixed_order: false,
            output_dir: PathBuf::from("outputs"),
            report_file: "iteration_health.txt".to_string(),
            samples_file: "iteration_health_samples.json".to_string(),
            progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_paths_resolve_under_root() {
        let config = HistoryConfig {
            root: PathBuf::from("/ws"),
            ..HistoryConfig::default()
        };
        assert_eq!(
            config.resolve(&config.cache_path),
            PathBuf::from("/ws/cache/results.json")
        );
        assert_eq!(
            config.resolve(Path::new("/abs/report.html")),
            PathBuf::from("/abs/report.html")
        );
    }
}
