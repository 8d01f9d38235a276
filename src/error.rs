use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// A version-control or dependency step that the harness cannot continue without.
    #[error("`{command}` failed with exit code {code:?}\n{stderr}")]
    Collaborator {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No result cache at {0}. Run `measure` first.")]
    CacheMissing(PathBuf),

    #[error("Result cache {path} is malformed: {source}")]
    MalformedCache {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Commit {0} already has a measurement record")]
    DuplicateRecord(String),

    #[error("Touching {path} did not advance its modification time")]
    Touch { path: PathBuf },

    #[error("Unexpected output from `{command}`: {detail}")]
    UnexpectedOutput { command: String, detail: String },
}

pub type Result<T> = std::result::Result<T, Error>;
