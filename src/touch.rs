use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use tracing::debug;

use crate::error::{Error, Result};

/// Used only when the clock has not passed the previous timestamp, or the filesystem
/// rounded `now` back down to it.
const MIN_BUMP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Touched {
    pub path: PathBuf,
    pub before: SystemTime,
    pub after: SystemTime,
}

/// Marks `path` as changed for cargo's mtime-based fingerprints without changing its content.
///
/// The file is rewritten byte-for-byte and then given an explicit modification time:
/// the current time, or one second past the previous timestamp if that is not later.
/// The new timestamp is read back; if it did not advance the touch is reported as an
/// error rather than silently producing a no-op perturbation.
pub fn touch(path: &Path) -> Result<Touched> {
    let before = fs::metadata(path)?.modified()?;
    let content = fs::read(path)?;
    fs::write(path, &content)?;

    let now = SystemTime::now();
    let mut after = set_mtime(path, if now > before { now } else { before + MIN_BUMP })?;
    if after <= before {
        after = set_mtime(path, before + MIN_BUMP)?;
    }
    if after <= before {
        return Err(Error::Touch {
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), "touched");
    Ok(Touched {
        path: path.to_path_buf(),
        before,
        after,
    })
}

/// Returns the timestamp as stored, after any filesystem rounding.
fn set_mtime(path: &Path, time: SystemTime) -> Result<SystemTime> {
    OpenOptions::new().write(true).open(path)?.set_modified(time)?;
    Ok(fs::metadata(path)?.modified()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_mtime_and_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        fs::write(&path, "fn main() {}\n").unwrap();

        let first = touch(&path).unwrap();
        assert!(first.after > first.before);

        // Back-to-back touches still advance.
        let second = touch(&path).unwrap();
        assert!(second.after > first.after);

        assert_eq!(fs::read_to_string(&path).unwrap(), "fn main() {}\n");
    }

    #[test]
    fn stale_file_is_stamped_now_not_in_the_future() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "pub fn f() {}\n").unwrap();
        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&path, hour_ago).unwrap();

        let touched = touch(&path).unwrap();
        assert!(touched.after > touched.before);
        assert!(touched.after <= SystemTime::now());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(touch(&dir.path().join("absent.rs")).is_err());
    }
}
