//! Runtime directory layout under the prefix path.
//!
//! ```text
//! <prefix>/
//!   run/upmon.pid
//!   log/
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const RUN_DIR: &str = "run";
pub const LOG_DIR: &str = "log";
pub const PID_FILE: &str = "upmon.pid";

/// Directories resolved under the prefix
#[derive(Debug, Clone)]
pub struct RuntimeDirs {
    pub prefix: PathBuf,
    pub run: PathBuf,
    pub log: PathBuf,
    /// Paths that could not be created because a regular file occupies them
    pub blocked: Vec<PathBuf>,
}

impl RuntimeDirs {
    pub fn is_usable(&self, dir: &Path) -> bool {
        !self.blocked.iter().any(|blocked| blocked == dir)
    }
}

/// Create `dir` (with parents) unless it exists.
///
/// Returns `false` when a non-directory already occupies the path; it is left
/// untouched.
fn dir_exists_or_mkdir(dir: &Path) -> io::Result<bool> {
    match fs::metadata(dir) {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir)?;
            Ok(true)
        }
        Err(error) => Err(error),
    }
}

/// Make sure `<prefix>`, `<prefix>/run` and `<prefix>/log` exist
pub fn ensure_initialized(prefix: impl AsRef<Path>) -> io::Result<RuntimeDirs> {
    let prefix = prefix.as_ref().to_path_buf();
    let mut dirs = RuntimeDirs {
        run: prefix.join(RUN_DIR),
        log: prefix.join(LOG_DIR),
        prefix,
        blocked: Vec::new(),
    };

    for dir in [dirs.prefix.clone(), dirs.run.clone(), dirs.log.clone()] {
        if !dir_exists_or_mkdir(&dir)? {
            dirs.blocked.push(dir);
        }
    }

    Ok(dirs)
}

/// Pid file removed again when dropped
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(run_dir: &Path) -> io::Result<Self> {
        let path = run_dir.join(PID_FILE);
        fs::write(&path, format!("{}\n", std::process::id()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_layout() {
        let temp = tempdir().unwrap();
        let prefix = temp.path().join("upmon");

        let dirs = ensure_initialized(&prefix).unwrap();

        assert!(prefix.is_dir());
        assert!(dirs.run.is_dir());
        assert!(dirs.log.is_dir());
        assert!(dirs.blocked.is_empty());
    }

    #[test]
    fn test_existing_layout_is_kept() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("log")).unwrap();
        fs::write(temp.path().join("log/keep.log"), "x").unwrap();

        ensure_initialized(temp.path()).unwrap();

        assert!(temp.path().join("log/keep.log").exists());
    }

    #[test]
    fn test_file_in_place_of_directory_is_left_alone() {
        let temp = tempdir().unwrap();
        let run = temp.path().join("run");
        fs::write(&run, "not a directory").unwrap();

        let dirs = ensure_initialized(temp.path()).unwrap();

        assert!(run.is_file());
        assert_eq!(dirs.blocked, vec![run.clone()]);
        assert!(!dirs.is_usable(&run));
        assert!(dirs.is_usable(&dirs.log));
        assert!(dirs.log.is_dir());
    }

    #[test]
    fn test_pid_file_lifecycle() {
        let temp = tempdir().unwrap();
        let dirs = ensure_initialized(temp.path()).unwrap();

        let pid_file = PidFile::create(&dirs.run).unwrap();
        let path = pid_file.path().to_path_buf();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());

        drop(pid_file);
        assert!(!path.exists());
    }
}
