//! Exclusive per-process claim on a data directory.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use fs4::fs_std::FileExt;
use tracing::debug;

use crate::error::StoreError;

const LOCK_FILE: &str = ".nudge.lock";

/// Advisory lock on `data_dir/.nudge.lock`, released when the file is
/// closed on drop.
///
/// Each process keeps its own in-memory copy of the task list and writes
/// the whole snapshot back, so only one process may own a data directory.
#[derive(Debug)]
pub struct DataDirLock {
    _file: File,
}

impl DataDirLock {
    /// Claim `data_dir`, creating it if needed. Fails with
    /// [`StoreError::DataDirInUse`] if another process holds the lock.
    pub fn acquire(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => {
                return Err(StoreError::DataDirInUse(data_dir.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        debug!(path = %path.display(), "data directory locked");
        Ok(Self { _file: file })
    }
}

#[cfg(windows)]
const ERROR_LOCK_VIOLATION: i32 = 33;

fn is_contended(e: &io::Error) -> bool {
    #[cfg(windows)]
    if e.raw_os_error() == Some(ERROR_LOCK_VIOLATION) {
        return true;
    }
    e.kind() == io::ErrorKind::WouldBlock
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_claim_is_refused_until_first_is_dropped() {
        let dir = TempDir::new().unwrap();
        let first = DataDirLock::acquire(dir.path()).unwrap();
        assert!(dir.path().join(LOCK_FILE).exists());

        let err = DataDirLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::DataDirInUse(_)));
        assert!(err.to_string().contains("in use by another nudge process"));

        drop(first);
        DataDirLock::acquire(dir.path()).unwrap();
    }

    #[test]
    fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let _lock = DataDirLock::acquire(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(nested.join(LOCK_FILE).is_file());
    }
}
