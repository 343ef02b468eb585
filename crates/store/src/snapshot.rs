//! Whole-file JSON snapshots written via temp file + rename.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::StoreError;

/// Sibling temp path: `dir/.name.tmp`.
fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

/// Atomically write `value` as pretty JSON to `path`.
///
/// Writes to a `.tmp` file first, then renames to the final path so a
/// reader never sees a partial file.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, json)?;
    restrict_permissions(&tmp_path)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Snapshots hold contact details and SMTP credentials: owner-only access.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_creates_parent_and_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();

        let back: Vec<i32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn overwrite_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        write_json(&path, &vec!["a", "b"]).unwrap();
        write_json(&path, &vec!["c"]).unwrap();

        let back: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec!["c"]);
    }

    #[test]
    fn tmp_path_is_hidden_sibling() {
        let p = tmp_path_for(Path::new("/data/tasks.json"));
        assert_eq!(p, PathBuf::from("/data/.tasks.json.tmp"));
    }

    #[cfg(unix)]
    #[test]
    fn snapshot_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email_settings.json");
        write_json(&path, &serde_json::json!({})).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
