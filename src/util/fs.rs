use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Replaces the contents of `path` with `bytes` in a single rename.
///
/// The bytes land in a hidden sibling file first and are synced before the
/// rename, so a reader sees either the old file or the complete new one. The
/// sibling is removed if any step after its creation fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let staging = staging_path(path);
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staging)
        .with_context(|| format!("Failed to create '{}'", staging.display()))?;

    let finished = fill_and_sync(file, &staging, bytes).and_then(|()| {
        fs::rename(&staging, path).with_context(|| {
            format!(
                "Failed to move '{}' into place at '{}'",
                staging.display(),
                path.display()
            )
        })
    });
    if finished.is_err() {
        let _ = fs::remove_file(&staging);
    }
    finished
}

fn fill_and_sync(mut file: File, staging: &Path, bytes: &[u8]) -> Result<()> {
    file.write_all(bytes)
        .with_context(|| format!("Failed to write '{}'", staging.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync '{}' to disk", staging.display()))
}

/// `dir/.name.<pid>.<nanos>.tmp` next to `path`; the rename stays on one filesystem.
fn staging_path(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.{nanos:x}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("linkfeed_atomic_write_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_creates_file() {
        let dir = scratch_dir("create");
        let path = dir.join("feed.xml");

        atomic_write(&path, b"<rss/>").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"<rss/>");
        assert_eq!(entries(&dir), vec!["feed.xml"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_replaces_existing_file() {
        let dir = scratch_dir("replace");
        let path = dir.join("feed.xml");
        fs::write(&path, "a much longer previous document").unwrap();

        atomic_write(&path, b"short").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
        assert_eq!(entries(&dir), vec!["feed.xml"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory_fails_cleanly() {
        let dir = scratch_dir("missing");
        let path = dir.join("absent").join("feed.xml");

        assert!(atomic_write(&path, b"x").is_err());
        assert!(!path.exists());
        assert!(entries(&dir).is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rename_onto_directory_cleans_up() {
        let dir = scratch_dir("onto_dir");
        let path = dir.join("taken");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        // Renaming a file over a non-empty directory fails on every platform
        assert!(atomic_write(&path, b"x").is_err());
        assert_eq!(entries(&dir), vec!["taken"]);
        let _ = fs::remove_dir_all(&dir);
    }
}
