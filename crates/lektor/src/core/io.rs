//! Filesystem helpers of the pipeline runner.

use crate::{LektorError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fallback used when the configured workdir can't be created.
pub const FALLBACK_WORKDIR: &str = "lektor-workdir";

/// Traverse a directory and return all file paths matching a filter.
///
/// # Errors
///
/// Returns `LektorError::Validation` if `dir` is not a directory and
/// `LektorError::Io` for I/O errors.
pub fn traverse_directory<F>(dir: impl AsRef<Path>, recursive: bool, filter: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LektorError::validation(format!(
            "Path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    traverse_directory_impl(dir, recursive, &filter, &mut files)?;
    Ok(files)
}

fn traverse_directory_impl<F>(dir: &Path, recursive: bool, filter: &F, files: &mut Vec<PathBuf>) -> Result<()>
where
    F: Fn(&Path) -> bool,
{
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            if filter(&path) {
                files.push(path);
            }
        } else if path.is_dir() && recursive {
            traverse_directory_impl(&path, recursive, filter, files)?;
        }
    }
    Ok(())
}

/// Input files below `dir` whose name ends with one of `extensions`, sorted.
///
/// Extensions match as case-sensitive name suffixes.
pub fn input_sorted(dir: impl AsRef<Path>, extensions: &[String], recursive: bool) -> Result<Vec<PathBuf>> {
    let suffixes: Vec<&str> = extensions.iter().map(|e| e.trim()).filter(|e| !e.is_empty()).collect();
    let mut paths = traverse_directory(dir, recursive, |path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| suffixes.iter().any(|s| name.ends_with(s)))
    })?;
    paths.sort();
    Ok(paths)
}

fn clean_directory(dir: &Path) -> Result<()> {
    tracing::info!("clean existing workdir '{}'", dir.display());
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Create `workdir` or delete the plain files left inside it.
///
/// Returns the directory actually used: a workdir that can't be created is
/// replaced by [`FALLBACK_WORKDIR`] below the system temp directory.
pub fn prepare_workdir(workdir: impl AsRef<Path>) -> Result<PathBuf> {
    let workdir = workdir.as_ref();
    if workdir.is_dir() {
        clean_directory(workdir)?;
        return Ok(workdir.to_path_buf());
    }
    match std::fs::create_dir_all(workdir) {
        Ok(()) => Ok(workdir.to_path_buf()),
        Err(e) => {
            let fallback = std::env::temp_dir().join(FALLBACK_WORKDIR);
            tracing::warn!(
                "workdir '{}' not writable ({}), use '{}'",
                workdir.display(),
                e,
                fallback.display()
            );
            if fallback.is_dir() {
                clean_directory(&fallback)?;
            } else {
                std::fs::create_dir_all(&fallback)?;
            }
            Ok(fallback)
        }
    }
}

/// Switch the state marker in `dir` from `prev` to `next`.
///
/// Appends a timestamped line to the previous marker file, creating it if
/// missing, and renames it. Returns the new marker path.
pub fn write_mark(dir: impl AsRef<Path>, prev: &str, next: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let old_marker = dir.join(prev);
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&old_marker)?;
    write!(file, "\n{} [INFO ] switch to state {}", now, next)?;
    drop(file);

    let new_marker = dir.join(next);
    std::fs::rename(&old_marker, &new_marker)?;
    tracing::debug!("marker '{}' -> '{}'", prev, next);
    Ok(new_marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn exts(items: &[&str]) -> Vec<String> {
        items.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_input_sorted_flat() {
        let dir = tempdir().unwrap();
        for name in ["0002.tif", "0001.tif", "0003.jpg", "notes.txt", "0004.tif.bak"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("0005.tif")).unwrap();

        let paths = input_sorted(dir.path(), &exts(&["tif", "jpg"]), false).unwrap();
        let names: Vec<_> = paths.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["0001.tif", "0002.tif", "0003.jpg"]);
    }

    #[test]
    fn test_input_sorted_recursive() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("0001.tif")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("0005.tif")).unwrap();

        let paths = input_sorted(dir.path(), &exts(&["tif"]), true).unwrap();
        assert_eq!(paths, vec![dir.path().join("0001.tif"), dir.path().join("sub").join("0005.tif")]);
    }

    #[test]
    fn test_input_sorted_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("0001.tif");
        File::create(&file).unwrap();
        assert!(matches!(input_sorted(&file, &exts(&["tif"]), false), Err(LektorError::Validation { .. })));
    }

    #[test]
    fn test_prepare_workdir_cleans_files_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("0001.xml"), "<alto/>").unwrap();
        fs::create_dir(dir.path().join("keep")).unwrap();

        let used = prepare_workdir(dir.path()).unwrap();
        assert_eq!(used, dir.path());
        assert!(!dir.path().join("0001.xml").exists());
        assert!(dir.path().join("keep").is_dir());
    }

    #[test]
    fn test_prepare_workdir_creates_missing() {
        let dir = tempdir().unwrap();
        let workdir = dir.path().join("work").join("ocr");
        assert_eq!(prepare_workdir(&workdir).unwrap(), workdir);
        assert!(workdir.is_dir());
    }

    #[test]
    fn test_write_mark_renames_and_appends() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ocr_busy"), "2024-01-01 00:00:00 [INFO ] start").unwrap();

        let marker = write_mark(dir.path(), "ocr_busy", "ocr_done").unwrap();
        assert_eq!(marker, dir.path().join("ocr_done"));
        assert!(!dir.path().join("ocr_busy").exists());
        let content = fs::read_to_string(marker).unwrap();
        assert!(content.starts_with("2024-01-01 00:00:00 [INFO ] start\n"));
        assert!(content.ends_with("[INFO ] switch to state ocr_done"));
    }

    #[test]
    fn test_write_mark_without_previous_marker() {
        let dir = tempdir().unwrap();
        let marker = write_mark(dir.path(), "ocr_busy", "ocr_fail").unwrap();
        assert!(fs::read_to_string(marker).unwrap().contains("switch to state ocr_fail"));
    }
}
