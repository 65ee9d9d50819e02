//! All-or-nothing file output.
//!
//! Writers produce `.<name>.partial` next to the final path and rename it
//! into place once complete, so an interrupted call never leaves a truncated
//! image or SEG-Y file behind.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Sibling staging path for `target`: `dir/.name.partial`.
pub fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("output"));
    let staged = format!(".{name}.partial");
    match target.parent() {
        Some(dir) => dir.join(staged),
        None => PathBuf::from(staged),
    }
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

/// Run `write` against a staging path and rename the result onto `target`.
///
/// On failure the staging file (or directory) is removed and the error is
/// returned unchanged; `target` is never touched.
pub fn write_atomic<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    let staged = partial_path(target);
    remove_any(&staged);

    if let Err(err) = write(&staged) {
        remove_any(&staged);
        return Err(err);
    }

    fs::rename(&staged, target).map_err(|e| {
        remove_any(&staged);
        Error::io(target, e)
    })
}

fn remove_any(path: &Path) {
    if path.is_dir() {
        let _ = fs::remove_dir_all(path);
    } else if path.exists() {
        let _ = fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("seisproc_fsio_{tag}_{stamp}"))
    }

    #[test]
    fn partial_path_is_hidden_sibling() {
        let p = partial_path(Path::new("/tmp/out/inline_101.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/out/.inline_101.jpg.partial"));
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = scratch_dir("fail");
        let target = dir.join("x.bin");
        let res = write_atomic(&target, |tmp| {
            fs::write(tmp, b"half").map_err(|e| Error::io(tmp, e))?;
            Err(Error::invalid("boom"))
        });
        assert!(matches!(res, Err(Error::InvalidInput(_))));
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn successful_write_creates_parent_dirs() {
        let dir = scratch_dir("ok").join("nested");
        let target = dir.join("y.bin");
        write_atomic(&target, |tmp| fs::write(tmp, b"done").map_err(|e| Error::io(tmp, e)))
            .expect("atomic write");
        assert_eq!(fs::read(&target).expect("read back"), b"done");
        assert!(!partial_path(&target).exists());
        let _ = fs::remove_dir_all(dir.parent().unwrap_or(&dir));
    }
}
