use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{PatchError, Result};

/// Atomically write bytes to a file using write-to-temp-then-rename.
///
/// 1. Writes data to a `.tmp` sibling file
/// 2. Calls `fsync` to flush to disk
/// 3. Renames the `.tmp` file over the target path
///
/// A reader never sees a half-written report, and a failed run leaves any
/// previous report in place.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    // foo.html → foo.html.tmp
    let file_name = path.file_name().unwrap_or_default();
    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let write_tmp = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()
    };
    if let Err(e) = write_tmp() {
        let _ = fs::remove_file(&tmp_path);
        return Err(PatchError::io(&tmp_path, e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PatchError::io(path, e)
    })
}

/// Write a rendered report to `target`, or to stdout when `target` is `-`.
pub fn write_report(target: &Path, report: &str) -> Result<()> {
    if target.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(report.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| PatchError::io(target, e))?;
        return Ok(());
    }
    atomic_write(target, report.as_bytes())?;
    tracing::info!(path = %target.display(), bytes = report.len(), "report written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file_without_leaving_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.html");
        fs::write(&path, "old").unwrap();

        write_report(&path, "new report").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new report");
        assert!(!dir.path().join("patch.html.tmp").exists());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail.
        let path = dir.path().join("patch.html");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = atomic_write(&path, b"report").unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
        assert!(!dir.path().join("patch.html.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("patch.html");
        let err = atomic_write(&path, b"x").unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
    }
}
