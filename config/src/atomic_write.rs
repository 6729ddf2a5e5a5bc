//! Atomic file writes.
//!
//! Temp file in the destination directory, then rename. On Windows the rename
//! fails when the target exists, so the old file is moved aside to `.bak` and
//! restored if the second attempt fails.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn best_effort_sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(path = %dir.display(), "Directory sync failed (best-effort): {e}");
    }
    #[cfg(not(unix))]
    let _ = dir;
}

/// Replace `path` with `bytes`, readable only by the owner on Unix. The temp
/// file is synced before the rename.
pub(crate) fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);

    let mut tmp = NamedTempFile::new_in(parent)?;
    // Restrict before any bytes land on disk.
    restrict_to_owner(tmp.path())?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup = path.with_extension("bak");
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;
        if let Err(retry) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(retry.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            tracing::warn!(path = %backup.display(), "Failed to remove backup after atomic write: {e}");
        }
    }

    restrict_to_owner(path)?;
    best_effort_sync_dir(parent);
    Ok(())
}

/// Create `dir` (and its parents) and, on Unix, tighten it to 0o700 when it
/// is ours and readable by anyone else.
pub(crate) fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let metadata = fs::metadata(dir)?;
        // SAFETY: getuid has no preconditions and cannot fail.
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() == our_uid && metadata.permissions().mode() & 0o077 != 0 {
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}
