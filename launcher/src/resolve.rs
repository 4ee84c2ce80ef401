//! Locates the launched script relative to the launcher's own install
//! location.
//!
//! The launcher is expected to live [`ANCESTOR_DEPTH`] directories below the
//! project root, with the script at `<root>/scripts/icarus.sh`:
//!
//! ```text
//! <root>/
//!   scripts/icarus.sh
//!   a/b/c/d/icarus-launcher
//! ```
//!
//! [`ANCESTOR_DEPTH`]: crate::layout::ANCESTOR_DEPTH

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::path::PathBuf;

use crate::error::LauncherError;
use crate::layout::LauncherLayout;

/// Resolve the script for `layout`, checking that it can be read.
pub fn resolve_script(layout: &LauncherLayout) -> Result<PathBuf, LauncherError> {
    let exe_dir = current_exe_dir()?;
    tracing::debug!(exe_dir = %exe_dir.display(), "resolved launcher directory");

    let script = script_path_for(&exe_dir, layout)?;
    ensure_readable(&script)?;
    tracing::debug!(script = %script.display(), "resolved launcher script");
    Ok(script)
}

/// Canonical directory containing the running executable, with symlinks
/// resolved.
pub fn current_exe_dir() -> Result<PathBuf, LauncherError> {
    let exe = std::env::current_exe()
        .and_then(std::fs::canonicalize)
        .map_err(|source| LauncherError::CurrentExe { source })?;
    exe_parent_dir(&exe)
}

fn exe_parent_dir(exe: &Path) -> Result<PathBuf, LauncherError> {
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| LauncherError::ProjectRoot {
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no parent directory", exe.display()),
            ),
        })
}

/// Replace `path` with its parent `levels` times.
///
/// Ascending past the filesystem root leaves the root in place, so a shallow
/// install resolves against `/` rather than failing here.
pub fn ascend(path: &Path, levels: usize) -> Result<PathBuf, LauncherError> {
    if !path.has_root() {
        return Err(LauncherError::ProjectRoot {
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not an absolute path", path.display()),
            ),
        });
    }

    let mut current = path;
    for level in 0..levels {
        match current.parent() {
            Some(parent) => current = parent,
            None => {
                tracing::warn!(
                    start = %path.display(),
                    ascended = level,
                    requested = levels,
                    "reached the filesystem root before the project root"
                );
                break;
            }
        }
    }
    Ok(current.to_path_buf())
}

/// Project root for `exe_dir` joined with the layout's script path. Does not
/// touch the filesystem.
pub fn script_path_for(
    exe_dir: &Path,
    layout: &LauncherLayout,
) -> Result<PathBuf, LauncherError> {
    let root = ascend(exe_dir, layout.ancestor_depth)?;
    let script = root.join(&layout.script_relative_path);
    if script.as_os_str().len() >= path_max() {
        return Err(LauncherError::ScriptPathTooLong { path: script });
    }
    Ok(script)
}

/// Fail unless the calling user can read `path`.
pub fn ensure_readable(path: &Path) -> Result<(), LauncherError> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|err| {
        LauncherError::MissingScript {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, err),
        }
    })?;

    if unsafe { libc::access(c_path.as_ptr(), libc::R_OK) } != 0 {
        return Err(LauncherError::MissingScript {
            path: path.to_path_buf(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

fn path_max() -> usize {
    libc::PATH_MAX as usize
}
