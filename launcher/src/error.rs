use std::io;
use std::path::PathBuf;

/// Exit status for every failure the launcher itself detects.
pub const LAUNCHER_FAILURE_EXIT_CODE: i32 = 1;

/// Exit status of a forked child whose `execv` of the interpreter failed.
pub const EXEC_FAILED_EXIT_CODE: i32 = 127;

/// Failures detected in the launcher process before or while supervising the
/// child. Exec failures never show up here: they happen in the forked child,
/// which reports them itself and exits with [`EXEC_FAILED_EXIT_CODE`].
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error("Failed to resolve launcher path: {source}")]
    CurrentExe {
        #[source]
        source: io::Error,
    },
    #[error("Failed to resolve project root: {source}")]
    ProjectRoot {
        #[source]
        source: io::Error,
    },
    #[error("Script path too long.")]
    ScriptPathTooLong { path: PathBuf },
    #[error("Missing launcher script: {}: {source}", path.display())]
    MissingScript {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to allocate argv: {reason}")]
    ArgvAllocation { reason: String },
    #[error("Failed to fork: {source}")]
    Fork {
        #[source]
        source: io::Error,
    },
    #[error("Failed to install handler for signal {signal}: {source}")]
    SignalInstall {
        signal: libc::c_int,
        #[source]
        source: io::Error,
    },
    #[error("waitpid failed: {source}")]
    Wait {
        #[source]
        source: io::Error,
    },
}

impl LauncherError {
    pub fn exit_code(&self) -> i32 {
        LAUNCHER_FAILURE_EXIT_CODE
    }
}
