use crate::error::LAUNCHER_FAILURE_EXIT_CODE;

/// Offset added to a signal number when reporting death by that signal, as
/// shells do.
pub const SIGNAL_EXIT_CODE_BASE: i32 = 128;

/// How the child terminated, decoded from a raw `waitpid` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildTermination {
    Exited(i32),
    Signaled(i32),
    Other(libc::c_int),
}

impl ChildTermination {
    pub fn from_wait_status(status: libc::c_int) -> Self {
        if libc::WIFEXITED(status) {
            Self::Exited(libc::WEXITSTATUS(status))
        } else if libc::WIFSIGNALED(status) {
            Self::Signaled(libc::WTERMSIG(status))
        } else {
            Self::Other(status)
        }
    }

    /// Exit code the launcher reports for this termination.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => SIGNAL_EXIT_CODE_BASE + signal,
            Self::Other(_) => LAUNCHER_FAILURE_EXIT_CODE,
        }
    }
}
