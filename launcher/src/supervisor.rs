//! Runs the script as a single child process and relays termination signals
//! to it until it exits.
//!
//! The sequence is:
//! 1. Build the child's argv as C strings (no allocation happens after fork).
//! 2. `fork`. The child resets the relayed signals to `SIG_DFL` and `execv`s
//!    the interpreter, or `_exit(127)`s if that fails.
//! 3. The parent records the child pid, installs [`relay_signal`] for the
//!    relayed signals, and `waitpid`s until the child terminates.
//!
//! A signal that arrives between `fork` and handler installation is handled by
//! whatever disposition the launcher inherited.

use std::ffi::CStr;
use std::ffi::CString;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use crate::error::EXEC_FAILED_EXIT_CODE;
use crate::error::LauncherError;
use crate::exit_status::ChildTermination;
use crate::layout::LauncherLayout;

/// Pid of the supervised child; `0` until the parent has forked.
static CHILD_PID: AtomicI32 = AtomicI32::new(0);

/// Null-terminated argv handed to `execv`: interpreter, script, then the
/// caller's arguments in order.
#[derive(Debug)]
pub struct ChildArgv {
    args: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
    exec_failure_prefix: Vec<u8>,
}

impl ChildArgv {
    pub fn new<I>(interpreter: &Path, script: &Path, args: I) -> Result<Self, LauncherError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut c_args = vec![
            to_cstring(interpreter.as_os_str())?,
            to_cstring(script.as_os_str())?,
        ];
        for arg in args {
            c_args.push(to_cstring(&arg)?);
        }

        // Pointers target the CStrings' heap buffers, which never move or
        // change for the lifetime of `args`.
        let mut ptrs: Vec<*const libc::c_char> = Vec::new();
        ptrs.try_reserve_exact(c_args.len() + 1)
            .map_err(|err| LauncherError::ArgvAllocation {
                reason: err.to_string(),
            })?;
        ptrs.extend(c_args.iter().map(|arg| arg.as_ptr()));
        ptrs.push(std::ptr::null());

        let mut exec_failure_prefix = b"Failed to exec ".to_vec();
        exec_failure_prefix.extend_from_slice(interpreter.as_os_str().as_bytes());
        exec_failure_prefix.extend_from_slice(b": ");

        Ok(Self {
            args: c_args,
            ptrs,
            exec_failure_prefix,
        })
    }

    pub fn program(&self) -> &CStr {
        &self.args[0]
    }

    pub fn args(&self) -> &[CString] {
        &self.args
    }

    fn as_ptr(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }
}

fn to_cstring(value: &OsStr) -> Result<CString, LauncherError> {
    CString::new(value.as_bytes()).map_err(|err| LauncherError::ArgvAllocation {
        reason: err.to_string(),
    })
}

/// Which side of the `fork` the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkOutcome {
    Child,
    Parent { pid: libc::pid_t },
}

pub fn fork_child() -> Result<ForkOutcome, LauncherError> {
    match unsafe { libc::fork() } {
        -1 => Err(LauncherError::Fork {
            source: io::Error::last_os_error(),
        }),
        0 => Ok(ForkOutcome::Child),
        pid => Ok(ForkOutcome::Parent { pid }),
    }
}

/// Post-fork child path: restore default dispositions and exec the
/// interpreter. Never returns; on exec failure the process `_exit`s with 127
/// so none of the parent's state is unwound from here.
///
/// The parent may have had other threads at `fork` time, so nothing here
/// allocates or takes a lock: the diagnostic is written with `write(2)` from
/// the prebuilt prefix and a stack buffer.
pub fn exec_child(argv: &ChildArgv, reset_signals: &[libc::c_int]) -> ! {
    for &signal in reset_signals {
        unsafe {
            libc::signal(signal, libc::SIG_DFL);
        }
    }

    unsafe {
        libc::execv(argv.program().as_ptr(), argv.as_ptr());
    }

    let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
    let mut reason = [0u8; 256];
    let rc = unsafe { libc::strerror_r(errno, reason.as_mut_ptr().cast(), reason.len()) };
    let reason_len = if rc == 0 {
        reason.iter().position(|&b| b == 0).unwrap_or(reason.len())
    } else {
        0
    };

    write_stderr(&argv.exec_failure_prefix);
    write_stderr(&reason[..reason_len]);
    write_stderr(b"\n");
    unsafe { libc::_exit(EXEC_FAILED_EXIT_CODE) }
}

fn write_stderr(bytes: &[u8]) {
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// Forward `signal` to the recorded child, if any.
///
/// Runs in signal context: it only loads the pid and calls `kill(2)`.
pub extern "C" fn relay_signal(signal: libc::c_int) {
    let pid = CHILD_PID.load(Ordering::SeqCst);
    if pid > 0 {
        unsafe {
            libc::kill(pid, signal);
        }
    }
}

/// Install [`relay_signal`] for each of `signals`. Interrupted system calls are
/// restarted (`SA_RESTART`). Every signal is attempted; the first failure is
/// returned.
pub fn install_relay_handlers(signals: &[libc::c_int]) -> Result<(), LauncherError> {
    let mut first_error = None;
    for &signal in signals {
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = relay_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        unsafe {
            libc::sigemptyset(&mut action.sa_mask);
        }

        if unsafe { libc::sigaction(signal, &action, std::ptr::null_mut()) } != 0
            && first_error.is_none()
        {
            first_error = Some(LauncherError::SignalInstall {
                signal,
                source: io::Error::last_os_error(),
            });
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Block until `pid` terminates and return its raw wait status. `EINTR` is
/// retried; any other `waitpid` failure is returned.
pub fn wait_for_child(pid: libc::pid_t) -> Result<libc::c_int, LauncherError> {
    let mut status: libc::c_int = 0;
    loop {
        if unsafe { libc::waitpid(pid, &mut status, 0) } != -1 {
            return Ok(status);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(LauncherError::Wait { source: err });
        }
    }
}

/// Spawn the child for `argv`, relay the layout's signals to it, and wait for
/// it to terminate.
///
/// Once the child exists this only returns after it has been reaped. A relay
/// handler that cannot be installed is logged and the child is still waited
/// for, so its exit status is what gets reported.
pub fn supervise(
    argv: &ChildArgv,
    layout: &LauncherLayout,
) -> Result<ChildTermination, LauncherError> {
    let pid = match fork_child()? {
        ForkOutcome::Child => exec_child(argv, layout.relayed_signals),
        ForkOutcome::Parent { pid } => pid,
    };

    CHILD_PID.store(pid, Ordering::SeqCst);
    if let Err(err) = install_relay_handlers(layout.relayed_signals) {
        tracing::warn!(pid, "signals will not be relayed to the child: {err}");
    }
    tracing::debug!(pid, program = %argv.program().to_string_lossy(), "spawned child");

    let status = wait_for_child(pid)?;
    let termination = ChildTermination::from_wait_status(status);
    tracing::debug!(pid, ?termination, "child terminated");
    Ok(termination)
}
