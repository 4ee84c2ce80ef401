//! `icarus-launcher` runs `<root>/scripts/icarus.sh` through `/bin/bash`,
//! where `<root>` is four directories above the launcher binary.
//!
//! All arguments are passed through to the script unchanged. SIGINT, SIGTERM,
//! SIGHUP and SIGQUIT are forwarded to the script while it runs, and the
//! script's exit status becomes the launcher's (`128 + N` if it died from
//! signal `N`). Failures in the launcher itself exit with status 1; a shell
//! that cannot be executed exits with status 127.
#[cfg(unix)]
mod error;
#[cfg(unix)]
mod exit_status;
#[cfg(unix)]
mod layout;
#[cfg(unix)]
mod resolve;
#[cfg(unix)]
mod supervisor;

#[cfg(unix)]
pub use error::EXEC_FAILED_EXIT_CODE;
#[cfg(unix)]
pub use error::LAUNCHER_FAILURE_EXIT_CODE;
#[cfg(unix)]
pub use error::LauncherError;
#[cfg(unix)]
pub use exit_status::ChildTermination;
#[cfg(unix)]
pub use exit_status::SIGNAL_EXIT_CODE_BASE;
#[cfg(unix)]
pub use layout::LauncherLayout;
#[cfg(unix)]
pub use resolve::ascend;
#[cfg(unix)]
pub use resolve::current_exe_dir;
#[cfg(unix)]
pub use resolve::ensure_readable;
#[cfg(unix)]
pub use resolve::resolve_script;
#[cfg(unix)]
pub use resolve::script_path_for;
#[cfg(unix)]
pub use supervisor::ChildArgv;
#[cfg(unix)]
pub use supervisor::ForkOutcome;
#[cfg(unix)]
pub use supervisor::supervise;

#[cfg(unix)]
use std::ffi::OsString;

#[cfg(unix)]
use tracing_subscriber::EnvFilter;

/// Entry point for the launcher binary.
#[cfg(unix)]
pub fn run_main() -> ! {
    init_tracing();

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let exit_code = match run(&LauncherLayout::default(), args) {
        Ok(termination) => termination.exit_code(),
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    };
    std::process::exit(exit_code);
}

/// Resolve the script for `layout`, run it with `args`, and report how it
/// terminated.
#[cfg(unix)]
pub fn run<I>(layout: &LauncherLayout, args: I) -> Result<ChildTermination, LauncherError>
where
    I: IntoIterator<Item = OsString>,
{
    let script = resolve_script(layout)?;
    let argv = ChildArgv::new(&layout.interpreter, &script, args)?;
    supervise(&argv, layout)
}

/// Diagnostics are opt-in through `RUST_LOG` and go to stderr, which the
/// script shares with the launcher.
#[cfg(unix)]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
