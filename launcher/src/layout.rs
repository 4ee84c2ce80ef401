use std::path::PathBuf;

/// Number of directory levels between the launcher's own directory and the
/// project root.
pub const ANCESTOR_DEPTH: usize = 4;

/// Location of the launched script, relative to the project root.
pub const SCRIPT_RELATIVE_PATH: &str = "scripts/icarus.sh";

/// Shell used to run the script. The script does not need to be executable.
pub const INTERPRETER: &str = "/bin/bash";

/// Signals the supervisor forwards to the child for as long as it runs.
pub const RELAYED_SIGNALS: &[libc::c_int] =
    &[libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Where the launcher expects to find things relative to its own install
/// location.
///
/// The binary always runs with [`LauncherLayout::default`]; the fields exist so
/// the resolver and supervisor can be exercised against other layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherLayout {
    pub ancestor_depth: usize,
    pub script_relative_path: PathBuf,
    pub interpreter: PathBuf,
    pub relayed_signals: &'static [libc::c_int],
}

impl Default for LauncherLayout {
    fn default() -> Self {
        Self {
            ancestor_depth: ANCESTOR_DEPTH,
            script_relative_path: PathBuf::from(SCRIPT_RELATIVE_PATH),
            interpreter: PathBuf::from(INTERPRETER),
            relayed_signals: RELAYED_SIGNALS,
        }
    }
}
