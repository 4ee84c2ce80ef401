#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::Child;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::install::Installation;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Touches the marker passed as `$1` once running, then becomes `sleep`.
const SLEEP_SCRIPT: &str = ": > \"$1\"\nexec sleep 30\n";

/// Exits 7 from a TERM trap.
const TRAP_SCRIPT: &str = "trap 'exit 7' TERM\n: > \"$1\"\nwhile true; do sleep 0.1; done\n";

fn spawn_and_wait_ready(installation: &Installation, marker: &Path) -> anyhow::Result<Child> {
    let mut child = Command::new(installation.launcher())
        .arg(marker)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .spawn()?;

    let deadline = Instant::now() + TIMEOUT;
    while !marker.exists() {
        if Instant::now() > deadline {
            let _ = child.kill();
            anyhow::bail!("script never became ready");
        }
        thread::sleep(Duration::from_millis(20));
    }
    // The script is running, so the launcher has long since installed its
    // handlers; give it a moment to be parked in waitpid.
    thread::sleep(Duration::from_millis(100));
    Ok(child)
}

fn wait_with_timeout(child: &mut Child) -> anyhow::Result<ExitStatus> {
    let deadline = Instant::now() + TIMEOUT;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            anyhow::bail!("launcher did not exit after the relayed signal");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn send_signal(child: &Child, signal: libc::c_int) {
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, signal) };
    assert_eq!(rc, 0, "kill failed: {}", std::io::Error::last_os_error());
}

fn assert_relayed_death(signal: libc::c_int) -> anyhow::Result<()> {
    let installation = Installation::with_script(SLEEP_SCRIPT)?;
    let scratch = tempdir()?;
    let marker = scratch.path().join("ready");

    let mut child = spawn_and_wait_ready(&installation, &marker)?;
    send_signal(&child, signal);
    let status = wait_with_timeout(&mut child)?;

    assert_eq!(status.code(), Some(128 + signal), "{status:?}");
    Ok(())
}

#[test]
fn sigint_is_relayed_and_reported_as_signal_death() -> anyhow::Result<()> {
    assert_relayed_death(libc::SIGINT)
}

#[test]
fn sigterm_is_relayed_and_reported_as_signal_death() -> anyhow::Result<()> {
    assert_relayed_death(libc::SIGTERM)
}

#[test]
fn sighup_is_relayed_and_reported_as_signal_death() -> anyhow::Result<()> {
    assert_relayed_death(libc::SIGHUP)
}

#[test]
fn sigquit_is_relayed_and_reported_as_signal_death() -> anyhow::Result<()> {
    // A core dump from the quit does not change the reported code.
    assert_relayed_death(libc::SIGQUIT)
}

#[test]
fn relayed_signal_reaches_script_trap() -> anyhow::Result<()> {
    let installation = Installation::with_script(TRAP_SCRIPT)?;
    let scratch = tempdir()?;
    let marker = scratch.path().join("ready");

    let mut child = spawn_and_wait_ready(&installation, &marker)?;
    send_signal(&child, libc::SIGTERM);
    let status = wait_with_timeout(&mut child)?;

    assert_eq!(status.code(), Some(7), "{status:?}");
    Ok(())
}
