#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::install::Installation;

const ECHO_ARGS: &str = "for arg in \"$@\"; do printf '<%s>\\n' \"$arg\"; done\n";

#[test]
fn exit_code_is_propagated() -> anyhow::Result<()> {
    let installation = Installation::with_script("exit 42\n")?;
    installation.command().assert().code(42);
    Ok(())
}

#[test]
fn successful_script_exits_zero() -> anyhow::Result<()> {
    let installation = Installation::with_script("echo hello\n")?;
    installation
        .command()
        .assert()
        .success()
        .stdout("hello\n")
        .stderr("");
    Ok(())
}

#[test]
fn signal_death_maps_to_128_plus_signal() -> anyhow::Result<()> {
    let installation = Installation::with_script("kill -TERM $$\nsleep 5\n")?;
    installation
        .command()
        .assert()
        .code(128 + libc::SIGTERM);
    Ok(())
}

#[test]
fn arguments_pass_through_verbatim() -> anyhow::Result<()> {
    let installation = Installation::with_script(ECHO_ARGS)?;
    installation
        .command()
        .args(["a", "b c", "-x"])
        .assert()
        .success()
        .stdout("<a>\n<b c>\n<-x>\n");
    Ok(())
}

#[test]
fn launcher_flags_belong_to_the_script() -> anyhow::Result<()> {
    let installation = Installation::with_script(ECHO_ARGS)?;
    installation
        .command()
        .args(["--help", "--", "--version", ""])
        .assert()
        .success()
        .stdout("<--help>\n<-->\n<--version>\n<>\n");
    Ok(())
}

#[test]
fn stdin_is_shared_with_the_script() -> anyhow::Result<()> {
    let installation = Installation::with_script("read -r line\necho \"got $line\"\n")?;
    installation
        .command()
        .write_stdin("ping\n")
        .assert()
        .success()
        .stdout("got ping\n");
    Ok(())
}
