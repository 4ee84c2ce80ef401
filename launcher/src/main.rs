#[cfg(not(unix))]
fn main() {
    eprintln!("icarus-launcher is only implemented for UNIX");
    std::process::exit(1);
}

#[cfg(unix)]
fn main() {
    icarus_launcher::run_main()
}
