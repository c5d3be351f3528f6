//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = landcheck_cli::run() {
        eprintln!("landcheck: {err}");
        std::process::exit(1);
    }
}
