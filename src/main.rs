//! Binary entrypoint for the `repoflat` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    // Recording is handled in commands::dispatch via REPOFLAT_RECORD=<dir>.
    match repoflat::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
