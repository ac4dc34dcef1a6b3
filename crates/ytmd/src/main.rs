//! Entry point for the ytmd shell process.

use std::process::ExitCode;

fn main() -> ExitCode {
    match ytmd::run_shell() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "ytmd::main", error = %error, "shell exited with an error");
            ExitCode::FAILURE
        }
    }
}
