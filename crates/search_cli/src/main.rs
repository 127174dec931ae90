pub mod cli;
mod logging;

use std::process::ExitCode;

use anstream::eprintln;
use clap::Parser;
use eyre::Result;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let parsed = cli::Cli::parse();

    let _log_guard = logging::initialize_logging(logging::LogArgs {
        log_level: parsed.log_level(),
        log_to_stderr: parsed.verbose > 0 || parsed.log_file.is_none(),
        log_file_path: parsed.log_file.as_ref(),
        delete_old_log_file: false,
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    match runtime.block_on(parsed.execute()) {
        Ok(exit_code) => Ok(exit_code),
        Err(err) => {
            eprintln!("error: {err}");
            tracing::debug!(?err, "Command failed");
            Ok(ExitCode::FAILURE)
        },
    }
}
