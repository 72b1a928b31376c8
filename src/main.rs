use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use gapscout::cli::{Cli, run};
use gapscout::domain::error::GapscoutError;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the stderr subscriber, plus an appending file layer when asked.
/// The returned guard must outlive every log call.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, GapscoutError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let init_error = |err: tracing_subscriber::util::TryInitError| {
        GapscoutError::Io(std::io::Error::other(format!(
            "failed to initialize tracing: {err}"
        )))
    };

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = non_blocking(file);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .map_err(init_error)?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .map_err(init_error)?;
            Ok(None)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match init_tracing(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    run(cli)
}
