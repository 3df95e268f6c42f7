use std::process::ExitCode;

use tourney_cli::Cli;
use tourney_sdk::{Error, ErrorKind};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Exit code of a run that left some accounts unsettled.
const PARTIAL_FAILURE: u8 = 2;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn is_partial_failure(report: &eyre::Report) -> bool {
    report
        .downcast_ref::<Error>()
        .is_some_and(|err| err.kind() == ErrorKind::PartialFailure)
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::init()?;
    tracing::debug!(?cli, "starting");

    match cli.execute().await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // The state file is saved already; report what is left to reconcile.
        Err(report) if is_partial_failure(&report) => {
            eprintln!("error: {report}");
            Ok(ExitCode::from(PARTIAL_FAILURE))
        }
        Err(report) => Err(report),
    }
}
