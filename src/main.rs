mod cli;
mod config;
mod document;
mod extractor;
mod fetch;
mod selector;
mod server;
mod state;

use std::process::ExitCode;

use anyhow::Result;
use cli::Args;
use server::Server;
use state::State;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn set_up_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_regex(false)
                .with_default_directive(Level::INFO.into())
                .with_env_var("ANIMEDEX_LOG")
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    set_up_logging();

    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();

        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("could not listen for Ctrl-C: {e}");
            }

            cancel.cancel();
        }
    });

    let mut tasks = match start(cancel.clone()).await {
        Ok(tasks) => tasks,

        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut exit_code = ExitCode::SUCCESS;

    while let Some(task_result) = tasks.join_next().await {
        cancel.cancel();

        if let Err(e) = task_outcome(task_result) {
            error!("{e:#}");
            exit_code = ExitCode::FAILURE;
        }
    }

    exit_code
}

/// Folds a panicked or cancelled task into the same error path as a task that returned an error.
fn task_outcome(result: Result<Result<()>, JoinError>) -> Result<()> {
    result.map_err(anyhow::Error::from).and_then(|result| result)
}

async fn start(cancel: CancellationToken) -> Result<JoinSet<Result<()>>> {
    let mut args = Args::parse();
    let config_paths = args
        .config_path
        .take()
        .into_iter()
        .chain(["./animedex.toml".into(), "/etc/animedex.toml".into()])
        .collect::<Vec<_>>();
    let mut config = config::load(&config_paths)?;
    config.update(args);
    config.validate()?;

    let state = State::new(config)?;
    let server = Server::new(state).await?;

    let mut tasks = JoinSet::new();
    tasks.spawn(server.serve(cancel));

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    #[tokio::test]
    async fn task_failures_and_panics_are_errors() {
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        tasks.spawn(async { Ok(()) });
        tasks.spawn(async { bail!("the HTTP server encountered a failure") });
        tasks.spawn(async { panic!("boom") });

        let mut failures = 0;

        while let Some(task_result) = tasks.join_next().await {
            if task_outcome(task_result).is_err() {
                failures += 1;
            }
        }

        assert_eq!(failures, 2);
    }
}
