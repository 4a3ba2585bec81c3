use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doors_cli::app::{App, AppError};
use doors_cli::commands::{self, Cli};
use doors_cli::config::ClientConfig;
use doors_client::ClientError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // Logs go to stderr; stdout carries the rendered views.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doors_cli=info,doors_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // --- Configuration ---
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url)?;
    }
    tracing::debug!(
        api_url = %config.api_url,
        token_path = %config.token_path.display(),
        "Loaded client configuration"
    );

    let app = App::new(config)?;
    commands::run(&app, cli.command).await
}

/// Print a one-line failure unless a view already showed one.
fn report(err: &anyhow::Error) {
    tracing::debug!(error = ?err, "Command failed");
    if let Some(AppError::Reported(_)) = err.downcast_ref::<AppError>() {
        return;
    }
    let message = match err.downcast_ref::<ClientError>() {
        Some(client_err) => client_err.user_message(),
        None => format!("{err:#}"),
    };
    eprintln!("error: {message}");
}
