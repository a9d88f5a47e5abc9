use seatable_client::{ClientRegistry, ReqwestExecutor};
use seatable_core::Result;
use seatable_nodes::{OperationResult, SeaTableConnector};
use seatable_runner::error::RunnerError;
use seatable_runner::{Invocation, RunnerConfig, parse_params};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the result document.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let outcome = tokio::select! {
        outcome = run() => outcome,
        _ = tokio::signal::ctrl_c() => Err(RunnerError::Interrupted.into()),
    };

    match outcome {
        Ok(result) if result.success => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(report) => {
            tracing::error!("{report}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<OperationResult, RunnerError> {
    let invocation = Invocation::from_args(std::env::args())?;
    let raw = match invocation.params {
        Some(raw) => raw,
        None => read_stdin().await?,
    };
    let params = parse_params(&raw)?;

    let config = RunnerConfig::from_env().map_err(|e| RunnerError::Configuration {
        details: e.to_string(),
    })?;
    tracing::info!(server = %config.server_url, "Loaded configuration");

    let http = ReqwestExecutor::new(config.http.clone()).map_err(|e| {
        RunnerError::Configuration {
            details: e.to_string(),
        }
    })?;
    let connector = SeaTableConnector::new(Arc::new(ClientRegistry::new()), Arc::new(http));

    let result = seatable_runner::run(&connector, &config, &invocation.operation, params).await?;
    let rendered = serde_json::to_string_pretty(&result).map_err(|e| RunnerError::Output {
        details: e.to_string(),
    })?;
    println!("{rendered}");
    Ok(result)
}

async fn read_stdin() -> Result<String, RunnerError> {
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .map_err(|e| RunnerError::InvalidParams {
            details: format!("read stdin: {e}"),
        })?;
    Ok(raw)
}
