use directory_backend::{Config, start_server};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "environment misconfigured");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = start_server(&config).await {
        error!(error = %e, "server stopped");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
