use rtmpd::{pool, RtmpServer, ServerConfig};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    pool::init();

    let server = RtmpServer::new(ServerConfig::default());

    tokio::select! {
        result = server.listen() => {
            // listen() only returns on a bind or validation failure
            if let Err(e) = result {
                error!(error = %e, "server failed");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            ExitCode::SUCCESS
        }
    }
}
