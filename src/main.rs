//! Firstflight connectivity checker.
//!
//! One executable, two roles: giving a certificate file selects the server
//! role, leaving it out selects the client role connecting to
//! `ENDPOINT:PORT`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use firstflight::core::constants::{DEFAULT_ENDPOINT, DEFAULT_KEY_FILE, DEFAULT_PORT};
use firstflight::core::DriverError;
use firstflight::driver::{ClientDriver, DriverConfig, ServerDriver};
use firstflight::engine::demo::DemoEngine;
use firstflight::engine::ServerCredentials;
use firstflight::transport::{DatagramGate, client_bind_addr, resolve_endpoint};

/// Minimal single-connection QUIC-style transport driver.
#[derive(Debug, Parser)]
#[command(name = "firstflight", version)]
struct Cli {
    /// Bind endpoint (server) or destination address literal (client).
    #[arg(default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// UDP port.
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Certificate file; giving one selects the server role.
    cert_file: Option<PathBuf>,

    /// Private key file (server role).
    key_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.cert_file.clone() {
        Some(cert_file) => run_server(&cli, cert_file).await,
        None => run_client(&cli).await,
    };

    match result {
        Ok(()) => {
            tracing::info!("clean shutdown");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run_server(cli: &Cli, cert_file: PathBuf) -> Result<(), DriverError> {
    let bind_addr = resolve_endpoint(&cli.endpoint, cli.port)?;
    tracing::info!(endpoint = %bind_addr, "starting server");

    let credentials = ServerCredentials {
        cert_file,
        key_file: cli
            .key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE)),
    };
    let engine = DemoEngine::server(credentials)?;
    let gate = DatagramGate::bind(bind_addr).await?;
    tracing::info!(local = %gate.local_addr()?, "server listening");

    ServerDriver::new(engine, gate, DriverConfig::default())
        .run()
        .await
}

async fn run_client(cli: &Cli) -> Result<(), DriverError> {
    let destination = resolve_endpoint(&cli.endpoint, cli.port)?;
    tracing::info!(destination = %destination, "starting client");

    let gate = DatagramGate::bind(client_bind_addr(destination)).await?;
    tracing::info!(local = %gate.local_addr()?, "client socket bound");

    ClientDriver::connect(DemoEngine::client(), gate, destination, DriverConfig::default())?
        .run()
        .await
}
