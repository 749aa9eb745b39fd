use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use vibeshift::{
    api,
    auth::{AccessGate, HostCapability, KeyStore},
    config::Config,
    gemini::GeminiClient,
    workflow::Orchestrator,
};

#[derive(Parser, Debug)]
#[command(name = "vibeshift", about = "VibeShift image reimagining server", version)]
struct Cli {
    /// Override API_HOST
    #[arg(long)]
    host: Option<String>,
    /// Override API_PORT
    #[arg(long)]
    port: Option<String>,
    /// Override OUTPUT_DIR for downloaded results
    #[arg(long, value_name = "PATH")]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    Config::dotenv_load();
    let cli = Cli::parse();
    let mut config = Config::new()?;
    if let Some(host) = cli.host {
        config.api_host = host;
    }
    if let Some(port) = cli.port {
        config.api_port = port;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    config.print_env_vars();

    let keys = KeyStore::new(config.gemini_api_key.clone());
    let gemini = Arc::new(GeminiClient::from_config(&config, keys.clone())?);
    let gate = Arc::new(AccessGate::new(
        HostCapability::Available(Arc::new(keys.clone())),
        config.confirm_policy(),
    ));
    let orchestrator = Arc::new(Orchestrator::new(gemini.clone(), gemini, gate));

    let state = Arc::new(api::AppState {
        orchestrator,
        keys,
        output_dir: config.output_dir.clone(),
    });
    let app = api::router(state);

    // Run our application with safe parsing
    let ip: std::net::IpAddr = config.api_host.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", config.api_host);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = config.api_port.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 8190", config.api_port);
        8190
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
