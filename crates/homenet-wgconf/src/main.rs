//! wg-config-server - serve WireGuard configs to their owners

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use homenet_wgconf::{create_router, load_configs, AppState, ConfigStore};

#[derive(Parser)]
#[command(name = "wg-config-server")]
#[command(about = "Serve WireGuard configs to clients that know the private key")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "[::1]:8080")]
    addr: SocketAddr,

    /// Directory of WireGuard configurations
    #[arg(long, default_value = ".")]
    conf_dir: PathBuf,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = match load_configs(&args.conf_dir) {
        Ok(store) => store,
        Err(e) => {
            error!("Error loading configs from {}: {}", args.conf_dir.display(), e);
            ConfigStore::new()
        }
    };
    info!(
        "Loaded {} config(s) from {}",
        store.len(),
        args.conf_dir.display()
    );

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let app = create_router(Arc::new(AppState::new(store)));
    axum::serve(listener, app).await?;

    Ok(())
}
