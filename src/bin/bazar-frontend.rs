use bazar::frontend::Frontend;
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct App {
    #[clap(long, default_value = "127.0.0.1:5000")]
    addr: SocketAddr,

    /// Catalog replica base URLs, selected round-robin for reads.
    #[clap(
        long,
        value_delimiter = ',',
        default_value = "http://127.0.0.1:5001,http://127.0.0.1:5002"
    )]
    catalog_replicas: Vec<String>,

    /// Order replica base URLs, scanned in order for purchase failover.
    #[clap(
        long,
        value_delimiter = ',',
        default_value = "http://127.0.0.1:5003,http://127.0.0.1:5004"
    )]
    order_replicas: Vec<String>,

    #[clap(long, default_value = "info", env = "BAZAR_LOG")]
    log_level: tracing_subscriber::filter::LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();
    tracing_subscriber::fmt()
        .with_max_level(app.log_level)
        .init();

    let frontend = Frontend::new(app.catalog_replicas, app.order_replicas);

    info!("bazar-frontend version: {}", env!("CARGO_PKG_VERSION"));
    let listener = TcpListener::bind(app.addr).await?;
    info!("Frontend listening on {}", app.addr);
    axum::serve(listener, frontend.router()).await?;
    Ok(())
}
