use bazar::order::OrderNode;
use bazar::store::OrderStore;
use clap::Parser;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct App {
    #[clap(long, default_value = "127.0.0.1:5003")]
    addr: SocketAddr,

    /// Directory holding this node's order ledger log file.
    #[clap(long, env = "BAZAR_DATA", default_value = default_data_location())]
    data_dir: PathBuf,

    /// Base URL of the peer order node receiving propagated orders.
    #[clap(long, default_value = "http://127.0.0.1:5004")]
    peer: String,

    /// Base URL of the designated catalog node for stock decrements.
    #[clap(long, default_value = "http://127.0.0.1:5001")]
    catalog: String,

    /// Base URL of the frontend, for cache invalidation callbacks.
    #[clap(long, default_value = "http://127.0.0.1:5000")]
    frontend: String,

    #[clap(long, default_value = "info", env = "BAZAR_LOG")]
    log_level: tracing_subscriber::filter::LevelFilter,
}

fn default_data_location() -> OsString {
    std::env::current_dir()
        .expect("unable to find current directory")
        .into_os_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();
    tracing_subscriber::fmt()
        .with_max_level(app.log_level)
        .init();

    let store = OrderStore::open(app.data_dir)?;
    let node = OrderNode::new(store, app.peer, app.catalog, app.frontend);

    info!("bazar-order version: {}", env!("CARGO_PKG_VERSION"));
    let listener = TcpListener::bind(app.addr).await?;
    info!("Order node listening on {}", app.addr);
    axum::serve(listener, node.router()).await?;
    Ok(())
}
