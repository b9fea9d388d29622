use bazar::catalog::CatalogNode;
use bazar::store::BookStore;
use clap::Parser;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct App {
    #[clap(long, default_value = "127.0.0.1:5001")]
    addr: SocketAddr,

    /// Directory holding this node's catalog log file.
    #[clap(long, env = "BAZAR_DATA", default_value = default_data_location())]
    data_dir: PathBuf,

    /// Base URL of the peer catalog node receiving propagated writes.
    #[clap(long, default_value = "http://127.0.0.1:5002")]
    peer: String,

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

    let store = BookStore::open(app.data_dir)?;
    let node = CatalogNode::new(store, app.peer, app.frontend);

    info!("bazar-catalog version: {}", env!("CARGO_PKG_VERSION"));
    let listener = TcpListener::bind(app.addr).await?;
    info!("Catalog node listening on {}", app.addr);
    axum::serve(listener, node.router()).await?;
    Ok(())
}
