use anyhow::Context;
use raw_http_server::config::Config;
use raw_http_server::endpoints;
use raw_http_server::files::{DirStore, FileStore};
use raw_http_server::http::server::Server;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let store = cfg
        .directory
        .clone()
        .map(|dir| Arc::new(DirStore::new(dir)) as Arc<dyn FileStore>);
    if store.is_none() {
        tracing::warn!("no --directory given, /files/* will answer 500");
    }

    let router = endpoints::routes(store)?;
    let server = Server::from_config(&cfg, router)
        .with_context(|| format!("Failed to bind to {}", cfg.listen_addr))?;

    server.run()
}
