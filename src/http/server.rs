use crate::concurrency::ThreadPool;
use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::router::Router;
use anyhow::Context;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn};

pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    pool: ThreadPool,
    read_timeout: Duration,
}

impl Server {
    pub fn bind(
        addr: &str,
        router: Router,
        min_workers: usize,
        read_timeout: Duration,
    ) -> anyhow::Result<Server> {
        let listener = TcpListener::bind(addr).with_context(|| format!("Can't bind {}", addr))?;
        Ok(Server {
            listener,
            router: Arc::new(router),
            pool: ThreadPool::new(min_workers)?,
            read_timeout,
        })
    }

    pub fn from_config(cfg: &Config, router: Router) -> anyhow::Result<Server> {
        Self::bind(&cfg.listen_addr, router, cfg.workers, cfg.read_timeout)
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever. Each one gets a worker of its own for as
    /// long as it stays open.
    pub fn run(self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            min_workers = self.pool.size(),
            "listening"
        );

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    warn!("error accepting connection: {}", e);
                    continue;
                }
            };

            let router = Arc::clone(&self.router);
            let read_timeout = self.read_timeout;
            if let Err(e) = self.pool.execute(move || serve(stream, router, read_timeout)) {
                error!("can't hand connection to a worker: {:#}", e);
            }
        }
        Ok(())
    }
}

fn serve(stream: TcpStream, router: Arc<Router>, read_timeout: Duration) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let _span = info_span!("conn", %peer).entered();
    info!("accepted new connection");

    if let Err(e) = stream.set_read_timeout(Some(read_timeout)) {
        warn!("can't set read timeout: {}", e);
        return;
    }

    if let Err(e) = Connection::new(stream, router).run() {
        error!("connection error: {:#}", e);
    }
}
