use anyhow::{Context, bail};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4221";
pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: String,
    /// Root for `/files/*`; `None` leaves those routes answering 500.
    pub directory: Option<PathBuf>,
    /// Worker threads kept warm. More are started whenever every worker
    /// is holding a connection.
    pub workers: usize,
    /// How long a connection may sit idle before it is closed.
    pub read_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            directory: None,
            workers: DEFAULT_WORKERS,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl Config {
    /// Command line flags, then `LISTEN` and `WORKERS` from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = Self::from_args(std::env::args().skip(1))?;

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.listen_addr = addr;
        }
        if let Ok(raw) = std::env::var("WORKERS") {
            cfg.workers = parse_workers(&raw)?;
        }
        Ok(cfg)
    }

    /// Parses `--directory <dir>` or `--directory=<dir>`. Program name must
    /// already be stripped.
    pub fn from_args<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let dir = match arg.split_once('=') {
                Some(("--directory", value)) => value.to_string(),
                None if arg == "--directory" => args
                    .next()
                    .context("--directory needs a value")?,
                _ => bail!("unknown argument: {}", arg),
            };

            cfg.directory = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        Ok(cfg)
    }
}

fn parse_workers(raw: &str) -> anyhow::Result<usize> {
    let workers: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("WORKERS is not a number: {:?}", raw))?;
    if workers == 0 {
        bail!("WORKERS must be at least 1");
    }
    Ok(workers)
}
