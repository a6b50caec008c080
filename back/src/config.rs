use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(name = "todo-back", about = "Todo list HTTP API")]
pub struct Config {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Backing store for todos.
    #[arg(long, env = "STORAGE_TYPE", value_enum, default_value_t = StorageKind::Memory)]
    pub storage: StorageKind,

    /// JSON snapshot used by the memory store.
    #[arg(long, env = "DATA_FILE_PATH", default_value = "./data/todos.json")]
    pub data_file: PathBuf,

    /// SQLite database used by the sqlite store.
    #[arg(long, env = "DATABASE_PATH", default_value = "./data/todos.db")]
    pub database: PathBuf,

    /// Upper bound for draining requests and flushing the store on shutdown.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5000)]
    pub shutdown_timeout_ms: u64,

    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// Serve TLS with this certificate, together with `--ssl-key`.
    #[arg(long, env = "SSL_CERT", requires = "ssl_key")]
    pub ssl_cert: Option<PathBuf>,

    #[arg(long, env = "SSL_KEY", requires = "ssl_cert")]
    pub ssl_key: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    Memory,
    Sqlite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    pub fn addr(&self) -> eyre::Result<SocketAddr> {
        let host = if self.host == "localhost" {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };

        Ok(SocketAddr::new(host.parse()?, self.port))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Default log filter when `RUST_LOG` is unset; development also logs
    /// internal error detail.
    pub fn default_log_filter(&self) -> &'static str {
        match self.environment {
            Environment::Development => "debug",
            Environment::Production => "info",
        }
    }

    pub fn tls(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.ssl_cert.as_ref().zip(self.ssl_key.as_ref())
    }
}
