use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::notifier::NotifierConfig;

/// Prefix for environment overrides, e.g. `TODO_MCP__SERVER__PORT=4000`.
pub const ENV_PREFIX: &str = "TODO_MCP";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the todo REST service
    #[arg(long, env = "TODO_STORE_URL")]
    pub store_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub notifier: NotifierSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one JSON-RPC request. Streams are not affected.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierSettings {
    pub keepalive_interval_secs: u64,
    pub lifetime_secs: u64,
    pub buffer_size: usize,
}

impl From<&NotifierSettings> for NotifierConfig {
    fn from(s: &NotifierSettings) -> Self {
        Self {
            keepalive_interval: Duration::from_secs(s.keepalive_interval_secs.max(1)),
            lifetime: Duration::from_secs(s.lifetime_secs),
            buffer_size: s.buffer_size.max(1),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("store.base_url", "http://localhost:8080")?
            .set_default("store.timeout_secs", 10)?
            .set_default("notifier.keepalive_interval_secs", 30)?
            .set_default("notifier.lifetime_secs", 300)?
            .set_default("notifier.buffer_size", 64)?
            .set_default("logging.json", false)?
            // ./config.{yaml,toml,json} when present
            .add_source(File::with_name("config").required(false));

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        // Flags (and their clap env fallbacks) win over everything else.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.store_url {
            builder = builder.set_override("store.base_url", url)?;
        }
        if cli.log_json {
            builder = builder.set_override("logging.json", true)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        url::Url::parse(&cfg.store.base_url).map_err(|e| {
            config::ConfigError::Message(format!("invalid store.base_url: {e}"))
        })?;
        Ok(cfg)
    }

    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig::from(&self.notifier)
    }
}
