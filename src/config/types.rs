use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the scraper service
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub jobs: JobsConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    #[serde(rename = "bind-address")]
    pub bind_address: String,

    /// Browser origins allowed by the CORS layer
    #[serde(rename = "allowed-origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl ServerConfig {
    /// Parses the bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_address.parse()
    }
}

/// Outbound fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Timeout for page fetches during a crawl (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Timeout for each asset fetched by a retrieval job (seconds)
    #[serde(rename = "asset-timeout-secs")]
    pub asset_timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("AudioBreakScraper/{}", env!("CARGO_PKG_VERSION")),
            page_timeout_secs: 30,
            asset_timeout_secs: 10,
            connect_timeout_secs: 10,
        }
    }
}

impl FetchConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Retrieval job configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// How often a progress stream polls the job registry (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Time between stale-job sweeps (seconds)
    #[serde(rename = "sweep-interval-secs")]
    pub sweep_interval_secs: u64,

    /// Idle time after which a finished job is reclaimed (seconds)
    #[serde(rename = "stale-after-secs")]
    pub stale_after_secs: u64,

    /// Interval of SSE keep-alive comments (seconds)
    #[serde(rename = "keep-alive-secs")]
    pub keep_alive_secs: u64,

    /// Root directory for per-job scratch directories (system temp dir if unset)
    #[serde(rename = "scratch-dir")]
    pub scratch_dir: Option<PathBuf>,

    /// Archive name used when a request does not supply one
    #[serde(rename = "default-zip-name")]
    pub default_zip_name: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            sweep_interval_secs: 3600,
            stale_after_secs: 7200,
            keep_alive_secs: 15,
            scratch_dir: None,
            default_zip_name: "media-assets.zip".to_string(),
        }
    }
}

impl JobsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Resolves the scratch root, falling back to the system temp dir
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
