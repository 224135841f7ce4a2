use alloy::primitives::Address;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required env var: {0}")]
    MissingEnv(String),
    #[error("invalid market address: {0}")]
    BadAddress(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Monad testnet JSON-RPC endpoint - overridable via env BIRDY_RPC_URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Endpoints tried in order when the primary refuses to answer.
    #[serde(default)]
    pub fallback_rpc_urls: Vec<String>,
    /// Prediction market contract - overridable via env BIRDY_MARKET_ADDRESS
    #[serde(default = "default_market_address")]
    pub market_address: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityConfig {
    /// Widest block range a single log query may cover.
    #[serde(default = "default_max_span")]
    pub max_span: u64,
    /// How many blocks behind the tip each scan reaches.
    #[serde(default = "default_lookback")]
    pub lookback: u64,
    /// Newest bets kept per scan.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    /// Seconds between scans in the watcher.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionConfig {
    /// Poll unresolved markets for on-chain resolution.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_resolution_interval")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    /// Enable exchange spot quotes for ticker-backed markets.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,
    #[serde(default = "default_feed_interval")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Path to a TOML market catalog; unset uses the built-in set.
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_rpc_url() -> String {
    "https://testnet-rpc.monad.xyz".to_string()
}
fn default_market_address() -> String {
    "0xCF078031f890Ed361442e09ebA6Ec255A47d6E72".to_string()
}
fn default_chain_id() -> u64 {
    10143
}
fn default_max_span() -> u64 {
    50
}
fn default_lookback() -> u64 {
    1000
}
fn default_recent_limit() -> usize {
    50
}
fn default_scan_interval() -> u64 {
    15
}
fn default_true() -> bool {
    true
}
fn default_resolution_interval() -> u64 {
    60
}
fn default_feed_base_url() -> String {
    crate::feed::BINANCE_REST_BASE.to_string()
}
fn default_feed_interval() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            fallback_rpc_urls: Vec::new(),
            market_address: default_market_address(),
            chain_id: default_chain_id(),
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            max_span: default_max_span(),
            lookback: default_lookback(),
            recent_limit: default_recent_limit(),
            scan_interval_secs: default_scan_interval(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_resolution_interval(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_feed_base_url(),
            poll_interval_secs: default_feed_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl ChainConfig {
    /// The market address as a checked `Address`.
    pub fn market(&self) -> Result<Address, ConfigError> {
        self.market_address
            .parse()
            .map_err(|_| ConfigError::BadAddress(self.market_address.clone()))
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.overlay_env();
        Ok(config)
    }

    /// Defaults plus environment overrides (no file needed).
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.overlay_env();
        config
    }

    /// Load `birdymarket.toml` when present, otherwise fall back to env-only.
    pub fn bootstrap() -> Result<Self, ConfigError> {
        let path = Path::new("birdymarket.toml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::from_env())
        }
    }

    fn overlay_env(&mut self) {
        if let Ok(url) = std::env::var("BIRDY_RPC_URL") {
            self.chain.rpc_url = url;
        }
        if let Ok(addr) = std::env::var("BIRDY_MARKET_ADDRESS") {
            self.chain.market_address = addr;
        }
    }
}

/// Fetch an env var that must be present, for signer keys the config file
/// never stores.
pub fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
}
