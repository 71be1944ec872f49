use crate::error::{AppError, Result};

pub const DOMA_API_URL: &str = "https://api-testnet.doma.xyz";
pub const DOMA_GRAPHQL_URL: &str = "https://api-testnet.doma.xyz/graphql";

/// Doma testnet chain id, used to build CAIP-10 owner filters.
pub const DOMA_CHAIN_ID: u64 = 97476;

/// Default decimal count for upstream prices that do not carry a currency.
pub const DEFAULT_CURRENCY_DECIMALS: u32 = 6;

/// Decimal places of every fixed-point amount the normalizer emits (USDC smallest unit).
pub const FIXED_POINT_DECIMALS: u32 = 6;

/// `10^FIXED_POINT_DECIMALS`, for conversions to and from display units.
pub const FIXED_POINT_SCALE: f64 = 1_000_000.0;

/// Client feed re-poll interval (seconds).
pub const AUCTION_POLL_INTERVAL_SECS: u64 = 30;

/// Upper bound on synthetic historical records per request.
pub const MAX_SYNTHETIC_HISTORY: u64 = 50;

/// Headers the browser is allowed to send on cross-origin calls.
pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// What to return when the upstream answers successfully but with no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
    /// Substitute hardcoded or randomly generated sample records.
    Sample,
    /// Return the empty list as-is.
    Empty,
}

impl std::str::FromStr for FallbackMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sample" => Ok(FallbackMode::Sample),
            "empty" => Ok(FallbackMode::Empty),
            other => Err(AppError::Config(format!(
                "FALLBACK_MODE must be 'sample' or 'empty', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for FallbackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackMode::Sample => write!(f, "sample"),
            FallbackMode::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub doma_api_url: String,
    pub doma_graphql_url: String,
    /// Sent as `Api-Key` when set (DOMA_API_KEY).
    pub doma_api_key: Option<String>,
    pub chain_id: u64,
    pub log_level: String,
    pub api_port: u16,
    pub fallback_mode: FallbackMode,
    /// Timeout applied to every outbound request (UPSTREAM_TIMEOUT_SECS).
    pub upstream_timeout_secs: u64,
    /// `take` argument for listing queries (LISTINGS_PAGE_SIZE).
    pub listings_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            doma_api_url: DOMA_API_URL.to_string(),
            doma_graphql_url: DOMA_GRAPHQL_URL.to_string(),
            doma_api_key: None,
            chain_id: DOMA_CHAIN_ID,
            log_level: "info".to_string(),
            api_port: 3000,
            fallback_mode: FallbackMode::Sample,
            upstream_timeout_secs: 30,
            listings_page_size: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            doma_api_url: std::env::var("DOMA_API_URL").unwrap_or(defaults.doma_api_url),
            doma_graphql_url: std::env::var("DOMA_GRAPHQL_URL")
                .unwrap_or(defaults.doma_graphql_url),
            doma_api_key: std::env::var("DOMA_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            chain_id: std::env::var("DOMA_CHAIN_ID")
                .unwrap_or_else(|_| DOMA_CHAIN_ID.to_string())
                .parse::<u64>()
                .map_err(|_| AppError::Config("DOMA_CHAIN_ID must be an integer".to_string()))?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            fallback_mode: std::env::var("FALLBACK_MODE")
                .unwrap_or_else(|_| "sample".to_string())
                .parse()?,
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .unwrap_or(defaults.upstream_timeout_secs),
            listings_page_size: std::env::var("LISTINGS_PAGE_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse::<u32>()
                .unwrap_or(defaults.listings_page_size),
        })
    }

    /// CAIP-10 account id for `address` on the configured chain.
    pub fn caip10(&self, address: &str) -> String {
        format!("eip155:{}:{}", self.chain_id, address)
    }
}
