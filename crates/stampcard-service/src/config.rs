//! Service configuration.

use stampcard_core::{money, LoyaltyConfig};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// SQLite database URL (default: "<sqlite://data/stampcard.db>").
    pub database_url: String,

    /// Connection pool size (default: 4).
    pub db_max_connections: u32,

    /// Program rules written to the database on first startup.
    pub loyalty_defaults: LoyaltyConfig,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/stampcard.db".into()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            loyalty_defaults: load_loyalty_defaults(
                std::env::var("DEFAULT_STAMPS_NEEDED").ok().as_deref(),
                std::env::var("DEFAULT_REAIS_PER_STAMP").ok().as_deref(),
            ),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024), // 64KB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Build the seed rules from raw variable values.
///
/// Each unset value keeps its built-in default. A set but unusable pair is
/// logged and replaced by the built-in defaults.
fn load_loyalty_defaults(
    stamps_needed: Option<&str>,
    reais_per_stamp: Option<&str>,
) -> LoyaltyConfig {
    let defaults = LoyaltyConfig::default();

    let stamps_needed = match stamps_needed {
        Some(raw) => raw.trim().parse().ok(),
        None => Some(defaults.stamps_needed),
    };
    let cents_per_stamp = match reais_per_stamp {
        Some(raw) => money::parse_reais(raw),
        None => Some(defaults.cents_per_stamp),
    };

    let loaded = stamps_needed
        .zip(cents_per_stamp)
        .and_then(|(needed, cents)| LoyaltyConfig::new(needed, cents).ok());

    loaded.unwrap_or_else(|| {
        tracing::warn!(
            stamps_needed = ?stamps_needed,
            cents_per_stamp = ?cents_per_stamp,
            "Invalid loyalty defaults in environment, using built-in values"
        );
        defaults
    })
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: "sqlite://data/stampcard.db".into(),
            db_max_connections: 4,
            loyalty_defaults: LoyaltyConfig::default(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
