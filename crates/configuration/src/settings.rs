use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application.
///
/// Every section has sensible defaults so the server can start with no
/// config file at all; `profitline.toml` and `PROFITLINE_*` environment
/// variables override them.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub database: Database,
    pub insights: Insights,
}

/// HTTP server parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    /// The socket address the API listens on (e.g. "0.0.0.0:4000").
    pub listen_addr: String,
}

impl Default for Server {
    fn default() -> Self {
        Self { listen_addr: "127.0.0.1:4000".to_string() }
    }
}

/// Database pool parameters. The connection URL itself comes from the
/// `DATABASE_URL` environment variable, not from this file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self { max_connections: 10 }
    }
}

/// Thresholds for the rule-based insights.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Insights {
    /// Net profit above which a period is flagged as a success. A sensible
    /// figure depends on the size of the business.
    pub success_threshold: Decimal,
}

impl Default for Insights {
    fn default() -> Self {
        Self { success_threshold: Decimal::from(50_000) }
    }
}
