pub mod app_config;
pub mod config;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app_config::{AppConfig, RpcConfig};
pub use config::{load_app_config, load_app_config_from_env};

/// One offered service as rendered on a business page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    /// Price text exactly as rendered. Empty means "quote only".
    pub price_text: String,
    /// Price in minor currency units (cents). `None` when the rendered
    /// price text is absent or unparseable — never zero.
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<i64>,
}

/// One business detail page, fully extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    pub source_url: String,
    /// Leading numeric path segment of the source URL, when present.
    pub external_id: Option<String>,
    pub city: Option<String>,
    /// Never empty: a page with zero extractable services is an
    /// extraction failure, not an empty-service business.
    pub services: Vec<ServiceRecord>,
}

/// Flattened unit appended to the durable sinks.
///
/// The dedup key across runs is `(url, business_name, service_name,
/// price)` — see [`IngestionRow::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRow {
    pub scraped_at: DateTime<Utc>,
    pub url: String,
    pub business_name: String,
    pub service_name: String,
    pub price: String,
}

/// Cross-run uniqueness key for one ingestion row.
pub type RowKey = (String, String, String, String);

impl IngestionRow {
    #[must_use]
    pub fn key(&self) -> RowKey {
        (
            self.url.clone(),
            self.business_name.clone(),
            self.service_name.clone(),
            self.price.clone(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("partial remote ingestion credentials: {0}")]
    PartialRpcCredentials(&'static str),
}
