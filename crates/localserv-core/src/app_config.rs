use std::path::PathBuf;

/// Credentials for the remote RPC ingestion endpoint.
///
/// Both halves are required; the config loader rejects a URL without a
/// key (and vice versa) before any network activity happens.
#[derive(Clone)]
pub struct RpcConfig {
    pub base_url: String,
    pub service_key: String,
    pub rpc_name: String,
}

impl std::fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &"[redacted]")
            .field("rpc_name", &self.rpc_name)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scheme + host of the target directory site.
    pub base_origin: String,
    /// Locale path prefix business links live under, e.g. `/es-es`.
    pub locale_prefix: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Maximum links per discovery run; 0 = unbounded.
    pub max_links: usize,
    /// Hard cap on result pages fetched per query.
    pub max_pages: usize,
    /// Bound on concurrent business-page extractions in a batch run.
    pub max_concurrent_extractions: usize,
    pub seed_category: String,
    pub csv_path: PathBuf,
    /// `None` disables the JSONL sink.
    pub jsonl_path: Option<PathBuf>,
    pub rpc: Option<RpcConfig>,
    pub source_code: String,
    pub business_type_code: String,
    pub country_code: String,
}
