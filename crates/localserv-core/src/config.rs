use std::path::PathBuf;

use crate::app_config::{AppConfig, RpcConfig};
use crate::ConfigError;

/// Browser-like identity sent with every request. The target site
/// serves reduced markup to obvious bot user-agents.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or remote ingestion
/// credentials are only half supplied.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or remote ingestion
/// credentials are only half supplied.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let base_origin = or_default("LOCALSERV_BASE_ORIGIN", "https://booksy.com")
        .trim_end_matches('/')
        .to_string();
    let locale_prefix = or_default("LOCALSERV_LOCALE_PREFIX", "/es-es");
    let user_agent = or_default("LOCALSERV_USER_AGENT", DEFAULT_USER_AGENT);
    let request_timeout_secs = parse_u64("LOCALSERV_REQUEST_TIMEOUT_SECS", "20")?;
    let max_links = parse_usize("LOCALSERV_MAX_LINKS", "0")?;
    let max_pages = parse_usize("LOCALSERV_MAX_PAGES", "200")?;
    let max_concurrent_extractions = parse_usize("LOCALSERV_MAX_CONCURRENT_EXTRACTIONS", "1")?;
    let seed_category = or_default("LOCALSERV_SEED_CATEGORY", "maquillaje");

    let csv_path = PathBuf::from(or_default("LOCALSERV_CSV_PATH", "data/services.csv"));
    // An explicitly empty JSONL path disables that sink.
    let jsonl_raw = or_default("LOCALSERV_JSONL_PATH", "data/services.jsonl");
    let jsonl_path = match jsonl_raw.trim() {
        "" | "none" | "off" => None,
        p => Some(PathBuf::from(p)),
    };

    let rpc = build_rpc_config(&lookup)?;

    let source_code = or_default("LOCALSERV_SOURCE_CODE", "booksy").to_lowercase();
    let business_type_code =
        or_default("LOCALSERV_BUSINESS_TYPE_CODE", "makeup_artist").to_lowercase();
    let country_code = or_default("LOCALSERV_COUNTRY_CODE", "ES").to_uppercase();

    Ok(AppConfig {
        base_origin,
        locale_prefix,
        user_agent,
        request_timeout_secs,
        max_links,
        max_pages,
        max_concurrent_extractions,
        seed_category,
        csv_path,
        jsonl_path,
        rpc,
        source_code,
        business_type_code,
        country_code,
    })
}

/// Assemble the optional RPC credential pair.
///
/// Both `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY` must be present
/// (non-empty) for the relay to be enabled; exactly one of the two is a
/// startup error rather than a silent no-op.
fn build_rpc_config<F>(lookup: &F) -> Result<Option<RpcConfig>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let base_url = non_empty("SUPABASE_URL");
    let service_key =
        non_empty("SUPABASE_SERVICE_ROLE_KEY").or_else(|| non_empty("SUPABASE_SERVICE_KEY"));

    match (base_url, service_key) {
        (Some(base_url), Some(service_key)) => {
            let rpc_name = lookup("LOCALSERV_RPC_NAME")
                .unwrap_or_else(|_| "ingest_business_payload".to_string());
            Ok(Some(RpcConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                service_key,
                rpc_name,
            }))
        }
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::PartialRpcCredentials(
            "SUPABASE_URL is set but SUPABASE_SERVICE_ROLE_KEY is missing",
        )),
        (None, Some(_)) => Err(ConfigError::PartialRpcCredentials(
            "SUPABASE_SERVICE_ROLE_KEY is set but SUPABASE_URL is missing",
        )),
    }
}
