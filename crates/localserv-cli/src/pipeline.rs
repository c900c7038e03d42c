//! End-to-end orchestration: discovery strategy, bounded-concurrency
//! extraction, durable sinks, optional RPC relay.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use localserv_core::{AppConfig, BusinessRecord, IngestionRow};
use localserv_ingest::{BusinessPayload, PayloadContext, RpcClient};
use localserv_scraper::{
    discover_city_wide, discover_links, extract_business, locate, resolve_location_token,
    DiscoveryLimits, PageFetcher,
};
use localserv_store::{CsvSink, JsonlSink};

/// Link discovery strategy selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// One probe query from seed category + postal code + city.
    PostalQuery,
    /// Resolve the location token, then paginate the category URL.
    CityCategory,
    /// Zone-code expansion across a whole city, no postal code.
    CityWide,
}

fn limits_of(config: &AppConfig) -> DiscoveryLimits {
    DiscoveryLimits {
        max_links: config.max_links,
        max_pages: config.max_pages,
    }
}

/// Runs one discovery strategy and returns the deduplicated links.
///
/// An unresolved location token aborts the city-category strategy;
/// the other strategies degrade to however many links their queries
/// surfaced.
pub async fn discover(
    config: &AppConfig,
    fetcher: &PageFetcher,
    strategy: Strategy,
    postal_code: &str,
    city: &str,
) -> anyhow::Result<Vec<String>> {
    let limits = limits_of(config);
    match strategy {
        Strategy::PostalQuery => {
            let query_text = [
                config.seed_category.replace('-', " ").as_str(),
                postal_code.trim(),
                city.trim(),
            ]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
            let url = locate::search_url(&config.base_origin, &config.locale_prefix, &query_text);
            tracing::info!(url, "postal-query discovery");
            let found =
                discover_links(fetcher, &url, &config.base_origin, &config.locale_prefix, limits)
                    .await;
            Ok(found.links)
        }
        Strategy::CityCategory => {
            let resolution = resolve_location_token(
                fetcher,
                &config.base_origin,
                &config.locale_prefix,
                postal_code,
                city,
            )
            .await;
            let Some(token) = resolution.token else {
                anyhow::bail!(
                    "could not infer a location token from probe {}",
                    resolution.probe_url
                );
            };
            let url = locate::category_url(
                &config.base_origin,
                &config.locale_prefix,
                &config.seed_category,
                &token,
            );
            tracing::info!(token, url, "city-category discovery");
            let found =
                discover_links(fetcher, &url, &config.base_origin, &config.locale_prefix, limits)
                    .await;
            Ok(found.links)
        }
        Strategy::CityWide => {
            let found = discover_city_wide(
                fetcher,
                &config.base_origin,
                &config.locale_prefix,
                city,
                &config.seed_category,
                limits,
            )
            .await;
            Ok(found.links)
        }
    }
}

/// What one batch run produced. `errors` holds `(url, message)` pairs;
/// a non-empty list means a nonzero exit even when rows were written.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub extracted: usize,
    pub rows_written: usize,
    pub relayed: usize,
    pub errors: Vec<(String, String)>,
}

/// Flattens one extracted business into sink rows, price text as
/// rendered (empty for quote-only services).
fn rows_from_record(record: &BusinessRecord) -> Vec<IngestionRow> {
    let scraped_at = Utc::now();
    record
        .services
        .iter()
        .map(|service| IngestionRow {
            scraped_at,
            url: record.source_url.clone(),
            business_name: record.name.clone(),
            service_name: service.name.clone(),
            price: service.price_text.clone(),
        })
        .collect()
}

/// Extracts every link with bounded concurrency and persists the
/// results.
///
/// Per-URL failures are collected, never propagated: one dead page
/// must not sink a batch. The CSV file is the dedup authority; the
/// JSONL mirror receives exactly the rows the CSV accepted.
pub async fn extract_and_persist(
    config: &AppConfig,
    fetcher: &PageFetcher,
    links: &[String],
    city_override: Option<&str>,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();

    let max_concurrent = config.max_concurrent_extractions.max(1);
    let results: Vec<(String, Result<BusinessRecord, localserv_scraper::ScrapeError>)> =
        stream::iter(links)
            .map(|url| async move {
                (url.clone(), extract_business(fetcher, url, city_override).await)
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

    let mut records = Vec::new();
    for (url, outcome) in results {
        match outcome {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::error!(url, error = %err, "extraction failed");
                report.errors.push((url, err.to_string()));
            }
        }
    }
    // Concurrency scrambles completion order; keep output deterministic.
    records.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    report.extracted = records.len();

    let batch: Vec<IngestionRow> = records.iter().flat_map(|r| rows_from_record(r)).collect();

    let csv = CsvSink::new(&config.csv_path);
    let mut seen = csv.existing_keys()?;
    let fresh: Vec<IngestionRow> = batch
        .into_iter()
        .filter(|row| seen.insert(row.key()))
        .collect();
    report.rows_written = csv.append_new(&fresh)?;
    if let Some(jsonl_path) = &config.jsonl_path {
        JsonlSink::new(jsonl_path).append(&fresh)?;
    }

    if let Some(rpc) = &config.rpc {
        let client = RpcClient::new(rpc, config.request_timeout_secs)?;
        let ctx = PayloadContext {
            source_code: config.source_code.clone(),
            business_type_code: config.business_type_code.clone(),
            country_code: config.country_code.clone(),
        };
        for record in &records {
            let payload = BusinessPayload::from_record(record, &ctx);
            match client.relay(&payload).await {
                Ok(()) => report.relayed += 1,
                Err(err) => {
                    tracing::error!(url = %record.source_url, error = %err, "relay failed");
                    report.errors.push((record.source_url.clone(), err.to_string()));
                }
            }
        }
    }

    tracing::info!(
        extracted = report.extracted,
        rows_written = report.rows_written,
        relayed = report.relayed,
        failed = report.errors.len(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
