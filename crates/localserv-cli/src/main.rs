mod pipeline;

use clap::{Args, Parser, Subcommand};
use localserv_core::load_app_config;
use localserv_scraper::PageFetcher;
use localserv_store::{query_rows, CsvSink, RowFilter, SortKey, SortOrder};
use tracing_subscriber::EnvFilter;

use crate::pipeline::Strategy;

#[derive(Debug, Parser)]
#[command(name = "localserv")]
#[command(about = "Local-services directory scraper and exporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover business links and print them, without extracting.
    Discover(DiscoverArgs),
    /// Discover, extract, and persist in one run.
    Run(DiscoverArgs),
    /// Extract and persist explicitly supplied business URLs.
    Export(ExportArgs),
    /// Browse rows accumulated in the CSV sink.
    Query(QueryArgs),
}

#[derive(Debug, Args)]
struct DiscoverArgs {
    #[arg(long, value_enum)]
    strategy: Strategy,
    /// Postal code; ignored by the city-wide strategy.
    #[arg(long, default_value = "")]
    postal_code: String,
    #[arg(long, default_value = "")]
    city: String,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Business page URLs, schemeless accepted.
    #[arg(required = true)]
    urls: Vec<String>,
    /// City recorded for every exported business, overriding the
    /// URL-derived guess.
    #[arg(long)]
    city: Option<String>,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Case-insensitive substring over business names.
    #[arg(long)]
    business: Option<String>,
    /// Exact business name to keep; repeatable, rows matching any
    /// given name pass.
    #[arg(long = "business-name")]
    business_name: Vec<String>,
    /// Case-insensitive substring over service names.
    #[arg(long)]
    service: Option<String>,
    /// Exact source URL.
    #[arg(long)]
    url: Option<String>,
    /// Inclusive minimum price in cents.
    #[arg(long)]
    min_price_cents: Option<i64>,
    /// Inclusive maximum price in cents.
    #[arg(long)]
    max_price_cents: Option<i64>,
    #[arg(long, value_enum)]
    sort: Option<SortField>,
    #[arg(long)]
    desc: bool,
    #[arg(long, default_value_t = 0)]
    offset: usize,
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SortField {
    Business,
    Service,
    Price,
    ScrapedAt,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Business => SortKey::Business,
            SortField::Service => SortKey::Service,
            SortField::Price => SortKey::Price,
            SortField::ScrapedAt => SortKey::ScrapedAt,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = load_app_config()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Discover(args) => {
            let fetcher = PageFetcher::new(config.request_timeout_secs, &config.user_agent)?;
            let links = pipeline::discover(
                &config,
                &fetcher,
                args.strategy,
                &args.postal_code,
                &args.city,
            )
            .await?;
            for link in &links {
                println!("{link}");
            }
            eprintln!("{} links discovered", links.len());
        }
        Commands::Run(args) => {
            let fetcher = PageFetcher::new(config.request_timeout_secs, &config.user_agent)?;
            let links = pipeline::discover(
                &config,
                &fetcher,
                args.strategy,
                &args.postal_code,
                &args.city,
            )
            .await?;
            let city = (!args.city.trim().is_empty()).then_some(args.city.as_str());
            let report = pipeline::extract_and_persist(&config, &fetcher, &links, city).await?;
            finish_batch(report)?;
        }
        Commands::Export(args) => {
            let fetcher = PageFetcher::new(config.request_timeout_secs, &config.user_agent)?;
            let report =
                pipeline::extract_and_persist(&config, &fetcher, &args.urls, args.city.as_deref())
                    .await?;
            finish_batch(report)?;
        }
        Commands::Query(args) => {
            let rows = CsvSink::new(&config.csv_path).read_rows()?;
            let filter = build_filter(&args);
            let order = if args.desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            let sort = args.sort.map(|field| (SortKey::from(field), order));
            let selected = query_rows(&rows, &filter, sort, args.offset, args.limit);
            for row in &selected {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.scraped_at.to_rfc3339(),
                    row.business_name,
                    row.service_name,
                    if row.price.is_empty() { "-" } else { &row.price },
                    row.url
                );
            }
            eprintln!("{} of {} rows", selected.len(), rows.len());
        }
    }

    Ok(())
}

fn build_filter(args: &QueryArgs) -> RowFilter {
    RowFilter {
        url: args.url.clone(),
        business_contains: args.business.clone(),
        service_contains: args.service.clone(),
        min_price_cents: args.min_price_cents,
        max_price_cents: args.max_price_cents,
        businesses: (!args.business_name.is_empty())
            .then(|| args.business_name.iter().cloned().collect()),
    }
}

/// Prints the batch summary and turns a non-empty error list into a
/// nonzero exit, after everything persistable was persisted.
fn finish_batch(report: pipeline::BatchReport) -> anyhow::Result<()> {
    println!(
        "extracted {} businesses, wrote {} rows, relayed {}",
        report.extracted, report.rows_written, report.relayed
    );
    if report.errors.is_empty() {
        return Ok(());
    }
    for (url, message) in &report.errors {
        eprintln!("FAILED {url}: {message}");
    }
    anyhow::bail!("batch finished with {} errors", report.errors.len())
}
