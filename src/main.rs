//! CLI entry point for the ISP ranking report generator.
//!
//! Loads page-load telemetry and CPU benchmark medians for each requested
//! country, ranks ISPs per network type, and writes a tab-separated
//! report, optionally publishing it as the latest dataset.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::{Datelike, Utc};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use aso_ranker::countries;
use aso_ranker::isp::GeoIpResolver;
use aso_ranker::medians::fetch_cpu_benchmark_medians;
use aso_ranker::query::HiveClient;
use aso_ranker::ranking::generate_ranking;
use aso_ranker::records::NetworkType;
use aso_ranker::report::{self, ReportWriter};
use aso_ranker::telemetry::fetch_timing_dataset;

#[derive(Parser)]
#[command(name = "aso_ranker")]
#[command(about = "Generate ISP ranking", long_about = None)]
struct Cli {
    /// Sample size threshold
    #[arg(long, default_value_t = 500)]
    threshold: usize,

    /// Country codes to rank
    #[arg(long, num_args = 1.., default_values_t = countries::all_codes().map(String::from))]
    countries: Vec<String>,

    /// Reporting year (defaults to the previous calendar month's)
    #[arg(long)]
    year: Option<i32>,

    /// Reporting month (defaults to the previous calendar month)
    #[arg(long)]
    month: Option<u32>,

    /// Size of the CPU score span around the median to keep
    #[arg(long, default_value_t = 100)]
    cpu_span: i64,

    /// Display debug logging
    #[arg(long)]
    debug: bool,

    /// Publish the dataset
    #[arg(long)]
    publish: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aso_ranker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aso_ranker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_level = if cli.debug { "debug" } else { "error" };
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(stderr_level.parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    generate_report(&cli).await
}

/// Runs the full batch: medians once, then per country one telemetry load
/// and one ranking per network type, streamed into the report file.
async fn generate_report(cli: &Cli) -> Result<()> {
    let (default_year, default_month) = previous_month();
    let year = cli.year.unwrap_or(default_year);
    let month = cli.month.unwrap_or(default_month);

    let executor = HiveClient::from_env();
    let resolver = GeoIpResolver::from_env();

    let filename = report::report_filename(year, month);
    let report_path = if cli.publish {
        Path::new(report::PUBLISH_DIR).join(&filename)
    } else {
        PathBuf::from(&filename)
    };

    let mut writer = ReportWriter::create(&report_path)?;

    info!(year, month, "Getting CPU medians per country per network type");
    let medians = fetch_cpu_benchmark_medians(&executor, year, month).await?;

    for country in &cli.countries {
        let Some(country_name) = countries::country_name(country) else {
            bail!("unknown country code {country:?}");
        };

        let timing = fetch_timing_dataset(&executor, &resolver, country, year, month).await?;

        for network in NetworkType::ALL {
            let ranking = generate_ranking(
                &executor,
                &resolver,
                &timing,
                country,
                year,
                month,
                cli.cpu_span as f64,
                network,
                &medians,
                cli.threshold,
            )
            .await?;

            writer.append_block(country_name, country, network, &ranking)?;
        }
    }

    writer.finish()?;
    info!(path = %report_path.display(), "Dataset written");

    if cli.publish {
        let latest = report::publish_latest(&report_path, Path::new(report::PUBLISH_DIR))?;
        info!(path = %latest.display(), "Copied to latest");
    }

    Ok(())
}

/// The year and month of the previous calendar month.
fn previous_month() -> (i32, u32) {
    let today = Utc::now().date_naive();
    let first = today.with_day(1).unwrap();
    let last_month = first.pred_opt().unwrap();
    (last_month.year(), last_month.month())
}
