//! Loading of the per-country navigation timing dataset.

use anyhow::Result;
use tracing::debug;

use crate::isp::IspResolver;
use crate::query::{QueryExecutor, parse_rows};
use crate::records::{TimingRecord, dedup_first, enrich_with_isp};

/// Cap on how many timing records are drawn per country, to bound query
/// cost. The source query randomizes order, so the cap is an unbiased
/// sample and first-seen deduplication is a uniform-random pick.
pub const MAX_SAMPLE_SIZE: usize = 1_000_000;

/// Fetches the timing dataset for a country and period, deduplicated by
/// page-view token and enriched with ASN/ASO.
#[tracing::instrument(skip(executor, resolver))]
pub async fn fetch_timing_dataset<Q, R>(
    executor: &Q,
    resolver: &R,
    country: &str,
    year: i32,
    month: u32,
) -> Result<Vec<TimingRecord>>
where
    Q: QueryExecutor,
    R: IspResolver,
{
    debug!("Fetching navigation timing dataset");

    let sql = format!(
        "SELECT useragent.device_family, ip, event.responseStart - event.connectStart AS ttfb, \
         event.loadEventStart - event.responseStart AS plt, event.netinfoConnectionType AS type, \
         event.pageviewToken, event.transferSize, event.mobileMode FROM event.NavigationTiming \
         WHERE year = {year} AND month = {month} AND event.originCountry = '{country}' \
         SORT BY RAND() LIMIT {MAX_SAMPLE_SIZE};"
    );

    let raw = executor.run(&sql).await?;

    debug!("Processing navigation timing dataset");

    let mut timing = dedup_first(parse_rows::<TimingRecord>(&raw));
    enrich_with_isp(&mut timing, resolver)?;

    debug!(records = timing.len(), "Timing dataset ready");

    Ok(timing)
}
