//! CPU-normalized joining of the timing and benchmark datasets.
//!
//! Comparing load-time metrics across devices of wildly different
//! computational power confounds ISP quality with device mix; restricting
//! both datasets to page views whose benchmark score lies in a narrow band
//! around the country/network median controls for this.

use std::collections::HashSet;

use anyhow::Result;
use tracing::debug;

use crate::isp::IspResolver;
use crate::query::{QueryExecutor, parse_rows};
use crate::ranking::types::CpuBand;
use crate::records::{BenchmarkRecord, TimingRecord, dedup_first, enrich_with_isp};

/// Fetches the benchmark records within the CPU band for a country and
/// period, and restricts the timing dataset to page views that have a
/// matching in-band benchmark record.
///
/// Returns `(restricted timing dataset, benchmark dataset)`.
#[tracing::instrument(skip(executor, resolver, timing))]
pub async fn cpu_normalized_join<Q, R>(
    executor: &Q,
    resolver: &R,
    timing: &[TimingRecord],
    country: &str,
    year: i32,
    month: u32,
    band: CpuBand,
) -> Result<(Vec<TimingRecord>, Vec<BenchmarkRecord>)>
where
    Q: QueryExecutor,
    R: IspResolver,
{
    debug!("Fetching CPU benchmark dataset");

    // Band bounds are exclusive on purpose; loosening them would silently
    // change ranking membership.
    let sql = format!(
        "SELECT nt.ip, nt.event.pageviewToken, cb.event.score FROM event.NavigationTiming AS nt \
         INNER JOIN event.CpuBenchmark AS cb ON nt.event.pageviewToken = cb.event.pageviewToken \
         WHERE nt.year = {year} AND nt.month = {month} AND cb.year = {year} AND cb.month = {month} \
         AND nt.event.originCountry = '{country}' AND cb.event.score > {} \
         AND cb.event.score < {};",
        band.min, band.max
    );

    let raw = executor.run(&sql).await?;

    debug!("Processing CPU benchmark dataset");

    // One benchmark score per page view
    let mut benchmarks = dedup_first(parse_rows::<BenchmarkRecord>(&raw));
    enrich_with_isp(&mut benchmarks, resolver)?;

    debug!("Only keeping timing records that have a matching benchmark entry");

    let tokens: HashSet<&str> = benchmarks.iter().map(|b| b.token.as_str()).collect();
    let restricted: Vec<TimingRecord> = timing
        .iter()
        .filter(|t| tokens.contains(t.token.as_str()))
        .cloned()
        .collect();

    debug!(
        timing = restricted.len(),
        benchmarks = benchmarks.len(),
        "CPU-normalized join complete"
    );

    Ok((restricted, benchmarks))
}
