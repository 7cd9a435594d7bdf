//! Per-organization aggregation of CPU-normalized telemetry into an
//! ordered ranking.

use std::collections::HashMap;

use anyhow::{Result, bail};
use tracing::debug;

use crate::isp::IspResolver;
use crate::medians::CpuMedians;
use crate::query::QueryExecutor;
use crate::ranking::classify::asns_for_network;
use crate::ranking::join::cpu_normalized_join;
use crate::ranking::types::{CpuBand, RankingEntry};
use crate::records::{BenchmarkRecord, NetworkType, TimingRecord};
use crate::stats::group_median;

/// Generates the ranking for one country and network type.
///
/// The ASN whitelist is derived from the unfiltered timing dataset, then
/// applied to the CPU-normalized one, so classification does not depend on
/// CPU filtering. A missing CPU median is a fatal precondition violation
/// for this country/network; there is no default.
#[tracing::instrument(skip(executor, resolver, timing, medians))]
pub async fn generate_ranking<Q, R>(
    executor: &Q,
    resolver: &R,
    timing: &[TimingRecord],
    country: &str,
    year: i32,
    month: u32,
    cpu_span: f64,
    network: NetworkType,
    medians: &CpuMedians,
    threshold: usize,
) -> Result<Vec<RankingEntry>>
where
    Q: QueryExecutor,
    R: IspResolver,
{
    let Some(median_cpu) = medians.get(network, country) else {
        bail!("no CPU benchmark median for {country}/{network}");
    };

    debug!(median_cpu, "Median CPU benchmark score");

    let band = CpuBand::around(median_cpu, cpu_span);

    let (normalized, benchmarks) =
        cpu_normalized_join(executor, resolver, timing, country, year, month, band).await?;

    // Which ASNs correspond to this network type, thanks to records that
    // have a connection type set
    let whitelisted_asns = asns_for_network(timing, network);

    debug!(whitelisted = whitelisted_asns.len(), "Whitelisted ASNs");

    // Keep data for those ASNs only, which may include records that don't
    // have a connection type set, then drop page views of the mobile site
    // on a desktop provider and vice versa. Comparing mobile and desktop
    // page views mixes apples and oranges, particularly on page weight;
    // the alpha and beta mobile sites go too.
    let rows: Vec<&TimingRecord> = normalized
        .iter()
        .filter(|t| whitelisted_asns.contains(&t.asn))
        .filter(|t| keeps_page_variant(t, network))
        .collect();

    Ok(rank_organizations(&rows, &benchmarks, threshold))
}

/// Whether a timing record serves the page variant expected for the
/// network type: the stable mobile site for cellular, the desktop site
/// (no mobile variant at all) for wifi.
pub fn keeps_page_variant(record: &TimingRecord, network: NetworkType) -> bool {
    match network {
        NetworkType::Cellular => record.mobile_mode.as_deref() == Some("stable"),
        NetworkType::Wifi => !matches!(
            record.mobile_mode.as_deref(),
            Some("stable") | Some("alpha") | Some("beta")
        ),
    }
}

/// Groups timing and benchmark rows by organization and emits entries in
/// ascending median-TTFB order, skipping organizations with fewer
/// benchmark samples than the threshold.
///
/// Metrics are aggregated per ASO rather than per ASN, as one organization
/// may own multiple ASNs.
pub fn rank_organizations(
    timing: &[&TimingRecord],
    benchmarks: &[BenchmarkRecord],
    threshold: usize,
) -> Vec<RankingEntry> {
    let ttfb_by_aso = group_median(
        timing
            .iter()
            .filter_map(|t| t.ttfb.map(|v| (t.aso.as_str(), v))),
    );
    let plt_by_aso = group_median(
        timing
            .iter()
            .filter_map(|t| t.plt.map(|v| (t.aso.as_str(), v))),
    );
    let transfer_by_aso = group_median(
        timing
            .iter()
            .filter_map(|t| t.transfer_size.map(|v| (t.aso.as_str(), v))),
    );
    let score_by_aso = group_median(benchmarks.iter().map(|b| (b.aso.as_str(), b.score)));

    let mut samples_by_aso: HashMap<&str, usize> = HashMap::new();
    for benchmark in benchmarks {
        *samples_by_aso.entry(benchmark.aso.as_str()).or_default() += 1;
    }

    let mut ordered: Vec<(&String, &f64)> = ttfb_by_aso.iter().collect();
    ordered.sort_by(|a, b| a.1.total_cmp(b.1).then_with(|| a.0.cmp(b.0)));

    let mut ranking = Vec::new();

    for (aso, median_ttfb) in ordered {
        let samples = samples_by_aso.get(aso.as_str()).copied().unwrap_or(0);
        if samples < threshold {
            continue;
        }

        // Not all records have a transfer size; an organization may have
        // none at all, in which case the report carries 0.
        ranking.push(RankingEntry {
            aso: aso.clone(),
            ttfb: *median_ttfb as i64,
            plt: plt_by_aso.get(aso).copied().unwrap_or(0.0) as i64,
            cpu: score_by_aso.get(aso).copied().unwrap_or(0.0) as i64,
            transfer_size: transfer_by_aso.get(aso).copied().unwrap_or(0.0) as i64,
            samples,
        });
    }

    ranking
}
