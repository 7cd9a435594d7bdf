//! Per-country median CPU benchmark scores, the normalization anchor for
//! device-power filtering.

use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use crate::query::{QueryExecutor, parse_rows};
use crate::records::NetworkType;

/// One `country, score` row from a median query.
#[derive(Debug, Deserialize)]
struct CountryMedianRow {
    country: String,
    score: f64,
}

/// Median CPU benchmark score per country, one map per network class.
///
/// A country with no matching benchmark data has no entry; callers must
/// treat absence as fatal for that country/network rather than defaulting.
#[derive(Debug, Default)]
pub struct CpuMedians {
    cellular: HashMap<String, f64>,
    wifi: HashMap<String, f64>,
}

impl CpuMedians {
    pub fn get(&self, network: NetworkType, country: &str) -> Option<f64> {
        match network {
            NetworkType::Cellular => self.cellular.get(country).copied(),
            NetworkType::Wifi => self.wifi.get(country).copied(),
        }
    }

    #[cfg(test)]
    pub fn from_maps(cellular: HashMap<String, f64>, wifi: HashMap<String, f64>) -> Self {
        Self { cellular, wifi }
    }
}

/// Fetches the per-country 50th-percentile CPU benchmark score for the
/// period, once for cellular traffic on the stable mobile site and once
/// for wifi traffic on the desktop site.
pub async fn fetch_cpu_benchmark_medians<Q: QueryExecutor>(
    executor: &Q,
    year: i32,
    month: u32,
) -> Result<CpuMedians> {
    let cellular_sql = format!(
        "SELECT nt.event.originCountry AS country, PERCENTILE(cb.event.score, 0.5) AS score \
         FROM event.CpuBenchmark AS cb JOIN event.NavigationTiming AS nt \
         ON cb.event.pageviewToken = nt.event.pageviewToken \
         WHERE cb.year = {year} AND cb.month = {month} AND nt.year = {year} AND nt.month = {month} \
         AND nt.event.netinfoConnectionType = 'cellular' AND nt.event.mobileMode = 'stable' \
         GROUP BY nt.event.originCountry;"
    );
    let cellular = to_map(parse_rows(&executor.run(&cellular_sql).await?));

    let wifi_sql = format!(
        "SELECT nt.event.originCountry AS country, PERCENTILE(cb.event.score, 0.5) AS score \
         FROM event.CpuBenchmark AS cb JOIN event.NavigationTiming AS nt \
         ON cb.event.pageviewToken = nt.event.pageviewToken \
         WHERE cb.year = {year} AND cb.month = {month} AND nt.year = {year} AND nt.month = {month} \
         AND nt.event.netinfoConnectionType = 'wifi' AND nt.event.mobileMode IS NULL \
         GROUP BY nt.event.originCountry;"
    );
    let wifi = to_map(parse_rows(&executor.run(&wifi_sql).await?));

    debug!(
        cellular_countries = cellular.len(),
        wifi_countries = wifi.len(),
        "Fetched CPU benchmark medians"
    );

    Ok(CpuMedians { cellular, wifi })
}

fn to_map(rows: Vec<CountryMedianRow>) -> HashMap<String, f64> {
    rows.into_iter().map(|r| (r.country, r.score)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    struct StubExecutor;

    #[async_trait::async_trait]
    impl QueryExecutor for StubExecutor {
        async fn run(&self, sql: &str) -> Result<String> {
            if sql.contains("'cellular'") {
                Ok("country\tscore\nUS\t300.0\nDE\t280.5\n".to_string())
            } else {
                Ok("country\tscore\nUS\t450.0\n".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_medians_per_network() {
        let medians = fetch_cpu_benchmark_medians(&StubExecutor, 2026, 7)
            .await
            .unwrap();

        assert_eq!(medians.get(NetworkType::Cellular, "US"), Some(300.0));
        assert_eq!(medians.get(NetworkType::Cellular, "DE"), Some(280.5));
        assert_eq!(medians.get(NetworkType::Wifi, "US"), Some(450.0));
    }

    #[tokio::test]
    async fn test_absent_country_has_no_entry() {
        let medians = fetch_cpu_benchmark_medians(&StubExecutor, 2026, 7)
            .await
            .unwrap();

        assert_eq!(medians.get(NetworkType::Wifi, "DE"), None);
        assert_eq!(medians.get(NetworkType::Cellular, "JP"), None);
    }
}
