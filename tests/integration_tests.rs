//! End-to-end pipeline test over stubbed query execution and ISP lookup.

use std::collections::HashMap;

use anyhow::Result;

use aso_ranker::isp::{Isp, IspResolver};
use aso_ranker::medians::fetch_cpu_benchmark_medians;
use aso_ranker::query::QueryExecutor;
use aso_ranker::ranking::generate_ranking;
use aso_ranker::records::NetworkType;
use aso_ranker::report::ReportWriter;
use aso_ranker::telemetry::fetch_timing_dataset;

/// Serves canned warehouse responses keyed on query shape.
struct StubWarehouse;

#[async_trait::async_trait]
impl QueryExecutor for StubWarehouse {
    async fn run(&self, sql: &str) -> Result<String> {
        if sql.contains("PERCENTILE") {
            if sql.contains("'cellular'") {
                return Ok("country\tscore\nUS\t300.0\n".to_string());
            }
            return Ok("country\tscore\nUS\t450.0\n".to_string());
        }

        if sql.contains("SORT BY RAND") {
            return Ok("device_family\tip\tttfb\tplt\ttype\tpageviewtoken\ttransfersize\tmobilemode\n\
                       iPhone\t10.0.0.1\t100\t400\tcellular\tt1\t1000\tstable\n\
                       iPhone\t10.0.0.1\t200\t600\tcellular\tt2\t3000\tstable\n\
                       Other\t10.0.0.2\t50\t300\twifi\tt3\t2000\tNULL\n\
                       Other\t10.0.0.2\t70\t500\twifi\tt4\tNULL\tNULL\n"
                .to_string());
        }

        // benchmark join query
        Ok("ip\tpageviewtoken\tscore\n\
            10.0.0.1\tt1\t300.0\n\
            10.0.0.1\tt2\t310.0\n\
            10.0.0.2\tt3\t300.0\n\
            10.0.0.2\tt4\t310.0\n"
            .to_string())
    }
}

struct StaticResolver(HashMap<&'static str, Isp>);

impl StaticResolver {
    fn new() -> Self {
        let mut map = HashMap::new();
        map.insert(
            "10.0.0.1",
            Isp {
                asn: 100,
                aso: "Acme Wireless".to_string(),
            },
        );
        map.insert(
            "10.0.0.2",
            Isp {
                asn: 200,
                aso: "Beta Broadband".to_string(),
            },
        );
        Self(map)
    }
}

impl IspResolver for StaticResolver {
    fn resolve_batch(&self, ips: &[String]) -> Result<Vec<Isp>> {
        Ok(ips
            .iter()
            .map(|ip| self.0.get(ip.as_str()).cloned().unwrap_or_else(Isp::unknown))
            .collect())
    }
}

#[tokio::test]
async fn test_full_pipeline_produces_report() {
    let executor = StubWarehouse;
    let resolver = StaticResolver::new();

    let medians = fetch_cpu_benchmark_medians(&executor, 2026, 7).await.unwrap();
    let timing = fetch_timing_dataset(&executor, &resolver, "US", 2026, 7)
        .await
        .unwrap();

    assert_eq!(timing.len(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("2026-07.tsv");
    let mut writer = ReportWriter::create(&path).unwrap();

    for network in NetworkType::ALL {
        let ranking = generate_ranking(
            &executor,
            &resolver,
            &timing,
            "US",
            2026,
            7,
            100.0,
            network,
            &medians,
            2,
        )
        .await
        .unwrap();

        assert_eq!(ranking.len(), 1);
        writer
            .append_block("United States", "US", network, &ranking)
            .unwrap();
    }

    writer.finish().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = content.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "Country\tCountry code\tType\tASO\tTTFB\tPLT\tCPU\tTransfer size\tSample size"
    );
    assert_eq!(
        lines[1],
        "United States\tUS\tMobile\tAcme Wireless\t150\t500\t305\t2000\t2"
    );
    assert_eq!(
        lines[2],
        "United States\tUS\tDesktop\tBeta Broadband\t60\t400\t305\t2000\t2"
    );
}

#[tokio::test]
async fn test_threshold_empties_the_ranking() {
    let executor = StubWarehouse;
    let resolver = StaticResolver::new();

    let medians = fetch_cpu_benchmark_medians(&executor, 2026, 7).await.unwrap();
    let timing = fetch_timing_dataset(&executor, &resolver, "US", 2026, 7)
        .await
        .unwrap();

    // Each organization only has 2 benchmark samples
    let ranking = generate_ranking(
        &executor,
        &resolver,
        &timing,
        "US",
        2026,
        7,
        100.0,
        NetworkType::Cellular,
        &medians,
        500,
    )
    .await
    .unwrap();

    assert!(ranking.is_empty());
}

#[tokio::test]
async fn test_country_without_median_fails() {
    let executor = StubWarehouse;
    let resolver = StaticResolver::new();

    let medians = fetch_cpu_benchmark_medians(&executor, 2026, 7).await.unwrap();
    let timing = fetch_timing_dataset(&executor, &resolver, "DE", 2026, 7)
        .await
        .unwrap();

    let result = generate_ranking(
        &executor,
        &resolver,
        &timing,
        "DE",
        2026,
        7,
        100.0,
        NetworkType::Wifi,
        &medians,
        2,
    )
    .await;

    assert!(result.is_err());
}
