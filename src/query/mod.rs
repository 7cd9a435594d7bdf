//! Bulk query execution against the data warehouse.
//!
//! The executor is a trait seam so the pipeline can be driven from canned
//! query output in tests. Results come back as raw tab-separated text with
//! a header row; [`parse_rows`] turns them into typed records.

mod hive;

pub use hive::HiveClient;

use anyhow::Result;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Abstraction over the bulk query execution mechanism.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Submits a query and waits for its complete tab-separated output,
    /// header row included. Execution failure is fatal to the run.
    async fn run(&self, sql: &str) -> Result<String>;
}

/// Parses tab-separated query output into typed rows.
///
/// Rows that fail to parse are skipped rather than failing the whole load;
/// the skipped count is surfaced as a warning so the loss is visible.
pub fn parse_rows<T: DeserializeOwned>(tsv: &str) -> Vec<T> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(tsv.as_bytes());

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize() {
        match result {
            Ok(record) => rows.push(record),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "Skipping malformed query result row");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Malformed rows skipped in query result");
    }

    rows
}
