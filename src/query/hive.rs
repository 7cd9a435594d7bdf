use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::debug;

use super::QueryExecutor;

/// Default location of the beeline binary, overridable via `BEELINE_BIN`.
pub const DEFAULT_BEELINE_BIN: &str = "/usr/local/bin/beeline";

/// Query executor that shells out to beeline in `tsv2` output mode.
pub struct HiveClient {
    beeline: PathBuf,
}

impl HiveClient {
    pub fn new(beeline: impl Into<PathBuf>) -> Self {
        Self {
            beeline: beeline.into(),
        }
    }

    /// Builds a client from the `BEELINE_BIN` environment variable,
    /// falling back to [`DEFAULT_BEELINE_BIN`].
    pub fn from_env() -> Self {
        let bin = std::env::var("BEELINE_BIN").unwrap_or_else(|_| DEFAULT_BEELINE_BIN.to_string());
        Self::new(bin)
    }
}

#[async_trait::async_trait]
impl QueryExecutor for HiveClient {
    async fn run(&self, sql: &str) -> Result<String> {
        debug!(sql, "Running query");

        // beeline reads the query from a file
        let mut sql_file = tempfile::NamedTempFile::new()?;
        sql_file.write_all(sql.as_bytes())?;
        sql_file.flush()?;

        let output = tokio::process::Command::new(&self.beeline)
            .arg("--outputformat=tsv2")
            .arg("--silent=true")
            .arg("-f")
            .arg(sql_file.path())
            .output()
            .await?;

        if !output.status.success() {
            bail!("query execution failed with {}", output.status);
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}
