//! Report serialization and publishing.
//!
//! The report is a single tab-separated UTF-8 file with a fixed
//! nine-column header, one row per ranking entry, grouped by country and
//! network type in processing order.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::ranking::RankingEntry;
use crate::records::NetworkType;

pub const REPORT_HEADERS: [&str; 9] = [
    "Country",
    "Country code",
    "Type",
    "ASO",
    "TTFB",
    "PLT",
    "CPU",
    "Transfer size",
    "Sample size",
];

/// Directory published reports land in.
pub const PUBLISH_DIR: &str = "/srv/published-datasets/performance/autonomoussystems";

/// File name for one reporting period, e.g. `2026-07.tsv`.
pub fn report_filename(year: i32, month: u32) -> String {
    format!("{year}-{month:02}.tsv")
}

/// Streaming writer for the ranking report.
pub struct ReportWriter {
    writer: csv::Writer<File>,
}

impl ReportWriter {
    /// Creates the report file and writes the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(file);

        writer.write_record(REPORT_HEADERS)?;

        Ok(Self { writer })
    }

    /// Appends one country/network block of ranking entries.
    pub fn append_block(
        &mut self,
        country_name: &str,
        country_code: &str,
        network: NetworkType,
        ranking: &[RankingEntry],
    ) -> Result<()> {
        for entry in ranking {
            debug!(
                ?entry,
                country_name,
                country_code,
                label = network.label(),
                "Writing ranking entry"
            );

            let ttfb = entry.ttfb.to_string();
            let plt = entry.plt.to_string();
            let cpu = entry.cpu.to_string();
            let transfer_size = entry.transfer_size.to_string();
            let samples = entry.samples.to_string();

            self.writer.write_record([
                country_name,
                country_code,
                network.label(),
                entry.aso.as_str(),
                ttfb.as_str(),
                plt.as_str(),
                cpu.as_str(),
                transfer_size.as_str(),
                samples.as_str(),
            ])?;
        }

        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Copies a written report to the canonical `latest.tsv` in the publish
/// directory, overwriting any prior latest file.
pub fn publish_latest(report_path: &Path, publish_dir: &Path) -> Result<PathBuf> {
    let latest_path = publish_dir.join("latest.tsv");
    std::fs::copy(report_path, &latest_path)?;
    Ok(latest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(aso: &str, ttfb: i64) -> RankingEntry {
        RankingEntry {
            aso: aso.to_string(),
            ttfb,
            plt: 900,
            cpu: 300,
            transfer_size: 52000,
            samples: 1200,
        }
    }

    #[test]
    fn test_filename_zero_pads_month() {
        assert_eq!(report_filename(2026, 7), "2026-07.tsv");
        assert_eq!(report_filename(2026, 11), "2026-11.tsv");
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.tsv");

        let writer = ReportWriter::create(&path).unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Country\tCountry code\tType\tASO\tTTFB\tPLT\tCPU\tTransfer size\tSample size\n"
        );
    }

    #[test]
    fn test_rows_are_tab_separated_and_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.tsv");

        let mut writer = ReportWriter::create(&path).unwrap();
        writer
            .append_block(
                "United States",
                "US",
                NetworkType::Cellular,
                &[entry("Example Wireless", 150)],
            )
            .unwrap();
        writer
            .append_block(
                "United States",
                "US",
                NetworkType::Wifi,
                &[entry("Example Broadband", 80)],
            )
            .unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "United States\tUS\tMobile\tExample Wireless\t150\t900\t300\t52000\t1200"
        );
        assert_eq!(
            lines[2],
            "United States\tUS\tDesktop\tExample Broadband\t80\t900\t300\t52000\t1200"
        );
    }

    #[test]
    fn test_empty_block_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.tsv");

        let mut writer = ReportWriter::create(&path).unwrap();
        writer
            .append_block("Japan", "JP", NetworkType::Cellular, &[])
            .unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_publish_overwrites_latest() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("2026-07.tsv");
        std::fs::write(&report_path, "new report\n").unwrap();
        std::fs::write(dir.path().join("latest.tsv"), "old report\n").unwrap();

        let latest = publish_latest(&report_path, dir.path()).unwrap();

        assert_eq!(latest, dir.path().join("latest.tsv"));
        assert_eq!(std::fs::read_to_string(latest).unwrap(), "new report\n");
    }
}
