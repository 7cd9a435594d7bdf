//! Data types used by the ranking pipeline.

/// A window of CPU benchmark scores around a country/network median.
///
/// Membership is exclusive on both ends (`min < score < max`), matching
/// the benchmark retrieval query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuBand {
    pub min: f64,
    pub max: f64,
}

impl CpuBand {
    /// Builds the band `[median - span/2, median + span/2]`.
    pub fn around(median: f64, span: f64) -> Self {
        CpuBand {
            min: median - span / 2.0,
            max: median + span / 2.0,
        }
    }
}

/// One ranked organization for a country/network block of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingEntry {
    pub aso: String,
    pub ttfb: i64,
    pub plt: i64,
    pub cpu: i64,
    pub transfer_size: i64,
    pub samples: usize,
}
